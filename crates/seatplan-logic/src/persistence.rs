//! Save/Load of exact seat positions.
//!
//! Uses bincode for a compact binary snapshot: the topology plus every
//! occupied seat and its student. Unlike the plain-text records, loading a
//! snapshot does not re-run placement; students go straight back to the
//! seats they were saved in, after the snapshot has been checked.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocator::SeatingAllocator;
use crate::config::TopologyConfig;
use crate::error::SeatingError;
use crate::integrity::Severity;
use crate::student::Student;
use crate::topology::SeatAddress;

/// Version number for the snapshot format (increment when it changes)
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub topology: TopologyConfig,
    /// Occupied seats in traversal order.
    pub seats: Vec<SeatedStudent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatedStudent {
    pub address: SeatAddress,
    pub student: Student,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("Snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error(transparent)]
    Seating(#[from] SeatingError),
    #[error("Inconsistent snapshot: {0}")]
    Inconsistent(String),
}

impl SeatingAllocator {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            topology: self.config().clone(),
            seats: self
                .students()
                .map(|located| SeatedStudent {
                    address: located.seat,
                    student: located.student.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild an allocator from a snapshot, refusing anything that would
    /// break the seating invariants.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, PersistenceError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }

        let mut seats = SeatingAllocator::new(snapshot.topology)?;
        for entry in snapshot.seats {
            let at = entry.address;
            if !seats.layout().contains(at) {
                return Err(PersistenceError::Inconsistent(format!(
                    "seat ({}, {}, {}, {}, {}) is outside the topology",
                    at.block, at.floor, at.room, at.row, at.col
                )));
            }
            if entry.student.parity() != at.parity() {
                return Err(PersistenceError::Inconsistent(format!(
                    "student {} (batch {}) cannot sit in column {}",
                    entry.student.roll_number(),
                    entry.student.batch_id(),
                    at.col
                )));
            }
            if seats.student_at(at).is_some() {
                return Err(PersistenceError::Inconsistent(format!("{at} is listed twice")));
            }
            let _ = seats.room_mut(at.room_address()).place(at.row, at.col, entry.student);
        }

        let errors: Vec<String> = seats
            .validate_integrity()
            .into_iter()
            .filter(|issue| issue.severity == Severity::Error)
            .map(|issue| issue.message)
            .collect();
        if !errors.is_empty() {
            return Err(PersistenceError::Inconsistent(errors.join("; ")));
        }

        log::info!("Snapshot restored: {} students", seats.occupied());
        Ok(seats)
    }

    /// Save the complete seating to a writer
    pub fn save_snapshot<W: Write>(&self, writer: W) -> Result<(), PersistenceError> {
        let snapshot = self.snapshot();
        bincode::serialize_into(writer, &snapshot)?;
        log::info!("Snapshot saved: {} students", snapshot.seats.len());
        Ok(())
    }

    /// Load a seating from a reader
    pub fn load_snapshot<R: Read>(reader: R) -> Result<Self, PersistenceError> {
        let snapshot: Snapshot = bincode::deserialize_from(reader)?;
        Self::from_snapshot(snapshot)
    }
}
