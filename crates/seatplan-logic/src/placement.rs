//! Insertion search: where does a student with a given roll number go?
//!
//! The search walks rooms in traversal order and, inside each room, only
//! the columns matching the student's batch parity (column-major). It stops
//! at the first seat that either:
//!
//! - is vacant, passes the anti-clustering rule, and is not followed in the
//!   pool by an occupant with a smaller roll number, or
//! - is occupied by a strictly greater roll number (a displacement point).
//!
//! While only insertions have happened a parity pool is always filled as a
//! prefix, so "not followed by a smaller roll" holds trivially for the
//! first vacancy. After deletions leave holes it keeps a late roll number
//! from landing in front of smaller ones.
//!
//! When every acceptable vacancy sits in front of smaller roll numbers the
//! search answers `Compact` with the first such hole: the pool has to be
//! closed up behind it before the student fits at the end.

use crate::allocator::SeatingAllocator;
use crate::student::Parity;
use crate::topology::{Room, Seat, SeatAddress};

/// Result of the insertion search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// Seat the student here; nobody moves.
    Vacant(SeatAddress),
    /// Seat the student here and push the current occupant forward.
    Displace(SeatAddress),
    /// No vacancy follows the largest roll number, but this hole passed
    /// the clustering rule. Shift the pool back into it, then search again.
    Compact(SeatAddress),
}

impl Candidate {
    pub fn seat(self) -> SeatAddress {
        match self {
            Candidate::Vacant(seat) | Candidate::Displace(seat) | Candidate::Compact(seat) => seat,
        }
    }
}

/// Anti-clustering rule for one room.
///
/// Once more than `threshold` students of `batch_id` sit in the batch's
/// parity columns, a vacant seat is refused if any of them studies a
/// subject other than `subject`.
pub fn clustering_allows(room: &Room, batch_id: u32, subject: &str, threshold: usize) -> bool {
    let parity = Parity::of_batch(batch_id);
    let same_batch: Vec<&str> = room
        .seats()
        .filter(|seat| parity.admits_column(seat.col()))
        .filter_map(Seat::student)
        .filter(|student| student.batch_id() == batch_id)
        .map(|student| student.subject())
        .collect();

    if same_batch.len() <= threshold {
        return true;
    }
    same_batch.iter().all(|&other| other == subject)
}

impl SeatingAllocator {
    /// Find the seat a new student should take, or `None` when no seat in
    /// the structure satisfies ordering, parity and clustering.
    pub fn find_insertion_position(
        &self,
        roll_number: u32,
        batch_id: u32,
        subject: &str,
    ) -> Option<Candidate> {
        let parity = Parity::of_batch(batch_id);
        let grid = self.layout().grid;
        let threshold = self.config().cluster_threshold();
        // First acceptable vacancy since the last occupant we passed.
        let mut pending: Option<SeatAddress> = None;
        // First acceptable vacancy given up because a smaller roll followed.
        let mut dropped: Option<SeatAddress> = None;

        for room_addr in self.layout().rooms() {
            let room = self.room_ref(room_addr);
            let mut admits: Option<bool> = None;

            for col in (0..grid).filter(|&c| parity.admits_column(c)) {
                for row in 0..grid {
                    let addr = room_addr.seat(row, col);
                    match room.seat(row, col).and_then(Seat::student) {
                        None => {
                            if pending.is_none()
                                && *admits.get_or_insert_with(|| {
                                    clustering_allows(room, batch_id, subject, threshold)
                                })
                            {
                                pending = Some(addr);
                            }
                        }
                        Some(occupant) => {
                            let occupant_roll = occupant.roll_number();
                            if let Some(vacancy) = pending.take() {
                                if occupant_roll >= roll_number {
                                    return Some(Candidate::Vacant(vacancy));
                                }
                                dropped.get_or_insert(vacancy);
                            } else if occupant_roll > roll_number {
                                return Some(Candidate::Displace(addr));
                            }
                        }
                    }
                }
            }
        }

        pending
            .map(Candidate::Vacant)
            .or_else(|| dropped.map(Candidate::Compact))
    }
}
