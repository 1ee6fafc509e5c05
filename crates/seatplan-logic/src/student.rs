//! Student records and batch parity.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_BATCH, MIN_BATCH};
use crate::error::{Result, SeatingError};

/// Column/batch parity. Each room's columns split into one pool per parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of_column(col: usize) -> Self {
        if col % 2 == 1 {
            Parity::Odd
        } else {
            Parity::Even
        }
    }

    pub fn of_batch(batch_id: u32) -> Self {
        if batch_id % 2 == 1 {
            Parity::Odd
        } else {
            Parity::Even
        }
    }

    pub fn admits_column(self, col: usize) -> bool {
        Parity::of_column(col) == self
    }
}

/// A seated (or to-be-seated) student. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    roll_number: u32,
    batch_id: u32,
    subject: String,
}

impl Student {
    pub fn new(roll_number: u32, batch_id: u32, subject: impl Into<String>) -> Self {
        Self {
            roll_number,
            batch_id,
            subject: subject.into(),
        }
    }

    pub fn roll_number(&self) -> u32 {
        self.roll_number
    }

    pub fn batch_id(&self) -> u32 {
        self.batch_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn parity(&self) -> Parity {
        Parity::of_batch(self.batch_id)
    }
}

/// Reject batch IDs outside the accepted range.
pub fn validate_batch(batch_id: u32) -> Result<()> {
    if (MIN_BATCH..=MAX_BATCH).contains(&batch_id) {
        Ok(())
    } else {
        Err(SeatingError::InvalidBatch(batch_id))
    }
}
