use thiserror::Error;

use crate::config::ConfigError;
use crate::constants::{MAX_BATCH, MIN_BATCH};

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, SeatingError>;

/// Errors surfaced by the seating engine.
///
/// Every variant is recoverable: the allocator is left in its last
/// consistent state when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatingError {
    #[error("invalid batch ID {0}: must be {min}-{max}", min = MIN_BATCH, max = MAX_BATCH)]
    InvalidBatch(u32),
    #[error("cannot place student {roll_number}: all seats full or constraints violated")]
    PlacementFailed { roll_number: u32 },
    #[error("{0} not found")]
    NotFound(String),
    #[error("malformed record #{index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
    #[error("seat ({row}, {col}) is outside the {grid_size}x{grid_size} grid")]
    InvalidSeat {
        row: usize,
        col: usize,
        grid_size: usize,
    },
    #[error("invalid topology: {}", join_errors(.0))]
    InvalidTopology(Vec<ConfigError>),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
