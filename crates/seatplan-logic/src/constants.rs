//! Fixed domain constants shared by the engine and its collaborators.

/// Lowest batch ID accepted at the insertion boundary.
pub const MIN_BATCH: u32 = 22;
/// Highest batch ID accepted at the insertion boundary.
pub const MAX_BATCH: u32 = 25;

/// Block letters in construction order. The hierarchy holds at most this many blocks.
pub const BLOCK_IDS: [char; 3] = ['A', 'B', 'C'];
pub const MAX_BLOCKS: usize = BLOCK_IDS.len();

pub mod defaults {
    pub const BLOCKS: usize = 3;
    pub const FLOORS_PER_BLOCK: usize = 3;
    pub const ROOMS_PER_FLOOR: usize = 10;
    pub const GRID_SIZE: usize = 4;
}

pub mod render {
    /// Token body for a vacant seat: rendered as `[Empty]`.
    pub const EMPTY: &str = "Empty";
}
