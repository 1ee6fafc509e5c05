//! Exam seating allocation engine.
//!
//! Students are seated across a fixed Block → Floor → Room → Seat grid
//! hierarchy. Every seat sits on one global traversal order (block, floor,
//! room, then column-major inside the room), and the allocator keeps roll
//! numbers non-decreasing along that order inside each column-parity pool
//! while insertions cascade forward and deletions collapse backward.
//!
//! The crate is pure logic: no I/O beyond `Read`/`Write` adapters, no
//! global state, one owning [`SeatingAllocator`](allocator::SeatingAllocator).
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`allocator`] | Top-level owner; insertion with forward collapse, deletion with backward collapse |
//! | [`config`] | Topology dimensions, collapse policy, validation |
//! | [`constants`] | Batch range, block letters, default dimensions |
//! | [`error`] | Engine error taxonomy |
//! | [`integrity`] | Occupancy, parity, ordering and link-symmetry checks |
//! | [`navigation`] | Room cursor driven by `w/s/a/d/q` commands |
//! | [`persistence`] | Versioned bincode snapshot of exact seat positions |
//! | [`placement`] | Parity-filtered insertion search and anti-clustering rule |
//! | [`query`] | Lookups, room rendering, occupancy summary |
//! | [`rebalance`] | Room/floor/block collapse contract and borrow-forward rule |
//! | [`records`] | Plain-text record import/save and seating-plan export |
//! | [`student`] | Student record and batch parity |
//! | [`topology`] | Seat arena, containers, eight-way wiring, traversal ordinals |
//!
//! ```
//! use seatplan_logic::allocator::SeatingAllocator;
//! use seatplan_logic::config::TopologyConfig;
//!
//! let mut seats = SeatingAllocator::new(TopologyConfig::new(1, 1, 2, 2)).unwrap();
//! seats.insert_student(10, 22, "Math").unwrap();
//! let placed = seats.insert_student(5, 22, "Math").unwrap();
//! assert_eq!(placed.displaced, 1);
//! assert!(seats.validate_integrity().is_empty());
//! ```

pub mod allocator;
pub mod config;
pub mod constants;
pub mod error;
pub mod integrity;
pub mod navigation;
pub mod persistence;
pub mod placement;
pub mod query;
pub mod rebalance;
pub mod records;
pub mod student;
pub mod topology;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::allocator::{Placement, Removal, SeatingAllocator, Shift};
    pub use crate::config::{CollapsePolicy, TopologyConfig};
    pub use crate::error::SeatingError;
    pub use crate::student::{Parity, Student};
    pub use crate::topology::{RoomAddress, SeatAddress};
}
