//! Topology configuration and validation.
//!
//! The hierarchy is sized once, up front: number of blocks, floors per
//! block, rooms per floor and the square grid size shared by every room.
//! Nothing about the shape changes afterwards.
//!
//! ```
//! use seatplan_logic::config::{validate_topology, TopologyConfig};
//!
//! let config = TopologyConfig::new(2, 3, 10, 4);
//! assert!(validate_topology(&config).is_empty());
//! assert_eq!(config.total_seats(), 2 * 3 * 10 * 16);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{defaults, MAX_BLOCKS};

/// What happens when a deletion leaves a room, floor or block sparse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapsePolicy {
    /// Report the collapse but move nobody.
    #[default]
    Deferred,
    /// Pull later students backward into the sparse container.
    BorrowForward,
}

/// Shape of the seating hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub blocks: usize,
    pub floors_per_block: usize,
    pub rooms_per_floor: usize,
    /// Rows and columns per room.
    pub grid_size: usize,
    /// Same-batch students a room's parity pool holds before the subject
    /// restriction kicks in (None = parity pool size halved).
    pub cluster_threshold: Option<usize>,
    pub collapse_policy: CollapsePolicy,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            blocks: defaults::BLOCKS,
            floors_per_block: defaults::FLOORS_PER_BLOCK,
            rooms_per_floor: defaults::ROOMS_PER_FLOOR,
            grid_size: defaults::GRID_SIZE,
            cluster_threshold: None,
            collapse_policy: CollapsePolicy::Deferred,
        }
    }
}

impl TopologyConfig {
    pub fn new(blocks: usize, floors_per_block: usize, rooms_per_floor: usize, grid_size: usize) -> Self {
        Self {
            blocks,
            floors_per_block,
            rooms_per_floor,
            grid_size,
            ..Self::default()
        }
    }

    pub fn with_collapse_policy(mut self, policy: CollapsePolicy) -> Self {
        self.collapse_policy = policy;
        self
    }

    pub fn with_cluster_threshold(mut self, threshold: usize) -> Self {
        self.cluster_threshold = Some(threshold);
        self
    }

    pub fn seats_per_room(&self) -> usize {
        self.grid_size * self.grid_size
    }

    pub fn rooms_per_block(&self) -> usize {
        self.floors_per_block * self.rooms_per_floor
    }

    pub fn total_floors(&self) -> usize {
        self.blocks * self.floors_per_block
    }

    pub fn total_rooms(&self) -> usize {
        self.blocks * self.rooms_per_block()
    }

    pub fn total_seats(&self) -> usize {
        self.total_rooms() * self.seats_per_room()
    }

    /// Same-batch occupancy above which a room refuses new subjects.
    ///
    /// Defaults to half of the parity pool, where the pool is half the room.
    pub fn cluster_threshold(&self) -> usize {
        self.cluster_threshold
            .unwrap_or((self.seats_per_room() / 2) / 2)
    }
}

/// Topology validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one block is required")]
    NoBlocks,
    #[error("{0} blocks requested, at most {max} supported", max = MAX_BLOCKS)]
    TooManyBlocks(usize),
    #[error("each block needs at least one floor")]
    NoFloors,
    #[error("each floor needs at least one room")]
    NoRooms,
    #[error("grid size must be at least 1")]
    EmptyGrid,
}

/// Validate a topology, returning all errors found.
pub fn validate_topology(config: &TopologyConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.blocks == 0 {
        errors.push(ConfigError::NoBlocks);
    }
    if config.blocks > MAX_BLOCKS {
        errors.push(ConfigError::TooManyBlocks(config.blocks));
    }
    if config.floors_per_block == 0 {
        errors.push(ConfigError::NoFloors);
    }
    if config.rooms_per_floor == 0 {
        errors.push(ConfigError::NoRooms);
    }
    if config.grid_size == 0 {
        errors.push(ConfigError::EmptyGrid);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TopologyConfig::default();
        let errors = validate_topology(&config);
        assert!(errors.is_empty(), "default config should be valid: {errors:?}");
        assert_eq!(config.total_rooms(), 90);
    }

    #[test]
    fn too_many_blocks() {
        let config = TopologyConfig::new(4, 1, 1, 2);
        assert_eq!(validate_topology(&config), vec![ConfigError::TooManyBlocks(4)]);
    }

    #[test]
    fn all_errors_reported() {
        let config = TopologyConfig::new(0, 0, 0, 0);
        let errors = validate_topology(&config);
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ConfigError::NoBlocks));
        assert!(errors.contains(&ConfigError::EmptyGrid));
    }

    #[test]
    fn cluster_threshold_halves_parity_pool() {
        assert_eq!(TopologyConfig::new(1, 1, 1, 4).cluster_threshold(), 4);
        assert_eq!(TopologyConfig::new(1, 1, 1, 2).cluster_threshold(), 1);
        assert_eq!(TopologyConfig::new(1, 1, 1, 5).cluster_threshold(), 6);
        assert_eq!(
            TopologyConfig::new(1, 1, 1, 4).with_cluster_threshold(2).cluster_threshold(),
            2
        );
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: TopologyConfig =
            serde_json::from_str(r#"{"blocks": 1, "collapse_policy": "borrow_forward"}"#).unwrap();
        assert_eq!(config.blocks, 1);
        assert_eq!(config.grid_size, 4);
        assert_eq!(config.collapse_policy, CollapsePolicy::BorrowForward);
    }
}
