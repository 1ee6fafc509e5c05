//! Structural collapse for rooms, floors and blocks.
//!
//! A deletion can leave a container sparsely populated while later ones
//! still hold students. Rooms, floors and blocks share one capability,
//! [`Rebalance`], and one rule for borrowing students back into them:
//!
//! 1. Find the container's first vacant seat (traversal order) that has an
//!    occupied seat of the same column parity somewhere after it.
//! 2. Shift that next occupant back into the vacancy.
//! 3. Repeat while the container is still sparse.
//!
//! Each shift moves one student strictly earlier along its parity pool and
//! jumps nobody, so the roll-number ordering of the pool is unchanged and
//! the loop always ends.
//!
//! Whether the rule runs is governed by [`CollapsePolicy`]: under
//! `Deferred` collapses are only reported.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::allocator::{SeatingAllocator, Shift};
use crate::config::CollapsePolicy;
use crate::topology::{Block, Floor, Room, RoomAddress};

/// Capability shared by every container that can run out of students.
pub trait Rebalance {
    /// `(occupied, capacity)`.
    fn occupancy(&self) -> (usize, usize);

    /// Whether the container should borrow students from later containers.
    fn is_sparse(&self) -> bool;
}

/// A room is sparse below half its seats (rounded up).
impl Rebalance for Room {
    fn occupancy(&self) -> (usize, usize) {
        (self.occupied(), self.capacity())
    }

    fn is_sparse(&self) -> bool {
        !self.is_half_full()
    }
}

/// A floor is sparse when more than half of its rooms are.
impl Rebalance for Floor {
    fn occupancy(&self) -> (usize, usize) {
        (self.occupied(), self.capacity())
    }

    fn is_sparse(&self) -> bool {
        let sparse = self.rooms().iter().filter(|room| room.is_sparse()).count();
        sparse * 2 > self.rooms().len()
    }
}

/// A block is sparse when more than half of its floors are.
impl Rebalance for Block {
    fn occupancy(&self) -> (usize, usize) {
        (self.occupied(), self.capacity())
    }

    fn is_sparse(&self) -> bool {
        let sparse = self.floors().iter().filter(|floor| floor.is_sparse()).count();
        sparse * 2 > self.floors().len()
    }
}

/// Which container a collapse concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Room(RoomAddress),
    Floor { block: usize, floor: usize },
    Block(usize),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Scope::Room(room) => write!(f, "{room}"),
            Scope::Floor { block, floor } => {
                let room = RoomAddress::new(block, floor, 0);
                write!(f, "Block {} - Floor {}", room.block_id(), room.floor_number())
            }
            Scope::Block(block) => write!(f, "Block {}", RoomAddress::new(block, 0, 0).block_id()),
        }
    }
}

/// A collapse signal, with whatever borrowing the policy performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseEvent {
    pub scope: Scope,
    /// Occupancy after any borrowing.
    pub occupied: usize,
    pub capacity: usize,
    pub borrowed: Vec<Shift>,
}

impl SeatingAllocator {
    fn container(&self, scope: Scope) -> Option<&dyn Rebalance> {
        match scope {
            Scope::Room(room) => self.room(room).map(|r| r as &dyn Rebalance),
            Scope::Floor { block, floor } => self
                .blocks()
                .get(block)?
                .floors()
                .get(floor)
                .map(|f| f as &dyn Rebalance),
            Scope::Block(block) => self.blocks().get(block).map(|b| b as &dyn Rebalance),
        }
    }

    fn scope_range(&self, scope: Scope) -> Range<usize> {
        match scope {
            Scope::Room(room) => self.layout().room_range(room),
            Scope::Floor { block, floor } => self.layout().floor_range(block, floor),
            Scope::Block(block) => self.layout().block_range(block),
        }
    }

    /// Whether a container exists and is sparse.
    pub fn is_sparse(&self, scope: Scope) -> bool {
        self.container(scope).is_some_and(|c| c.is_sparse())
    }

    /// Apply the borrow-forward rule to a container regardless of policy.
    /// Returns the shifts performed, in order.
    pub fn rebalance(&mut self, scope: Scope) -> Vec<Shift> {
        let mut shifts = Vec::new();
        if self.container(scope).is_none() {
            return shifts;
        }
        let range = self.scope_range(scope);

        while self.is_sparse(scope) {
            let next = self
                .layout()
                .ordinals(range.clone())
                .filter(|&seat| self.student_at(seat).is_none())
                .find_map(|vacancy| self.next_occupied_in_pool(vacancy).map(|from| (from, vacancy)));
            let Some((from, to)) = next else {
                break;
            };
            match self.move_student(from, to) {
                Some(shift) => shifts.push(shift),
                None => break,
            }
        }

        if !shifts.is_empty() {
            log::info!("{} borrowed {} students", scope, shifts.len());
        }
        shifts
    }

    fn collapse(&mut self, scope: Scope) -> CollapseEvent {
        let borrowed = match self.config().collapse_policy {
            CollapsePolicy::Deferred => {
                log::info!("{} collapse triggered (rebalancing deferred)", scope);
                Vec::new()
            }
            CollapsePolicy::BorrowForward => self.rebalance(scope),
        };
        let (occupied, capacity) = self
            .container(scope)
            .map_or((0, 0), |c| c.occupancy());
        CollapseEvent {
            scope,
            occupied,
            capacity,
            borrowed,
        }
    }

    /// Signal (and, under `BorrowForward`, repair) a sparse room.
    pub fn room_collapse(&mut self, room: RoomAddress) -> Option<CollapseEvent> {
        let scope = Scope::Room(room);
        self.is_sparse(scope).then(|| self.collapse(scope))
    }

    pub fn floor_collapse(&mut self, block: usize, floor: usize) -> Option<CollapseEvent> {
        let scope = Scope::Floor { block, floor };
        self.is_sparse(scope).then(|| self.collapse(scope))
    }

    pub fn block_collapse(&mut self, block: usize) -> Option<CollapseEvent> {
        let scope = Scope::Block(block);
        self.is_sparse(scope).then(|| self.collapse(scope))
    }

    /// Collapse checks after a room lost a student: the room first, then
    /// its floor if the room collapsed, then its block if the floor did.
    pub(crate) fn check_collapse(&mut self, room: RoomAddress) -> Vec<CollapseEvent> {
        let mut events = Vec::new();
        let Some(event) = self.room_collapse(room) else {
            return events;
        };
        events.push(event);
        let Some(event) = self.floor_collapse(room.block, room.floor) else {
            return events;
        };
        events.push(event);
        if let Some(event) = self.block_collapse(room.block) {
            events.push(event);
        }
        events
    }
}
