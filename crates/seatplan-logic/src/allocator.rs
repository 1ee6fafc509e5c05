//! The top-level owner of the seating hierarchy.
//!
//! `SeatingAllocator` builds the fixed topology once and then only moves
//! students between seats. Insertion cascades forward (a smaller roll
//! number takes a seat and its occupant is re-seated further along);
//! deletion collapses backward (the next student of the same parity pool
//! moves into the vacancy).

use serde::{Deserialize, Serialize};

use crate::config::{validate_topology, TopologyConfig};
use crate::error::{Result, SeatingError};
use crate::placement::Candidate;
use crate::rebalance::CollapseEvent;
use crate::student::{validate_batch, Student};
use crate::topology::{self, Block, Layout, Room, RoomAddress, Seat, SeatAddress};

/// Where an inserted student ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub seat: SeatAddress,
    /// Students pushed forward to make room.
    pub displaced: usize,
}

/// One student moved backward by one occupied position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub roll_number: u32,
    pub from: SeatAddress,
    pub to: SeatAddress,
}

/// Outcome of a successful deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct Removal {
    pub student: Student,
    pub vacated: SeatAddress,
    pub shift: Option<Shift>,
    pub collapses: Vec<CollapseEvent>,
}

/// Owns every block, floor, room, seat and student.
#[derive(Debug, Clone)]
pub struct SeatingAllocator {
    config: TopologyConfig,
    layout: Layout,
    blocks: Vec<Block>,
}

impl SeatingAllocator {
    /// Build and wire the hierarchy described by `config`.
    pub fn new(config: TopologyConfig) -> Result<Self> {
        let errors = validate_topology(&config);
        if !errors.is_empty() {
            return Err(SeatingError::InvalidTopology(errors));
        }

        let layout = Layout::of(&config);
        let blocks = topology::build(&layout);
        log::info!(
            "Seating built: {} blocks x {} floors x {} rooms, {}x{} grid ({} seats)",
            layout.blocks,
            layout.floors,
            layout.rooms,
            layout.grid,
            layout.grid,
            layout.total_seats()
        );

        Ok(Self {
            config,
            layout,
            blocks,
        })
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn grid_size(&self) -> usize {
        self.layout.grid
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn room(&self, room: RoomAddress) -> Option<&Room> {
        self.blocks
            .get(room.block)?
            .floors()
            .get(room.floor)?
            .rooms()
            .get(room.room)
    }

    pub fn seat(&self, seat: SeatAddress) -> Option<&Seat> {
        self.room(seat.room_address())?.seat(seat.row, seat.col)
    }

    pub fn student_at(&self, seat: SeatAddress) -> Option<&Student> {
        self.seat(seat).and_then(Seat::student)
    }

    /// Total students seated.
    pub fn occupied(&self) -> usize {
        self.blocks.iter().map(Block::occupied).sum()
    }

    /// Remove every student, keeping the topology and its wiring.
    pub fn clear(&mut self) {
        for room in self.layout.rooms().collect::<Vec<_>>() {
            topology::room_mut(&mut self.blocks, room).clear();
        }
        log::info!("All seats cleared");
    }

    pub(crate) fn room_ref(&self, room: RoomAddress) -> &Room {
        topology::room_ref(&self.blocks, room)
    }

    pub(crate) fn room_mut(&mut self, room: RoomAddress) -> &mut Room {
        topology::room_mut(&mut self.blocks, room)
    }

    // ── Insertion ───────────────────────────────────────────────────────

    /// Seat a new student, displacing larger roll numbers forward as needed.
    ///
    /// Fails with `InvalidBatch` outside 22–25 and with `PlacementFailed`
    /// when the student (or anyone displaced on its behalf) has nowhere to
    /// go. A failed insertion leaves every seat as it was.
    pub fn insert_student(&mut self, roll_number: u32, batch_id: u32, subject: &str) -> Result<Placement> {
        if let Err(err) = validate_batch(batch_id) {
            log::warn!("Rejected student {}: {}", roll_number, err);
            return Err(err);
        }

        let placement = self.forward_collapse(Student::new(roll_number, batch_id, subject))?;
        log::info!(
            "Student {} inserted at {} ({} displaced)",
            roll_number,
            placement.seat,
            placement.displaced
        );
        Ok(placement)
    }

    /// Work-list form of the displacement cascade. Each displaced student
    /// is searched for from the start of the structure again; displaced
    /// roll numbers strictly increase, so the loop ends.
    ///
    /// If the only acceptable vacancies sit in front of smaller roll
    /// numbers, the pool is compacted once and the search repeated.
    fn forward_collapse(&mut self, student: Student) -> Result<Placement> {
        let roll_number = student.roll_number();
        let mut chain: Vec<SeatAddress> = Vec::new();
        let mut compacted: Option<Vec<Shift>> = None;
        let mut pending = student;

        loop {
            let candidate =
                self.find_insertion_position(pending.roll_number(), pending.batch_id(), pending.subject());
            let seat = match candidate {
                Some(Candidate::Compact(hole)) if compacted.is_none() => {
                    compacted = Some(self.compact_pool(hole));
                    continue;
                }
                Some(Candidate::Vacant(seat)) | Some(Candidate::Displace(seat)) => seat,
                Some(Candidate::Compact(_)) | None => {
                    log::warn!(
                        "Cannot place student {}: no seat left for {} after {} displacements, rolling back",
                        roll_number,
                        pending.roll_number(),
                        chain.len()
                    );
                    let shifts = compacted.unwrap_or_default();
                    self.unwind(&chain, &shifts, pending);
                    return Err(SeatingError::PlacementFailed { roll_number });
                }
            };

            match self.room_mut(seat.room_address()).place(seat.row, seat.col, pending) {
                None => {
                    let mut placed = chain.first().copied().unwrap_or(seat);
                    for shift in compacted.iter().flatten() {
                        if shift.from == placed {
                            placed = shift.to;
                        }
                    }
                    return Ok(Placement {
                        seat: placed,
                        displaced: chain.len(),
                    });
                }
                Some(displaced) => {
                    log::debug!("Student {} displaced from {}", displaced.roll_number(), seat);
                    chain.push(seat);
                    pending = displaced;
                }
            }
        }
    }

    /// Close the pool up behind `hole`: every later student of the same
    /// parity moves back by one occupied position, leaving the vacancy
    /// after the largest roll number.
    fn compact_pool(&mut self, hole: SeatAddress) -> Vec<Shift> {
        let mut shifts = Vec::new();
        let mut vacancy = hole;
        while let Some(shift) = self.backward_collapse(vacancy) {
            vacancy = shift.from;
            shifts.push(shift);
        }
        log::debug!("Compacted pool behind {}: {} students shifted back", hole, shifts.len());
        shifts
    }

    /// Undo an insertion attempt. Compaction shifts are reversed first, then
    /// the displacement chain walking backwards, each seat getting its
    /// previous occupant back. What remains in hand is the rejected newcomer.
    fn unwind(&mut self, chain: &[SeatAddress], shifts: &[Shift], mut pending: Student) {
        for shift in shifts.iter().rev() {
            if self.move_student(shift.to, shift.from).is_none() {
                log::error!("Could not return student {} to {}", shift.roll_number, shift.from);
            }
        }
        for seat in chain.iter().rev() {
            match self.room_mut(seat.room_address()).place(seat.row, seat.col, pending) {
                Some(placed) => pending = placed,
                None => return,
            }
        }
        log::debug!("Discarded student {}", pending.roll_number());
    }

    // ── Deletion ────────────────────────────────────────────────────────

    /// Remove a student by roll number, shift the next student of the same
    /// pool back into the vacancy, and run the collapse checks.
    pub fn delete_student(&mut self, roll_number: u32) -> Result<Removal> {
        let not_found = || SeatingError::NotFound(format!("student {roll_number}"));
        let Some(vacated) = self.locate_roll(roll_number) else {
            log::warn!("Student {} not found", roll_number);
            return Err(not_found());
        };
        let Some(student) = self.room_mut(vacated.room_address()).take(vacated.row, vacated.col) else {
            return Err(not_found());
        };

        let shift = self.backward_collapse(vacated);

        let mut touched = vec![vacated.room_address()];
        if let Some(shift) = &shift {
            if shift.from.room_address() != vacated.room_address() {
                touched.push(shift.from.room_address());
            }
        }
        let mut collapses = Vec::new();
        for room in touched {
            collapses.extend(self.check_collapse(room));
        }

        log::info!("Student {} deleted from {}", roll_number, vacated);
        Ok(Removal {
            student,
            vacated,
            shift,
            collapses,
        })
    }

    /// Move the next occupied seat of the vacancy's parity pool (in
    /// traversal order) back into the vacancy. Exactly one student moves;
    /// nothing happens if `vacated` is occupied or nobody follows it.
    pub fn backward_collapse(&mut self, vacated: SeatAddress) -> Option<Shift> {
        if !self.layout.contains(vacated) || self.student_at(vacated).is_some() {
            return None;
        }
        let from = self.next_occupied_in_pool(vacated)?;
        self.move_student(from, vacated)
    }

    /// First occupied seat after `after` in traversal order whose column
    /// parity matches.
    pub(crate) fn next_occupied_in_pool(&self, after: SeatAddress) -> Option<SeatAddress> {
        let parity = after.parity();
        let start = self.layout.ordinal(after) + 1;
        self.layout
            .ordinals(start..self.layout.total_seats())
            .filter(|seat| seat.parity() == parity)
            .find(|&seat| self.student_at(seat).is_some())
    }

    /// Move a student from `from` into the vacant seat `to`, keeping both
    /// rooms' counters in step. Returns `None` and moves nobody when `to`
    /// is occupied or either seat is outside the structure.
    pub(crate) fn move_student(&mut self, from: SeatAddress, to: SeatAddress) -> Option<Shift> {
        if !self.layout.contains(from) || !self.layout.contains(to) || self.student_at(to).is_some() {
            return None;
        }
        let student = self.room_mut(from.room_address()).take(from.row, from.col)?;
        let roll_number = student.roll_number();
        if let Some(previous) = self.room_mut(to.room_address()).place(to.row, to.col, student) {
            // `to` was vacant a moment ago; swap back rather than lose anyone.
            if let Some(moved) = self.room_mut(to.room_address()).place(to.row, to.col, previous) {
                let _ = self.room_mut(from.room_address()).place(from.row, from.col, moved);
            }
            return None;
        }
        log::debug!("Student {} shifted back from {} to {}", roll_number, from, to);
        Some(Shift {
            roll_number,
            from,
            to,
        })
    }
}
