//! Read-only lookups and text rendering.
//!
//! Lookups never mutate and never fail hard: a miss is `None` plus a log
//! line. Roll-number lookups scan rooms in traversal order and each room
//! row by row (the visual order), which is also the order rendering uses.

use serde::{Deserialize, Serialize};

use crate::allocator::SeatingAllocator;
use crate::constants::{render, BLOCK_IDS};
use crate::error::{Result, SeatingError};
use crate::student::Student;
use crate::topology::{Room, RoomAddress, Seat, SeatAddress};

/// A student together with the seat holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<'a> {
    pub seat: SeatAddress,
    pub student: &'a Student,
}

/// Structure-wide occupancy figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancySummary {
    pub blocks: usize,
    pub floors: usize,
    pub rooms: usize,
    pub seats: usize,
    pub occupied: usize,
    pub empty: usize,
    /// Percent of seats occupied.
    pub occupancy_rate: f64,
}

impl SeatingAllocator {
    /// Row-major scan for a roll number; the first match wins.
    pub(crate) fn locate_roll(&self, roll_number: u32) -> Option<SeatAddress> {
        self.layout().rooms().find_map(|room_addr| {
            self.room_ref(room_addr)
                .seats()
                .find(|seat| seat.student().is_some_and(|s| s.roll_number() == roll_number))
                .map(|seat| room_addr.seat(seat.row(), seat.col()))
        })
    }

    pub fn find_student_by_roll(&self, roll_number: u32) -> Option<Located<'_>> {
        let found = self.locate_roll(roll_number).and_then(|seat| {
            self.student_at(seat).map(|student| Located { seat, student })
        });
        if found.is_none() {
            log::warn!("Student {} not found", roll_number);
        }
        found
    }

    /// Turn user-facing identifiers (block letter, one-based floor and room
    /// numbers) into a room address.
    pub fn resolve_room(&self, block_id: char, floor: u32, room: u32) -> Result<RoomAddress> {
        let layout = self.layout();
        let block = BLOCK_IDS
            .iter()
            .take(layout.blocks)
            .position(|&id| id == block_id.to_ascii_uppercase())
            .ok_or_else(|| SeatingError::NotFound(format!("block {block_id}")))?;
        let floor_idx = (floor as usize)
            .checked_sub(1)
            .filter(|&f| f < layout.floors)
            .ok_or_else(|| SeatingError::NotFound(format!("floor {floor} in block {block_id}")))?;
        let room_idx = (room as usize)
            .checked_sub(1)
            .filter(|&r| r < layout.rooms)
            .ok_or_else(|| SeatingError::NotFound(format!("room {room} on floor {floor}")))?;
        Ok(RoomAddress::new(block, floor_idx, room_idx))
    }

    /// Look up the student at a user-facing location. Rows and columns are
    /// zero-based, as printed in seat addresses.
    pub fn find_student_by_location(
        &self,
        block_id: char,
        floor: u32,
        room: u32,
        row: usize,
        col: usize,
    ) -> Option<&Student> {
        let room_addr = match self.resolve_room(block_id, floor, room) {
            Ok(addr) => addr,
            Err(err) => {
                log::warn!("{}", err);
                return None;
            }
        };
        let grid = self.grid_size();
        if row >= grid || col >= grid {
            log::warn!(
                "{}",
                SeatingError::InvalidSeat {
                    row,
                    col,
                    grid_size: grid
                }
            );
            return None;
        }
        let student = self.student_at(room_addr.seat(row, col));
        if student.is_none() {
            log::info!("No student at {}", room_addr.seat(row, col));
        }
        student
    }

    /// Every seated student in allocation traversal order.
    pub fn students(&self) -> impl Iterator<Item = Located<'_>> + '_ {
        self.layout().traversal().filter_map(move |seat| {
            self.student_at(seat).map(|student| Located { seat, student })
        })
    }

    /// The grid of one room as `[roll]` / `[Empty]` lines.
    pub fn room_lines(&self, room: RoomAddress) -> Option<Vec<String>> {
        self.room(room).map(grid_lines)
    }

    /// Header plus grid lines for one room.
    pub fn render_room(&self, room: RoomAddress) -> Option<String> {
        let lines = self.room_lines(room)?;
        let mut out = format!("=== {room} ===\n");
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        Some(out)
    }

    pub fn summary(&self) -> OccupancySummary {
        let layout = self.layout();
        let seats = layout.total_seats();
        let occupied = self.occupied();
        let occupancy_rate = if seats == 0 {
            0.0
        } else {
            occupied as f64 * 100.0 / seats as f64
        };
        OccupancySummary {
            blocks: layout.blocks,
            floors: layout.blocks * layout.floors,
            rooms: layout.total_rooms(),
            seats,
            occupied,
            empty: seats - occupied,
            occupancy_rate,
        }
    }
}

fn seat_token(seat: &Seat) -> String {
    match seat.student() {
        Some(student) => format!("[{}]", student.roll_number()),
        None => format!("[{}]", render::EMPTY),
    }
}

pub(crate) fn grid_lines(room: &Room) -> Vec<String> {
    let grid = room.grid_size();
    (0..grid)
        .map(|row| {
            (0..grid)
                .filter_map(|col| room.seat(row, col))
                .map(seat_token)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopologyConfig;

    fn seated() -> SeatingAllocator {
        let mut seats = SeatingAllocator::new(TopologyConfig::new(2, 2, 2, 2)).unwrap();
        seats.insert_student(10, 22, "Math").unwrap();
        seats.insert_student(11, 23, "Physics").unwrap();
        seats
    }

    #[test]
    fn test_find_by_roll() {
        let seats = seated();
        let found = seats.find_student_by_roll(11).unwrap();
        assert_eq!(found.seat, RoomAddress::new(0, 0, 0).seat(0, 1));
        assert_eq!(found.student.subject(), "Physics");
        assert!(seats.find_student_by_roll(99).is_none());
    }

    #[test]
    fn test_resolve_room() {
        let seats = seated();
        assert_eq!(seats.resolve_room('B', 2, 1), Ok(RoomAddress::new(1, 1, 0)));
        assert_eq!(seats.resolve_room('a', 1, 2), Ok(RoomAddress::new(0, 0, 1)));
        assert!(matches!(seats.resolve_room('C', 1, 1), Err(SeatingError::NotFound(_))));
        assert!(seats.resolve_room('A', 0, 1).is_err());
        assert!(seats.resolve_room('A', 3, 1).is_err());
        assert!(seats.resolve_room('A', 1, 3).is_err());
    }

    #[test]
    fn test_find_by_location() {
        let seats = seated();
        let student = seats.find_student_by_location('A', 1, 1, 0, 0).unwrap();
        assert_eq!(student.roll_number(), 10);
        assert!(seats.find_student_by_location('A', 1, 1, 1, 1).is_none());
        assert!(seats.find_student_by_location('A', 1, 1, 2, 0).is_none());
        assert!(seats.find_student_by_location('Z', 1, 1, 0, 0).is_none());
    }

    #[test]
    fn test_render_room_is_row_major() {
        let mut seats = SeatingAllocator::new(TopologyConfig::new(1, 1, 1, 2)).unwrap();
        seats.insert_student(10, 22, "Math").unwrap();
        seats.insert_student(20, 22, "Math").unwrap();
        seats.insert_student(11, 23, "Math").unwrap();
        let text = seats.render_room(RoomAddress::new(0, 0, 0)).unwrap();
        assert_eq!(
            text,
            "=== Block A - Floor 1 - Room 1 ===\n[10] [11]\n[20] [Empty]\n"
        );
        assert!(seats.render_room(RoomAddress::new(0, 0, 5)).is_none());
    }

    #[test]
    fn test_students_in_traversal_order() {
        let mut seats = SeatingAllocator::new(TopologyConfig::new(1, 1, 1, 2)).unwrap();
        seats.insert_student(11, 23, "Math").unwrap();
        seats.insert_student(20, 22, "Math").unwrap();
        seats.insert_student(10, 22, "Math").unwrap();
        let rolls: Vec<u32> = seats.students().map(|l| l.student.roll_number()).collect();
        assert_eq!(rolls, vec![10, 20, 11]);
    }

    #[test]
    fn test_summary() {
        let seats = seated();
        let summary = seats.summary();
        assert_eq!(summary.blocks, 2);
        assert_eq!(summary.floors, 4);
        assert_eq!(summary.rooms, 8);
        assert_eq!(summary.seats, 32);
        assert_eq!(summary.occupied, 2);
        assert_eq!(summary.empty, 30);
        assert!((summary.occupancy_rate - 6.25).abs() < 1e-9);
    }
}
