//! Structural integrity checks for a seating hierarchy.
//!
//! Pure functions over a borrowed allocator, each returning the issues it
//! found. Nothing here mutates. `validate_all` (also available as
//! [`SeatingAllocator::validate_integrity`]) runs every check.

use std::collections::HashMap;

use serde::Serialize;

use crate::allocator::SeatingAllocator;
use crate::constants::{MAX_BATCH, MIN_BATCH};
use crate::student::Parity;
use crate::topology::{Direction, Seat};

/// One integrity finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

impl IntegrityIssue {
    fn error(category: &'static str, message: String) -> Self {
        Self {
            category,
            severity: Severity::Error,
            message,
        }
    }

    fn warning(category: &'static str, message: String) -> Self {
        Self {
            category,
            severity: Severity::Warning,
            message,
        }
    }
}

// ── A. Per-room bookkeeping ─────────────────────────────────────────────

/// Each room's counter equals the number of seats holding a student.
pub fn check_occupancy_counters(seats: &SeatingAllocator) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    for addr in seats.layout().rooms() {
        let room = seats.room_ref(addr);
        let actual = room.seats().filter(|s| !s.is_vacant()).count();
        if actual != room.occupied() {
            issues.push(IntegrityIssue::error(
                "occupancy",
                format!("{} counts {} students but holds {}", addr, room.occupied(), actual),
            ));
        }
    }
    issues
}

/// Seats know their own row and column.
pub fn check_seat_coordinates(seats: &SeatingAllocator) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    let grid = seats.grid_size();
    for addr in seats.layout().rooms() {
        let room = seats.room_ref(addr);
        for (i, seat) in room.seats().enumerate() {
            if (seat.row(), seat.col()) != (i / grid, i % grid) {
                issues.push(IntegrityIssue::error(
                    "coordinates",
                    format!(
                        "{}: seat #{} reports ({}, {})",
                        addr,
                        i,
                        seat.row(),
                        seat.col()
                    ),
                ));
            }
        }
    }
    issues
}

// ── B. Student placement ────────────────────────────────────────────────

/// Every student sits in a column of its batch parity, with a valid batch.
pub fn check_parity(seats: &SeatingAllocator) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    for located in seats.students() {
        let student = located.student;
        if !(MIN_BATCH..=MAX_BATCH).contains(&student.batch_id()) {
            issues.push(IntegrityIssue::error(
                "batch",
                format!(
                    "Student {} at {} has batch {}",
                    student.roll_number(),
                    located.seat,
                    student.batch_id()
                ),
            ));
        }
        if student.parity() != located.seat.parity() {
            issues.push(IntegrityIssue::error(
                "parity",
                format!(
                    "Student {} (batch {}) sits in column {}",
                    student.roll_number(),
                    student.batch_id(),
                    located.seat.col
                ),
            ));
        }
    }
    issues
}

/// Roll numbers never decrease along either parity pool.
pub fn check_ordering(seats: &SeatingAllocator) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    for parity in [Parity::Even, Parity::Odd] {
        let mut previous: Option<u32> = None;
        for located in seats.students().filter(|l| l.seat.parity() == parity) {
            let roll = located.student.roll_number();
            if let Some(prev) = previous {
                if roll < prev {
                    issues.push(IntegrityIssue::error(
                        "ordering",
                        format!(
                            "Student {} at {} follows roll {} in the {:?} pool",
                            roll, located.seat, prev, parity
                        ),
                    ));
                }
            }
            previous = Some(roll);
        }
    }
    issues
}

/// The same roll number seated twice. Allowed, but lookups only ever
/// see the first one.
pub fn check_duplicate_rolls(seats: &SeatingAllocator) -> Vec<IntegrityIssue> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for located in seats.students() {
        *counts.entry(located.student.roll_number()).or_insert(0) += 1;
    }
    let mut duplicates: Vec<(u32, usize)> = counts.into_iter().filter(|&(_, n)| n > 1).collect();
    duplicates.sort_unstable();
    duplicates
        .into_iter()
        .map(|(roll, n)| {
            IntegrityIssue::warning("duplicates", format!("Roll number {} is seated {} times", roll, n))
        })
        .collect()
}

// ── C. Wiring ───────────────────────────────────────────────────────────

/// Every neighbor link points inside the hierarchy and is returned by the
/// opposite link of its target.
pub fn check_links(seats: &SeatingAllocator) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();
    let layout = seats.layout();
    for here in layout.traversal() {
        let Some(seat) = seats.seat(here) else {
            continue;
        };
        for dir in Direction::ALL {
            let Some(there) = seat.neighbor(dir) else {
                continue;
            };
            if !layout.contains(there) {
                issues.push(IntegrityIssue::error(
                    "links",
                    format!("{} links {:?} outside the hierarchy", here, dir),
                ));
                continue;
            }
            let back = seats.seat(there).and_then(|s: &Seat| s.neighbor(dir.opposite()));
            if back != Some(here) {
                issues.push(IntegrityIssue::error(
                    "links",
                    format!("{} -> {:?} -> {} is not mirrored", here, dir, there),
                ));
            }
        }
    }
    issues
}

// ── Master validation ───────────────────────────────────────────────────

pub fn validate_all(seats: &SeatingAllocator) -> Vec<IntegrityIssue> {
    let mut all = Vec::new();
    all.extend(check_occupancy_counters(seats));
    all.extend(check_seat_coordinates(seats));
    all.extend(check_parity(seats));
    all.extend(check_ordering(seats));
    all.extend(check_duplicate_rolls(seats));
    all.extend(check_links(seats));
    all
}

impl SeatingAllocator {
    pub fn validate_integrity(&self) -> Vec<IntegrityIssue> {
        validate_all(self)
    }
}
