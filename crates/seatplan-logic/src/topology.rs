//! Seat arena, containers and the wiring pass.
//!
//! Containers own their children by value (`Block` → `Floor` → `Room` →
//! `Seat`), so teardown follows ownership and never touches a neighbor
//! link. Neighbor links are plain [`SeatAddress`] indices into that tree.
//!
//! # Traversal order
//!
//! Every seat has an ordinal on one global walk: block, floor, room, then
//! column-major inside the room (outer column, inner row). [`Layout`] turns
//! addresses into ordinals and back with index arithmetic. Each room, floor
//! and block therefore covers one contiguous ordinal range.
//!
//! # Wiring
//!
//! | Links | Between |
//! |-------|---------|
//! | `left` / `right` | adjacent columns of a row; last column of a room to the first column of the next room in traversal order |
//! | `front` / `back` | adjacent rows of a column |
//! | `up` / `down` | same position, same room index, adjacent floors of a block |
//! | `left_building` / `right_building` | last column of a room to the first column of the same-position room in the next block |

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::config::TopologyConfig;
use crate::constants::BLOCK_IDS;
use crate::student::{Parity, Student};

fn block_letter(block: usize) -> char {
    BLOCK_IDS.get(block).copied().unwrap_or('?')
}

/// Position of a room by container indices (all zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomAddress {
    pub block: usize,
    pub floor: usize,
    pub room: usize,
}

impl RoomAddress {
    pub fn new(block: usize, floor: usize, room: usize) -> Self {
        Self { block, floor, room }
    }

    pub fn seat(self, row: usize, col: usize) -> SeatAddress {
        SeatAddress {
            block: self.block,
            floor: self.floor,
            room: self.room,
            row,
            col,
        }
    }

    pub fn block_id(self) -> char {
        block_letter(self.block)
    }

    /// One-based floor number as shown to users.
    pub fn floor_number(self) -> u32 {
        self.floor as u32 + 1
    }

    /// One-based room number as shown to users.
    pub fn room_number(self) -> u32 {
        self.room as u32 + 1
    }
}

impl fmt::Display for RoomAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block {} - Floor {} - Room {}",
            self.block_id(),
            self.floor_number(),
            self.room_number()
        )
    }
}

/// Position of a seat: the arena index used for every neighbor link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatAddress {
    pub block: usize,
    pub floor: usize,
    pub room: usize,
    pub row: usize,
    pub col: usize,
}

impl SeatAddress {
    pub fn room_address(self) -> RoomAddress {
        RoomAddress::new(self.block, self.floor, self.room)
    }

    pub fn parity(self) -> Parity {
        Parity::of_column(self.col)
    }
}

impl fmt::Display for SeatAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let room = self.room_address();
        write!(
            f,
            "Block {}, Floor {}, Room {}, Row {}, Col {}",
            room.block_id(),
            room.floor_number(),
            room.room_number(),
            self.row,
            self.col
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Front,
    Back,
    Left,
    Right,
    Up,
    Down,
    LeftBuilding,
    RightBuilding,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Front,
        Direction::Back,
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
        Direction::LeftBuilding,
        Direction::RightBuilding,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Front => Direction::Back,
            Direction::Back => Direction::Front,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::LeftBuilding => Direction::RightBuilding,
            Direction::RightBuilding => Direction::LeftBuilding,
        }
    }
}

/// The eight non-owning neighbor links of a seat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Neighbors {
    pub front: Option<SeatAddress>,
    pub back: Option<SeatAddress>,
    pub left: Option<SeatAddress>,
    pub right: Option<SeatAddress>,
    pub up: Option<SeatAddress>,
    pub down: Option<SeatAddress>,
    pub left_building: Option<SeatAddress>,
    pub right_building: Option<SeatAddress>,
}

impl Neighbors {
    pub fn get(&self, dir: Direction) -> Option<SeatAddress> {
        match dir {
            Direction::Front => self.front,
            Direction::Back => self.back,
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Up => self.up,
            Direction::Down => self.down,
            Direction::LeftBuilding => self.left_building,
            Direction::RightBuilding => self.right_building,
        }
    }

    fn set(&mut self, dir: Direction, to: SeatAddress) {
        let slot = match dir {
            Direction::Front => &mut self.front,
            Direction::Back => &mut self.back,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
            Direction::LeftBuilding => &mut self.left_building,
            Direction::RightBuilding => &mut self.right_building,
        };
        *slot = Some(to);
    }
}

#[derive(Debug, Clone)]
pub struct Seat {
    student: Option<Student>,
    row: usize,
    col: usize,
    neighbors: Neighbors,
}

impl Seat {
    fn new(row: usize, col: usize) -> Self {
        Self {
            student: None,
            row,
            col,
            neighbors: Neighbors::default(),
        }
    }

    pub fn student(&self) -> Option<&Student> {
        self.student.as_ref()
    }

    pub fn is_vacant(&self) -> bool {
        self.student.is_none()
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn neighbors(&self) -> &Neighbors {
        &self.neighbors
    }

    pub fn neighbor(&self, dir: Direction) -> Option<SeatAddress> {
        self.neighbors.get(dir)
    }
}

/// A square grid of seats. Keeps its occupancy counter in step with its
/// seats: every student moves in or out through `place` / `take`.
#[derive(Debug, Clone)]
pub struct Room {
    number: u32,
    grid_size: usize,
    /// Row-major.
    seats: Vec<Seat>,
    occupied: usize,
}

impl Room {
    /// Build the grid and wire `left/right` along rows and `front/back`
    /// along columns.
    fn new(address: RoomAddress, grid_size: usize) -> Self {
        let mut seats: Vec<Seat> = (0..grid_size * grid_size)
            .map(|i| Seat::new(i / grid_size, i % grid_size))
            .collect();

        for row in 0..grid_size {
            for col in 0..grid_size {
                let here = row * grid_size + col;
                if col > 0 {
                    seats[here - 1]
                        .neighbors
                        .set(Direction::Right, address.seat(row, col));
                    seats[here]
                        .neighbors
                        .set(Direction::Left, address.seat(row, col - 1));
                }
                if row > 0 {
                    seats[here - grid_size]
                        .neighbors
                        .set(Direction::Back, address.seat(row, col));
                    seats[here]
                        .neighbors
                        .set(Direction::Front, address.seat(row - 1, col));
                }
            }
        }

        Self {
            number: address.room_number(),
            grid_size,
            seats,
            occupied: 0,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn seat(&self, row: usize, col: usize) -> Option<&Seat> {
        if row >= self.grid_size || col >= self.grid_size {
            return None;
        }
        self.seats.get(row * self.grid_size + col)
    }

    /// Seats in row-major (visual) order.
    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter()
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    pub fn capacity(&self) -> usize {
        self.seats.len()
    }

    /// Half the room, rounded up.
    pub fn min_occupancy(&self) -> usize {
        (self.capacity() + 1) / 2
    }

    pub fn is_full(&self) -> bool {
        self.occupied >= self.capacity()
    }

    pub fn is_half_full(&self) -> bool {
        self.occupied >= self.min_occupancy()
    }

    /// Seat a student, returning the previous occupant (if any).
    pub(crate) fn place(&mut self, row: usize, col: usize, student: Student) -> Option<Student> {
        let previous = self.seats[row * self.grid_size + col].student.replace(student);
        if previous.is_none() {
            self.occupied += 1;
        }
        previous
    }

    pub(crate) fn take(&mut self, row: usize, col: usize) -> Option<Student> {
        let removed = self.seats[row * self.grid_size + col].student.take();
        if removed.is_some() {
            self.occupied -= 1;
        }
        removed
    }

    pub(crate) fn clear(&mut self) {
        for seat in &mut self.seats {
            seat.student = None;
        }
        self.occupied = 0;
    }
}

#[derive(Debug, Clone)]
pub struct Floor {
    number: u32,
    rooms: Vec<Room>,
}

impl Floor {
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn occupied(&self) -> usize {
        self.rooms.iter().map(Room::occupied).sum()
    }

    pub fn capacity(&self) -> usize {
        self.rooms.iter().map(Room::capacity).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Block {
    id: char,
    floors: Vec<Floor>,
}

impl Block {
    pub fn id(&self) -> char {
        self.id
    }

    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    pub fn occupied(&self) -> usize {
        self.floors.iter().map(Floor::occupied).sum()
    }

    pub fn capacity(&self) -> usize {
        self.floors.iter().map(Floor::capacity).sum()
    }
}

// ── Layout arithmetic ───────────────────────────────────────────────────

/// Dimensions of a built hierarchy plus ordinal arithmetic over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub blocks: usize,
    pub floors: usize,
    pub rooms: usize,
    pub grid: usize,
}

impl Layout {
    pub fn of(config: &TopologyConfig) -> Self {
        Self {
            blocks: config.blocks,
            floors: config.floors_per_block,
            rooms: config.rooms_per_floor,
            grid: config.grid_size,
        }
    }

    pub fn seats_per_room(&self) -> usize {
        self.grid * self.grid
    }

    pub fn total_rooms(&self) -> usize {
        self.blocks * self.floors * self.rooms
    }

    pub fn total_seats(&self) -> usize {
        self.total_rooms() * self.seats_per_room()
    }

    pub fn contains(&self, seat: SeatAddress) -> bool {
        seat.block < self.blocks
            && seat.floor < self.floors
            && seat.room < self.rooms
            && seat.row < self.grid
            && seat.col < self.grid
    }

    /// Position of a room in the global room sequence.
    pub fn room_index(&self, room: RoomAddress) -> usize {
        (room.block * self.floors + room.floor) * self.rooms + room.room
    }

    pub fn room_at(&self, index: usize) -> RoomAddress {
        RoomAddress::new(
            index / (self.floors * self.rooms),
            (index / self.rooms) % self.floors,
            index % self.rooms,
        )
    }

    /// Every room in traversal order.
    pub fn rooms(&self) -> impl Iterator<Item = RoomAddress> + '_ {
        (0..self.total_rooms()).map(move |i| self.room_at(i))
    }

    /// Position of a seat on the global traversal.
    pub fn ordinal(&self, seat: SeatAddress) -> usize {
        self.room_index(seat.room_address()) * self.seats_per_room() + seat.col * self.grid + seat.row
    }

    pub fn address_at(&self, ordinal: usize) -> SeatAddress {
        let per_room = self.seats_per_room();
        let within = ordinal % per_room;
        self.room_at(ordinal / per_room)
            .seat(within % self.grid, within / self.grid)
    }

    /// Every seat in traversal order.
    pub fn traversal(&self) -> impl Iterator<Item = SeatAddress> + '_ {
        self.ordinals(0..self.total_seats())
    }

    pub fn ordinals(&self, range: Range<usize>) -> impl Iterator<Item = SeatAddress> + '_ {
        range.map(move |i| self.address_at(i))
    }

    pub fn room_range(&self, room: RoomAddress) -> Range<usize> {
        let start = self.room_index(room) * self.seats_per_room();
        start..start + self.seats_per_room()
    }

    pub fn floor_range(&self, block: usize, floor: usize) -> Range<usize> {
        let span = self.rooms * self.seats_per_room();
        let start = (block * self.floors + floor) * span;
        start..start + span
    }

    pub fn block_range(&self, block: usize) -> Range<usize> {
        let span = self.floors * self.rooms * self.seats_per_room();
        let start = block * span;
        start..start + span
    }
}

// ── Construction & wiring ───────────────────────────────────────────────

/// Build the containment tree, then run the wiring pass.
pub(crate) fn build(layout: &Layout) -> Vec<Block> {
    let mut blocks: Vec<Block> = (0..layout.blocks)
        .map(|b| Block {
            id: block_letter(b),
            floors: (0..layout.floors)
                .map(|f| Floor {
                    number: f as u32 + 1,
                    rooms: (0..layout.rooms)
                        .map(|r| Room::new(RoomAddress::new(b, f, r), layout.grid))
                        .collect(),
                })
                .collect(),
        })
        .collect();

    connect_vertically(&mut blocks, layout);
    connect_cross_block(&mut blocks, layout);
    connect_room_continuity(&mut blocks, layout);
    blocks
}

pub(crate) fn room_ref(blocks: &[Block], room: RoomAddress) -> &Room {
    &blocks[room.block].floors[room.floor].rooms[room.room]
}

pub(crate) fn room_mut(blocks: &mut [Block], room: RoomAddress) -> &mut Room {
    &mut blocks[room.block].floors[room.floor].rooms[room.room]
}

fn seat_mut(blocks: &mut [Block], seat: SeatAddress) -> &mut Seat {
    let room = room_mut(blocks, seat.room_address());
    let grid = room.grid_size;
    &mut room.seats[seat.row * grid + seat.col]
}

fn link(blocks: &mut [Block], from: SeatAddress, dir: Direction, to: SeatAddress) {
    seat_mut(blocks, from).neighbors.set(dir, to);
    seat_mut(blocks, to).neighbors.set(dir.opposite(), from);
}

/// `up`/`down` between identical positions of same-index rooms on adjacent floors.
fn connect_vertically(blocks: &mut [Block], layout: &Layout) {
    for b in 0..layout.blocks {
        for f in 1..layout.floors {
            for r in 0..layout.rooms {
                let below = RoomAddress::new(b, f - 1, r);
                let above = RoomAddress::new(b, f, r);
                for row in 0..layout.grid {
                    for col in 0..layout.grid {
                        link(blocks, below.seat(row, col), Direction::Up, above.seat(row, col));
                    }
                }
            }
        }
    }
}

/// `right_building`/`left_building` between same-position rooms of adjacent blocks.
fn connect_cross_block(blocks: &mut [Block], layout: &Layout) {
    let last = layout.grid - 1;
    for b in 1..layout.blocks {
        for f in 0..layout.floors {
            for r in 0..layout.rooms {
                let west = RoomAddress::new(b - 1, f, r);
                let east = RoomAddress::new(b, f, r);
                for row in 0..layout.grid {
                    link(blocks, west.seat(row, last), Direction::RightBuilding, east.seat(row, 0));
                }
            }
        }
    }
}

/// Chain every room to the next one in traversal order via plain
/// `right`/`left`: along a floor, from a floor's last room to the next
/// floor's first, and from a block's top floor to the next block's bottom floor.
fn connect_room_continuity(blocks: &mut [Block], layout: &Layout) {
    let last = layout.grid - 1;
    for i in 1..layout.total_rooms() {
        let prev = layout.room_at(i - 1);
        let next = layout.room_at(i);
        for row in 0..layout.grid {
            link(blocks, prev.seat(row, last), Direction::Right, next.seat(row, 0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(blocks: usize, floors: usize, rooms: usize, grid: usize) -> Layout {
        Layout::of(&TopologyConfig::new(blocks, floors, rooms, grid))
    }

    fn seat<'a>(blocks: &'a [Block], addr: SeatAddress) -> &'a Seat {
        room_ref(blocks, addr.room_address())
            .seat(addr.row, addr.col)
            .unwrap()
    }

    #[test]
    fn test_ordinal_roundtrip() {
        let l = layout(2, 3, 4, 3);
        for ordinal in 0..l.total_seats() {
            assert_eq!(l.ordinal(l.address_at(ordinal)), ordinal);
        }
    }

    #[test]
    fn test_traversal_is_column_major_within_room() {
        let l = layout(1, 1, 2, 2);
        let order: Vec<(usize, usize, usize)> = l.traversal().map(|s| (s.room, s.row, s.col)).collect();
        assert_eq!(
            order,
            vec![
                (0, 0, 0),
                (0, 1, 0),
                (0, 0, 1),
                (0, 1, 1),
                (1, 0, 0),
                (1, 1, 0),
                (1, 0, 1),
                (1, 1, 1),
            ]
        );
    }

    #[test]
    fn test_ranges_are_contiguous() {
        let l = layout(2, 2, 3, 2);
        assert_eq!(l.room_range(RoomAddress::new(0, 0, 1)), 4..8);
        assert_eq!(l.floor_range(0, 1), 12..24);
        assert_eq!(l.block_range(1), 24..48);
    }

    #[test]
    fn test_intra_room_links() {
        let l = layout(1, 1, 1, 3);
        let blocks = build(&l);
        let room = RoomAddress::new(0, 0, 0);
        let middle = seat(&blocks, room.seat(1, 1));
        assert_eq!(middle.neighbor(Direction::Front), Some(room.seat(0, 1)));
        assert_eq!(middle.neighbor(Direction::Back), Some(room.seat(2, 1)));
        assert_eq!(middle.neighbor(Direction::Left), Some(room.seat(1, 0)));
        assert_eq!(middle.neighbor(Direction::Right), Some(room.seat(1, 2)));
        let corner = seat(&blocks, room.seat(0, 0));
        assert_eq!(corner.neighbor(Direction::Front), None);
        assert_eq!(corner.neighbor(Direction::Left), None);
    }

    #[test]
    fn test_vertical_links() {
        let l = layout(1, 3, 2, 2);
        let blocks = build(&l);
        let ground = RoomAddress::new(0, 0, 1).seat(1, 0);
        let first = RoomAddress::new(0, 1, 1).seat(1, 0);
        assert_eq!(seat(&blocks, ground).neighbor(Direction::Up), Some(first));
        assert_eq!(seat(&blocks, first).neighbor(Direction::Down), Some(ground));
        assert_eq!(seat(&blocks, ground).neighbor(Direction::Down), None);
        let top = RoomAddress::new(0, 2, 1).seat(1, 0);
        assert_eq!(seat(&blocks, top).neighbor(Direction::Up), None);
    }

    #[test]
    fn test_cross_block_links() {
        let l = layout(3, 2, 2, 2);
        let blocks = build(&l);
        let west = RoomAddress::new(1, 1, 0).seat(0, 1);
        let east = RoomAddress::new(2, 1, 0).seat(0, 0);
        assert_eq!(seat(&blocks, west).neighbor(Direction::RightBuilding), Some(east));
        assert_eq!(seat(&blocks, east).neighbor(Direction::LeftBuilding), Some(west));
        let first_block = RoomAddress::new(0, 0, 0).seat(0, 0);
        assert_eq!(seat(&blocks, first_block).neighbor(Direction::LeftBuilding), None);
    }

    #[test]
    fn test_right_chain_visits_every_room_in_order() {
        let l = layout(2, 2, 3, 2);
        let blocks = build(&l);
        for row in 0..l.grid {
            let mut current = Some(RoomAddress::new(0, 0, 0).seat(row, 0));
            let mut rooms_seen = Vec::new();
            while let Some(addr) = current {
                if addr.col == 0 {
                    rooms_seen.push(l.room_index(addr.room_address()));
                }
                assert_eq!(addr.row, row);
                current = seat(&blocks, addr).neighbor(Direction::Right);
            }
            let expected: Vec<usize> = (0..l.total_rooms()).collect();
            assert_eq!(rooms_seen, expected);
        }
    }

    #[test]
    fn test_top_floor_continues_into_next_block() {
        let l = layout(2, 3, 2, 2);
        let blocks = build(&l);
        let top_last = RoomAddress::new(0, 2, 1).seat(1, 1);
        let next_bottom_first = RoomAddress::new(1, 0, 0).seat(1, 0);
        assert_eq!(seat(&blocks, top_last).neighbor(Direction::Right), Some(next_bottom_first));
        assert_eq!(seat(&blocks, next_bottom_first).neighbor(Direction::Left), Some(top_last));
    }

    #[test]
    fn test_room_counter_tracks_place_and_take() {
        let mut room = Room::new(RoomAddress::new(0, 0, 0), 2);
        assert_eq!(room.min_occupancy(), 2);
        assert!(room.place(0, 0, Student::new(1, 22, "Math")).is_none());
        assert_eq!(room.occupied(), 1);
        let previous = room.place(0, 0, Student::new(2, 22, "Math"));
        assert_eq!(previous.map(|s| s.roll_number()), Some(1));
        assert_eq!(room.occupied(), 1);
        assert!(room.take(1, 1).is_none());
        assert_eq!(room.occupied(), 1);
        assert!(room.take(0, 0).is_some());
        assert_eq!(room.occupied(), 0);
    }
}
