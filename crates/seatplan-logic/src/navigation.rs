//! Room-by-room navigation for console front ends.
//!
//! `w`/`s` move one floor up or down, keeping the room number. Past the top
//! floor `w` lands on the top floor of the previous block; below floor 1 `s`
//! lands on floor 1 of the next block. `a`/`d` step to the previous/next
//! room in traversal order, crossing floor and block boundaries. `q` quits.

use serde::{Deserialize, Serialize};

use crate::topology::{Layout, RoomAddress};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavCommand {
    UpFloor,
    DownFloor,
    PrevRoom,
    NextRoom,
    Quit,
}

impl NavCommand {
    /// Parse a single console key (case-insensitive).
    pub fn parse(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' => Some(NavCommand::UpFloor),
            's' => Some(NavCommand::DownFloor),
            'a' => Some(NavCommand::PrevRoom),
            'd' => Some(NavCommand::NextRoom),
            'q' => Some(NavCommand::Quit),
            _ => None,
        }
    }
}

/// The room a console is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub room: RoomAddress,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            room: RoomAddress::new(0, 0, 0),
        }
    }
}

impl Cursor {
    /// Apply a command; returns whether the cursor moved.
    pub fn apply(&mut self, cmd: NavCommand, layout: &Layout) -> bool {
        let before = self.room;
        match cmd {
            NavCommand::UpFloor => {
                if self.room.floor + 1 < layout.floors {
                    self.room.floor += 1;
                } else if self.room.block > 0 {
                    self.room.block -= 1;
                    self.room.floor = layout.floors - 1;
                }
            }
            NavCommand::DownFloor => {
                if self.room.floor > 0 {
                    self.room.floor -= 1;
                } else if self.room.block + 1 < layout.blocks {
                    self.room.block += 1;
                    self.room.floor = 0;
                }
            }
            NavCommand::PrevRoom => {
                let index = layout.room_index(self.room);
                if index > 0 {
                    self.room = layout.room_at(index - 1);
                }
            }
            NavCommand::NextRoom => {
                let index = layout.room_index(self.room);
                if index + 1 < layout.total_rooms() {
                    self.room = layout.room_at(index + 1);
                }
            }
            NavCommand::Quit => {}
        }
        self.room != before
    }
}
