use serde::Serialize;

pub mod agent;
pub mod map;
pub mod room;
pub mod strategy;

/// A cell coordinate inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    /// Where every robot starts.
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    /// The same coordinate in the signed space strategies plan in.
    #[inline]
    pub fn signed(self) -> (isize, isize) {
        (self.x as isize, self.y as isize)
    }
}
