//! Coordinate types for tile and pixel positions.
//!
//! Tile rows grow upward: `y = 0` is the bottom of the world and the cell
//! "above" `(x, y)` is `(x, y + 1)`.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Position of a single tile in the world grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Pod, Zeroable,
)]
#[repr(C)]
pub struct TilePos {
    /// Column
    pub x: i32,
    /// Row (0 = bottom)
    pub y: i32,
}

impl TilePos {
    /// Creates a new tile position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring tile in the given direction.
    #[must_use]
    pub const fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Returns the four axis neighbours in [`Direction::ALL`] order.
    #[must_use]
    pub const fn neighbors(self) -> [Self; 4] {
        [
            self.step(Direction::Right),
            self.step(Direction::Up),
            self.step(Direction::Left),
            self.step(Direction::Down),
        ]
    }

    /// Manhattan distance to another tile.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Converts to the pixel position of the tile's lower-left corner.
    #[must_use]
    pub fn to_pixel(self, block_size: u32) -> PixelPos {
        PixelPos {
            x: self.x as f32 * block_size as f32,
            y: self.y as f32 * block_size as f32,
        }
    }
}

/// Position in pixel space (one tile spans `block_size` pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPos {
    /// X coordinate in pixels
    pub x: f32,
    /// Y coordinate in pixels
    pub y: f32,
}

impl PixelPos {
    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Converts to the tile containing this pixel.
    #[must_use]
    pub fn to_tile(self, block_size: u32) -> TilePos {
        let size = block_size as f32;
        TilePos {
            x: (self.x / size).floor() as i32,
            y: (self.y / size).floor() as i32,
        }
    }
}

/// One of the four axis directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// +x
    Right,
    /// +y
    Up,
    /// -x
    Left,
    /// -y
    Down,
}

impl Direction {
    /// All directions, in flood-fill visiting order.
    pub const ALL: [Self; 4] = [Self::Right, Self::Up, Self::Left, Self::Down];

    /// Unit offset of this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Right => (1, 0),
            Self::Up => (0, 1),
            Self::Left => (-1, 0),
            Self::Down => (0, -1),
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Left => Self::Right,
            Self::Down => Self::Up,
        }
    }
}
