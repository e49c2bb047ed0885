//! Grid geometry
//!
//! Cells are integer coordinates on a square board with the origin at the
//! top-left corner; `y` grows downwards.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// A cell on the board
pub type Position = IVec2;

/// Snake heading. Only the four unit vectors exist, so diagonals can't happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step for this heading
    #[inline]
    pub fn vector(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// True if turning from `self` to `other` changes the axis of travel
    #[inline]
    pub fn is_perpendicular(self, other: Direction) -> bool {
        self.is_horizontal() != other.is_horizontal()
    }
}

/// Where every level starts the snake
#[inline]
pub fn spawn_position() -> Position {
    IVec2::new(SPAWN_X, SPAWN_Y)
}

/// Is the cell on the board?
#[inline]
pub fn in_bounds(pos: Position) -> bool {
    pos.x >= 0 && pos.x < GRID_SIZE && pos.y >= 0 && pos.y < GRID_SIZE
}

/// Central square kept clear of obstacles so a fresh level is survivable
#[inline]
pub fn in_keep_out(pos: Position) -> bool {
    let centre = GRID_SIZE / 2;
    (pos.x - centre).abs() < KEEP_OUT_HALF_WIDTH && (pos.y - centre).abs() < KEEP_OUT_HALF_WIDTH
}

/// Euclidean distance between two cells
#[inline]
pub fn distance(a: Position, b: Position) -> f32 {
    (a - b).as_vec2().length()
}

/// Uniformly random cell anywhere on the board
pub fn random_cell(rng: &mut impl Rng) -> Position {
    IVec2::new(rng.random_range(0..GRID_SIZE), rng.random_range(0..GRID_SIZE))
}

/// Every cell on the board, row by row
pub fn all_cells() -> impl Iterator<Item = Position> {
    (0..GRID_SIZE).flat_map(|y| (0..GRID_SIZE).map(move |x| IVec2::new(x, y)))
}
