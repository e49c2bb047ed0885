//! Per-level obstacle layouts
//!
//! Rocks are scattered first, then (from `WALLS_FROM_LEVEL` on) a few straight
//! brick walls. Every placement is a bounded retry: when it runs out of
//! attempts the rock or wall is simply left out, so a crowded board gets a
//! sparser layout instead of an error.

use std::collections::HashSet;

use glam::IVec2;
use rand::Rng;

use super::grid::{self, Position};
use super::state::{Obstacle, ObstacleKind};
use crate::consts::*;

/// Cells that can no longer take an obstacle
struct Reservations {
    taken: HashSet<Position>,
}

impl Reservations {
    fn new(seed_snake: &[Position]) -> Self {
        Self {
            taken: seed_snake.iter().copied().collect(),
        }
    }

    fn is_reserved(&self, pos: Position) -> bool {
        self.taken.contains(&pos) || grid::in_keep_out(pos)
    }

    fn reserve(&mut self, pos: Position) {
        self.taken.insert(pos);
    }
}

/// Rocks for a level: 1.2 per level, capped
pub fn rock_count(level: u32) -> u32 {
    (level.saturating_mul(6) / 5).min(MAX_ROCKS)
}

/// Build the obstacle set for `level`.
///
/// `seed_snake` cells are kept free, as is the central keep-out square.
/// `next_id` hands out obstacle IDs.
pub fn generate_obstacles(
    level: u32,
    seed_snake: &[Position],
    rng: &mut impl Rng,
    next_id: &mut impl FnMut() -> u32,
) -> Vec<Obstacle> {
    let mut reserved = Reservations::new(seed_snake);
    let mut obstacles = Vec::new();

    let rocks = rock_count(level);
    let mut dropped_rocks = 0;
    for _ in 0..rocks {
        match place_rock(&reserved, rng) {
            Some(pos) => {
                reserved.reserve(pos);
                obstacles.push(Obstacle::solid(next_id(), pos, ObstacleKind::Rock));
            }
            None => dropped_rocks += 1,
        }
    }
    if dropped_rocks > 0 {
        log::debug!("Level {}: dropped {} of {} rocks", level, dropped_rocks, rocks);
    }

    if level >= WALLS_FROM_LEVEL {
        let walls = rng.random_range(1..=3);
        for _ in 0..walls {
            let length = rng.random_range(3..=5);
            let vertical = rng.random_bool(0.5);
            match place_wall(&reserved, length, vertical, rng) {
                Some(cells) => {
                    for pos in cells {
                        reserved.reserve(pos);
                        obstacles.push(Obstacle::solid(next_id(), pos, ObstacleKind::Brick));
                    }
                }
                None => log::debug!("Level {}: dropped a wall of length {}", level, length),
            }
        }
    }

    obstacles
}

/// Sample a free cell for one rock
fn place_rock(reserved: &Reservations, rng: &mut impl Rng) -> Option<Position> {
    (0..PLACEMENT_ATTEMPTS)
        .map(|_| grid::random_cell(rng))
        .find(|&pos| !reserved.is_reserved(pos))
}

/// Sample an anchor whose whole run of `length` cells is free and on the board
fn place_wall(
    reserved: &Reservations,
    length: i32,
    vertical: bool,
    rng: &mut impl Rng,
) -> Option<Vec<Position>> {
    let step = if vertical { IVec2::Y } else { IVec2::X };
    (0..PLACEMENT_ATTEMPTS).find_map(|_| {
        let anchor = grid::random_cell(rng);
        let cells: Vec<Position> = (0..length).map(|i| anchor + step * i).collect();
        cells
            .iter()
            .all(|&pos| grid::in_bounds(pos) && !reserved.is_reserved(pos))
            .then_some(cells)
    })
}
