//! Game state and core simulation types

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{self, Direction, Position};
use super::layout::generate_obstacles;

/// Phase of a play session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ticks are running
    Playing,
    /// Player paused; tick schedule is suspended
    Paused,
    /// Between levels; layout is regenerated and the snake waits for the reset
    LevelTransition,
    /// Run ended on a collision
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleState {
    Solid,
    /// Passable and about to disappear
    Deteriorating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Rock,
    /// One cell of a straight wall
    Brick,
}

/// A single-cell obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub position: Position,
    pub state: ObstacleState,
    pub kind: ObstacleKind,
    /// Clock time (ms) the obstacle started deteriorating
    #[serde(default)]
    pub deteriorated_at: Option<u64>,
}

impl Obstacle {
    pub fn solid(id: u32, position: Position, kind: ObstacleKind) -> Self {
        Self {
            id,
            position,
            state: ObstacleState::Solid,
            kind,
            deteriorated_at: None,
        }
    }

    #[inline]
    pub fn is_solid(&self) -> bool {
        self.state == ObstacleState::Solid
    }

    /// Start crumbling at `now_ms`. Returns false if it already was.
    pub fn deteriorate(&mut self, now_ms: u64) -> bool {
        if self.state == ObstacleState::Deteriorating {
            return false;
        }
        self.state = ObstacleState::Deteriorating;
        self.deteriorated_at = Some(now_ms);
        true
    }

    /// Has the deterioration window run out?
    pub fn is_expired(&self, now_ms: u64, window_ms: u64) -> bool {
        match (self.state, self.deteriorated_at) {
            (ObstacleState::Deteriorating, Some(at)) => now_ms.saturating_sub(at) >= window_ms,
            // Deteriorating without a stamp never happens through `deteriorate`
            (ObstacleState::Deteriorating, None) => true,
            (ObstacleState::Solid, _) => false,
        }
    }
}

/// Something the host should react to (sound, persistence, screen flow, redraw)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A nut was eaten
    Ate,
    /// One or more rocks started crumbling this tick
    RockCrumbled,
    /// Level threshold reached; `level` is the new level
    LevelUp { level: u32 },
    /// Transition finished, snake is back at the spawn cell
    LevelStarted { level: u32 },
    Paused,
    Resumed,
    /// Collision; score and level from before the fatal move
    GameOver { score: u64, level: u32 },
    /// A tick (or level reset) was committed and should be drawn
    Frame,
}

/// Complete per-session simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    rng: Pcg32,
    /// Current level (1-based)
    pub level: u32,
    pub score: u64,
    /// Head first
    pub snake: VecDeque<Position>,
    /// Heading used by the next tick
    pub direction: Direction,
    pub food: Position,
    pub obstacles: Vec<Obstacle>,
    /// A nut was eaten recently (render hint)
    pub eating: bool,
    /// Pending events, drained by the host
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Fresh state for `level`: snake at the spawn cell, new layout, new food
    pub fn new(seed: u64, level: u32) -> Self {
        let level = level.max(1);
        let mut state = Self::empty(seed, level);
        state.regenerate_obstacles(level, &[grid::spawn_position()]);
        state.spawn_food();
        state
    }

    /// State with no obstacles and the food at the spawn cell; callers fill it in
    pub fn empty(seed: u64, level: u32) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            level: level.max(1),
            score: 0,
            snake: VecDeque::from([grid::spawn_position()]),
            direction: Direction::Up,
            food: grid::spawn_position(),
            obstacles: Vec::new(),
            eating: false,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    #[inline]
    pub fn head(&self) -> Position {
        // Snake is never empty
        self.snake.front().copied().unwrap_or_else(grid::spawn_position)
    }

    /// Change heading. Only turns onto the other axis are accepted, checked
    /// against the pending heading, so the last accepted write wins.
    pub fn steer(&mut self, direction: Direction) -> bool {
        if self.direction.is_perpendicular(direction) {
            self.direction = direction;
            true
        } else {
            false
        }
    }

    /// Cell is covered by the snake or any obstacle
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.snake.contains(&pos) || self.obstacles.iter().any(|o| o.position == pos)
    }

    /// Move the food to a uniformly chosen free cell.
    /// Returns false (food unchanged) when the board is full.
    pub fn spawn_food(&mut self) -> bool {
        let free: Vec<Position> = grid::all_cells().filter(|&c| !self.is_occupied(c)).collect();
        if free.is_empty() {
            log::warn!("No free cell left for food");
            return false;
        }
        let index = self.rng.random_range(0..free.len());
        self.food = free[index];
        true
    }

    /// Replace all obstacles with a fresh layout for `level`
    pub fn regenerate_obstacles(&mut self, level: u32, seed_snake: &[Position]) {
        let mut next_id = self.next_id;
        let obstacles = generate_obstacles(level, seed_snake, &mut self.rng, &mut || {
            let id = next_id;
            next_id += 1;
            id
        });
        self.next_id = next_id;
        log::info!(
            "Level {} layout: {} rocks, {} bricks",
            level,
            obstacles.iter().filter(|o| o.kind == ObstacleKind::Rock).count(),
            obstacles.iter().filter(|o| o.kind == ObstacleKind::Brick).count()
        );
        self.obstacles = obstacles;
    }

    /// Put a single-segment snake back on the spawn cell, heading up
    pub fn reset_snake(&mut self) {
        self.snake.clear();
        self.snake.push_back(grid::spawn_position());
        self.direction = Direction::Up;
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
