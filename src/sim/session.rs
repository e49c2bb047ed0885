//! One play session: tick scheduling, pause, level transitions, game over
//!
//! The host calls `update` with the current clock time as often as it likes
//! (every animation frame). At most one tick runs per call, and only when the
//! tick interval for the current level has elapsed. Deferred work (the pause
//! between levels, the eating flash) lives in a cancellable timer set, so
//! ending a session guarantees nothing fires afterwards.

use serde::{Deserialize, Serialize};

use super::grid::{self, Direction, Position};
use super::state::{GameEvent, GamePhase, GameState, Obstacle};
use super::tick::{TickOutcome, tick};
use super::timer::{TimerId, Timers};
use crate::consts::*;
use crate::{level_palette_index, tick_interval_ms};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    FinishLevelTransition,
    EndEatingFlash,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Head first
    pub snake: Vec<Position>,
    pub food: Position,
    pub obstacles: Vec<Obstacle>,
    pub eating: bool,
    pub score: u64,
    pub level: u32,
    pub phase: GamePhase,
    /// Background tint index for the level
    pub palette: u32,
}

pub struct Session {
    state: GameState,
    phase: GamePhase,
    timers: Timers<Deferred>,
    /// Clock time of the next tick; None while ticks are suspended
    next_tick_at: Option<u64>,
    eating_timer: Option<TimerId>,
    ended: bool,
}

impl Session {
    /// Start playing `initial_level` at clock time `now_ms`
    pub fn new(initial_level: u32, seed: u64, now_ms: u64) -> Self {
        let state = GameState::new(seed, initial_level);
        log::info!("Session started at level {} (seed {})", state.level, seed);
        Self::from_state(state, now_ms)
    }

    /// Resume from a prepared state; the first tick is one interval away
    pub fn from_state(state: GameState, now_ms: u64) -> Self {
        let next_tick_at = Some(now_ms + tick_interval_ms(state.level));
        Self {
            state,
            phase: GamePhase::Playing,
            timers: Timers::new(),
            next_tick_at,
            eating_timer: None,
            ended: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Deferred actions still outstanding
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Change heading; read by the next tick. Ignored between levels and after game over.
    pub fn steer(&mut self, direction: Direction) -> bool {
        match self.phase {
            GamePhase::Playing | GamePhase::Paused if !self.ended => self.state.steer(direction),
            _ => false,
        }
    }

    /// Playing -> Paused. Fully suspends the tick schedule.
    pub fn pause(&mut self) -> bool {
        if self.ended || self.phase != GamePhase::Playing {
            return false;
        }
        self.phase = GamePhase::Paused;
        self.next_tick_at = None;
        self.state.events.push(GameEvent::Paused);
        true
    }

    /// Paused -> Playing. The next tick is a full interval from now.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        if self.ended || self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = GamePhase::Playing;
        self.next_tick_at = Some(now_ms + tick_interval_ms(self.state.level));
        self.state.events.push(GameEvent::Resumed);
        true
    }

    /// Escape key / pause button. Does nothing between levels or after game over.
    pub fn toggle_pause(&mut self, now_ms: u64) -> bool {
        match self.phase {
            GamePhase::Playing => self.pause(),
            GamePhase::Paused => self.resume(now_ms),
            GamePhase::LevelTransition | GamePhase::GameOver => false,
        }
    }

    /// Fire due timers, then run a tick if one is due
    pub fn update(&mut self, now_ms: u64) {
        if self.ended {
            return;
        }

        for deferred in self.timers.poll(now_ms) {
            match deferred {
                Deferred::FinishLevelTransition => self.finish_level_transition(now_ms),
                Deferred::EndEatingFlash => {
                    self.state.eating = false;
                    self.eating_timer = None;
                }
            }
        }

        if self.phase != GamePhase::Playing {
            return;
        }
        let Some(due) = self.next_tick_at else {
            self.next_tick_at = Some(now_ms + tick_interval_ms(self.state.level));
            return;
        };
        if now_ms < due {
            return;
        }

        let score_before = self.state.score;
        let outcome = tick(&mut self.state, now_ms);
        if self.state.score > score_before {
            self.start_eating_flash(now_ms);
        }

        match outcome {
            TickOutcome::Continue => {
                // Fixed rate, but never queue up missed ticks
                let interval = tick_interval_ms(self.state.level);
                let next = due + interval;
                self.next_tick_at = Some(if next <= now_ms { now_ms + interval } else { next });
                self.state.events.push(GameEvent::Frame);
            }
            TickOutcome::LevelUp { level } => self.begin_level_transition(level, now_ms),
            TickOutcome::Collision { score, level, .. } => {
                self.phase = GamePhase::GameOver;
                self.next_tick_at = None;
                self.timers.cancel_all();
                self.eating_timer = None;
                self.state.events.push(GameEvent::GameOver { score, level });
            }
        }
    }

    /// Cancel everything outstanding; later `update` calls are no-ops
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        let cancelled = self.timers.cancel_all();
        self.eating_timer = None;
        self.next_tick_at = None;
        self.ended = true;
        log::info!(
            "Session ended at level {} with score {} ({} deferred actions cancelled)",
            self.state.level,
            self.state.score,
            cancelled
        );
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            snake: self.state.snake.iter().copied().collect(),
            food: self.state.food,
            obstacles: self.state.obstacles.clone(),
            eating: self.state.eating,
            score: self.state.score,
            level: self.state.level,
            phase: self.phase,
            palette: level_palette_index(self.state.level),
        }
    }

    fn start_eating_flash(&mut self, now_ms: u64) {
        if let Some(id) = self.eating_timer.take() {
            self.timers.cancel(id);
        }
        self.state.eating = true;
        self.eating_timer = Some(
            self.timers.schedule(now_ms + EATING_FLASH_MS, Deferred::EndEatingFlash),
        );
    }

    fn begin_level_transition(&mut self, level: u32, now_ms: u64) {
        log::info!("Level {} reached (score {})", level, self.state.score);
        self.state.level = level;
        self.state.regenerate_obstacles(level, &[grid::spawn_position()]);
        self.phase = GamePhase::LevelTransition;
        self.next_tick_at = None;
        self.timers.schedule(now_ms + LEVEL_TRANSITION_MS, Deferred::FinishLevelTransition);
        self.state.events.push(GameEvent::LevelUp { level });
        self.state.events.push(GameEvent::Frame);
    }

    fn finish_level_transition(&mut self, now_ms: u64) {
        self.state.reset_snake();
        self.state.spawn_food();
        self.phase = GamePhase::Playing;
        self.next_tick_at = Some(now_ms + tick_interval_ms(self.state.level));
        self.state.events.push(GameEvent::LevelStarted {
            level: self.state.level,
        });
        self.state.events.push(GameEvent::Frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::in_keep_out;
    use crate::sim::layout::rock_count;
    use crate::sim::state::ObstacleKind;
    use glam::IVec2;
    use std::collections::VecDeque;

    /// Session on an empty board with the food out of the way
    fn session_at(now_ms: u64) -> Session {
        let mut state = GameState::empty(99, 1);
        state.food = IVec2::new(0, 23);
        Session::from_state(state, now_ms)
    }

    /// Snake that has grown four times, about to eat its fifth nut
    fn session_before_level_up() -> Session {
        session_before_level_up_at(1)
    }

    fn session_before_level_up_at(level: u32) -> Session {
        let mut state = GameState::empty(99, level);
        state.snake = (0..5).map(|i| IVec2::new(12, 12 + i)).collect();
        state.food = IVec2::new(12, 11);
        state.score = 40;
        Session::from_state(state, 0)
    }

    #[test]
    fn test_ticks_follow_level_interval() {
        let mut session = session_at(0);
        session.update(149);
        assert_eq!(session.state().head(), IVec2::new(12, 12));
        session.update(150);
        assert_eq!(session.state().head(), IVec2::new(12, 11));
        session.update(299);
        assert_eq!(session.state().head(), IVec2::new(12, 11));
        session.update(300);
        assert_eq!(session.state().head(), IVec2::new(12, 10));
        assert_eq!(session.drain_events(), vec![GameEvent::Frame, GameEvent::Frame]);
    }

    #[test]
    fn test_one_tick_per_update_without_catch_up() {
        let mut session = session_at(0);
        session.update(150);
        // Host stalled for a second
        session.update(1150);
        assert_eq!(session.state().head(), IVec2::new(12, 10));
        session.update(1200);
        assert_eq!(session.state().head(), IVec2::new(12, 10));
        session.update(1300);
        assert_eq!(session.state().head(), IVec2::new(12, 9));
    }

    #[test]
    fn test_pause_suspends_ticks() {
        let mut session = session_at(0);
        assert!(session.toggle_pause(100));
        assert_eq!(session.phase(), GamePhase::Paused);
        session.update(10_000);
        assert_eq!(session.state().head(), IVec2::new(12, 12));

        assert!(session.toggle_pause(10_000));
        assert_eq!(session.phase(), GamePhase::Playing);
        session.update(10_149);
        assert_eq!(session.state().head(), IVec2::new(12, 12));
        session.update(10_150);
        assert_eq!(session.state().head(), IVec2::new(12, 11));

        let events = session.drain_events();
        assert_eq!(&events[..2], &[GameEvent::Paused, GameEvent::Resumed]);
    }

    #[test]
    fn test_reversal_rejected() {
        let mut session = session_at(0);
        assert!(session.steer(Direction::Right));
        assert!(!session.steer(Direction::Left));
        assert_eq!(session.state().direction, Direction::Right);
    }

    #[test]
    fn test_collision_ends_game() {
        let mut state = GameState::empty(1, 3);
        state.snake = VecDeque::from([IVec2::new(0, 4)]);
        state.direction = Direction::Left;
        state.score = 70;
        state.food = IVec2::new(20, 20);
        let mut session = Session::from_state(state, 0);

        session.update(tick_interval_ms(3));
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(
            session.drain_events(),
            vec![GameEvent::GameOver { score: 70, level: 3 }]
        );

        // Terminal
        assert!(!session.toggle_pause(1000));
        assert!(!session.steer(Direction::Up));
        session.update(10_000);
        assert!(session.drain_events().is_empty());
    }

    fn rocks(session: &Session) -> u32 {
        session
            .state()
            .obstacles
            .iter()
            .filter(|o| o.kind == ObstacleKind::Rock)
            .count() as u32
    }

    #[test]
    fn test_level_up_lays_out_next_level() {
        for level in 1..=11 {
            let mut session = session_before_level_up_at(level);
            session.update(tick_interval_ms(level));
            assert_eq!(session.level(), level + 1);
            assert_eq!(rocks(&session), rock_count(level + 1), "level {}", level + 1);
            let walls = session
                .state()
                .obstacles
                .iter()
                .any(|o| o.kind == ObstacleKind::Brick);
            assert_eq!(walls, level + 1 >= WALLS_FROM_LEVEL, "level {}", level + 1);
        }
    }

    #[test]
    fn test_level_up_transition() {
        let mut session = session_before_level_up();
        session.update(150);

        assert_eq!(session.phase(), GamePhase::LevelTransition);
        assert_eq!(session.level(), 2);
        assert_eq!(session.score(), 50);
        assert_eq!(
            session.drain_events(),
            vec![
                GameEvent::Ate,
                GameEvent::LevelUp { level: 2 },
                GameEvent::Frame
            ]
        );
        for obstacle in &session.state().obstacles {
            assert!(!in_keep_out(obstacle.position));
            assert_ne!(obstacle.position, grid::spawn_position());
        }
        assert_eq!(rocks(&session), rock_count(2));

        // No pausing or ticking while the popup is up
        assert!(!session.toggle_pause(1000));
        session.update(150 + LEVEL_TRANSITION_MS - 1);
        assert_eq!(session.phase(), GamePhase::LevelTransition);
        assert_eq!(session.state().snake.len(), 6);

        session.update(150 + LEVEL_TRANSITION_MS);
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(
            session.state().snake,
            VecDeque::from([grid::spawn_position()])
        );
        assert_eq!(session.state().direction, Direction::Up);
        assert!(!session.state().is_occupied(session.state().food));
        assert_eq!(session.score(), 50);
        let events = session.drain_events();
        assert!(events.contains(&GameEvent::LevelStarted { level: 2 }));

        // Level 2 ticks faster
        let start = 150 + LEVEL_TRANSITION_MS;
        session.update(start + tick_interval_ms(2));
        assert_eq!(session.state().head(), IVec2::new(12, 11));
    }

    #[test]
    fn test_end_cancels_pending_transition() {
        let mut session = session_before_level_up();
        session.update(150);
        assert_eq!(session.phase(), GamePhase::LevelTransition);
        assert!(session.pending_timers() > 0);

        session.end();
        assert_eq!(session.pending_timers(), 0);
        session.drain_events();

        session.update(150 + LEVEL_TRANSITION_MS * 2);
        assert_eq!(session.phase(), GamePhase::LevelTransition);
        assert_eq!(session.state().snake.len(), 6);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_eating_flash() {
        let mut state = GameState::empty(5, 1);
        state.food = IVec2::new(12, 11);
        let mut session = Session::from_state(state, 0);

        session.update(150);
        assert!(session.snapshot().eating);
        // Timers keep running while paused; no further ticks can eat again
        assert!(session.pause());
        session.update(150 + EATING_FLASH_MS - 1);
        assert!(session.snapshot().eating);
        session.update(150 + EATING_FLASH_MS);
        assert!(!session.snapshot().eating);
    }

    #[test]
    fn test_snapshot_mirrors_state() {
        let session = Session::new(7, 2024, 0);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.level, 7);
        assert_eq!(snapshot.palette, 5);
        assert_eq!(snapshot.snake, vec![grid::spawn_position()]);
        assert_eq!(snapshot.obstacles.len(), session.state().obstacles.len());
        assert_eq!(snapshot.phase, GamePhase::Playing);
    }
}
