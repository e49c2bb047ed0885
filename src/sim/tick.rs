//! Fixed timestep simulation tick
//!
//! One call advances the snake by one cell. The scheduler (see `session`)
//! decides when; this module only decides what happens.

use super::grid::{self, Position};
use super::state::{GameEvent, GameState, ObstacleKind};
use crate::consts::*;

/// What killed the snake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    Wall,
    Body,
    Obstacle,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Move committed, keep going
    Continue,
    /// Game over. Score and level are from before the move; the state is untouched.
    Collision {
        kind: CollisionKind,
        score: u64,
        level: u32,
    },
    /// The nut just eaten completed the level; `level` is the next one.
    /// The grown snake is committed, rocks are not updated.
    LevelUp { level: u32 },
}

/// First collision for moving the head onto `pos`, checked wall, body, obstacle
pub fn collision_at(state: &GameState, pos: Position) -> Option<CollisionKind> {
    if !grid::in_bounds(pos) {
        return Some(CollisionKind::Wall);
    }
    if state.snake.contains(&pos) {
        return Some(CollisionKind::Body);
    }
    if state.obstacles.iter().any(|o| o.is_solid() && o.position == pos) {
        return Some(CollisionKind::Obstacle);
    }
    None
}

/// Advance the game state by one step
pub fn tick(state: &mut GameState, now_ms: u64) -> TickOutcome {
    let head = state.head() + state.direction.vector();

    if let Some(kind) = collision_at(state, head) {
        log::info!(
            "Collision ({:?}) at {:?}: score {}, level {}",
            kind,
            head,
            state.score,
            state.level
        );
        return TickOutcome::Collision {
            kind,
            score: state.score,
            level: state.level,
        };
    }

    state.snake.push_front(head);

    if head == state.food {
        state.score += FOOD_SCORE;
        state.events.push(GameEvent::Ate);
        state.spawn_food();

        let grown = state.snake.len() - 1;
        if grown > 0 && grown % LEVEL_UP_EVERY == 0 {
            return TickOutcome::LevelUp {
                level: state.level + 1,
            };
        }
    } else {
        state.snake.pop_back();
    }

    if crumble_rocks(state, head, now_ms) > 0 {
        state.events.push(GameEvent::RockCrumbled);
    }
    expire_obstacles(state, now_ms);

    TickOutcome::Continue
}

/// Solid rocks near `head` start deteriorating. Returns how many did.
fn crumble_rocks(state: &mut GameState, head: Position, now_ms: u64) -> usize {
    state
        .obstacles
        .iter_mut()
        .filter(|o| o.kind == ObstacleKind::Rock && o.is_solid())
        .filter(|o| grid::distance(head, o.position) <= ROCK_DETERIORATION_DISTANCE)
        .map(|o| o.deteriorate(now_ms))
        .filter(|&changed| changed)
        .count()
}

/// Drop obstacles whose deterioration window has passed
fn expire_obstacles(state: &mut GameState, now_ms: u64) {
    state
        .obstacles
        .retain(|o| !o.is_expired(now_ms, DETERIORATION_WINDOW_MS));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Direction;
    use crate::sim::state::{Obstacle, ObstacleState};
    use glam::IVec2;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    /// Empty board, snake at the spawn cell heading up, food far away
    fn open_board() -> GameState {
        let mut state = GameState::empty(12345, 1);
        state.food = IVec2::new(0, 23);
        state
    }

    #[test]
    fn test_moves_one_cell_without_growing() {
        let mut state = open_board();
        state.snake = VecDeque::from([IVec2::new(5, 5), IVec2::new(5, 6), IVec2::new(5, 7)]);
        state.direction = Direction::Right;

        assert_eq!(tick(&mut state, 0), TickOutcome::Continue);
        assert_eq!(
            state.snake,
            VecDeque::from([IVec2::new(6, 5), IVec2::new(5, 5), IVec2::new(5, 6)])
        );
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_walks_to_food_in_seven_ticks() {
        let mut state = open_board();
        state.food = IVec2::new(12, 5);

        for step in 1..=6 {
            assert_eq!(tick(&mut state, step * 150), TickOutcome::Continue);
            assert_eq!(state.snake.len(), 1);
        }
        assert_eq!(state.score, 0);

        assert_eq!(tick(&mut state, 7 * 150), TickOutcome::Continue);
        assert_eq!(state.head(), IVec2::new(12, 5));
        assert_eq!(state.score, 10);
        assert_eq!(state.snake.len(), 2);
        assert_eq!(state.drain_events(), vec![GameEvent::Ate]);
        assert_ne!(state.food, IVec2::new(12, 5));
    }

    #[test]
    fn test_eating_grows_and_moves_food() {
        let mut state = open_board();
        state.obstacles.push(Obstacle::solid(1, IVec2::new(20, 20), ObstacleKind::Brick));
        state.food = IVec2::new(12, 11);

        assert_eq!(tick(&mut state, 0), TickOutcome::Continue);
        assert_eq!(state.snake.len(), 2);
        assert_eq!(state.score, FOOD_SCORE);
        assert!(!state.snake.contains(&state.food));
        assert!(state.obstacles.iter().all(|o| o.position != state.food));
    }

    #[test]
    fn test_level_up_on_fifth_growth() {
        let mut state = open_board();
        state.level = 2;
        state.score = 40;
        // Grown four times already
        state.snake = (0..5).map(|i| IVec2::new(12, 12 + i)).collect();
        state.food = IVec2::new(12, 11);

        assert_eq!(tick(&mut state, 0), TickOutcome::LevelUp { level: 3 });
        assert_eq!(state.snake.len(), 6);
        assert_eq!(state.score, 50);
        // Tick itself does not change the level; the session does
        assert_eq!(state.level, 2);
    }

    #[test]
    fn test_growth_off_the_multiple_continues() {
        let mut state = open_board();
        state.snake = (0..3).map(|i| IVec2::new(12, 12 + i)).collect();
        state.food = IVec2::new(12, 11);
        assert_eq!(tick(&mut state, 0), TickOutcome::Continue);
        assert_eq!(state.snake.len(), 4);
    }

    #[test]
    fn test_wall_collision_reports_prior_score() {
        let mut state = open_board();
        state.snake = VecDeque::from([IVec2::new(0, 7)]);
        state.direction = Direction::Left;
        state.score = 30;
        state.level = 4;

        let outcome = tick(&mut state, 0);
        assert_eq!(
            outcome,
            TickOutcome::Collision {
                kind: CollisionKind::Wall,
                score: 30,
                level: 4
            }
        );
        assert_eq!(state.head(), IVec2::new(0, 7));
    }

    #[test]
    fn test_self_collision() {
        let mut state = open_board();
        // Head at (5,5) moving down into its own body
        state.snake = VecDeque::from([
            IVec2::new(5, 5),
            IVec2::new(6, 5),
            IVec2::new(6, 6),
            IVec2::new(5, 6),
            IVec2::new(4, 6),
        ]);
        state.direction = Direction::Down;
        assert!(matches!(
            tick(&mut state, 0),
            TickOutcome::Collision {
                kind: CollisionKind::Body,
                ..
            }
        ));
    }

    #[test]
    fn test_wall_checked_before_body() {
        let mut state = open_board();
        state.snake = VecDeque::from([IVec2::new(0, 5), IVec2::new(1, 5)]);
        state.direction = Direction::Left;
        assert_eq!(collision_at(&state, IVec2::new(-1, 5)), Some(CollisionKind::Wall));
        assert_eq!(collision_at(&state, IVec2::new(1, 5)), Some(CollisionKind::Body));
    }

    #[test]
    fn test_solid_obstacle_kills_deteriorating_does_not() {
        let mut state = open_board();
        state.obstacles.push(Obstacle::solid(1, IVec2::new(12, 11), ObstacleKind::Brick));
        assert!(matches!(
            tick(&mut state, 0),
            TickOutcome::Collision {
                kind: CollisionKind::Obstacle,
                ..
            }
        ));

        let mut state = open_board();
        let mut rock = Obstacle::solid(1, IVec2::new(12, 11), ObstacleKind::Rock);
        rock.deteriorate(0);
        state.obstacles.push(rock);
        assert_eq!(tick(&mut state, 100), TickOutcome::Continue);
        assert_eq!(state.head(), IVec2::new(12, 11));
    }

    #[test]
    fn test_nearby_rocks_crumble_with_one_event() {
        let mut state = open_board();
        // Head moves to (12, 11)
        state.obstacles = vec![
            Obstacle::solid(1, IVec2::new(12, 8), ObstacleKind::Rock), // distance 3
            Obstacle::solid(2, IVec2::new(14, 11), ObstacleKind::Rock), // distance 2
            Obstacle::solid(3, IVec2::new(15, 10), ObstacleKind::Rock), // sqrt(10)
            Obstacle::solid(4, IVec2::new(13, 11), ObstacleKind::Brick), // bricks never crumble
        ];

        assert_eq!(tick(&mut state, 1000), TickOutcome::Continue);
        let states: Vec<ObstacleState> = state.obstacles.iter().map(|o| o.state).collect();
        assert_eq!(
            states,
            vec![
                ObstacleState::Deteriorating,
                ObstacleState::Deteriorating,
                ObstacleState::Solid,
                ObstacleState::Solid,
            ]
        );
        assert_eq!(state.obstacles[0].deteriorated_at, Some(1000));
        assert_eq!(state.drain_events(), vec![GameEvent::RockCrumbled]);

        // Already crumbling: no new event, timestamp kept
        state.direction = Direction::Left;
        assert_eq!(tick(&mut state, 1150), TickOutcome::Continue);
        assert!(state.drain_events().is_empty());
        assert_eq!(state.obstacles[0].deteriorated_at, Some(1000));
    }

    #[test]
    fn test_crumbling_rock_disappears_after_window() {
        let mut state = open_board();
        state.obstacles = vec![Obstacle::solid(1, IVec2::new(12, 9), ObstacleKind::Rock)];

        tick(&mut state, 5000);
        assert_eq!(state.obstacles.len(), 1);

        state.direction = Direction::Left;
        tick(&mut state, 5000 + DETERIORATION_WINDOW_MS - 1);
        assert_eq!(state.obstacles.len(), 1);

        tick(&mut state, 5000 + DETERIORATION_WINDOW_MS);
        assert!(state.obstacles.is_empty());
    }

    proptest! {
        #[test]
        fn prop_plain_moves_keep_length(turns in proptest::collection::vec(0u8..4, 1..12)) {
            let mut state = open_board();
            state.food = IVec2::new(-10, -10); // unreachable
            state.snake = (0..4).map(|i| IVec2::new(12, 12 + i)).collect();

            for (i, turn) in turns.into_iter().enumerate() {
                let dir = match turn {
                    0 => Direction::Up,
                    1 => Direction::Down,
                    2 => Direction::Left,
                    _ => Direction::Right,
                };
                state.steer(dir);
                let before = state.head();
                let len = state.snake.len();
                match tick(&mut state, i as u64 * 100) {
                    TickOutcome::Continue => {
                        prop_assert_eq!(state.snake.len(), len);
                        prop_assert_eq!(state.head(), before + state.direction.vector());
                    }
                    TickOutcome::Collision { .. } => {
                        prop_assert_eq!(state.head(), before);
                        break;
                    }
                    TickOutcome::LevelUp { .. } => prop_assert!(false, "no food to eat"),
                }
            }
        }
    }
}
