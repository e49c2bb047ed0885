//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time comes in as a parameter (injected clock)
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies

pub mod grid;
pub mod layout;
pub mod session;
pub mod state;
pub mod tick;
pub mod timer;

pub use grid::{Direction, Position};
pub use layout::generate_obstacles;
pub use session::{Session, Snapshot};
pub use state::{GameEvent, GamePhase, GameState, Obstacle, ObstacleKind, ObstacleState};
pub use tick::{CollisionKind, TickOutcome, tick};
pub use timer::{TimerId, Timers};
