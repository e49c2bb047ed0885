//! Eskilaum - a squirrel-and-nuts arcade snake
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, collisions, layouts, levels)
//! - `audio`: Procedural sound synthesizer and playback
//! - `app`: Screen flow around a play session
//! - `platform`: Browser/native platform abstraction (clock, input)
//! - `persistence`: Key-value storage for the two persisted values
//! - `settings`: Sound configuration

pub mod app;
pub mod audio;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use app::{App, Screen};
pub use audio::{AudioManager, SoundEffect, SoundSink};
pub use settings::SoundConfig;

/// Game configuration constants
pub mod consts {
    /// Board is GRID_SIZE x GRID_SIZE cells
    pub const GRID_SIZE: i32 = 24;

    /// Tick interval at level 1 (ms per tick, lower is faster)
    pub const INITIAL_TICK_MS: u64 = 150;
    /// Subtracted from the tick interval per level
    pub const LEVEL_TICK_DECREASE_MS: u64 = 10;
    /// Fastest possible tick interval
    pub const MIN_TICK_MS: u64 = 50;

    /// Rocks within this Euclidean distance of the head start crumbling (cells)
    pub const ROCK_DETERIORATION_DISTANCE: f32 = 3.0;
    /// A crumbling obstacle disappears after this long
    pub const DETERIORATION_WINDOW_MS: u64 = 1000;

    /// Pause between levels
    pub const LEVEL_TRANSITION_MS: u64 = 3000;
    /// How long the eating flag stays up after a nut is eaten
    pub const EATING_FLASH_MS: u64 = 200;

    /// Points per nut
    pub const FOOD_SCORE: u64 = 10;
    /// A level is cleared every time the snake has grown by this many segments
    pub const LEVEL_UP_EVERY: usize = 5;

    /// Spawn cell for the snake at every level start
    pub const SPAWN_X: i32 = 12;
    pub const SPAWN_Y: i32 = 12;

    /// Obstacles never start within this many cells (exclusive) of the centre
    pub const KEEP_OUT_HALF_WIDTH: i32 = 5;
    /// Sampling attempts per rock or per wall before giving up on it
    pub const PLACEMENT_ATTEMPTS: u32 = 50;
    /// Upper bound on rocks per level
    pub const MAX_ROCKS: u32 = 15;
    /// Walls only show up from this level on
    pub const WALLS_FROM_LEVEL: u32 = 3;

    /// Number of distinct level background tints
    pub const LEVEL_PALETTE_LEN: u32 = 6;
}

/// Tick interval for a level, floored at `MIN_TICK_MS`
#[inline]
pub fn tick_interval_ms(level: u32) -> u64 {
    use consts::*;
    let decrease = u64::from(level.saturating_sub(1)) * LEVEL_TICK_DECREASE_MS;
    INITIAL_TICK_MS.saturating_sub(decrease).max(MIN_TICK_MS)
}

/// Background tint index for a level (the last tint repeats)
#[inline]
pub fn level_palette_index(level: u32) -> u32 {
    level.saturating_sub(1).min(consts::LEVEL_PALETTE_LEN - 1)
}
