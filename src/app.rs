//! Screen flow around a play session
//!
//! Start screen -> playing -> game over (retry or menu), plus the pause menu
//! actions and the exit screen. The app owns the persisted values: the level
//! is saved when a level is cleared, never on game over, so "Play Again"
//! retries the level the player failed on.

use crate::audio::{SoundEffect, SoundSink};
use crate::persistence::{self, KeyValueStore};
use crate::platform::{Command, command_for_key};
use crate::settings::SoundConfig;
use crate::sim::{GameEvent, GamePhase, Session, Snapshot};

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Start,
    Playing,
    GameOver { score: u64, level: u32 },
    /// "Thanks for playing"
    Exit,
}

pub struct App<S: KeyValueStore, A: SoundSink> {
    store: S,
    audio: A,
    sound: SoundConfig,
    /// Level the next session starts at
    level: u32,
    screen: Screen,
    session: Option<Session>,
    seed: u64,
    /// Clock time at which the exit click has finished and audio can close
    audio_close_at: Option<u64>,
}

impl<S: KeyValueStore, A: SoundSink> App<S, A> {
    pub fn new(store: S, mut audio: A, seed: u64) -> Self {
        let sound = SoundConfig::load(&store);
        let level = persistence::load_level(&store);
        audio.apply_config(&sound);
        log::info!("Starting at level {}", level);
        Self {
            store,
            audio,
            sound,
            level,
            screen: Screen::Start,
            session: None,
            seed,
            audio_close_at: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn sound_config(&self) -> SoundConfig {
        self.sound
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.session.as_ref().map(Session::snapshot)
    }

    /// Pause menu is up (not the level-up popup)
    pub fn is_paused(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.phase() == GamePhase::Paused)
    }

    /// Start button and "Play Again" land here
    pub fn start(&mut self, now_ms: u64) {
        self.audio.play(SoundEffect::Click);
        self.audio_close_at = None;
        self.end_session();
        self.seed = next_seed(self.seed);
        self.session = Some(Session::new(self.level, self.seed, now_ms));
        self.screen = Screen::Playing;
    }

    /// Game over screen: try the same level again
    pub fn retry(&mut self, now_ms: u64) {
        self.start(now_ms);
    }

    /// Game over "Back to Menu", pause menu "Reset", exit screen "Start New Game"
    pub fn back_to_menu(&mut self) {
        self.audio_close_at = None;
        self.audio.play(SoundEffect::Click);
        self.end_session();
        self.screen = Screen::Start;
    }

    /// Pause menu "Exit". Audio is released once the click has played out.
    pub fn exit(&mut self, now_ms: u64) {
        self.audio.play(SoundEffect::Click);
        self.end_session();
        let click_ms = (SoundEffect::Click.params().duration() * 1000.0).ceil() as u64;
        self.audio_close_at = Some(now_ms + click_ms);
        self.screen = Screen::Exit;
        log::info!("Thanks for playing");
    }

    /// Keyboard input while playing
    pub fn key(&mut self, key: &str, now_ms: u64) {
        if self.screen != Screen::Playing {
            return;
        }
        match command_for_key(key) {
            Some(Command::Steer(direction)) => {
                if let Some(session) = &mut self.session {
                    session.steer(direction);
                }
            }
            Some(Command::TogglePause) => self.toggle_pause(now_ms),
            None => {}
        }
        self.flush_events();
    }

    /// Escape key, menu button, pause menu "Continue"
    pub fn toggle_pause(&mut self, now_ms: u64) {
        if let Some(session) = &mut self.session {
            session.toggle_pause(now_ms);
        }
        self.flush_events();
    }

    /// Window lost focus or tab hidden
    pub fn auto_pause(&mut self) {
        if let Some(session) = &mut self.session
            && session.pause()
        {
            log::info!("Auto-paused");
        }
        self.flush_events();
    }

    /// Pause menu sound switch
    pub fn toggle_sound(&mut self) {
        self.sound.toggle_effects();
        self.sound.save(&mut self.store);
        self.audio.apply_config(&self.sound);
    }

    /// Advance the running session. Returns true when a new frame was committed.
    pub fn update(&mut self, now_ms: u64) -> bool {
        if let Some(at) = self.audio_close_at
            && now_ms >= at
        {
            self.audio_close_at = None;
            self.audio.shutdown();
        }
        if self.screen != Screen::Playing {
            return false;
        }
        if let Some(session) = &mut self.session {
            session.update(now_ms);
        }
        self.flush_events()
    }

    /// React to everything the session reported; true if a frame was committed
    fn flush_events(&mut self) -> bool {
        let Some(session) = &mut self.session else {
            return false;
        };
        let events = session.drain_events();

        let mut frame = false;
        for event in events {
            if let Some(effect) = SoundEffect::for_event(&event) {
                self.audio.play(effect);
            }
            match event {
                GameEvent::LevelUp { level } => {
                    self.level = level;
                    persistence::save_level(&mut self.store, level);
                }
                GameEvent::GameOver { score, level } => {
                    // Not saved: a failed attempt retries the same level
                    self.level = level;
                    self.screen = Screen::GameOver { score, level };
                    self.end_session();
                    frame = true;
                }
                GameEvent::Frame => frame = true,
                _ => {}
            }
        }
        frame
    }

    fn end_session(&mut self) {
        if let Some(session) = &mut self.session {
            session.end();
        }
    }
}

/// Decorrelate consecutive session seeds
fn next_seed(seed: u64) -> u64 {
    seed.wrapping_mul(2654435761).wrapping_add(0x9E37_79B9_7F4A_7C15)
}
