//! Sound preferences
//!
//! Persisted as JSON under `persistence::CONFIG_KEY`.

use serde::{Deserialize, Serialize};

use crate::persistence::{CONFIG_KEY, KeyValueStore};

/// Sound configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundConfig {
    /// Sound effects on/off
    pub effects: bool,
    /// Stored for the pause menu toggle; there is no music to play
    pub music: bool,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            effects: true,
            music: true,
        }
    }
}

impl SoundConfig {
    /// Parse a stored config, falling back to defaults when it is malformed
    pub fn parse(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring malformed sound config ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get(CONFIG_KEY) {
            Some(json) => {
                let config = Self::parse(&json);
                log::info!("Loaded sound config: {:?}", config);
                config
            }
            None => {
                log::info!("Using default sound config");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) {
        if let Ok(json) = serde_json::to_string(self) {
            store.set(CONFIG_KEY, &json);
            log::info!("Sound config saved");
        }
    }

    /// Flip sound effects (pause menu switch)
    pub fn toggle_effects(&mut self) {
        self.effects = !self.effects;
    }
}
