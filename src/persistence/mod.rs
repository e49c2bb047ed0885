//! Persisted values
//!
//! Only two values survive between visits: the last level reached and the
//! sound configuration. Both live in a string key-value store (LocalStorage
//! on the web, memory elsewhere). Anything unreadable falls back to its
//! default; nothing here can fail the game.

use std::collections::HashMap;

/// LocalStorage key for the last level reached
pub const LEVEL_KEY: &str = "eskilaum_level";
/// LocalStorage key for the sound configuration
pub const CONFIG_KEY: &str = "eskilaum_config";

/// Minimal string store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Browser LocalStorage. Missing storage (private mode, sandboxed frame)
/// behaves like an empty store that forgets writes.
#[cfg(target_arch = "wasm32")]
pub struct LocalStore {
    storage: Option<web_sys::Storage>,
}

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    pub fn open() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable - progress will not be saved");
        }
        Self { storage }
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.set_item(key, value);
        }
    }
}

/// Last level reached, defaulting to 1
pub fn load_level(store: &impl KeyValueStore) -> u32 {
    let Some(raw) = store.get(LEVEL_KEY) else {
        return 1;
    };
    match raw.trim().parse::<u32>() {
        Ok(level) if level >= 1 => level,
        _ => {
            log::warn!("Ignoring unreadable saved level {:?}", raw);
            1
        }
    }
}

pub fn save_level(store: &mut impl KeyValueStore, level: u32) {
    store.set(LEVEL_KEY, &level.max(1).to_string());
    log::info!("Progress saved (level {})", level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_defaults_to_one() {
        let store = MemoryStore::new();
        assert_eq!(load_level(&store), 1);
    }

    #[test]
    fn test_level_round_trip() {
        let mut store = MemoryStore::new();
        save_level(&mut store, 4);
        assert_eq!(store.get(LEVEL_KEY).as_deref(), Some("4"));
        assert_eq!(load_level(&store), 4);
    }

    #[test]
    fn test_malformed_level_falls_back() {
        let mut store = MemoryStore::new();
        for junk in ["", "abc", "-3", "0", "2.5"] {
            store.set(LEVEL_KEY, junk);
            assert_eq!(load_level(&store), 1, "{:?}", junk);
        }
    }
}
