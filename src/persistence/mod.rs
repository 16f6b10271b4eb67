//! Key-value progress persistence
//!
//! Features:
//! - `ProgressStore` port over string keys (LocalStorage on web)
//! - Shared in-memory store for native runs and tests
//! - Lenient decoding: missing or malformed values read as defaults

#[cfg(target_arch = "wasm32")]
pub mod local_storage;
pub mod progress;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;
pub use progress::Progress;

/// Storage keys
pub mod keys {
    pub const HIGH_SCORE: &str = "infiniteStairs_highScore";
    pub const TOTAL_COINS: &str = "infiniteStairs_totalCoins";
    pub const PREV_HIGH_SCORE: &str = "infiniteStairs_prevHighScore";
    pub const SELECTED_CHAR: &str = "infiniteStairs_selectedChar";
    pub const UPGRADES: &str = "infiniteStairs_upgrades";
    pub const CONSUMABLES: &str = "infiniteStairs_consumables";
    pub const PURCHASED_CHARS: &str = "infiniteStairs_purchasedChars";
    pub const SETTINGS: &str = "infiniteStairs_settings";
}

/// Write failures (reads never fail; absent means default)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("write to `{key}` was rejected: {reason}")]
    WriteRejected { key: String, reason: String },
}

/// String key-value store
pub trait ProgressStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Write a value, logging instead of failing
pub fn write_or_warn(store: &mut dyn ProgressStore, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        log::warn!("Failed to persist {}: {}", key, e);
    }
}

/// In-memory store. Clones share the same map, so a test can keep a handle
/// while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored entry
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_clones_share_state() {
        let mut store = MemoryStore::new();
        let observer = store.clone();
        store.set(keys::HIGH_SCORE, "42").unwrap();
        assert_eq!(observer.get(keys::HIGH_SCORE).as_deref(), Some("42"));
        assert_eq!(observer.entries().len(), 1);
    }

    struct ReadOnly;

    impl ProgressStore for ReadOnly {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::WriteRejected {
                key: key.to_string(),
                reason: "quota exceeded".into(),
            })
        }
    }

    #[test]
    fn test_write_failures_are_swallowed() {
        let mut store = ReadOnly;
        write_or_warn(&mut store, keys::TOTAL_COINS, "10");
        assert!(store.get(keys::TOTAL_COINS).is_none());
    }
}
