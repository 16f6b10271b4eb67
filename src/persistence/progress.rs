//! Player progress: scores, wallet, shop inventory

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{ProgressStore, keys, write_or_warn};

/// Everything that survives between runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub high_score: u64,
    pub total_coins: u64,
    /// High score as of the last unlock check
    pub prev_high_score: u64,
    pub selected_char: Option<String>,
    /// Upgrade id -> owned
    pub upgrades: BTreeMap<String, bool>,
    /// Consumable id -> count
    pub consumables: BTreeMap<String, u32>,
    pub purchased_chars: Vec<String>,
}

fn read_u64(store: &dyn ProgressStore, key: &str) -> u64 {
    store
        .get(key)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}

fn read_json<T: DeserializeOwned + Default>(store: &dyn ProgressStore, key: &str) -> T {
    let Some(raw) = store.get(key) else {
        return T::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed {}: {}", key, e);
        T::default()
    })
}

fn write_json<T: Serialize>(store: &mut dyn ProgressStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => write_or_warn(store, key, &json),
        Err(e) => log::warn!("Failed to encode {}: {}", key, e),
    }
}

impl Progress {
    /// Read every key, defaulting anything missing or malformed
    pub fn load(store: &dyn ProgressStore) -> Self {
        let progress = Self {
            high_score: read_u64(store, keys::HIGH_SCORE),
            total_coins: read_u64(store, keys::TOTAL_COINS),
            prev_high_score: read_u64(store, keys::PREV_HIGH_SCORE),
            selected_char: store.get(keys::SELECTED_CHAR).filter(|id| !id.is_empty()),
            upgrades: read_json(store, keys::UPGRADES),
            consumables: read_json(store, keys::CONSUMABLES),
            purchased_chars: read_json(store, keys::PURCHASED_CHARS),
        };
        log::debug!(
            "Loaded progress: high score {}, {} coins",
            progress.high_score,
            progress.total_coins
        );
        progress
    }

    /// Write scores and wallet (end of run)
    pub fn save_scores(&self, store: &mut dyn ProgressStore) {
        write_or_warn(store, keys::HIGH_SCORE, &self.high_score.to_string());
        write_or_warn(store, keys::PREV_HIGH_SCORE, &self.prev_high_score.to_string());
        write_or_warn(store, keys::TOTAL_COINS, &self.total_coins.to_string());
    }

    /// Write everything
    pub fn save(&self, store: &mut dyn ProgressStore) {
        self.save_scores(store);
        if let Some(id) = &self.selected_char {
            write_or_warn(store, keys::SELECTED_CHAR, id);
        }
        write_json(store, keys::UPGRADES, &self.upgrades);
        write_json(store, keys::CONSUMABLES, &self.consumables);
        write_json(store, keys::PURCHASED_CHARS, &self.purchased_chars);
    }

    pub fn has_upgrade(&self, id: &str) -> bool {
        self.upgrades.get(id).copied().unwrap_or(false)
    }

    pub fn consumable_count(&self, id: &str) -> u32 {
        self.consumables.get(id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_empty_store_loads_defaults() {
        let store = MemoryStore::new();
        assert_eq!(Progress::load(&store), Progress::default());
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let mut store = MemoryStore::new();
        store.set(keys::HIGH_SCORE, "lots").unwrap();
        store.set(keys::TOTAL_COINS, "-5").unwrap();
        store.set(keys::UPGRADES, "{not json").unwrap();
        store.set(keys::PURCHASED_CHARS, r#"["ninja"]"#).unwrap();

        let progress = Progress::load(&store);
        assert_eq!(progress.high_score, 0);
        assert_eq!(progress.total_coins, 0);
        assert!(progress.upgrades.is_empty());
        assert_eq!(progress.purchased_chars, vec!["ninja".to_string()]);
    }

    #[test]
    fn test_reads_browser_json_shapes() {
        let mut store = MemoryStore::new();
        store.set(keys::UPGRADES, r#"{"energyMaster":true,"itemLuck":false}"#).unwrap();
        store.set(keys::CONSUMABLES, r#"{"startShield":2}"#).unwrap();
        store.set(keys::SELECTED_CHAR, "robot").unwrap();

        let progress = Progress::load(&store);
        assert!(progress.has_upgrade("energyMaster"));
        assert!(!progress.has_upgrade("itemLuck"));
        assert!(!progress.has_upgrade("coinBooster"));
        assert_eq!(progress.consumable_count("startShield"), 2);
        assert_eq!(progress.consumable_count("feverStart"), 0);
        assert_eq!(progress.selected_char.as_deref(), Some("robot"));
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut progress = Progress {
            high_score: 321,
            total_coins: 77,
            prev_high_score: 300,
            selected_char: Some("ninja".into()),
            ..Progress::default()
        };
        progress.consumables.insert("feverStart".into(), 1);
        progress.save(&mut store);

        assert_eq!(store.get(keys::HIGH_SCORE).as_deref(), Some("321"));
        assert_eq!(Progress::load(&store), progress);
    }
}
