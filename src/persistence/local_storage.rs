//! Browser LocalStorage backend

use super::{ProgressStore, StoreError};

/// `window.localStorage`, resolved on every access so a blocked storage
/// (private mode) degrades to defaults instead of failing construction
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

impl ProgressStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().and_then(|s| s.get_item(key).ok().flatten())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = Self::storage().ok_or(StoreError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| StoreError::WriteRejected {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }
}
