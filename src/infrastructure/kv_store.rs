//! Key-value persistence adapter.
//!
//! The pinned snapshot is stored as one string value under one key, so the
//! adapter contract is just `get` and `set`.

use std::collections::HashMap;

use crate::domain::{AppConfig, Result, StorageBackend};

use super::local_storage::LocalStorage;

/// String key-value storage.
pub trait KeyValueStore {
    /// Read the value under `key`, `None` if nothing was ever written.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns error if the backend rejects the write.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process store; contents are lost when it is dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with one entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self { entries }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Open the backend selected in the configuration.
///
/// # Errors
/// Returns error if the SQLite file cannot be opened.
pub fn open_store(config: &AppConfig) -> Result<Box<dyn KeyValueStore>> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let path = config.storage_db_path();
            tracing::debug!(path = %path.display(), "Opening SQLite key-value store");
            Ok(Box::new(LocalStorage::open(&path)?))
        }
        StorageBackend::Memory => {
            tracing::debug!("Using in-memory key-value store");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}
