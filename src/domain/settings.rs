//! Application configuration.
//!
//! Loaded from `config.toml` in the data directory; every field has a default.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::pinned::PinPolicy;

/// Which key-value backend holds the pinned snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite file in the data directory.
    #[default]
    Sqlite,
    /// Process memory only; nothing survives the session.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend for the pinned snapshot.
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Pinning behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinsConfig {
    /// Replace an already pinned record instead of appending a duplicate.
    #[serde(default = "default_dedupe")]
    pub dedupe: bool,
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            dedupe: default_dedupe(),
        }
    }
}

const fn default_dedupe() -> bool {
    true
}

/// Path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathConfig {
    /// Base data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub pins: PinsConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

impl AppConfig {
    /// Get the data directory, using default if not configured.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".helpdesk-pins")
    }

    /// Get the key-value database path.
    #[must_use]
    pub fn storage_db_path(&self) -> PathBuf {
        self.data_dir().join("pins.db")
    }

    /// Pin policy derived from `[pins]`.
    #[must_use]
    pub const fn pin_policy(&self) -> PinPolicy {
        PinPolicy {
            dedupe: self.pins.dedupe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.pins.dedupe);
        assert!(config.pin_policy().dedupe);
    }

    #[test]
    fn test_paths_follow_data_dir() {
        let config = AppConfig {
            paths: PathConfig {
                data_dir: Some(PathBuf::from("/var/lib/pins")),
            },
            ..AppConfig::default()
        };

        assert_eq!(config.data_dir(), PathBuf::from("/var/lib/pins"));
        assert_eq!(config.storage_db_path(), PathBuf::from("/var/lib/pins/pins.db"));
    }
}
