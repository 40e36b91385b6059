//! Local SQLite key-value storage.
//!
//! Keeps the serialized pinned snapshot across sessions in a single table.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{AppError, Result};

use super::kv_store::KeyValueStore;

/// Key-value repository backed by SQLite.
pub struct LocalStorage {
    conn: Connection,
}

impl LocalStorage {
    /// Opens or creates the key-value database.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or schema creation fails.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create storage directory", e))?;
        }

        let conn = Connection::open(path).map_err(AppError::database)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(AppError::database)?;

        let storage = Self { conn };
        storage.init_schema()?;

        Ok(storage)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    /// Returns error if schema creation fails.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(AppError::database)?;
        let storage = Self { conn };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
            )
            .map_err(AppError::database)?;

        Ok(())
    }

    /// All stored keys, sorted.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_entries ORDER BY key")
            .map_err(AppError::database)?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(AppError::database)?;

        let mut keys = Vec::new();
        for row in rows {
            match row {
                Ok(key) => keys.push(key),
                Err(e) => tracing::warn!("Failed to read key row: {}", e),
            }
        }

        Ok(keys)
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(AppError::database)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                r"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(AppError::database)?;

        tracing::trace!(key, bytes = value.len(), "Stored value");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("test.db");

        let storage = LocalStorage::open(&db_path).unwrap();

        let count: i64 = storage
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='kv_entries'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count, 1);
    }

    #[test]
    fn test_get_missing_key() {
        let storage = LocalStorage::open_in_memory().unwrap();
        assert_eq!(storage.get("nope").unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut storage = LocalStorage::open_in_memory().unwrap();
        storage.set("k", "first").unwrap();
        storage.set("k", "second").unwrap();

        assert_eq!(storage.get("k").unwrap().as_deref(), Some("second"));
        assert_eq!(storage.keys().unwrap(), vec!["k".to_string()]);
    }

    #[test]
    fn test_value_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        {
            let mut storage = LocalStorage::open(&db_path).unwrap();
            storage.set("pinned-store", r#"{"tickets":null}"#).unwrap();
        }

        let storage = LocalStorage::open(&db_path).unwrap();
        assert_eq!(
            storage.get("pinned-store").unwrap().as_deref(),
            Some(r#"{"tickets":null}"#)
        );
    }
}
