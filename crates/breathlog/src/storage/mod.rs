//! Storage layer for breathlog.
//!
//! The log collection is persisted through the narrow [`KeyValueStore`]
//! surface: one key, one JSON document. [`Storage`] is the `SQLite` engine
//! behind that surface and also holds the offline asset cache.
//! [`MemoryStore`] keeps records in process, for tests and dry runs.

pub mod collection;
pub mod migrations;
pub mod schema;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::offline::CachedAsset;

pub use collection::{LogStore, DEFAULT_COLLECTION_KEY};

/// A durable key-value surface holding JSON documents.
pub trait KeyValueStore {
    /// Read the document stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write did not reach the store.
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Storage engine backed by `SQLite`.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// and brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store a batch of assets atomically.
    ///
    /// Either every asset is written or none is.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn put_assets(&self, assets: &[CachedAsset]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r"
                INSERT OR REPLACE INTO assets (cache_name, path, body, content_hash, cached_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )?;
            for asset in assets {
                stmt.execute(params![
                    asset.cache_name,
                    asset.path,
                    asset.body,
                    asset.content_hash,
                    asset.cached_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        debug!("Stored {} assets", assets.len());
        Ok(assets.len())
    }

    /// Look up one cached asset.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_asset(&self, cache_name: &str, path: &str) -> Result<Option<CachedAsset>> {
        let asset = self
            .conn
            .query_row(
                r"
                SELECT cache_name, path, body, content_hash, cached_at
                FROM assets WHERE cache_name = ?1 AND path = ?2
                ",
                params![cache_name, path],
                Self::row_to_asset,
            )
            .optional()?;
        Ok(asset)
    }

    /// All assets held by one cache, ordered by path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_assets(&self, cache_name: &str) -> Result<Vec<CachedAsset>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT cache_name, path, body, content_hash, cached_at
            FROM assets WHERE cache_name = ?1 ORDER BY path
            ",
        )?;
        let assets = stmt
            .query_map([cache_name], Self::row_to_asset)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(assets)
    }

    /// Names of every cache that holds at least one asset.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn cache_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT cache_name FROM assets ORDER BY cache_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Delete every asset of a cache. Returns the number of assets removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_cache(&self, cache_name: &str) -> Result<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM assets WHERE cache_name = ?1", [cache_name])?;
        if affected > 0 {
            info!("Deleted cache {} ({} assets)", cache_name, affected);
        }
        Ok(affected)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let record_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        let asset_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            record_count,
            asset_count,
            cache_names: self.cache_names()?,
            db_size_bytes,
        })
    }

    fn row_to_asset(row: &rusqlite::Row) -> rusqlite::Result<CachedAsset> {
        let cached_at_str: String = row.get(4)?;
        let cached_at = DateTime::parse_from_rfc3339(&cached_at_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        Ok(CachedAsset {
            cache_name: row.get(0)?,
            path: row.get(1)?,
            body: row.get(2)?,
            content_hash: row.get(3)?,
            cached_at,
        })
    }
}

impl KeyValueStore for Storage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM records WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                r"
                INSERT INTO records (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                ",
                params![key, value],
            )
            .map_err(|e| Error::store_write(key, e.to_string()))?;
        debug!(key, bytes = value.len(), "Record written");
        Ok(())
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of key-value records.
    pub record_count: i64,
    /// Number of cached assets across all caches.
    pub asset_count: i64,
    /// Names of caches holding assets.
    pub cache_names: Vec<String>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

/// An in-process key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with one record.
    #[must_use]
    pub fn with_record(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.records.borrow_mut().insert(key.into(), value.into());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.records
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_open_in_memory() {
        assert!(Storage::open_in_memory().is_ok());
    }

    #[test]
    fn test_load_missing_key() {
        let storage = create_test_storage();
        assert!(storage.load("breathingLogs").unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let storage = create_test_storage();
        storage.save("breathingLogs", "[]").unwrap();
        assert_eq!(storage.load("breathingLogs").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_save_overwrites() {
        let storage = create_test_storage();
        storage.save("k", "[1]").unwrap();
        storage.save("k", "[1,2]").unwrap();

        assert_eq!(storage.load("k").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(storage.stats().unwrap().record_count, 1);
    }

    #[test]
    fn test_put_and_get_asset() {
        let storage = create_test_storage();
        let asset = CachedAsset::new("wellness-cache-v1", "/index.html", b"<html>".to_vec());
        storage.put_assets(std::slice::from_ref(&asset)).unwrap();

        let fetched = storage
            .get_asset("wellness-cache-v1", "/index.html")
            .unwrap()
            .unwrap();
        assert_eq!(fetched.body, b"<html>");
        assert_eq!(fetched.content_hash, asset.content_hash);
        assert!(storage
            .get_asset("wellness-cache-v0", "/index.html")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_cache_names_and_delete() {
        let storage = create_test_storage();
        storage
            .put_assets(&[
                CachedAsset::new("cache-v1", "/", b"a".to_vec()),
                CachedAsset::new("cache-v2", "/", b"b".to_vec()),
                CachedAsset::new("cache-v2", "/manifest.json", b"{}".to_vec()),
            ])
            .unwrap();

        assert_eq!(
            storage.cache_names().unwrap(),
            vec!["cache-v1".to_string(), "cache-v2".to_string()]
        );
        assert_eq!(storage.list_assets("cache-v2").unwrap().len(), 2);

        assert_eq!(storage.delete_cache("cache-v1").unwrap(), 1);
        assert_eq!(storage.cache_names().unwrap(), vec!["cache-v2".to_string()]);
        assert_eq!(storage.delete_cache("cache-v1").unwrap(), 0);
    }

    #[test]
    fn test_stats() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.record_count, 0);
        assert_eq!(stats.asset_count, 0);
        assert!(stats.cache_names.is_empty());
        assert_eq!(stats.db_size_bytes, 0);

        storage.save("breathingLogs", "[]").unwrap();
        storage
            .put_assets(&[CachedAsset::new("c", "/", b"x".to_vec())])
            .unwrap();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.record_count, 1);
        assert_eq!(stats.asset_count, 1);
    }

    #[test]
    fn test_open_file_based_persists() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("breathlog.db");

        {
            let storage = Storage::open(&db_path).unwrap();
            storage.save("breathingLogs", r#"[{"date":"2026-10-19"}]"#).unwrap();
            assert_eq!(storage.path(), db_path);
            assert!(storage.stats().unwrap().db_size_bytes > 0);
        }

        let reopened = Storage::open(&db_path).unwrap();
        assert!(reopened.load("breathingLogs").unwrap().is_some());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested/deeper/breathlog.db");

        let _storage = Storage::open(&nested).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.load("k").unwrap().is_none());
        store.save("k", "v").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v"));

        let seeded = MemoryStore::with_record("k", "seed");
        assert_eq!(seeded.load("k").unwrap().as_deref(), Some("seed"));
    }
}
