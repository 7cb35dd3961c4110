//! Persistence adapter for the log collection.
//!
//! The whole collection is one JSON array under one key. Reads never fail:
//! a missing or unreadable document is an empty history. Writes report
//! failure to the caller. A stored document that does not parse is copied to
//! a backup key before the first write replaces it.

use tracing::{debug, warn};

use super::KeyValueStore;
use crate::entry::LogCollection;
use crate::error::Result;

/// Storage key the web form used for the collection.
pub const DEFAULT_COLLECTION_KEY: &str = "breathingLogs";

/// Loads and saves a [`LogCollection`] through a [`KeyValueStore`].
#[derive(Debug)]
pub struct LogStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> LogStore<S> {
    /// Adapter over `store` using `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Adapter over `store` using [`DEFAULT_COLLECTION_KEY`].
    pub fn with_default_key(store: S) -> Self {
        Self::new(store, DEFAULT_COLLECTION_KEY)
    }

    /// The storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the stored collection.
    ///
    /// Absent, unreadable or malformed data yields an empty collection.
    pub fn load_collection(&self) -> LogCollection {
        let raw = match self.store.load(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No stored collection, starting empty");
                return LogCollection::new();
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Could not read stored collection, starting empty");
                return LogCollection::new();
            }
        };

        match serde_json::from_str::<LogCollection>(&raw) {
            Ok(collection) => {
                debug!(key = %self.key, entries = collection.len(), "Loaded collection");
                collection
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored collection is malformed, starting empty");
                LogCollection::new()
            }
        }
    }

    /// Overwrite the stored collection.
    ///
    /// If the record currently under the key does not parse as a collection,
    /// it is first copied to a free backup key (see [`Self::backup_key`]).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the backup or the store write fails.
    /// Nothing is overwritten when the backup fails.
    pub fn save_collection(&self, collection: &LogCollection) -> Result<()> {
        let json = serde_json::to_string(collection)?;
        self.back_up_unparsable()?;
        self.store.save(&self.key, &json)?;
        debug!(key = %self.key, entries = collection.len(), "Saved collection");
        Ok(())
    }

    /// Backup key for the `attempt`-th unparsable record: `<key>.unreadable`,
    /// then `<key>.unreadable.1`, `<key>.unreadable.2` and so on.
    #[must_use]
    pub fn backup_key(&self, attempt: usize) -> String {
        if attempt == 0 {
            format!("{}.unreadable", self.key)
        } else {
            format!("{}.unreadable.{attempt}", self.key)
        }
    }

    fn back_up_unparsable(&self) -> Result<()> {
        // A read failure leaves nothing to copy; the write below reports its own error.
        let Ok(Some(raw)) = self.store.load(&self.key) else {
            return Ok(());
        };
        if serde_json::from_str::<LogCollection>(&raw).is_ok() {
            return Ok(());
        }

        let mut attempt = 0;
        let backup = loop {
            let candidate = self.backup_key(attempt);
            match self.store.load(&candidate)? {
                None => break candidate,
                Some(existing) if existing == raw => return Ok(()),
                Some(_) => attempt += 1,
            }
        };
        self.store.save(&backup, &raw)?;
        warn!(key = %self.key, backup = %backup, "Stored collection did not parse; kept a copy before overwriting");
        Ok(())
    }
}
