//! Offline asset cache.
//!
//! A named, versioned cache of the app's root assets. Installing fetches
//! every precache path from the origin and stores them together or not at
//! all. Activating deletes every cache whose name is not the current one.
//! Fetching answers from the cache first and falls back to the origin.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::OfflineConfig;
use crate::error::{Error, Result};
use crate::storage::Storage;

/// One cached response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAsset {
    /// Cache the asset belongs to.
    pub cache_name: String,
    /// Request path, e.g. `/index.html`.
    pub path: String,
    /// Response body.
    pub body: Vec<u8>,
    /// BLAKE3 hash of the body.
    pub content_hash: String,
    /// When the asset was stored.
    pub cached_at: DateTime<Utc>,
}

impl CachedAsset {
    /// Build an asset stamped with the current time.
    #[must_use]
    pub fn new(cache_name: impl Into<String>, path: impl Into<String>, body: Vec<u8>) -> Self {
        let content_hash = Self::compute_hash(&body);
        Self {
            cache_name: cache_name.into(),
            path: path.into(),
            body,
            content_hash,
            cached_at: Utc::now(),
        }
    }

    /// Compute the BLAKE3 hash of a body.
    #[must_use]
    pub fn compute_hash(body: &[u8]) -> String {
        blake3::hash(body).to_hex().to_string()
    }

    /// First 12 characters of the content hash, or all of it if shorter.
    #[must_use]
    pub fn short_hash(&self) -> &str {
        self.content_hash.get(..12).unwrap_or(&self.content_hash)
    }
}

/// Where assets come from when they are not cached.
pub trait Origin {
    /// Fetch the body for a request path.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin cannot serve the path.
    fn fetch(&self, path: &str) -> Result<Vec<u8>>;
}

/// An origin serving files from a local directory, as a static web server would.
///
/// `/` maps to `index.html`.
#[derive(Debug, Clone)]
pub struct DirOrigin {
    root: PathBuf,
}

impl DirOrigin {
    /// Serve files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a request path to a file, refusing anything that escapes the root.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = path.trim_start_matches('/');
        let relative = if relative.is_empty() {
            "index.html"
        } else {
            relative
        };

        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::asset_fetch(path, "path escapes the origin root"));
        }
        Ok(self.root.join(relative))
    }
}

impl Origin for DirOrigin {
    fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let file = self.resolve(path)?;
        fs::read(&file).map_err(|e| Error::asset_fetch(path, e.to_string()))
    }
}

/// An origin that is never reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOrigin;

impl Origin for OfflineOrigin {
    fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        Err(Error::asset_fetch(path, "network unavailable"))
    }
}

/// Where a served body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    /// The current cache.
    Cache,
    /// The origin, after a cache miss.
    Network,
}

/// A body answered by [`OfflineCache::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    /// Response body.
    pub body: Vec<u8>,
    /// Where it came from.
    pub source: ServedFrom,
}

/// The versioned offline cache.
#[derive(Debug, Clone)]
pub struct OfflineCache {
    name: String,
    precache: Vec<String>,
}

impl OfflineCache {
    /// A cache named `name` precaching `precache`.
    pub fn new(name: impl Into<String>, precache: Vec<String>) -> Self {
        Self {
            name: name.into(),
            precache,
        }
    }

    /// The cache described by the configuration.
    #[must_use]
    pub fn from_config(config: &OfflineConfig) -> Self {
        Self::new(config.cache_name.clone(), config.precache.clone())
    }

    /// Current cache name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Paths fetched on install.
    #[must_use]
    pub fn precache(&self) -> &[String] {
        &self.precache
    }

    /// Fetch every precache path and store them in this cache.
    ///
    /// All fetches happen before anything is written, so a failure leaves the
    /// store untouched.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error, or a storage error.
    pub fn install(&self, storage: &Storage, origin: &dyn Origin) -> Result<usize> {
        let assets = self
            .precache
            .iter()
            .map(|path| {
                let body = origin.fetch(path)?;
                Ok(CachedAsset::new(self.name.clone(), path.clone(), body))
            })
            .collect::<Result<Vec<_>>>()?;

        let stored = storage.put_assets(&assets)?;
        info!(cache = %self.name, assets = stored, "Offline cache installed");
        Ok(stored)
    }

    /// Delete every cache other than this one. Returns the deleted names.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn activate(&self, storage: &Storage) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for name in storage.cache_names()? {
            if name != self.name {
                storage.delete_cache(&name)?;
                deleted.push(name);
            }
        }
        if !deleted.is_empty() {
            info!(cache = %self.name, removed = ?deleted, "Removed stale caches");
        }
        Ok(deleted)
    }

    /// Serve a path from the cache, falling back to the origin.
    ///
    /// Origin responses are not added to the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not cached and the origin fails.
    pub fn fetch(&self, storage: &Storage, origin: &dyn Origin, path: &str) -> Result<Served> {
        match storage.get_asset(&self.name, path) {
            Ok(Some(asset)) => {
                debug!(path, "Served from cache");
                return Ok(Served {
                    body: asset.body,
                    source: ServedFrom::Cache,
                });
            }
            Ok(None) => debug!(path, "Cache miss"),
            Err(e) => warn!(path, error = %e, "Cache lookup failed, trying origin"),
        }

        let body = origin.fetch(path)?;
        Ok(Served {
            body,
            source: ServedFrom::Network,
        })
    }
}
