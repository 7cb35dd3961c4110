//! `SQLite` schema definitions for breathlog.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the key-value records table.
///
/// Each row is one named JSON document; the log collection lives under a
/// single key.
pub const CREATE_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS records (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Base schema statements, applied on every open.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_RECORDS_TABLE, CREATE_METADATA_TABLE];

/// SQL statement to create the offline asset cache table (schema v2).
pub const CREATE_ASSETS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS assets (
    cache_name TEXT NOT NULL,
    path TEXT NOT NULL,
    body BLOB NOT NULL,
    content_hash TEXT NOT NULL,
    cached_at TEXT NOT NULL,
    PRIMARY KEY (cache_name, path)
)
";

/// SQL statement to index assets by cache name for activation cleanup.
pub const CREATE_ASSETS_CACHE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_assets_cache ON assets(cache_name)
";
