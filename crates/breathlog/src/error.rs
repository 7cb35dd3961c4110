//! Error types for breathlog.
//!
//! This module defines all error types used throughout the breathlog crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for breathlog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Writing a record to the key-value store failed.
    #[error("failed to write record '{key}': {message}")]
    StoreWrite {
        /// Key of the record being written.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Capture Form Errors ===
    /// The form is gated on a meal time and none has been chosen yet.
    #[error("select a meal time (breakfast, lunch or dinner) before saving")]
    MealTimeNotSelected,

    /// A meal slot other than the selected meal time was edited.
    #[error("meal slot '{slot}' is not active; the selected meal time is '{active}'")]
    InactiveMealSlot {
        /// The slot that was edited.
        slot: String,
        /// The currently selected meal time.
        active: String,
    },

    /// A field value could not be interpreted.
    #[error("invalid value for {field}: '{value}'")]
    InvalidField {
        /// Name of the field.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    // === Offline Cache Errors ===
    /// Fetching an asset from the origin failed.
    #[error("failed to fetch asset {path}: {message}")]
    AssetFetch {
        /// Request path of the asset.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for breathlog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a store write error for the given key.
    #[must_use]
    pub fn store_write(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreWrite {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an asset fetch error.
    #[must_use]
    pub fn asset_fetch(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssetFetch {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid field error.
    #[must_use]
    pub fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }

    /// Check if this error means persisting data failed.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOpen { .. }
                | Self::DatabaseQuery(_)
                | Self::DatabaseMigration { .. }
                | Self::StoreWrite { .. }
        )
    }
}
