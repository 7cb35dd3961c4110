//! Configuration management for breathlog.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reminders::Reminder;
use crate::storage::DEFAULT_COLLECTION_KEY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "breathlog";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "breathlog.db";

/// Environment variable prefix.
const ENV_PREFIX: &str = "BREATHLOG_";

/// Allowed shape of a cache name.
const CACHE_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9._-]*$";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BREATHLOG_`, sections split by `__`)
/// 2. TOML config file at `~/.config/breathlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Capture form configuration.
    pub capture: CaptureConfig,
    /// Reminder configuration.
    pub reminders: RemindersConfig,
    /// Offline asset cache configuration.
    pub offline: OfflineConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/breathlog/breathlog.db`
    pub database_path: Option<PathBuf>,
    /// Key holding the log collection.
    pub collection_key: String,
}

/// Capture form configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Require a meal time to be selected before an entry can be saved.
    pub meal_time_gate: bool,
}

/// Reminder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemindersConfig {
    /// Show check-in reminders during interactive sessions.
    pub enabled: bool,
    /// Reminders, each fired once after its delay.
    pub schedule: Vec<ReminderConfig>,
}

/// One scheduled reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Seconds after the session starts.
    pub after_secs: u64,
    /// Text shown to the user.
    pub message: String,
}

/// Offline asset cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Name of the current cache version.
    pub cache_name: String,
    /// Request paths fetched on install.
    pub precache: Vec<String>,
    /// Directory acting as the origin for asset fetches.
    pub origin_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
        }
    }
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_reminder_schedule(),
        }
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            cache_name: "wellness-cache-v1".to_string(),
            precache: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
            ],
            origin_dir: None,
        }
    }
}

/// Check-ins through the day, as the web app scheduled them.
fn default_reminder_schedule() -> Vec<ReminderConfig> {
    vec![
        ReminderConfig {
            after_secs: 5,
            message: "Morning check-in: How's your breathing? Log breakfast!".to_string(),
        },
        ReminderConfig {
            after_secs: 15,
            message: "Lunch check-in: Update breathing & meals!".to_string(),
        },
        ReminderConfig {
            after_secs: 25,
            message: "Afternoon check-in: Final breathing & dinner/snacks!".to_string(),
        },
    ]
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.collection_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage.collection_key must not be empty".to_string(),
            });
        }

        let cache_name = Regex::new(CACHE_NAME_PATTERN).map_err(|e| Error::internal(e.to_string()))?;
        if !cache_name.is_match(&self.offline.cache_name) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "invalid cache name '{}': use letters, digits, '.', '_' or '-'",
                    self.offline.cache_name
                ),
            });
        }

        if let Some(path) = self.offline.precache.iter().find(|p| !p.starts_with('/')) {
            return Err(Error::ConfigValidation {
                message: format!("precache path '{path}' must start with '/'"),
            });
        }

        if self.reminders.schedule.iter().any(|r| r.after_secs == 0) {
            return Err(Error::ConfigValidation {
                message: "reminder after_secs must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Reminders to schedule for an interactive session.
    ///
    /// Empty when reminders are disabled.
    #[must_use]
    pub fn reminders(&self) -> Vec<Reminder> {
        if !self.reminders.enabled {
            return Vec::new();
        }
        self.reminders
            .schedule
            .iter()
            .map(|r| Reminder::new(Duration::from_secs(r.after_secs), r.message.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(!config.capture.meal_time_gate);
        assert!(config.reminders.enabled);
        assert_eq!(config.storage.collection_key, "breathingLogs");
        assert_eq!(config.offline.cache_name, "wellness-cache-v1");
    }

    #[test]
    fn test_default_offline_config() {
        let offline = OfflineConfig::default();
        assert_eq!(offline.precache, vec!["/", "/index.html", "/manifest.json"]);
        assert!(offline.origin_dir.is_none());
    }

    #[test]
    fn test_default_reminder_schedule() {
        let schedule = default_reminder_schedule();
        assert_eq!(schedule.len(), 3);
        assert_eq!(
            schedule.iter().map(|r| r.after_secs).collect::<Vec<_>>(),
            vec![5, 15, 25]
        );
        assert!(schedule[0].message.contains("Morning"));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_collection_key() {
        let mut config = Config::default();
        config.storage.collection_key = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("collection_key"));
    }

    #[test]
    fn test_validate_invalid_cache_name() {
        let mut config = Config::default();
        config.offline.cache_name = "wellness cache/v2".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid cache name"));
    }

    #[test]
    fn test_validate_relative_precache_path() {
        let mut config = Config::default();
        config.offline.precache.push("index.css".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("index.css"));
    }

    #[test]
    fn test_validate_zero_reminder_delay() {
        let mut config = Config::default();
        config.reminders.schedule[1].after_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("after_secs"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config
            .database_path()
            .to_string_lossy()
            .contains("breathlog.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_reminders_enabled() {
        let config = Config::default();
        let reminders = config.reminders();
        assert_eq!(reminders.len(), 3);
        assert_eq!(reminders[0].delay, Duration::from_secs(5));
    }

    #[test]
    fn test_reminders_disabled() {
        let mut config = Config::default();
        config.reminders.enabled = false;
        assert!(config.reminders().is_empty());
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("breathlog"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[capture]
meal_time_gate = true

[offline]
cache_name = "wellness-cache-v2"

[[reminders.schedule]]
after_secs = 60
message = "Time to check in"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert!(config.capture.meal_time_gate);
        assert_eq!(config.offline.cache_name, "wellness-cache-v2");
        assert_eq!(config.reminders.schedule.len(), 1);
        assert_eq!(config.reminders.schedule[0].after_secs, 60);
        assert_eq!(config.storage.collection_key, "breathingLogs");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[offline]\ncache_name = \"bad name\"\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("collection_key"));
        assert!(json.contains("meal_time_gate"));
    }
}
