//! `breathlog` - A personal breathing and wellness log
//!
//! This library provides the capture form for daily check-ins, the durable
//! log collection behind it, the grouped history and trend chart views derived
//! from that collection, and an offline cache for the app's root assets.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod chart;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod form;
pub mod history;
pub mod logging;
pub mod offline;
pub mod reminders;
pub mod session;
pub mod storage;

pub use chart::{project, ChartData};
pub use config::Config;
pub use entry::{Breathing, LogCollection, LogEntry, MealSlot, MealTime, Reading};
pub use error::{Error, Result};
pub use form::{CaptureForm, FormState, SavedEntry};
pub use history::group_by_date;
pub use logging::init_logging;
pub use offline::OfflineCache;
pub use storage::{KeyValueStore, LogStore, Storage, StorageStats};
