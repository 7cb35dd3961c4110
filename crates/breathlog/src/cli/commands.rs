//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::entry::{Breathing, MealSlot, MealTime};
use crate::error::Result;
use crate::form::CaptureForm;
use crate::storage::KeyValueStore;

/// Log command arguments.
#[derive(Debug, Default, Args)]
pub struct LogCommand {
    /// Meal time this check-in belongs to
    #[arg(short, long, value_enum)]
    pub meal_time: Option<MealTimeArg>,

    /// How breathing feels today
    #[arg(short, long, value_enum)]
    pub breathing: Option<BreathingArg>,

    /// Oxygen level (%)
    #[arg(short, long)]
    pub oxygen: Option<String>,

    /// Heart rate (BPM)
    #[arg(long)]
    pub heart_rate: Option<String>,

    /// Any observations
    #[arg(short, long)]
    pub notes: Option<String>,

    /// What you had for breakfast
    #[arg(long)]
    pub breakfast: Option<String>,

    /// What you had for lunch
    #[arg(long)]
    pub lunch: Option<String>,

    /// What you had for dinner
    #[arg(long)]
    pub dinner: Option<String>,

    /// Snacks between meals
    #[arg(long)]
    pub snacks: Option<String>,

    /// Activities today
    #[arg(short, long)]
    pub activities: Option<String>,
}

impl LogCommand {
    /// Copy the given flags into `form`.
    ///
    /// # Errors
    ///
    /// Returns the form's error if a meal flag targets a slot the form rejects.
    pub fn fill<S: KeyValueStore>(&self, form: &mut CaptureForm<S>) -> Result<()> {
        if let Some(meal_time) = self.meal_time {
            form.select_meal_time(meal_time.into());
        }
        if let Some(breathing) = self.breathing {
            form.set_breathing(Some(breathing.into()));
        }
        if let Some(oxygen) = &self.oxygen {
            form.set_oxygen(oxygen.as_str());
        }
        if let Some(heart_rate) = &self.heart_rate {
            form.set_heart_rate(heart_rate.as_str());
        }
        if let Some(notes) = &self.notes {
            form.set_notes(notes.as_str());
        }
        let meals = [
            (MealSlot::Breakfast, &self.breakfast),
            (MealSlot::Lunch, &self.lunch),
            (MealSlot::Dinner, &self.dinner),
            (MealSlot::Snacks, &self.snacks),
        ];
        for (slot, text) in meals {
            if let Some(text) = text {
                form.set_meal(slot, text.as_str())?;
            }
        }
        if let Some(activities) = &self.activities {
            form.set_activities(activities.as_str());
        }
        Ok(())
    }
}

/// Session command arguments.
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Don't show check-in reminders
    #[arg(long)]
    pub no_reminders: bool,
}

/// History command arguments.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Trend command arguments.
#[derive(Debug, Args)]
pub struct TrendCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Offline asset cache commands.
#[derive(Debug, Subcommand)]
pub enum AssetsCommand {
    /// Fetch and store every precache asset
    Install {
        /// Directory serving as the origin (overrides offline.origin_dir)
        #[arg(short, long, value_name = "DIR")]
        origin: Option<PathBuf>,
    },

    /// Delete caches other than the current one
    Activate,

    /// Serve one asset, cache first
    Get {
        /// Request path, e.g. /index.html
        path: String,

        /// Directory serving as the origin (overrides offline.origin_dir)
        #[arg(short, long, value_name = "DIR")]
        origin: Option<PathBuf>,

        /// Write the body to this file instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List cached assets
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Meal time argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MealTimeArg {
    /// Morning check-in
    Breakfast,
    /// Midday check-in
    Lunch,
    /// Evening check-in
    Dinner,
}

impl From<MealTimeArg> for MealTime {
    fn from(arg: MealTimeArg) -> Self {
        match arg {
            MealTimeArg::Breakfast => Self::Breakfast,
            MealTimeArg::Lunch => Self::Lunch,
            MealTimeArg::Dinner => Self::Dinner,
        }
    }
}

/// Breathing argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BreathingArg {
    /// Better than usual
    Better,
    /// About the same
    Same,
    /// Worse than usual
    Worse,
}

impl From<BreathingArg> for Breathing {
    fn from(arg: BreathingArg) -> Self {
        match arg {
            BreathingArg::Better => Self::Better,
            BreathingArg::Same => Self::Same,
            BreathingArg::Worse => Self::Worse,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::storage::{LogStore, MemoryStore};

    fn form(gated: bool) -> CaptureForm<MemoryStore> {
        CaptureForm::open(LogStore::with_default_key(MemoryStore::new()), gated)
    }

    #[test]
    fn test_meal_time_arg_conversion() {
        assert_eq!(MealTime::from(MealTimeArg::Breakfast), MealTime::Breakfast);
        assert_eq!(MealTime::from(MealTimeArg::Lunch), MealTime::Lunch);
        assert_eq!(MealTime::from(MealTimeArg::Dinner), MealTime::Dinner);
    }

    #[test]
    fn test_breathing_arg_conversion() {
        assert_eq!(Breathing::from(BreathingArg::Better), Breathing::Better);
        assert_eq!(Breathing::from(BreathingArg::Same), Breathing::Same);
        assert_eq!(Breathing::from(BreathingArg::Worse), Breathing::Worse);
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_fill_sets_every_field() {
        let cmd = LogCommand {
            breathing: Some(BreathingArg::Same),
            oxygen: Some("96".to_string()),
            heart_rate: Some("70".to_string()),
            notes: Some("ok".to_string()),
            lunch: Some("salad".to_string()),
            snacks: Some("nuts".to_string()),
            activities: Some("walk".to_string()),
            ..LogCommand::default()
        };
        let mut form = form(false);
        cmd.fill(&mut form).unwrap();

        let draft = form.draft();
        assert_eq!(draft.breathing, Some(Breathing::Same));
        assert_eq!(draft.oxygen.raw(), "96");
        assert_eq!(draft.heart_rate.raw(), "70");
        assert_eq!(draft.meals.lunch, "salad");
        assert_eq!(draft.meals.snacks, "nuts");
        assert_eq!(draft.activities, "walk");
    }

    #[test]
    fn test_fill_gated_rejects_other_slot() {
        let cmd = LogCommand {
            meal_time: Some(MealTimeArg::Breakfast),
            dinner: Some("pasta".to_string()),
            ..LogCommand::default()
        };
        let mut form = form(true);
        let err = cmd.fill(&mut form).unwrap_err();
        assert!(matches!(err, Error::InactiveMealSlot { .. }));
    }

    #[test]
    fn test_status_command_debug() {
        let cmd = StatusCommand { json: true };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("json"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_output_format_debug() {
        let format = OutputFormat::Json;
        let debug_str = format!("{format:?}");
        assert_eq!(debug_str, "Json");
    }
}
