//! Command-line interface for breathlog.
//!
//! This module provides the CLI structure and command handlers for the
//! `brlog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AssetsCommand, BreathingArg, ConfigCommand, HistoryCommand, LogCommand, MealTimeArg,
    OutputFormat, SessionArgs, StatusCommand, TrendCommand,
};

/// brlog - Breathing and wellness log
///
/// Record daily check-ins of breathing, oxygen, heart rate, meals and
/// activities, then review them as a history or a trend chart.
#[derive(Debug, Parser)]
#[command(name = "brlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record one check-in from flags
    Log(LogCommand),

    /// Fill in check-ins interactively
    Session(SessionArgs),

    /// Show saved entries grouped by date
    History(HistoryCommand),

    /// Show oxygen, heart rate and breathing trends
    Trend(TrendCommand),

    /// Show storage status
    Status(StatusCommand),

    /// Manage the offline asset cache
    #[command(subcommand)]
    Assets(AssetsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
