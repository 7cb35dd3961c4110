//! `brlog` - CLI for breathlog
//!
//! This binary records wellness check-ins and shows them back as a grouped
//! history or a trend chart.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use breathlog::chart::{self, render_text};
use breathlog::cli::{
    AssetsCommand, Cli, Command, ConfigCommand, HistoryCommand, LogCommand, OutputFormat,
    SessionArgs, StatusCommand, TrendCommand,
};
use breathlog::entry::{Breathing, MealSlot};
use breathlog::offline::{DirOrigin, OfflineOrigin, Origin, ServedFrom};
use breathlog::session::Session;
use breathlog::{
    group_by_date, init_logging, project, CaptureForm, Config, LogEntry, LogStore, OfflineCache,
    Storage,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    // Execute the command
    match cli.command {
        Command::Log(log_cmd) => handle_log(&config, &log_cmd),
        Command::Session(session_args) => handle_session(&config, &session_args),
        Command::History(history_cmd) => handle_history(&config, &history_cmd),
        Command::Trend(trend_cmd) => handle_trend(&config, &trend_cmd),
        Command::Status(status_cmd) => handle_status(&config, &status_cmd),
        Command::Assets(assets_cmd) => handle_assets(&config, assets_cmd),
        Command::Config(config_cmd) => handle_config(&config, cli.config, config_cmd),
    }
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening database {}", path.display()))
}

fn open_log_store(config: &Config) -> anyhow::Result<LogStore<Storage>> {
    Ok(LogStore::new(
        open_storage(config)?,
        config.storage.collection_key.clone(),
    ))
}

fn handle_log(config: &Config, cmd: &LogCommand) -> anyhow::Result<()> {
    let mut form = CaptureForm::open(open_log_store(config)?, config.capture.meal_time_gate);
    cmd.fill(&mut form)?;
    let saved = form.save_now().context("saving entry")?;

    for advisory in &saved.advisories {
        eprintln!("warning: {advisory}");
    }
    println!("Saved entry #{}", saved.index + 1);
    println!();
    print_entry(&saved.entry);
    Ok(())
}

fn handle_session(config: &Config, args: &SessionArgs) -> anyhow::Result<()> {
    let form = CaptureForm::open(open_log_store(config)?, config.capture.meal_time_gate);
    let mut session = Session::new(form);
    let reminders = if args.no_reminders {
        Vec::new()
    } else {
        config.reminders()
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    runtime.block_on(async {
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        let mut output = tokio::io::stdout();
        session.run(input, &mut output, reminders).await
    })?;
    Ok(())
}

fn handle_history(config: &Config, cmd: &HistoryCommand) -> anyhow::Result<()> {
    let collection = open_log_store(config)?.load_collection();
    let groups = group_by_date(&collection);

    match cmd.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&groups)?);
        }
        _ if groups.is_empty() => println!("No logs yet."),
        OutputFormat::Plain => {
            for (date, entries) in &groups {
                println!("{date}");
                println!("{}", "=".repeat(10));
                for entry in entries {
                    print_entry(entry);
                    println!();
                }
            }
        }
        OutputFormat::Table => {
            println!(
                "{:<10}  {:<9}  {:<9}  {:>5}  {:>5}  Notes",
                "Date", "Meal", "Breathing", "O2 %", "BPM"
            );
            println!("{}", "-".repeat(60));
            for entries in groups.values() {
                for entry in entries {
                    println!(
                        "{:<10}  {:<9}  {:<9}  {:>5}  {:>5}  {}",
                        entry.date.to_string(),
                        entry.meal_time.map(|m| m.to_string()).unwrap_or_default(),
                        entry.breathing.map(Breathing::as_str).unwrap_or_default(),
                        entry.oxygen.raw(),
                        entry.heart_rate.raw(),
                        entry.notes
                    );
                }
            }
        }
    }
    Ok(())
}

fn handle_trend(config: &Config, cmd: &TrendCommand) -> anyhow::Result<()> {
    let collection = open_log_store(config)?.load_collection();
    let chart = project(&collection);

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chart)?),
        OutputFormat::Plain | OutputFormat::Table => {
            let layout = &chart.layout;
            if !chart.is_empty() {
                let titles: Vec<_> = layout.series.iter().map(|s| s.label).collect();
                println!("Trends: {}", titles.join(", "));
                println!();
            }
            print!("{}", render_text(&chart));
        }
    }
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let log_store = open_log_store(config)?;
    let collection = log_store.load_collection();
    let stats = log_store.store().stats()?;
    let span = collection.date_span();

    if cmd.json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "collection_key": log_store.key(),
            "entries": collection.len(),
            "first_date": span.map(|(first, _)| first),
            "last_date": span.map(|(_, last)| last),
            "meal_time_gate": config.capture.meal_time_gate,
            "cache_name": config.offline.cache_name,
            "cached_assets": stats.asset_count,
            "caches": stats.cache_names,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("brlog status");
        println!("------------");
        println!("Database:      {}", config.database_path().display());
        println!("Entries:       {}", collection.len());
        if let Some((first, last)) = span {
            println!("Date range:    {first} to {last}");
        }
        println!("Meal gate:     {}", config.capture.meal_time_gate);
        println!("Cache:         {}", config.offline.cache_name);
        println!("Cached assets: {}", stats.asset_count);
        println!("Size:          {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn origin_for(config: &Config, dir: Option<PathBuf>) -> Box<dyn Origin> {
    match dir.or_else(|| config.offline.origin_dir.clone()) {
        Some(dir) => Box::new(DirOrigin::new(dir)),
        None => Box::new(OfflineOrigin),
    }
}

fn handle_assets(config: &Config, cmd: AssetsCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let cache = OfflineCache::from_config(&config.offline);

    match cmd {
        AssetsCommand::Install { origin } => {
            let Some(dir) = origin.or_else(|| config.offline.origin_dir.clone()) else {
                bail!("no origin directory: pass --origin or set offline.origin_dir");
            };
            let stored = cache.install(&storage, &DirOrigin::new(dir))?;
            println!("Installed {stored} assets into {}", cache.name());
        }
        AssetsCommand::Activate => {
            let deleted = cache.activate(&storage)?;
            if deleted.is_empty() {
                println!("No stale caches.");
            } else {
                for name in deleted {
                    println!("Deleted cache {name}");
                }
            }
        }
        AssetsCommand::Get {
            path,
            origin,
            output,
        } => {
            let origin = origin_for(config, origin);
            let served = cache.fetch(&storage, origin.as_ref(), &path)?;
            let source = match served.source {
                ServedFrom::Cache => "cache",
                ServedFrom::Network => "network",
            };
            eprintln!("{path}: {} bytes from {source}", served.body.len());
            match output {
                Some(file) => std::fs::write(&file, &served.body)
                    .with_context(|| format!("writing {}", file.display()))?,
                None => std::io::stdout().write_all(&served.body)?,
            }
        }
        AssetsCommand::List { json } => {
            let assets = storage.list_assets(cache.name())?;
            if json {
                let listing: Vec<_> = assets
                    .iter()
                    .map(|a| {
                        serde_json::json!({
                            "path": a.path,
                            "bytes": a.body.len(),
                            "content_hash": a.content_hash,
                            "cached_at": a.cached_at,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else if assets.is_empty() {
                println!("Cache {} is empty.", cache.name());
            } else {
                for asset in &assets {
                    println!(
                        "{:<20} {:>8} bytes  {}",
                        asset.path,
                        asset.body.len(),
                        asset.short_hash()
                    );
                }
            }
        }
    }
    Ok(())
}

fn handle_config(
    config: &Config,
    config_path: Option<PathBuf>,
    cmd: ConfigCommand,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Collection key:     {}", config.storage.collection_key);
                println!();
                println!("[Capture]");
                println!("  Meal time gate:     {}", config.capture.meal_time_gate);
                println!();
                println!("[Reminders]");
                println!("  Enabled:            {}", config.reminders.enabled);
                for reminder in &config.reminders.schedule {
                    println!("  After {:>4}s:        {}", reminder.after_secs, reminder.message);
                }
                println!();
                println!("[Offline]");
                println!("  Cache name:         {}", config.offline.cache_name);
                println!("  Precache:           {}", config.offline.precache.join(", "));
                if let Some(dir) = &config.offline.origin_dir {
                    println!("  Origin dir:         {}", dir.display());
                }
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_entry(entry: &LogEntry) {
    println!("{}", chart::label(entry));
    println!(
        "Breathing:    {}",
        entry.breathing.map(Breathing::as_str).unwrap_or_default()
    );
    println!("Oxygen Level: {}%", entry.oxygen);
    println!("Heart Rate:   {} BPM", entry.heart_rate);
    println!("Notes:        {}", entry.notes);
    for slot in MealSlot::ALL {
        let label = match slot {
            MealSlot::Breakfast => "Breakfast:",
            MealSlot::Lunch => "Lunch:",
            MealSlot::Dinner => "Dinner:",
            MealSlot::Snacks => "Snacks:",
        };
        println!("{label:<13} {}", entry.meals.get(slot));
    }
    println!("Activities:   {}", entry.activities);
}
