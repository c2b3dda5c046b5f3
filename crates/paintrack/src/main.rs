//! `paintrack` - CLI for keeping a personal pain history
//!
//! This binary records pain entries, lists and removes them, and moves the
//! history in and out as CSV.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use paintrack::cli::{
    Cli, Command, ConfigCommand, ExportCommand, ImportCommand, ListCommand, LogCommand,
    RemoveCommand, StatusCommand,
};
use paintrack::{
    export_to_file, import_from_file, init_logging, Config, CsvCodec, EntryManager, EntryStore,
    KeyValueStore, PainEntry, Severity, SqliteStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Initialize logging from flags and configuration
    init_logging(cli.verbosity(), &config.logging);

    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        command => run_with_entries(&config, command).await,
    }
}

/// Open storage, hydrate the collection, run `command`, then drain writes.
async fn run_with_entries(config: &Config, command: Command) -> anyhow::Result<()> {
    let store = Arc::new(SqliteStore::open(config.database_path())?);
    let backend: Arc<dyn KeyValueStore> = store.clone();
    let manager = EntryManager::hydrate(EntryStore::new(backend)).await?;
    let codec = CsvCodec::new(config.date_zone()?);

    let result = match command {
        Command::Log(cmd) => handle_log(config, &manager, &cmd).await,
        Command::List(cmd) => handle_list(&manager, &codec, &cmd),
        Command::Remove(cmd) => handle_remove(&manager, &cmd).await,
        Command::Export(cmd) => handle_export(config, &manager, &codec, cmd).await,
        Command::Import(cmd) => handle_import(&manager, &codec, &cmd).await,
        Command::Status(cmd) => handle_status(&store, &manager, &codec, &cmd),
        Command::Config(cmd) => handle_config(config, cmd),
    };

    let drained = manager.shutdown().await;
    result?;
    drained?;
    Ok(())
}

async fn handle_log(
    config: &Config,
    manager: &EntryManager,
    cmd: &LogCommand,
) -> anyhow::Result<()> {
    let level = cmd.level.unwrap_or(config.entry.default_pain_level);
    let entry = PainEntry::record(&cmd.body_part, level)?;
    let summary = format!(
        "Logged {} at {}/10 ({})",
        entry.body_part,
        entry.pain_level,
        entry.severity()
    );
    let id = entry.id.clone();

    manager.commit(entry).await?;

    println!("{summary}");
    println!("  id: {id}");
    Ok(())
}

fn handle_list(manager: &EntryManager, codec: &CsvCodec, cmd: &ListCommand) -> anyhow::Result<()> {
    let mut entries = manager.sorted_by_recent();
    if let Some(limit) = cmd.limit {
        entries.truncate(limit);
    }

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No entries yet. Record one with `paintrack log <BODY PART>`.");
        return Ok(());
    }

    for entry in &entries {
        let date = codec
            .zone()
            .format_timestamp(entry.timestamp)
            .unwrap_or_else(|| "unknown date".to_string());
        println!(
            "{}  {:<24}  {:>2}/10  {:<8}  {}",
            entry.id,
            entry.body_part,
            entry.pain_level,
            entry.severity().to_string(),
            date
        );
    }
    Ok(())
}

async fn handle_remove(manager: &EntryManager, cmd: &RemoveCommand) -> anyhow::Result<()> {
    if !manager.remove(&cmd.id) {
        println!("No entry with id {}", cmd.id);
        return Ok(());
    }
    manager.flush().await?;
    println!("Removed entry {}", cmd.id);
    Ok(())
}

async fn handle_export(
    config: &Config,
    manager: &EntryManager,
    codec: &CsvCodec,
    cmd: ExportCommand,
) -> anyhow::Result<()> {
    let path = cmd
        .output
        .unwrap_or_else(|| PathBuf::from(&config.export.file_name));

    match export_to_file(manager, codec, &path).await {
        Ok(outcome) => {
            println!(
                "Exported {} entries to {} ({})",
                outcome.entries,
                outcome.path.display(),
                outcome.content_type
            );
            Ok(())
        }
        Err(e) if e.is_nothing_to_export() => {
            println!("{e}");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("failed to export to {}", path.display())),
    }
}

async fn handle_import(
    manager: &EntryManager,
    codec: &CsvCodec,
    cmd: &ImportCommand,
) -> anyhow::Result<()> {
    let outcome = import_from_file(manager, codec, &cmd.file)
        .await
        .with_context(|| format!("failed to import {}", cmd.file.display()))?;
    if !outcome.is_empty() {
        manager.flush().await?;
    }

    println!("{}", outcome.message());
    if outcome.rejected > 0 {
        println!("  Skipped {} invalid lines", outcome.rejected);
    }
    if outcome.undated > 0 {
        println!(
            "  {} entries had no readable date and were stamped with the import time",
            outcome.undated
        );
    }
    Ok(())
}

fn handle_status(
    store: &SqliteStore,
    manager: &EntryManager,
    codec: &CsvCodec,
    cmd: &StatusCommand,
) -> anyhow::Result<()> {
    let entries = manager.sorted_by_recent();
    let count = |severity: Severity| entries.iter().filter(|e| e.severity() == severity).count();
    let (mild, moderate, severe) = (
        count(Severity::Mild),
        count(Severity::Moderate),
        count(Severity::Severe),
    );
    let latest = entries
        .first()
        .and_then(|e| codec.zone().format_timestamp(e.timestamp));

    if cmd.json {
        let status = serde_json::json!({
            "database_path": store.path(),
            "database_size_bytes": store.size_bytes(),
            "entries": entries.len(),
            "mild": mild,
            "moderate": moderate,
            "severe": severe,
            "latest": latest,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("paintrack status");
        println!("----------------");
        println!("Database:      {}", store.path().display());
        println!("Size:          {} bytes", store.size_bytes());
        println!("Entries:       {}", entries.len());
        println!("  Mild:        {mild}");
        println!("  Moderate:    {moderate}");
        println!("  Severe:      {severe}");
        println!("Latest:        {}", latest.as_deref().unwrap_or("-"));
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
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
                println!();
                println!("[Export]");
                println!("  File name:          {}", config.export.file_name);
                match config.export.utc_offset_minutes {
                    Some(minutes) => println!("  UTC offset (min):   {minutes}"),
                    None => println!("  UTC offset (min):   local"),
                }
                println!();
                println!("[Entry]");
                println!(
                    "  Default pain level: {}",
                    config.entry.default_pain_level
                );
                println!();
                println!("[Logging]");
                println!(
                    "  Level:              {}",
                    config.logging.level.as_deref().unwrap_or("info")
                );
                println!("  Show targets:       {}", config.logging.show_targets);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
