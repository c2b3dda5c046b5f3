//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Record a new entry.
#[derive(Debug, Args)]
pub struct LogCommand {
    /// The body part that hurts (e.g. "Lower back", "Left knee")
    pub body_part: String,

    /// Pain intensity, 0 = no pain, 10 = worst pain [default: from config]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub level: Option<u8>,
}

/// List recorded entries.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Show at most this many entries (newest first)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Delete an entry.
#[derive(Debug, Args)]
pub struct RemoveCommand {
    /// Id of the entry to delete
    pub id: String,
}

/// Export history as CSV.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Output file [default: export.file_name from config]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Import history from CSV.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// The .csv file to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
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
