//! Command-line interface for paintrack.
//!
//! This module provides the CLI structure for the `paintrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, ExportCommand, ImportCommand, ListCommand, LogCommand, RemoveCommand,
    StatusCommand,
};

/// paintrack - Keep a personal pain history
///
/// Record where it hurts and how much, review your history, and move it in
/// and out as CSV.
#[derive(Debug, Parser)]
#[command(name = "paintrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
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
    /// Record a pain entry
    Log(LogCommand),

    /// Show pain history, newest first
    List(ListCommand),

    /// Delete a pain entry by id
    Remove(RemoveCommand),

    /// Export pain history to CSV
    Export(ExportCommand),

    /// Import pain history from CSV
    Import(ImportCommand),

    /// Show storage status
    Status(StatusCommand),

    /// View or check configuration
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
