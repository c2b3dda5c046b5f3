//! `paintrack` - A personal pain history tracker
//!
//! This library provides the core functionality for recording pain entries,
//! keeping them durable in a key-value store, and moving them in and out as CSV.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod csv;
pub mod entry;
pub mod error;
pub mod logging;
pub mod manager;
pub mod storage;
pub mod transfer;

pub use config::Config;
pub use csv::{CsvCodec, DateZone, DecodeReport};
pub use entry::{PainEntry, Severity};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use manager::EntryManager;
pub use storage::{EntryStore, KeyValueStore, MemoryStore, SqliteStore};
pub use transfer::{export_to_file, import_from_file, ExportOutcome, ImportOutcome};
