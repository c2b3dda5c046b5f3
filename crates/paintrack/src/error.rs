//! Error types for paintrack.
//!
//! This module defines all error types used throughout the paintrack crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for paintrack operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Database Errors ===
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

    // === Entry Store Errors ===
    /// Reading the stored collection failed.
    ///
    /// The entry store swallows this and falls back to an empty collection;
    /// it only escapes from the raw backend.
    #[error("failed to read '{key}' from storage: {source}")]
    StorageRead {
        /// Storage key that was being read.
        key: &'static str,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    /// Writing the collection to storage failed.
    #[error("failed to write '{key}' to storage: {source}")]
    StorageWrite {
        /// Storage key that was being written.
        key: &'static str,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },

    /// A newly recorded entry could not be written to storage.
    ///
    /// The entry stays in memory and is retried on the next write.
    #[error("Failed to save entry. Please try again.")]
    EntryNotSaved {
        /// The underlying write failure.
        #[source]
        source: Box<Error>,
    },

    /// The background persistence writer is no longer running.
    #[error("persistence writer has stopped")]
    PersistWorkerStopped,

    // === Entry Errors ===
    /// User input does not form a valid entry.
    #[error("{reason}")]
    InvalidEntry {
        /// Message suitable for showing to the user.
        reason: String,
    },

    /// An entry with this id is already in the collection.
    #[error("an entry with id {id} already exists")]
    DuplicateEntry {
        /// The conflicting id.
        id: String,
    },

    // === Import/Export Errors ===
    /// Export was requested for an empty collection.
    #[error("No entries to export")]
    NoEntriesToExport,

    /// Import was requested for something that is not a CSV file.
    #[error("unsupported import file {path}: expected a .csv file")]
    UnsupportedImportFile {
        /// The rejected path.
        path: PathBuf,
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

/// A specialized Result type for paintrack operations.
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

    /// Create an invalid entry error with a user-facing reason.
    #[must_use]
    pub fn invalid_entry(reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            reason: reason.into(),
        }
    }

    /// Wrap a backend failure as a storage read error.
    #[must_use]
    pub fn storage_read(key: &'static str, source: Error) -> Self {
        Self::StorageRead {
            key,
            source: Box::new(source),
        }
    }

    /// Wrap a backend failure as a storage write error.
    #[must_use]
    pub fn storage_write(key: &'static str, source: Error) -> Self {
        Self::StorageWrite {
            key,
            source: Box::new(source),
        }
    }

    /// Check if this error is a failed write to storage.
    #[must_use]
    pub fn is_storage_write(&self) -> bool {
        matches!(self, Self::StorageWrite { .. })
    }

    /// Check if this error means there was nothing to export.
    #[must_use]
    pub fn is_nothing_to_export(&self) -> bool {
        matches!(self, Self::NoEntriesToExport)
    }
}
