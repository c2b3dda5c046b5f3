//! File-level CSV export and import.
//!
//! Export reads the collection and writes it through the codec. Import
//! decodes a `.csv` file and appends the result through the manager's bulk
//! path, so imported entries are persisted like any other change.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::has_csv_extension;
use crate::csv::{CsvCodec, CSV_MIME_TYPE};
use crate::error::{Error, Result};
use crate::manager::EntryManager;

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Where the file was written.
    pub path: PathBuf,
    /// Number of entries written.
    pub entries: usize,
    /// MIME type of the written file.
    pub content_type: &'static str,
}

/// Result of an import. Importing nothing is not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Entries added to the collection.
    pub imported: usize,
    /// Lines skipped as invalid.
    pub rejected: usize,
    /// Imported entries stamped with the import time for lack of a readable date.
    pub undated: usize,
}

impl ImportOutcome {
    /// Check if nothing was imported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.imported == 0
    }

    /// Message to show the user.
    #[must_use]
    pub fn message(&self) -> String {
        if self.is_empty() {
            "No valid entries found in the CSV file".to_string()
        } else {
            format!("Successfully imported {} entries", self.imported)
        }
    }
}

/// Write the collection, newest first, to `path` as CSV.
///
/// # Errors
///
/// Returns [`Error::NoEntriesToExport`] if the collection is empty (no file is
/// written), or an I/O error if the file cannot be written.
pub async fn export_to_file(
    manager: &EntryManager,
    codec: &CsvCodec,
    path: impl AsRef<Path>,
) -> Result<ExportOutcome> {
    let path = path.as_ref();
    let entries = manager.sorted_by_recent();
    let text = codec.encode(&entries)?;

    tokio::fs::write(path, text).await?;
    info!("Exported {} entries to {}", entries.len(), path.display());

    Ok(ExportOutcome {
        path: path.to_path_buf(),
        entries: entries.len(),
        content_type: CSV_MIME_TYPE,
    })
}

/// Import entries from the CSV file at `path`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedImportFile`] if the path has no `.csv`
/// extension, or an I/O error if the file cannot be read.
pub async fn import_from_file(
    manager: &EntryManager,
    codec: &CsvCodec,
    path: impl AsRef<Path>,
) -> Result<ImportOutcome> {
    let path = path.as_ref();
    if !has_csv_extension(path) {
        return Err(Error::UnsupportedImportFile {
            path: path.to_path_buf(),
        });
    }

    let text = tokio::fs::read_to_string(path).await?;
    let report = codec.decode(&text);
    let rejected = report.rejected.len();
    let undated = report.undated;
    let imported = manager.extend(report.entries);

    info!(
        imported,
        rejected,
        undated,
        "Imported entries from {}",
        path.display()
    );
    Ok(ImportOutcome {
        imported,
        rejected,
        undated,
    })
}
