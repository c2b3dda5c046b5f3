//! Whole-collection persistence for pain entries.
//!
//! The collection is stored as one JSON array under [`ENTRIES_KEY`] and
//! replaced wholesale on every save.

use std::sync::Arc;

use tracing::{debug, warn};

use super::KeyValueStore;
use crate::entry::PainEntry;
use crate::error::{Error, Result};

/// Storage key holding the serialized entry collection.
pub const ENTRIES_KEY: &str = "pain_tracker_entries";

/// Reads and writes the entry collection through a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct EntryStore {
    backend: Arc<dyn KeyValueStore>,
}

impl EntryStore {
    /// Wrap a key-value backend.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Load the stored collection.
    ///
    /// Never fails: a missing value, an unreadable backend or a corrupt blob
    /// all yield an empty collection. Failures are logged.
    #[must_use]
    pub fn load(&self) -> Vec<PainEntry> {
        match self.try_load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Error retrieving pain entries, starting empty");
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<PainEntry>> {
        let Some(json) = self
            .backend
            .get(ENTRIES_KEY)
            .map_err(|e| Error::storage_read(ENTRIES_KEY, e))?
        else {
            debug!("No stored entries under '{}'", ENTRIES_KEY);
            return Ok(Vec::new());
        };

        let entries: Vec<PainEntry> = serde_json::from_str(&json)
            .map_err(|e| Error::storage_read(ENTRIES_KEY, e.into()))?;
        debug!("Loaded {} entries", entries.len());
        Ok(entries)
    }

    /// Replace the stored collection with `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if serialization or the backend write fails.
    pub fn save(&self, entries: &[PainEntry]) -> Result<()> {
        let json =
            serde_json::to_string(entries).map_err(|e| Error::storage_write(ENTRIES_KEY, e.into()))?;
        self.backend
            .set(ENTRIES_KEY, &json)
            .map_err(|e| Error::storage_write(ENTRIES_KEY, e))?;
        debug!("Saved {} entries", entries.len());
        Ok(())
    }
}
