//! Core entry types for paintrack.
//!
//! A [`PainEntry`] is one recorded observation: which body part hurt, how
//! much, and when. Entries are created once and never edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Highest pain level on the 0-10 scale.
pub const MAX_PAIN_LEVEL: u8 = 10;

/// Pain level preselected for a new entry.
pub const DEFAULT_PAIN_LEVEL: u8 = 5;

/// A single recorded pain observation.
///
/// Serialized with the camelCase field names of the stored JSON blob
/// (`id`, `bodyPart`, `painLevel`, `timestamp`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PainEntry {
    /// Unique identifier, generated at creation.
    pub id: String,

    /// The body part affected.
    pub body_part: String,

    /// Intensity from 0 (no pain) to 10 (worst pain).
    pub pain_level: u8,

    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl PainEntry {
    /// Create an entry with a fresh id and the given fields.
    #[must_use]
    pub fn new(body_part: impl Into<String>, pain_level: u8, timestamp: i64) -> Self {
        Self {
            id: new_entry_id(),
            body_part: body_part.into(),
            pain_level,
            timestamp,
        }
    }

    /// Record an entry from user input, stamped with the current time.
    ///
    /// The body part is trimmed and must not be blank; the level must be on
    /// the 0-10 scale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntry`] with a message suitable for the user.
    pub fn record(body_part: &str, pain_level: u8) -> Result<Self> {
        let body_part = body_part.trim();
        if body_part.is_empty() {
            return Err(Error::invalid_entry("Please enter a body part"));
        }
        if pain_level > MAX_PAIN_LEVEL {
            return Err(Error::invalid_entry(format!(
                "Pain level must be between 0 and {MAX_PAIN_LEVEL}, got {pain_level}"
            )));
        }
        Ok(Self::new(body_part, pain_level, Utc::now().timestamp_millis()))
    }

    /// The creation time as a UTC datetime, if the timestamp is in range.
    #[must_use]
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Severity bucket for this entry's pain level.
    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::from_level(self.pain_level)
    }
}

/// Generate a new opaque entry id.
#[must_use]
pub fn new_entry_id() -> String {
    Uuid::new_v4().to_string()
}

/// Coarse classification of a pain level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Levels 0 through 3.
    Mild,
    /// Levels 4 through 6.
    Moderate,
    /// Levels 7 and above.
    Severe,
}

impl Severity {
    /// Classify a pain level.
    #[must_use]
    pub fn from_level(level: u8) -> Self {
        match level {
            0..=3 => Self::Mild,
            4..=6 => Self::Moderate,
            _ => Self::Severe,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mild => write!(f, "Mild"),
            Self::Moderate => write!(f, "Moderate"),
            Self::Severe => write!(f, "Severe"),
        }
    }
}

/// Sort entries for display, newest first.
///
/// The sort is stable, so entries sharing a timestamp keep insertion order.
pub fn sort_by_recent(entries: &mut [PainEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
