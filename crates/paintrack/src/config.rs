//! Configuration management for paintrack.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::csv::{DateZone, EXPORT_FILE_NAME};
use crate::entry::{DEFAULT_PAIN_LEVEL, MAX_PAIN_LEVEL};
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "paintrack";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "paintrack.db";

/// Widest UTC offset in use anywhere, in minutes.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PAINTRACK_`, `__` between sections)
/// 2. TOML config file at `~/.config/paintrack/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// CSV export/import configuration.
    pub export: ExportConfig,
    /// New entry configuration.
    pub entry: EntryConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/paintrack/paintrack.db`
    pub database_path: Option<PathBuf>,
}

/// CSV export/import configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name used when no export path is given.
    pub file_name: String,
    /// Fixed UTC offset for the date column, in minutes east of UTC.
    /// Unset means the system's local zone.
    pub utc_offset_minutes: Option<i32>,
}

/// Defaults for newly recorded entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryConfig {
    /// Pain level used when none is given.
    pub default_pain_level: u8,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level used when neither `RUST_LOG` nor `-q`/`-v` is given
    /// (`error`, `warn`, `info`, `debug` or `trace`).
    pub level: Option<String>,
    /// Include the event target in log lines.
    pub show_targets: bool,
}

impl LoggingConfig {
    /// The configured level, if set and valid.
    #[must_use]
    pub fn level(&self) -> Option<tracing::Level> {
        self.level.as_deref().and_then(|level| level.parse().ok())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: EXPORT_FILE_NAME.to_string(),
            utc_offset_minutes: None,
        }
    }
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            default_pain_level: DEFAULT_PAIN_LEVEL,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("PAINTRACK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let file_name = self.export.file_name.trim();
        if file_name.is_empty() {
            return Err(Error::ConfigValidation {
                message: "export.file_name must not be empty".to_string(),
            });
        }
        if !has_csv_extension(file_name) {
            return Err(Error::ConfigValidation {
                message: format!("export.file_name ({file_name}) must end in .csv"),
            });
        }

        if let Some(minutes) = self.export.utc_offset_minutes {
            if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "export.utc_offset_minutes ({minutes}) must be within +/-{MAX_UTC_OFFSET_MINUTES}"
                    ),
                });
            }
        }

        if let Some(level) = &self.logging.level {
            if level.parse::<tracing::Level>().is_err() {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "logging.level ({level}) must be one of error, warn, info, debug, trace"
                    ),
                });
            }
        }

        if self.entry.default_pain_level > MAX_PAIN_LEVEL {
            return Err(Error::ConfigValidation {
                message: format!(
                    "entry.default_pain_level ({}) must be at most {MAX_PAIN_LEVEL}",
                    self.entry.default_pain_level
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the zone used for the CSV date column.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured offset is not a valid UTC offset.
    pub fn date_zone(&self) -> Result<DateZone> {
        DateZone::from_offset_minutes(self.export.utc_offset_minutes)
    }
}

/// Check for a `.csv` extension, ignoring case.
pub(crate) fn has_csv_extension(path: impl AsRef<std::path::Path>) -> bool {
    path.as_ref()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.export.file_name, "pain_history.csv");
        assert!(config.export.utc_offset_minutes.is_none());
        assert_eq!(config.entry.default_pain_level, 5);
        assert!(config.logging.level.is_none());
        assert!(!config.logging.show_targets);
    }

    #[test]
    fn test_validate_logging_level() {
        let mut config = Config::default();
        config.logging.level = Some("DEBUG".to_string());
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level(), Some(tracing::Level::DEBUG));

        config.logging.level = Some("loud".to_string());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("logging.level"));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_file_name() {
        let mut config = Config::default();
        config.export.file_name = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("export.file_name"));
    }

    #[test]
    fn test_validate_non_csv_file_name() {
        let mut config = Config::default();
        config.export.file_name = "history.txt".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains(".csv"));
    }

    #[test]
    fn test_validate_uppercase_extension() {
        let mut config = Config::default();
        config.export.file_name = "HISTORY.CSV".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_offset_range() {
        let mut config = Config::default();
        config.export.utc_offset_minutes = Some(-14 * 60);
        assert!(config.validate().is_ok());

        config.export.utc_offset_minutes = Some(15 * 60);
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("utc_offset_minutes"));
    }

    #[test]
    fn test_validate_default_pain_level() {
        let mut config = Config::default();
        config.entry.default_pain_level = 11;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_pain_level"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("paintrack.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/pain.db"));

        assert_eq!(config.database_path(), PathBuf::from("/custom/path/pain.db"));
    }

    #[test]
    fn test_date_zone() {
        let mut config = Config::default();
        assert_eq!(config.date_zone().unwrap(), DateZone::Local);

        config.export.utc_offset_minutes = Some(0);
        assert_eq!(config.date_zone().unwrap(), DateZone::utc());
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("paintrack"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_default_data_dir() {
        let path = Config::default_data_dir();
        assert!(path.to_string_lossy().contains("paintrack"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[storage]\ndatabase_path = \"/data/pain.db\"\n\n[export]\nutc_offset_minutes = 120\n\n[entry]\ndefault_pain_level = 3\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/data/pain.db"));
        assert_eq!(config.export.utc_offset_minutes, Some(120));
        assert_eq!(config.export.file_name, "pain_history.csv");
        assert_eq!(config.entry.default_pain_level, 3);
        assert_eq!(config.logging.level(), Some(tracing::Level::WARN));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[entry]\ndefault_pain_level = 42\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_has_csv_extension() {
        assert!(has_csv_extension("pain_history.csv"));
        assert!(has_csv_extension("/tmp/Export.CSV"));
        assert!(!has_csv_extension("pain_history.txt"));
        assert!(!has_csv_extension("csv"));
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("default_pain_level"));
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
