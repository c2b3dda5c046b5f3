//! Storage layer for paintrack.
//!
//! Durable state lives in a small key-value store. [`KeyValueStore`] is the
//! seam; [`SqliteStore`] is the on-device implementation and [`MemoryStore`]
//! backs tests. [`EntryStore`] keeps the entry collection under one key.

pub mod entries;
pub mod schema;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use entries::{EntryStore, ENTRIES_KEY};

/// A durable string-to-string store.
///
/// Implementations must make [`set`](KeyValueStore::set) atomic: a reader
/// sees either the previous value or the new one, never a partial write.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read the value under `key`, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// `SQLite`-backed key-value store.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the database file in bytes (0 for in-memory stores).
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map_or(0, |m| m.len())
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("database connection lock poisoned"))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row(schema::SELECT_VALUE, [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(schema::UPSERT_VALUE, (key, value))?;
        debug!("Stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }
}

/// Create all tables if they don't exist.
fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in schema::SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}

/// Volatile key-value store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| Error::internal("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_store(store: &dyn KeyValueStore) {
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("k", "first").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("first"));

        store.set("k", "second").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("second"));
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[test]
    fn test_sqlite_store_in_memory() {
        let store = SqliteStore::open_in_memory().unwrap();
        exercise_store(&store);
        assert_eq!(store.path().to_string_lossy(), ":memory:");
        assert_eq!(store.size_bytes(), 0);
    }

    #[test]
    fn test_memory_store() {
        exercise_store(&MemoryStore::new());
    }

    #[test]
    fn test_unicode_values() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set("k", "Knöchel 膝 🦵").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("Knöchel 膝 🦵"));
    }

    #[test]
    fn test_open_file_based_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("paintrack.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.set("k", "durable").unwrap();
            assert_eq!(store.path(), db_path);
            assert!(store.size_bytes() > 0);
        }

        let reopened = SqliteStore::open(&db_path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("durable"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested_path = dir.path().join("nested/deeper/paintrack.db");

        let _store = SqliteStore::open(&nested_path).unwrap();
        assert!(nested_path.exists());
    }
}
