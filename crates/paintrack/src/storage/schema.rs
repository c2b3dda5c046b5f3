//! `SQLite` schema definitions for paintrack.
//!
//! The database is a plain key-value table; each value is an opaque text
//! blob owned by whichever component uses the key.

/// SQL statement to create the key-value table.
pub const CREATE_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Insert a value, replacing any existing value for the key in one statement.
pub const UPSERT_VALUE: &str = r"
INSERT INTO kv_store (key, value) VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')
";

/// Fetch the value stored under a key.
pub const SELECT_VALUE: &str = "SELECT value FROM kv_store WHERE key = ?1";

/// All schema statements in order of execution.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_KV_TABLE];
