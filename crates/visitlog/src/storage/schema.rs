//! `SQLite` schema definitions for visitlog.
//!
//! The database is a plain key/value table. Each value is a JSON document
//! written in full on every update. The layout carries a version number in
//! `metadata` so an older binary refuses a database written by a newer one
//! instead of misreading it.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};

/// Layout version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata key holding the layout version.
const VERSION_KEY: &str = "schema_version";

/// SQL statement to create the entries table.
pub const CREATE_ENTRIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_ENTRIES_TABLE, CREATE_METADATA_TABLE];

/// Create the tables if missing and check the stored layout version.
///
/// A fresh database is stamped with [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns [`Error::UnsupportedSchema`] if the database was written with a
/// different layout, or a query error if the tables cannot be created.
pub fn initialize(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        None => {
            conn.execute(
                "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
                (VERSION_KEY, SCHEMA_VERSION.to_string()),
            )?;
            debug!(version = SCHEMA_VERSION, "Stamped new database");
            Ok(())
        }
        Some(found) if found.parse::<u32>().ok() == Some(SCHEMA_VERSION) => Ok(()),
        Some(found) => Err(Error::UnsupportedSchema {
            found,
            supported: SCHEMA_VERSION,
        }),
    }
}
