//! Database connection management
//!
//! Provides utilities for opening SQLite connections and reading or writing
//! the schema version kept in the database header.

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;
use stratum_core::errors::StratumError;
use stratum_core::{version_from_header, SchemaVersion, MAX_SCHEMA_VERSION};
use tracing::info;

/// Statement enabling referential-integrity enforcement
pub const FOREIGN_KEYS_ON: &str = "PRAGMA foreign_keys=ON;";

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Turn on foreign-key enforcement when `enabled`
///
/// Returns whether the pragma was issued. Pragmas are not transaction
/// scoped, so this runs outside any batch.
pub fn enable_foreign_keys(conn: &Connection, enabled: bool) -> Result<bool> {
    if !enabled {
        return Ok(false);
    }
    conn.execute_batch(FOREIGN_KEYS_ON).map_err(from_rusqlite)?;
    info!("Foreign Keys supported. Enabling foreign key features.");
    Ok(true)
}

/// Whether foreign-key enforcement is currently on for this connection
pub fn foreign_keys_enabled(conn: &Connection) -> Result<bool> {
    let on: i64 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .map_err(from_rusqlite)?;
    Ok(on == 1)
}

/// Read the schema version stored in the database header
///
/// # Errors
///
/// A negative header value is reported as `InvalidVersion`.
pub fn user_version(conn: &Connection) -> Result<SchemaVersion> {
    let raw: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(from_rusqlite)?;
    Ok(version_from_header(raw)?)
}

/// Write the schema version into the database header
///
/// # Errors
///
/// Versions above `MAX_SCHEMA_VERSION` do not fit the header and are
/// rejected before anything is written.
pub fn set_user_version(conn: &Connection, version: SchemaVersion) -> Result<()> {
    if version > MAX_SCHEMA_VERSION {
        return Err(StratumError::InvalidVersion {
            version: i64::from(version),
            reason: format!("version must not exceed {}", MAX_SCHEMA_VERSION),
        }
        .into());
    }
    conn.pragma_update(None, "user_version", version)
        .map_err(from_rusqlite)
}
