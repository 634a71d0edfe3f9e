//! Error handling for stratum-store
//!
//! Wraps stratum-core ExError with store-specific helpers

use stratum_core::errors::{ExError, ExErrorKind, StratumError};
use stratum_core::SchemaVersion;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a file-migration error for a failing script statement
pub fn migration_error(file: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("file_migration")
        .with_file(file)
        .with_message(format!("Migration {} failed: {}", file, reason))
}

/// Wrap a failure raised by one stage of a code migration
pub fn code_migration_error(version: SchemaVersion, stage: &str, source: ExError) -> ExError {
    ExError::from(StratumError::MigrationFailed {
        version,
        reason: format!("Code migration failed during {}", stage),
    })
    .with_op(stage.to_string())
    .with_source(source)
}

/// Create a configuration error
pub fn config_error(reason: impl Into<String>) -> ExError {
    StratumError::InvalidConfig {
        reason: reason.into(),
    }
    .into()
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
///
/// A missing file maps to `NotFound` so callers can tell an absent asset
/// apart from a failing disk.
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    let kind = match err.kind() {
        std::io::ErrorKind::NotFound => ExErrorKind::NotFound,
        _ => ExErrorKind::Io,
    };
    ExError::new(kind)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
