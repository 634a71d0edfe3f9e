//! Stratum Core - storage-independent kernel of the migration engine
//!
//! This crate provides the pieces that never touch SQLite or the filesystem:
//! - Structured error facility (`ExError`, `ExErrorKind`, `StratumError`)
//! - Structured logging facility with test capture
//! - Natural-order comparison for migration file names
//! - Schema versions and the `(old, new]` migration window

pub mod errors;
pub mod logging_facility;
pub mod natural_order;
pub mod version;

pub use stratum_core_types::schema;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, StratumError};
pub use natural_order::{natural_cmp, sort_natural};
pub use version::{
    version_from_header, SchemaVersion, VersionWindow, MAX_SCHEMA_VERSION, NO_PRIOR_VERSION,
};
