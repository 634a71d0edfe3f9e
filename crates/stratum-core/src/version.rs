//! Schema versions and the migration window

use crate::errors::{Result, StratumError};

/// A schema version as stored in the database header
pub type SchemaVersion = u32;

/// Sentinel for "no prior database" used as the lower bound of a fresh install
pub const NO_PRIOR_VERSION: i64 = -1;

/// Largest version the database header can store (a signed 32-bit field)
pub const MAX_SCHEMA_VERSION: SchemaVersion = i32::MAX as SchemaVersion;

/// Check a raw header value read back from the database
///
/// # Errors
///
/// Negative values cannot have been written by this engine and are
/// rejected rather than read as "no schema".
pub fn version_from_header(raw: i64) -> Result<SchemaVersion> {
    match SchemaVersion::try_from(raw) {
        Ok(version) if version <= MAX_SCHEMA_VERSION => Ok(version),
        _ => Err(StratumError::InvalidVersion {
            version: raw,
            reason: format!("stored version must be between 0 and {}", MAX_SCHEMA_VERSION),
        }),
    }
}

/// Half-open version range `(old, new]` selecting which migrations are due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionWindow {
    old: i64,
    new: SchemaVersion,
}

impl VersionWindow {
    /// Window for a freshly created database: `(-1, new]`
    pub fn fresh(new: SchemaVersion) -> Self {
        Self {
            old: NO_PRIOR_VERSION,
            new,
        }
    }

    /// Window for an upgrade from an existing version
    pub fn upgrade(old: SchemaVersion, new: SchemaVersion) -> Self {
        Self {
            old: i64::from(old),
            new,
        }
    }

    /// Exclusive lower bound
    pub fn old(&self) -> i64 {
        self.old
    }

    /// Inclusive upper bound
    pub fn new_version(&self) -> SchemaVersion {
        self.new
    }

    /// True iff `old < version <= new`
    pub fn contains(&self, version: i64) -> bool {
        self.old < version && version <= i64::from(self.new)
    }

    /// True when no version falls inside the window
    pub fn is_empty(&self) -> bool {
        self.old >= i64::from(self.new)
    }
}

impl std::fmt::Display for VersionWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}]", self.old, self.new)
    }
}
