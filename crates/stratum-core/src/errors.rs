use stratum_core_types::PassId;
use thiserror::Error;

/// Result type alias using StratumError
pub type Result<T> = std::result::Result<T, StratumError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and log assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Structural/Validation
    InvalidVersion,
    InvalidMigrationName,
    Config,

    // Lifecycle
    /// The on-disk database is newer than the requested schema version
    Downgrade,
    /// A code migration reported failure; the upgrade pass was aborted
    Migration,

    // Integration/IO
    NotFound,
    Io,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidVersion => "ERR_INVALID_VERSION",
            ExErrorKind::InvalidMigrationName => "ERR_INVALID_MIGRATION_NAME",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Downgrade => "ERR_DOWNGRADE",
            ExErrorKind::Migration => "ERR_MIGRATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and context
/// (operation, schema version, migration file) for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    version: Option<i64>,
    file: Option<String>,
    pass_id: Option<PassId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            version: None,
            file: None,
            pass_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add schema version context
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    /// Add migration file context
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Add lifecycle pass correlation
    pub fn with_pass_id(mut self, pass_id: PassId) -> Self {
        self.pass_id = Some(pass_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the schema version context, if any
    pub fn version(&self) -> Option<i64> {
        self.version
    }

    /// Get the migration file context, if any
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Get the pass correlation id, if any
    pub fn pass_id(&self) -> Option<&PassId> {
        self.pass_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(file) = &self.file {
            write!(f, " (file: {})", file)?;
        }
        if let Some(version) = self.version {
            write!(f, " (version: {})", version)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for conditions raised by the migration engine itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StratumError {
    /// Migration script name does not parse as an integer version
    #[error("Invalid migration file name: {file}")]
    InvalidMigrationName { file: String },

    /// Version outside the representable window
    #[error("Invalid schema version {version}: {reason}")]
    InvalidVersion { version: i64, reason: String },

    /// On-disk database is newer than the requested version
    #[error("Cannot downgrade database from version {current} to {requested}")]
    DowngradeRefused { current: u32, requested: u32 },

    /// Bundled asset could not be located
    #[error("Asset not found: {name}")]
    AssetNotFound { name: String },

    /// Code migration reported failure
    #[error("Migration to version {version} failed: {reason}")]
    MigrationFailed { version: u32, reason: String },

    /// Configuration rejected during validation or parsing
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<StratumError> for ExError {
    fn from(err: StratumError) -> Self {
        match err {
            StratumError::InvalidMigrationName { file } => {
                ExError::new(ExErrorKind::InvalidMigrationName)
                    .with_op("parse_script_version")
                    .with_file(file)
                    .with_message("File name does not parse as an integer version")
            }

            StratumError::InvalidVersion { version, reason } => {
                ExError::new(ExErrorKind::InvalidVersion)
                    .with_version(version)
                    .with_message(reason)
            }

            StratumError::DowngradeRefused { current, requested } => {
                ExError::new(ExErrorKind::Downgrade)
                    .with_op("open")
                    .with_version(i64::from(current))
                    .with_message(format!(
                        "Database is at version {} but version {} was requested",
                        current, requested
                    ))
            }

            StratumError::AssetNotFound { name } => ExError::new(ExErrorKind::NotFound)
                .with_op("open_asset")
                .with_file(name)
                .with_message("Asset not found"),

            StratumError::MigrationFailed { version, reason } => {
                ExError::new(ExErrorKind::Migration)
                    .with_version(i64::from(version))
                    .with_message(reason)
            }

            StratumError::InvalidConfig { reason } => ExError::new(ExErrorKind::Config)
                .with_op("load_config")
                .with_message(reason),
        }
    }
}
