//! Database configuration
//!
//! Declarative settings for one database, loadable from TOML:
//!
//! ```toml
//! name = "app.db"
//! version = 3
//! foreign_keys = true
//! asset_root = "assets"
//! database_dir = "data"
//! ```
//!
//! Code migrations cannot be written in TOML and are attached to the
//! `OpenHelper` instead.

use crate::errors::{config_error, io_error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use stratum_core::{SchemaVersion, MAX_SCHEMA_VERSION};

fn default_database_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Settings for one database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database file name, also the name of the bundled template
    pub name: String,
    /// Target schema version
    pub version: SchemaVersion,
    /// Enable `PRAGMA foreign_keys` on every lifecycle callback
    #[serde(default)]
    pub foreign_keys: bool,
    /// Root of the bundled assets (template database and `migrations/`)
    #[serde(default)]
    pub asset_root: Option<PathBuf>,
    /// Directory the database file lives in
    #[serde(default = "default_database_dir")]
    pub database_dir: PathBuf,
}

impl DatabaseConfig {
    pub fn new(name: impl Into<String>, version: SchemaVersion) -> Self {
        Self {
            name: name.into(),
            version,
            foreign_keys: false,
            asset_root: None,
            database_dir: default_database_dir(),
        }
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    pub fn with_database_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.database_dir = dir.into();
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| config_error(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    ///
    /// Relative `asset_root` and `database_dir` paths are resolved against
    /// the directory containing the file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| io_error("load_config", e).with_file(path.display().to_string()))?;
        let mut config = Self::from_toml_str(&text)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if let Some(root) = config.asset_root.take() {
            config.asset_root = Some(resolve(base, root));
        }
        config.database_dir = resolve(base, std::mem::take(&mut config.database_dir));
        Ok(config)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(config_error("Database name must not be empty"));
        }
        if self.name.contains('/') || self.name.contains('\\') {
            return Err(config_error(format!(
                "Database name must be a bare file name: {}",
                self.name
            )));
        }
        if self.version == 0 {
            return Err(config_error("Database version must be at least 1"));
        }
        if self.version > MAX_SCHEMA_VERSION {
            return Err(config_error(format!(
                "Database version must not exceed {}",
                MAX_SCHEMA_VERSION
            )));
        }
        Ok(())
    }

    /// Full path of the database file
    pub fn database_path(&self) -> PathBuf {
        self.database_dir.join(&self.name)
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
