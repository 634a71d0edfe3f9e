//! Stratum Store - SQLite lifecycle, bootstrap and migrations
//!
//! Provides:
//! - Bundled asset access (`AssetSource`) and first-run template copy
//! - Transactional schema creation for registered tables and views
//! - File and code migrations over a `(old, new]` version window
//! - `OpenHelper` driving create / upgrade / open against a database file

pub mod assets;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod errors;
pub mod helper;
pub mod migrations;
pub mod schema;
pub mod transact;

// Re-export key types
pub use assets::{AssetSource, FsAssets, MemoryAssets, MIGRATION_PATH};
pub use bootstrap::{copy_bundled_database, BootstrapOutcome};
pub use config::DatabaseConfig;
pub use errors::Result;
pub use helper::{DatabaseListener, LifecycleAction, OpenHelper, OpenReport};
pub use migrations::{Migration, MigrationRegistry, MigrationReport};
pub use schema::{DatabaseStructure, ModelView, TableDefinition, TableStructure, ViewDefinition};
pub use transact::transact;
