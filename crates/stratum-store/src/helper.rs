//! Open helper
//!
//! Drives a database through its lifecycle. `open` seeds the file from the
//! bundled template, compares the stored schema version with the configured
//! one and runs the matching callback:
//!
//! - stored version 0: `on_create` over `(-1, version]`
//! - stored version below target: `on_upgrade` over `(stored, version]`
//! - stored version above target: refused with a downgrade error
//!
//! followed by `on_open`. Each callback notifies the listener first, then
//! enables foreign keys when configured, and only then touches the schema.
//! The callbacks are public so an embedder with its own open logic can call
//! them directly.

use crate::assets::{AssetSource, FsAssets, MemoryAssets};
use crate::bootstrap::{copy_bundled_database, BootstrapOutcome};
use crate::config::DatabaseConfig;
use crate::db;
use crate::errors::{io_error, Result};
use crate::migrations::{execute_migrations, MigrationRegistry, MigrationReport};
use crate::schema::{create_schema, DatabaseStructure};
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use stratum_core::errors::StratumError;
use stratum_core::{log_op_end, log_op_error, log_op_start};
use stratum_core::{SchemaVersion, VersionWindow};
use stratum_core_types::schema::{OP_ON_CREATE, OP_ON_OPEN, OP_ON_UPGRADE};
use stratum_core_types::PassId;
use tracing::info_span;

/// Hooks notified at each lifecycle callback, before the engine runs
///
/// An error returned from a hook aborts the callback.
pub trait DatabaseListener: Send + Sync {
    fn on_open(&self, _conn: &Connection) -> Result<()> {
        Ok(())
    }

    fn on_create(&self, _conn: &Connection) -> Result<()> {
        Ok(())
    }

    fn on_upgrade(
        &self,
        _conn: &Connection,
        _old_version: SchemaVersion,
        _new_version: SchemaVersion,
    ) -> Result<()> {
        Ok(())
    }
}

/// Which callback `open` chose
#[derive(Debug, Clone)]
pub enum LifecycleAction {
    /// The database had no schema and was created
    Created(MigrationReport),
    /// The database was upgraded from `from`
    Upgraded {
        from: SchemaVersion,
        report: MigrationReport,
    },
    /// The database was already at the configured version
    Opened,
}

/// Everything `open` did before handing out the connection
#[derive(Debug, Clone)]
pub struct OpenReport {
    /// `None` for in-memory databases
    pub bootstrap: Option<BootstrapOutcome>,
    pub action: LifecycleAction,
}

pub struct OpenHelper {
    config: DatabaseConfig,
    assets: Box<dyn AssetSource + Send + Sync>,
    registry: MigrationRegistry,
    structure: DatabaseStructure,
    listener: Option<Box<dyn DatabaseListener>>,
}

impl OpenHelper {
    pub fn new(config: DatabaseConfig, assets: impl AssetSource + Send + Sync + 'static) -> Self {
        Self {
            config,
            assets: Box::new(assets),
            registry: MigrationRegistry::empty(),
            structure: DatabaseStructure::new(),
            listener: None,
        }
    }

    /// Helper reading assets from the configured `asset_root`
    ///
    /// Without an asset root there is no template and no `migrations/`
    /// directory; both steps log and continue.
    pub fn from_config(config: DatabaseConfig) -> Self {
        match config.asset_root.clone() {
            Some(root) => Self::new(config, FsAssets::new(root)),
            None => Self::new(config, MemoryAssets::new()),
        }
    }

    /// Attach the code-migration registry
    pub fn with_migrations(mut self, registry: MigrationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Attach the tables and views created on every create/upgrade pass
    pub fn with_structure(mut self, structure: DatabaseStructure) -> Self {
        self.structure = structure;
        self
    }

    pub fn set_listener(&mut self, listener: Box<dyn DatabaseListener>) {
        self.listener = Some(listener);
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    pub fn assets(&self) -> &dyn AssetSource {
        self.assets.as_ref()
    }

    pub fn database_path(&self) -> PathBuf {
        self.config.database_path()
    }

    /// Open the on-disk database, creating or upgrading it as needed
    pub fn open(&self) -> Result<Connection> {
        self.open_with_report().map(|(conn, _)| conn)
    }

    /// `open`, also returning what was done
    pub fn open_with_report(&self) -> Result<(Connection, OpenReport)> {
        self.config.validate()?;
        let path = self.database_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error("create_database_dir", e))?;
        }

        let bootstrap = copy_bundled_database(&path, self.assets(), &self.config.name);
        let mut conn = db::open(&path)?;
        let action = self.drive(&mut conn)?;

        Ok((
            conn,
            OpenReport {
                bootstrap: Some(bootstrap),
                action,
            },
        ))
    }

    /// Run the lifecycle against a fresh in-memory database
    pub fn open_in_memory(&self) -> Result<(Connection, OpenReport)> {
        self.config.validate()?;
        let mut conn = db::open_in_memory()?;
        let action = self.drive(&mut conn)?;
        Ok((
            conn,
            OpenReport {
                bootstrap: None,
                action,
            },
        ))
    }

    fn drive(&self, conn: &mut Connection) -> Result<LifecycleAction> {
        let current = db::user_version(conn)?;
        let target = self.config.version;

        let action = if current == 0 {
            let report = self.on_create(conn)?;
            db::set_user_version(conn, target)?;
            LifecycleAction::Created(report)
        } else if current < target {
            let report = self.on_upgrade(conn, current, target)?;
            db::set_user_version(conn, target)?;
            LifecycleAction::Upgraded {
                from: current,
                report,
            }
        } else if current > target {
            return Err(StratumError::DowngradeRefused {
                current,
                requested: target,
            }
            .into());
        } else {
            LifecycleAction::Opened
        };

        self.on_open(conn)?;
        Ok(action)
    }

    /// Callback for a database that has just been opened
    pub fn on_open(&self, conn: &mut Connection) -> Result<()> {
        let pass_id = PassId::new();
        let span = info_span!("lifecycle", pass_id = %pass_id);
        let _enter = span.enter();

        let start = Instant::now();
        log_op_start!(OP_ON_OPEN);
        let result = self.open_pass(conn).map_err(|e| e.with_pass_id(pass_id.clone()));
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => {
                log_op_end!(OP_ON_OPEN, duration_ms = duration_ms);
            }
            Err(err) => {
                log_op_error!(OP_ON_OPEN, err, duration_ms = duration_ms);
            }
        }
        result
    }

    /// Callback for a database with no schema: builds everything up to the
    /// configured version
    pub fn on_create(&self, conn: &mut Connection) -> Result<MigrationReport> {
        let pass_id = PassId::new();
        let span = info_span!("lifecycle", pass_id = %pass_id);
        let _enter = span.enter();

        let start = Instant::now();
        log_op_start!(OP_ON_CREATE, new_version = self.config.version);
        let window = VersionWindow::fresh(self.config.version);
        let result = self
            .create_pass(conn, window)
            .map_err(|e| e.with_pass_id(pass_id.clone()));
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!(OP_ON_CREATE, duration_ms = duration_ms);
            }
            Err(err) => {
                log_op_error!(OP_ON_CREATE, err, duration_ms = duration_ms);
            }
        }
        result
    }

    /// Callback for a database stored at `old_version`
    pub fn on_upgrade(
        &self,
        conn: &mut Connection,
        old_version: SchemaVersion,
        new_version: SchemaVersion,
    ) -> Result<MigrationReport> {
        let pass_id = PassId::new();
        let span = info_span!("lifecycle", pass_id = %pass_id);
        let _enter = span.enter();

        let start = Instant::now();
        log_op_start!(
            OP_ON_UPGRADE,
            old_version = old_version,
            new_version = new_version
        );
        let result = self
            .upgrade_pass(conn, old_version, new_version)
            .map_err(|e| e.with_pass_id(pass_id.clone()));
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                log_op_end!(OP_ON_UPGRADE, duration_ms = duration_ms);
            }
            Err(err) => {
                log_op_error!(OP_ON_UPGRADE, err, duration_ms = duration_ms);
            }
        }
        result
    }

    fn open_pass(&self, conn: &mut Connection) -> Result<()> {
        if let Some(listener) = &self.listener {
            listener.on_open(conn)?;
        }
        db::enable_foreign_keys(conn, self.config.foreign_keys)?;
        Ok(())
    }

    fn create_pass(&self, conn: &mut Connection, window: VersionWindow) -> Result<MigrationReport> {
        if let Some(listener) = &self.listener {
            listener.on_create(conn)?;
        }
        db::enable_foreign_keys(conn, self.config.foreign_keys)?;
        create_schema(conn, &self.structure)?;
        execute_migrations(conn, self.assets(), &self.registry, window)
    }

    fn upgrade_pass(
        &self,
        conn: &mut Connection,
        old_version: SchemaVersion,
        new_version: SchemaVersion,
    ) -> Result<MigrationReport> {
        if let Some(listener) = &self.listener {
            listener.on_upgrade(conn, old_version, new_version)?;
        }
        db::enable_foreign_keys(conn, self.config.foreign_keys)?;
        create_schema(conn, &self.structure)?;
        execute_migrations(
            conn,
            self.assets(),
            &self.registry,
            VersionWindow::upgrade(old_version, new_version),
        )
    }
}

impl std::fmt::Debug for OpenHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenHelper")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("structure", &self.structure)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}
