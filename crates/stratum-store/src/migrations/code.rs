//! Code-based migrations
//!
//! A code migration is bound to one target version and runs its three
//! lifecycle hooks in order: `on_pre_migrate`, `migrate`, `on_post_migrate`.
//! The registry maps each version to its migrations in registration order
//! and is frozen once built.

use crate::errors::Result;
use rusqlite::Connection;
use std::collections::BTreeMap;
use stratum_core::SchemaVersion;

/// A unit of programmatic migration work
///
/// The runner does not wrap these calls in a transaction; a migration that
/// needs atomicity opens its own.
pub trait Migration: Send + Sync {
    /// Called before `migrate`
    fn on_pre_migrate(&self) -> Result<()> {
        Ok(())
    }

    /// Perform the migration against the open database
    fn migrate(&self, conn: &Connection) -> Result<()>;

    /// Called after `migrate` succeeded
    fn on_post_migrate(&self) -> Result<()> {
        Ok(())
    }

    /// Short name for logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Migration running a fixed list of statements, one `execute_batch` each
#[derive(Debug, Clone)]
pub struct SqlMigration {
    name: String,
    statements: Vec<String>,
}

impl SqlMigration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statements: Vec::new(),
        }
    }

    /// Append a statement
    pub fn statement(mut self, sql: impl Into<String>) -> Self {
        self.statements.push(sql.into());
        self
    }
}

impl Migration for SqlMigration {
    fn migrate(&self, conn: &Connection) -> Result<()> {
        for sql in &self.statements {
            conn.execute_batch(sql)
                .map_err(crate::errors::from_rusqlite)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Migration backed by a closure
pub struct FnMigration<F> {
    name: String,
    func: F,
}

impl<F> FnMigration<F>
where
    F: Fn(&Connection) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Migration for FnMigration<F>
where
    F: Fn(&Connection) -> Result<()> + Send + Sync,
{
    fn migrate(&self, conn: &Connection) -> Result<()> {
        (self.func)(conn)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Immutable mapping from version to the migrations targeting it
#[derive(Default)]
pub struct MigrationRegistry {
    by_version: BTreeMap<SchemaVersion, Vec<Box<dyn Migration>>>,
}

impl MigrationRegistry {
    /// Start building a registry
    pub fn builder() -> MigrationRegistryBuilder {
        MigrationRegistryBuilder::default()
    }

    /// An empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Migrations registered for `version`, in registration order
    pub fn get(&self, version: SchemaVersion) -> &[Box<dyn Migration>] {
        self.by_version
            .get(&version)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Versions that have at least one migration, ascending
    pub fn versions(&self) -> impl Iterator<Item = SchemaVersion> + '_ {
        self.by_version.keys().copied()
    }

    /// Total number of registered migrations
    pub fn len(&self) -> usize {
        self.by_version.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_version.is_empty()
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (version, migrations) in &self.by_version {
            let names: Vec<&str> = migrations.iter().map(|m| m.name()).collect();
            map.entry(version, &names);
        }
        map.finish()
    }
}

/// Builder collecting migrations before the registry is frozen
#[derive(Default)]
pub struct MigrationRegistryBuilder {
    by_version: BTreeMap<SchemaVersion, Vec<Box<dyn Migration>>>,
}

impl MigrationRegistryBuilder {
    /// Register a migration for `version`, after any already registered there
    pub fn add(mut self, version: SchemaVersion, migration: impl Migration + 'static) -> Self {
        self.by_version
            .entry(version)
            .or_default()
            .push(Box::new(migration));
        self
    }

    pub fn build(self) -> MigrationRegistry {
        MigrationRegistry {
            by_version: self.by_version,
        }
    }
}
