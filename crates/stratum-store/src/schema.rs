//! Schema creator
//!
//! Executes the creation statement of every registered table and view in a
//! single transaction. Runs on every create and every upgrade pass, so the
//! statements must be safe to repeat (`IF NOT EXISTS`).

use crate::errors::{from_rusqlite, Result};
use crate::transact::transact;
use rusqlite::Connection;
use std::time::Instant;
use stratum_core::{log_op_end, log_op_error, log_op_start};
use stratum_core_types::schema::OP_CREATE_SCHEMA;

/// A table known to the application
pub trait TableStructure {
    /// Table name, used for logging
    fn table_name(&self) -> &str;

    /// Full `CREATE TABLE` statement
    fn creation_query(&self) -> String;
}

/// A read-only view known to the application
pub trait ModelView {
    /// View name
    fn view_name(&self) -> &str;

    /// The `SELECT` the view is defined as
    fn query(&self) -> String;

    /// Full `CREATE VIEW` statement
    fn creation_query(&self) -> String {
        format!(
            "CREATE VIEW IF NOT EXISTS {} AS {}",
            self.view_name(),
            self.query()
        )
    }
}

/// Table described by its name and creation statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    name: String,
    sql: String,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

impl TableStructure for TableDefinition {
    fn table_name(&self) -> &str {
        &self.name
    }

    fn creation_query(&self) -> String {
        self.sql.clone()
    }
}

/// View described by its name and defining query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDefinition {
    name: String,
    query: String,
}

impl ViewDefinition {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
        }
    }
}

impl ModelView for ViewDefinition {
    fn view_name(&self) -> &str {
        &self.name
    }

    fn query(&self) -> String {
        self.query.clone()
    }
}

/// Every table and view the database should contain
#[derive(Default)]
pub struct DatabaseStructure {
    tables: Vec<Box<dyn TableStructure + Send + Sync>>,
    views: Vec<Box<dyn ModelView + Send + Sync>>,
}

impl DatabaseStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table
    pub fn table(mut self, table: impl TableStructure + Send + Sync + 'static) -> Self {
        self.tables.push(Box::new(table));
        self
    }

    /// Register a view
    pub fn view(mut self, view: impl ModelView + Send + Sync + 'static) -> Self {
        self.views.push(Box::new(view));
        self
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.views.is_empty()
    }

    /// Creation statements in execution order: tables, then views
    pub fn creation_statements(&self) -> Vec<String> {
        self.tables
            .iter()
            .map(|t| t.creation_query())
            .chain(self.views.iter().map(|v| v.creation_query()))
            .collect()
    }
}

impl std::fmt::Debug for DatabaseStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseStructure")
            .field(
                "tables",
                &self.tables.iter().map(|t| t.table_name()).collect::<Vec<_>>(),
            )
            .field(
                "views",
                &self.views.iter().map(|v| v.view_name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Create every registered table and view in one transaction
///
/// Any failing statement rolls the whole batch back; no table or view from
/// the batch survives.
pub fn create_schema(conn: &mut Connection, structure: &DatabaseStructure) -> Result<()> {
    let start = Instant::now();
    log_op_start!(
        OP_CREATE_SCHEMA,
        tables = structure.table_count(),
        views = structure.view_count()
    );

    let result = transact(conn, |tx| {
        for statement in structure.creation_statements() {
            tx.execute_batch(&statement).map_err(from_rusqlite)?;
        }
        Ok(())
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(()) => {
            log_op_end!(OP_CREATE_SCHEMA, duration_ms = duration_ms);
        }
        Err(err) => {
            log_op_error!(OP_CREATE_SCHEMA, err, duration_ms = duration_ms);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn object_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'view') ORDER BY name")
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<String>, _>>()
            .unwrap();
        names
    }

    fn users_and_posts() -> DatabaseStructure {
        DatabaseStructure::new()
            .table(TableDefinition::new(
                "users",
                "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
            ))
            .table(TableDefinition::new(
                "posts",
                "CREATE TABLE IF NOT EXISTS posts (id INTEGER PRIMARY KEY, \
                 user_id INTEGER NOT NULL REFERENCES users(id))",
            ))
            .view(ViewDefinition::new(
                "user_names",
                "SELECT name FROM users",
            ))
    }

    #[test]
    fn test_view_creation_query() {
        let view = ViewDefinition::new("active", "SELECT * FROM users");
        assert_eq!(
            view.creation_query(),
            "CREATE VIEW IF NOT EXISTS active AS SELECT * FROM users"
        );
    }

    #[test]
    fn test_create_schema() {
        let mut conn = open_in_memory().unwrap();
        create_schema(&mut conn, &users_and_posts()).unwrap();
        assert_eq!(object_names(&conn), vec!["posts", "user_names", "users"]);
    }

    #[test]
    fn test_create_schema_is_repeatable() {
        let mut conn = open_in_memory().unwrap();
        let structure = users_and_posts();
        create_schema(&mut conn, &structure).unwrap();
        create_schema(&mut conn, &structure).unwrap();
        assert_eq!(object_names(&conn).len(), 3);
    }

    #[test]
    fn test_failing_last_statement_rolls_back_batch() {
        let mut conn = open_in_memory().unwrap();
        let structure = users_and_posts().view(ViewDefinition::new("broken", "SELECT FROM"));

        let result = create_schema(&mut conn, &structure);

        assert!(result.is_err());
        assert!(object_names(&conn).is_empty());
    }

    #[test]
    fn test_empty_structure() {
        let mut conn = open_in_memory().unwrap();
        let structure = DatabaseStructure::new();
        assert!(structure.is_empty());
        create_schema(&mut conn, &structure).unwrap();
    }
}
