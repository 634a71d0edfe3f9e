//! Migration runner
//!
//! Brings a database across the version window `(old, new]` in two phases:
//!
//! - **Phase A** runs the numbered scripts under `migrations/` in natural
//!   order, all inside one transaction. Problems here are logged and never
//!   propagated: an unlistable directory skips the phase, a badly named file
//!   is skipped, a failing statement rolls the whole phase back.
//! - **Phase B** runs the registered code migrations in ascending version
//!   order, registration order within a version, without a shared
//!   transaction. The first failure aborts the pass and is returned.

use crate::assets::{AssetSource, MIGRATION_PATH};
use crate::errors::{code_migration_error, io_error, Result};
use crate::migrations::code::{Migration, MigrationRegistry};
use crate::migrations::script::{execute_sql_script, parse_script_version};
use crate::transact::transact;
use rusqlite::Connection;
use serde::Serialize;
use std::time::Instant;
use stratum_core::errors::{ExError, ExErrorKind, StratumError};
use stratum_core::{log_op_end, log_op_error, log_op_start, sort_natural};
use stratum_core::{SchemaVersion, VersionWindow};
use stratum_core_types::schema::{OP_CODE_MIGRATIONS, OP_FILE_MIGRATIONS};
use tracing::{error, info, warn};

/// How one script file relates to a version window
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptDisposition {
    /// Version inside the window; the script must run
    Due(i64),
    /// Valid version outside the window; silently ignored
    OutOfWindow(i64),
    /// Name does not parse as a version; skipped with a warning
    Invalid(StratumError),
}

/// Classify a script file name against a window
pub fn classify_script(file: &str, window: VersionWindow) -> ScriptDisposition {
    match parse_script_version(file) {
        Ok(version) if window.contains(version) => ScriptDisposition::Due(version),
        Ok(version) => ScriptDisposition::OutOfWindow(version),
        Err(err) => ScriptDisposition::Invalid(err),
    }
}

/// A script file together with its parsed version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedScript {
    pub file: String,
    pub version: i64,
}

/// What Phase A would do for a window, without touching a database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    /// Scripts that would run, in execution order
    pub due: Vec<PlannedScript>,
    /// Scripts outside the window
    pub out_of_window: Vec<PlannedScript>,
    /// File names that do not parse as a version
    pub invalid: Vec<String>,
}

/// List and classify the migration scripts for a window
pub fn plan_file_migrations(assets: &dyn AssetSource, window: VersionWindow) -> Result<MigrationPlan> {
    let mut files = assets
        .list(MIGRATION_PATH)
        .map_err(|e| io_error("list_migrations", e))?;
    sort_natural(&mut files);

    let mut plan = MigrationPlan::default();
    for file in files {
        match classify_script(&file, window) {
            ScriptDisposition::Due(version) => plan.due.push(PlannedScript { file, version }),
            ScriptDisposition::OutOfWindow(version) => {
                plan.out_of_window.push(PlannedScript { file, version })
            }
            ScriptDisposition::Invalid(_) => plan.invalid.push(file),
        }
    }
    Ok(plan)
}

/// A script applied by Phase A
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedScript {
    pub file: String,
    pub version: i64,
    pub checksum: String,
}

/// A code migration completed by Phase B
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub version: SchemaVersion,
    pub name: String,
}

/// Final state of Phase A
#[derive(Debug, Clone)]
pub enum FilePhaseStatus {
    /// The batch committed
    Committed,
    /// The migration directory could not be listed; nothing ran
    ListingFailed,
    /// A statement failed; every script of the batch was rolled back
    RolledBack(ExError),
}

/// Outcome of Phase A
#[derive(Debug, Clone)]
pub struct FileMigrationReport {
    pub status: FilePhaseStatus,
    /// Scripts whose statements are committed
    pub applied: Vec<AppliedScript>,
    /// Files skipped because their name is not a version
    pub invalid: Vec<String>,
    /// Due scripts that could not be read and were skipped
    pub unreadable: Vec<String>,
}

impl FileMigrationReport {
    fn listing_failed() -> Self {
        Self {
            status: FilePhaseStatus::ListingFailed,
            applied: Vec::new(),
            invalid: Vec::new(),
            unreadable: Vec::new(),
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self.status, FilePhaseStatus::Committed)
    }
}

/// Outcome of a full migration pass
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub window: VersionWindow,
    pub files: FileMigrationReport,
    pub code: Vec<AppliedMigration>,
}

/// Run Phase A then Phase B over `window`
///
/// Only Phase B failures are returned; Phase A reports through
/// `MigrationReport::files`.
pub fn execute_migrations(
    conn: &mut Connection,
    assets: &dyn AssetSource,
    registry: &MigrationRegistry,
    window: VersionWindow,
) -> Result<MigrationReport> {
    let files = run_file_migrations(conn, assets, window);
    let code = run_code_migrations(conn, registry, window)?;
    Ok(MigrationReport {
        window,
        files,
        code,
    })
}

/// Phase A: run due scripts from `migrations/` inside one transaction
pub fn run_file_migrations(
    conn: &mut Connection,
    assets: &dyn AssetSource,
    window: VersionWindow,
) -> FileMigrationReport {
    let mut files = match assets.list(MIGRATION_PATH) {
        Ok(files) => files,
        Err(e) => {
            let err = io_error("list_migrations", e);
            error!(error = %err, "Failed to execute migrations.");
            return FileMigrationReport::listing_failed();
        }
    };
    sort_natural(&mut files);

    let start = Instant::now();
    log_op_start!(
        OP_FILE_MIGRATIONS,
        old_version = window.old(),
        new_version = window.new_version(),
        files = files.len()
    );

    let mut applied = Vec::new();
    let mut invalid = Vec::new();
    let mut unreadable = Vec::new();

    let outcome = transact(conn, |tx| {
        for file in &files {
            let version = match classify_script(file, window) {
                ScriptDisposition::Due(version) => version,
                ScriptDisposition::OutOfWindow(_) => continue,
                ScriptDisposition::Invalid(err) => {
                    warn!(file = %file, error = %err, "Skipping invalidly named file");
                    invalid.push(file.clone());
                    continue;
                }
            };

            match execute_sql_script(tx, assets, file) {
                Ok(checksum) => {
                    info!(
                        file = %file,
                        version,
                        checksum = %checksum,
                        "Migration script executed successfully"
                    );
                    applied.push(AppliedScript {
                        file: file.clone(),
                        version,
                        checksum,
                    });
                }
                Err(err) if matches!(err.kind(), ExErrorKind::Io | ExErrorKind::NotFound) => {
                    error!(file = %file, error = %err, "Failed to read migration script");
                    unreadable.push(file.clone());
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    });

    let duration_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(()) => {
            log_op_end!(
                OP_FILE_MIGRATIONS,
                duration_ms = duration_ms,
                applied = applied.len()
            );
            FileMigrationReport {
                status: FilePhaseStatus::Committed,
                applied,
                invalid,
                unreadable,
            }
        }
        Err(err) => {
            log_op_error!(OP_FILE_MIGRATIONS, err, duration_ms = duration_ms);
            FileMigrationReport {
                status: FilePhaseStatus::RolledBack(err),
                applied: Vec::new(),
                invalid,
                unreadable,
            }
        }
    }
}

/// Phase B: run registered code migrations whose version is in `window`
///
/// # Errors
///
/// The first failing hook aborts the remaining migrations; the error names
/// the version and the hook that failed.
pub fn run_code_migrations(
    conn: &Connection,
    registry: &MigrationRegistry,
    window: VersionWindow,
) -> Result<Vec<AppliedMigration>> {
    let mut applied = Vec::new();
    if registry.is_empty() || window.is_empty() {
        return Ok(applied);
    }

    let start = Instant::now();
    log_op_start!(
        OP_CODE_MIGRATIONS,
        old_version = window.old(),
        new_version = window.new_version()
    );

    let due: Vec<SchemaVersion> = registry
        .versions()
        .filter(|v| window.contains(i64::from(*v)))
        .collect();

    for version in due {
        for migration in registry.get(version) {
            if let Err(err) = run_triad(conn, version, migration.as_ref()) {
                log_op_error!(
                    OP_CODE_MIGRATIONS,
                    err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    version = version,
                    migration = migration.name()
                );
                return Err(err);
            }
            info!(version, migration = migration.name(), "Code migration applied");
            applied.push(AppliedMigration {
                version,
                name: migration.name().to_string(),
            });
        }
    }

    log_op_end!(
        OP_CODE_MIGRATIONS,
        duration_ms = start.elapsed().as_millis() as u64,
        applied = applied.len()
    );
    Ok(applied)
}

fn run_triad(conn: &Connection, version: SchemaVersion, migration: &dyn Migration) -> Result<()> {
    migration
        .on_pre_migrate()
        .map_err(|e| code_migration_error(version, "on_pre_migrate", e))?;
    migration
        .migrate(conn)
        .map_err(|e| code_migration_error(version, "migrate", e))?;
    migration
        .on_post_migrate()
        .map_err(|e| code_migration_error(version, "on_post_migrate", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::db::open_in_memory;
    use crate::migrations::code::SqlMigration;

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    fn numbered_assets() -> MemoryAssets {
        MemoryAssets::new()
            .with_migration("1.sql", "CREATE TABLE v1 (id INTEGER);")
            .with_migration("2.sql", "CREATE TABLE v2 (id INTEGER);")
            .with_migration("10.sql", "CREATE TABLE v10 (id INTEGER);")
    }

    #[test]
    fn test_classify_script() {
        let window = VersionWindow::upgrade(2, 5);
        assert_eq!(classify_script("3.sql", window), ScriptDisposition::Due(3));
        assert_eq!(
            classify_script("2.sql", window),
            ScriptDisposition::OutOfWindow(2)
        );
        assert!(matches!(
            classify_script("abc.sql", window),
            ScriptDisposition::Invalid(_)
        ));
    }

    #[test]
    fn test_plan_orders_naturally() {
        let plan = plan_file_migrations(&numbered_assets(), VersionWindow::upgrade(1, 10)).unwrap();

        let due: Vec<&str> = plan.due.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(due, vec!["2.sql", "10.sql"]);
        assert_eq!(plan.out_of_window.len(), 1);
        assert!(plan.invalid.is_empty());
    }

    #[test]
    fn test_file_phase_applies_window_only() {
        let mut conn = open_in_memory().unwrap();

        let report = run_file_migrations(&mut conn, &numbered_assets(), VersionWindow::upgrade(1, 2));

        assert!(report.is_committed());
        assert_eq!(report.applied.len(), 1);
        assert!(!table_exists(&conn, "v1"));
        assert!(table_exists(&conn, "v2"));
        assert!(!table_exists(&conn, "v10"));
    }

    #[test]
    fn test_file_phase_rolls_back_on_failure() {
        let mut conn = open_in_memory().unwrap();
        let assets = numbered_assets().with_migration("3.sql", "INSERT INTO nowhere VALUES (1);");

        let report = run_file_migrations(&mut conn, &assets, VersionWindow::fresh(3));

        assert!(matches!(report.status, FilePhaseStatus::RolledBack(_)));
        assert!(report.applied.is_empty());
        assert!(!table_exists(&conn, "v1"));
        assert!(!table_exists(&conn, "v2"));
    }

    #[test]
    fn test_missing_directory_skips_phase() {
        let mut conn = open_in_memory().unwrap();
        let report = run_file_migrations(&mut conn, &MemoryAssets::new(), VersionWindow::fresh(3));
        assert!(matches!(report.status, FilePhaseStatus::ListingFailed));
    }

    #[test]
    fn test_code_phase_skips_out_of_window() {
        let conn = open_in_memory().unwrap();
        let registry = MigrationRegistry::builder()
            .add(2, SqlMigration::new("two").statement("CREATE TABLE c2 (id INTEGER)"))
            .add(3, SqlMigration::new("three").statement("CREATE TABLE c3 (id INTEGER)"))
            .build();

        let applied = run_code_migrations(&conn, &registry, VersionWindow::upgrade(2, 3)).unwrap();

        assert_eq!(
            applied,
            vec![AppliedMigration {
                version: 3,
                name: "three".to_string()
            }]
        );
        assert!(!table_exists(&conn, "c2"));
        assert!(table_exists(&conn, "c3"));
    }

    #[test]
    fn test_code_phase_empty_window_runs_nothing() {
        let conn = open_in_memory().unwrap();
        let registry = MigrationRegistry::builder()
            .add(3, SqlMigration::new("three").statement("CREATE TABLE c3 (id INTEGER)"))
            .build();

        let applied = run_code_migrations(&conn, &registry, VersionWindow::upgrade(3, 3)).unwrap();

        assert!(applied.is_empty());
        assert!(!table_exists(&conn, "c3"));
    }

    #[test]
    fn test_code_phase_error_is_annotated() {
        let conn = open_in_memory().unwrap();
        let registry = MigrationRegistry::builder()
            .add(1, SqlMigration::new("bad").statement("DROP TABLE nothing_here"))
            .build();

        let err = run_code_migrations(&conn, &registry, VersionWindow::fresh(1)).unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::Migration);
        assert_eq!(err.op(), Some("migrate"));
        assert_eq!(err.version(), Some(1));
    }
}
