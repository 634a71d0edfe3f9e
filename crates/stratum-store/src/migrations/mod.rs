//! Migration framework
//!
//! Provides:
//! - Numbered SQL scripts applied in one batch (file migrations)
//! - Registered code migrations with pre/post hooks
//! - Script checksums for the migration log
//! - Dry-run planning of which scripts a window would apply

mod checksums;
mod code;
mod runner;
mod script;

pub use checksums::{compute_checksum, LineChecksum};
pub use code::{FnMigration, Migration, MigrationRegistry, MigrationRegistryBuilder, SqlMigration};
pub use runner::{
    classify_script, execute_migrations, plan_file_migrations, run_code_migrations,
    run_file_migrations, AppliedMigration, AppliedScript, FileMigrationReport, FilePhaseStatus,
    MigrationPlan, MigrationReport, PlannedScript, ScriptDisposition,
};
pub use script::{execute_sql_script, parse_script_version, prepare_statement, read_script};
