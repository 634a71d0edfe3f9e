//! Plan command
//!
//! Usage: stratum plan --config <PATH> [--from <VERSION>] [--json]
//!
//! Lists the scripts an upgrade would run without opening the database for
//! writing.

use clap::Args;
use std::path::PathBuf;
use stratum_core::{SchemaVersion, VersionWindow};
use stratum_store::migrations::plan_file_migrations;
use stratum_store::{db, DatabaseConfig, FsAssets};

#[derive(Debug, Args)]
pub struct PlanArgs {
    /// Path to the database TOML config
    #[arg(long)]
    pub config: PathBuf,

    /// Version to upgrade from (defaults to the version stored in the database)
    #[arg(long)]
    pub from: Option<SchemaVersion>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = DatabaseConfig::load(&args.config)?;
    let asset_root = config
        .asset_root
        .clone()
        .ok_or("config has no asset_root; nothing to plan")?;

    let from = match args.from {
        Some(version) => version,
        None => stored_version(&config)?,
    };
    let window = if from == 0 {
        VersionWindow::fresh(config.version)
    } else {
        VersionWindow::upgrade(from, config.version)
    };

    let plan = plan_file_migrations(&FsAssets::new(asset_root), window)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Window {}", window);
    if plan.due.is_empty() {
        println!("  nothing to run");
    }
    for script in &plan.due {
        println!("  run  {} (version {})", script.file, script.version);
    }
    for file in &plan.invalid {
        println!("  skip {} (not a version number)", file);
    }
    Ok(())
}

/// Version in the database header, or 0 when the file does not exist yet
fn stored_version(config: &DatabaseConfig) -> Result<SchemaVersion, Box<dyn std::error::Error>> {
    let path = config.database_path();
    if !path.exists() {
        return Ok(0);
    }
    let conn = rusqlite::Connection::open_with_flags(
        &path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
    )?;
    Ok(db::user_version(&conn)?)
}
