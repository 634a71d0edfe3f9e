//! Migrate command
//!
//! Usage: stratum migrate --config <PATH>

use clap::Args;
use std::path::PathBuf;
use stratum_store::migrations::{FilePhaseStatus, MigrationReport};
use stratum_store::{BootstrapOutcome, DatabaseConfig, LifecycleAction, OpenHelper};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Path to the database TOML config
    #[arg(long)]
    pub config: PathBuf,
}

pub fn execute(args: MigrateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = DatabaseConfig::load(&args.config)?;
    let helper = OpenHelper::from_config(config);
    let (_conn, report) = helper.open_with_report()?;

    let path = helper.database_path();
    match report.bootstrap {
        Some(BootstrapOutcome::Copied { bytes }) => {
            println!("Seeded {} from template ({} bytes)", path.display(), bytes)
        }
        Some(BootstrapOutcome::Failed) => {
            println!("No template copied for {}", path.display())
        }
        _ => {}
    }

    let target = helper.config().version;
    match report.action {
        LifecycleAction::Created(migrations) => {
            println!("Created {} at version {}", path.display(), target);
            print_migrations(&migrations);
        }
        LifecycleAction::Upgraded { from, report } => {
            println!("Upgraded {} from version {} to {}", path.display(), from, target);
            print_migrations(&report);
        }
        LifecycleAction::Opened => {
            println!("{} is up to date (version {})", path.display(), target);
        }
    }

    Ok(())
}

fn print_migrations(report: &MigrationReport) {
    for script in &report.files.applied {
        println!("  applied {} ({})", script.file, &script.checksum[..12]);
    }
    for file in &report.files.invalid {
        println!("  skipped {} (not a version number)", file);
    }
    for file in &report.files.unreadable {
        println!("  skipped {} (unreadable)", file);
    }
    match &report.files.status {
        FilePhaseStatus::RolledBack(err) => println!("  script batch rolled back: {}", err),
        FilePhaseStatus::ListingFailed => println!("  no migration scripts found"),
        FilePhaseStatus::Committed => {}
    }
    for migration in &report.code {
        println!("  ran code migration {} (version {})", migration.name, migration.version);
    }
}
