//! Stratum CLI
//!
//! Command-line interface for the Stratum migration engine

use clap::{Parser, Subcommand};
use stratum_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "stratum")]
#[command(about = "Stratum - versioned SQLite schema migrations", long_about = None)]
struct Cli {
    /// Logging profile (dev, prod, test)
    #[arg(long, global = true, default_value = "prod")]
    log: Profile,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the configured database, creating or upgrading it
    Migrate(commands::migrate::MigrateArgs),
    /// Show which migration scripts an upgrade would run
    Plan(commands::plan::PlanArgs),
    /// Print the schema version stored in a database file
    Version(commands::version::VersionArgs),
}

fn main() {
    let cli = Cli::parse();
    logging_facility::init(cli.log);

    let result = match cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args),
        Commands::Plan(args) => commands::plan::execute(args),
        Commands::Version(args) => commands::version::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
