//! Version command
//!
//! Usage: stratum version --db <PATH>

use clap::Args;
use std::path::PathBuf;
use stratum_store::db;

#[derive(Debug, Args)]
pub struct VersionArgs {
    /// Path to the SQLite database file
    #[arg(long)]
    pub db: PathBuf,
}

pub fn execute(args: VersionArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.db.exists() {
        return Err(format!("Database not found: {}", args.db.display()).into());
    }
    let conn =
        rusqlite::Connection::open_with_flags(&args.db, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    println!("{}", db::user_version(&conn)?);
    Ok(())
}
