//! File-based migration scripts
//!
//! A script is named `<version>.<ext>` and holds one statement per line.
//! Every `;` is stripped from a line before it runs, so a line must hold
//! exactly one statement.

use crate::assets::{AssetSource, MIGRATION_PATH};
use crate::errors::{io_error, migration_error, Result};
use crate::migrations::checksums::LineChecksum;
use rusqlite::Connection;
use std::io::Read;
use stratum_core::errors::StratumError;

/// Parse the version from a script file name
///
/// The extension is stripped and the remaining base name must parse as an
/// integer. `"12.sql"` is version 12; `"abc.sql"` is rejected.
pub fn parse_script_version(file: &str) -> std::result::Result<i64, StratumError> {
    let base = match file.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => file,
    };
    base.parse::<i64>()
        .map_err(|_| StratumError::InvalidMigrationName {
            file: file.to_string(),
        })
}

/// Strip statement terminators from one script line
///
/// Returns `None` for lines that are blank once stripped.
pub fn prepare_statement(line: &str) -> Option<String> {
    let statement = line.replace(';', "");
    if statement.trim().is_empty() {
        None
    } else {
        Some(statement)
    }
}

/// Read the whole script `migrations/<file>` into text
///
/// Bytes that are not valid UTF-8 decode to U+FFFD instead of failing, so
/// only a failing stream makes a script unreadable.
pub fn read_script(assets: &dyn AssetSource, file: &str) -> Result<String> {
    let path = format!("{}/{}", MIGRATION_PATH, file);
    let mut input = assets
        .open(&path)
        .map_err(|e| io_error("open_migration", e).with_file(file))?;
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|e| io_error("read_migration", e).with_file(file))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Execute the script `migrations/<file>` against `conn`
///
/// The script is read in full before its first statement runs; a read
/// failure executes nothing and is reported with an I/O (or not-found)
/// kind. A failing statement is reported as a persistence error naming the
/// file. Returns the script checksum.
pub fn execute_sql_script(conn: &Connection, assets: &dyn AssetSource, file: &str) -> Result<String> {
    let text = read_script(assets, file)?;
    let mut checksum = LineChecksum::new();

    for line in text.lines() {
        checksum.update_line(line);

        if let Some(statement) = prepare_statement(line) {
            conn.execute_batch(&statement)
                .map_err(|e| migration_error(file, &e.to_string()))?;
        }
    }

    Ok(checksum.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssets;
    use crate::db::open_in_memory;
    use stratum_core::errors::ExErrorKind;

    #[test]
    fn test_parse_script_version() {
        assert_eq!(parse_script_version("1.sql"), Ok(1));
        assert_eq!(parse_script_version("0042.sql"), Ok(42));
        assert_eq!(parse_script_version("7"), Ok(7));
        assert!(parse_script_version("abc.sql").is_err());
        assert!(parse_script_version("1_init.sql").is_err());
        assert!(parse_script_version(".sql").is_err());
    }

    #[test]
    fn test_prepare_statement_strips_semicolons() {
        assert_eq!(
            prepare_statement("INSERT INTO t VALUES (1);").as_deref(),
            Some("INSERT INTO t VALUES (1)")
        );
        assert_eq!(prepare_statement("  ;  "), None);
        assert_eq!(prepare_statement(""), None);
    }

    #[test]
    fn test_execute_sql_script() {
        let conn = open_in_memory().unwrap();
        let assets = MemoryAssets::new().with_migration(
            "1.sql",
            "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);\n\
             \n\
             INSERT INTO notes (body) VALUES ('first');\n\
             INSERT INTO notes (body) VALUES ('second');\n",
        );

        let checksum = execute_sql_script(&conn, &assets, "1.sql").unwrap();

        assert_eq!(checksum.len(), 64);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_failing_statement_names_file() {
        let conn = open_in_memory().unwrap();
        let assets = MemoryAssets::new().with_migration("2.sql", "INSERT INTO missing VALUES (1);");

        let err = execute_sql_script(&conn, &assets, "2.sql").unwrap_err();

        assert_eq!(err.kind(), ExErrorKind::Persistence);
        assert_eq!(err.file(), Some("2.sql"));
    }

    #[test]
    fn test_invalid_utf8_line_decodes_lossily() {
        let conn = open_in_memory().unwrap();
        let mut script = b"CREATE TABLE a (id INTEGER);\n-- ".to_vec();
        script.extend_from_slice(&[0xff, 0xfe]);
        script.extend_from_slice(b"\nCREATE TABLE b (id INTEGER);\n");
        let assets = MemoryAssets::new().with_file("migrations/1.sql", script);

        execute_sql_script(&conn, &assets, "1.sql").unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name IN ('a', 'b')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn test_missing_script_is_not_found() {
        let conn = open_in_memory().unwrap();
        let err = execute_sql_script(&conn, &MemoryAssets::new(), "3.sql").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::NotFound);
    }
}
