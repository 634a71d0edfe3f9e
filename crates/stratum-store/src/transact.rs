//! Transactional executor
//!
//! Runs a unit of work inside one SQLite transaction. The work commits only
//! when it returns `Ok`; an `Err` (or a panic unwinding through it) drops the
//! transaction, which rolls back every statement it issued.

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;

/// Run `work` inside a single transaction
///
/// The closure receives the transaction as a plain `&Connection`, so the
/// same statement helpers work inside and outside a batch.
pub fn transact<T, F>(conn: &mut Connection, work: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    let tx = conn.transaction().map_err(from_rusqlite)?;
    let value = work(&tx)?;
    tx.commit().map_err(from_rusqlite)?;
    Ok(value)
}
