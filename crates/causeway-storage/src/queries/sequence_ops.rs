//! The `ledger_sequence` high-water counter.

use rusqlite::{params, Connection, Transaction, TransactionBehavior};

use causeway_core::errors::{CausewayResult, LedgerError};

use crate::{is_busy, map_sqlite_err};

/// Reserve the next sequence number under an IMMEDIATE transaction.
///
/// The write lock is taken before the counter is read, so two connections
/// (even in different processes) can never read the same value. If the lock
/// cannot be obtained within the busy timeout the caller gets a retryable
/// `SequenceConflict`.
pub fn next_sequence(conn: &Connection) -> CausewayResult<i64> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| busy_as_conflict("begin", e))?;

    let next = read_high_water(&tx)? + 1;
    tx.execute(
        "UPDATE ledger_sequence SET value = ?1 WHERE name = 'event_ledger'",
        params![next],
    )
    .map_err(|e| busy_as_conflict("update", e))?;
    tx.commit().map_err(|e| busy_as_conflict("commit", e))?;
    Ok(next)
}

/// Highest number ever handed out, including numbers whose rows have been
/// compacted away.
pub fn current_sequence(conn: &Connection) -> CausewayResult<i64> {
    read_high_water(conn)
}

fn read_high_water(conn: &Connection) -> CausewayResult<i64> {
    conn.query_row(
        "SELECT MAX(
            COALESCE((SELECT value FROM ledger_sequence WHERE name = 'event_ledger'), 0),
            COALESCE((SELECT MAX(sequence_num) FROM event_ledger), 0)
         )",
        [],
        |row| row.get(0),
    )
    .map_err(|e| map_sqlite_err("read sequence high-water", e))
}

fn busy_as_conflict(step: &str, e: rusqlite::Error) -> causeway_core::CausewayError {
    if is_busy(&e) {
        LedgerError::SequenceConflict {
            reason: format!("could not lock sequence counter ({step}): {e}"),
        }
        .into()
    } else {
        map_sqlite_err(step, e)
    }
}
