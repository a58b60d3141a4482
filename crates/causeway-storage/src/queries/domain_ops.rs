//! Origin-hash index over domain records.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use causeway_core::errors::CausewayResult;
use causeway_core::models::DomainRecordRef;

use super::row::format_ts;
use crate::map_sqlite_err;

const DOMAIN_COLUMNS: &str = "record_id, scope, title, description, assignee, origin_hash";

fn row_to_ref(row: &Row<'_>) -> rusqlite::Result<DomainRecordRef> {
    Ok(DomainRecordRef {
        record_id: row.get(0)?,
        scope: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        assignee: row.get(4)?,
        origin_hash: row.get(5)?,
    })
}

/// Insert or replace by `record_id`.
pub fn register_domain_record(conn: &Connection, record: &DomainRecordRef) -> CausewayResult<()> {
    conn.execute(
        "INSERT INTO domain_records (record_id, scope, title, description, assignee, origin_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(record_id) DO UPDATE SET
            scope = excluded.scope, title = excluded.title, description = excluded.description,
            assignee = excluded.assignee, origin_hash = excluded.origin_hash",
        params![
            record.record_id,
            record.scope,
            record.title,
            record.description,
            record.assignee,
            record.origin_hash,
            format_ts(Utc::now()),
        ],
    )
    .map_err(|e| map_sqlite_err("register_domain_record", e))?;
    Ok(())
}

/// Oldest record in `scope` carrying `origin_hash`.
pub fn find_by_origin_hash(
    conn: &Connection,
    origin_hash: &str,
    scope: &str,
) -> CausewayResult<Option<DomainRecordRef>> {
    conn.query_row(
        &format!(
            "SELECT {DOMAIN_COLUMNS} FROM domain_records
             WHERE origin_hash = ?1 AND scope = ?2
             ORDER BY created_at, rowid LIMIT 1"
        ),
        params![origin_hash, scope],
        row_to_ref,
    )
    .optional()
    .map_err(|e| map_sqlite_err("find_by_origin_hash", e))
}

/// Most recent records in `scope`.
pub fn list_candidates(
    conn: &Connection,
    scope: &str,
    limit: usize,
) -> CausewayResult<Vec<DomainRecordRef>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {DOMAIN_COLUMNS} FROM domain_records
             WHERE scope = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))
        .map_err(|e| map_sqlite_err("prepare list_candidates", e))?;
    let rows = stmt
        .query_map(params![scope, limit as i64], row_to_ref)
        .map_err(|e| map_sqlite_err("list_candidates", e))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| map_sqlite_err("list_candidates row", e))
}
