//! Candidate selection, the atomic summary-write + delete unit, and the
//! summary audit trail.

use std::collections::BTreeMap;

use rusqlite::{params, params_from_iter, Connection};
use tracing::{debug, warn};

use causeway_core::constants::MAX_SQL_IN_CHUNK;
use causeway_core::errors::{CausewayResult, CompactionError};
use causeway_core::models::{
    CompactionCandidate, CompactionSummary, EventId, EventStatus, EventType, RetentionCutoffs,
};

use super::row::{format_ts, parse_enum, parse_opt_ts, parse_ts, placeholders};
use crate::map_sqlite_err;

/// Up to `limit` records whose age exceeds the cutoff for their status,
/// oldest first.
pub fn select_candidates(
    conn: &Connection,
    cutoffs: &RetentionCutoffs,
    limit: usize,
) -> CausewayResult<Vec<CompactionCandidate>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, event_type, status, duration_ms, created_at FROM event_ledger
             WHERE (status = 'completed'  AND created_at < ?1)
                OR (status = 'failed'     AND created_at < ?2)
                OR (status = 'pending'    AND created_at < ?3)
                OR (status = 'processing' AND created_at < ?4)
                OR (status = 'skipped'    AND created_at < ?5)
             ORDER BY created_at, id
             LIMIT ?6",
        )
        .map_err(|e| map_sqlite_err("prepare select_candidates", e))?;

    let rows = stmt
        .query_map(
            params![
                format_ts(cutoffs.cutoff_for(EventStatus::Completed)),
                format_ts(cutoffs.cutoff_for(EventStatus::Failed)),
                format_ts(cutoffs.cutoff_for(EventStatus::Pending)),
                format_ts(cutoffs.cutoff_for(EventStatus::Processing)),
                format_ts(cutoffs.cutoff_for(EventStatus::Skipped)),
                limit as i64,
            ],
            |row| {
                Ok((
                    row.get::<_, EventId>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .map_err(|e| map_sqlite_err("select_candidates", e))?;

    let mut candidates = Vec::new();
    for row in rows {
        let (id, event_type, status, duration_ms, created_at) =
            row.map_err(|e| map_sqlite_err("select_candidates row", e))?;
        candidates.push(CompactionCandidate {
            id,
            event_type: parse_enum::<EventType>(&event_type)?,
            status: parse_enum::<EventStatus>(&status)?,
            duration_ms,
            created_at: parse_ts(&created_at)?,
        });
    }
    Ok(candidates)
}

/// Insert the summary, delete the batch, and record the real deleted count,
/// all in one transaction. Nothing is committed on any error.
pub fn commit_compaction(
    conn: &Connection,
    summary: &CompactionSummary,
    ids: &[EventId],
) -> CausewayResult<CompactionSummary> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| map_sqlite_err("compaction begin", e))?;

    match commit_compaction_inner(&tx, summary, ids) {
        Ok(committed) => {
            tx.commit().map_err(|e| CompactionError::CompactionFailure {
                run_id: summary.run_id.clone(),
                reason: format!("commit: {e}"),
            })?;
            Ok(committed)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(CompactionError::CompactionFailure {
                run_id: summary.run_id.clone(),
                reason: e.to_string(),
            }
            .into())
        }
    }
}

fn commit_compaction_inner(
    conn: &Connection,
    summary: &CompactionSummary,
    ids: &[EventId],
) -> CausewayResult<CompactionSummary> {
    let summary_id = insert_summary(conn, summary)?;
    let deleted = delete_events(conn, ids)?;
    if deleted != ids.len() {
        warn!(
            run_id = %summary.run_id,
            selected = ids.len(),
            deleted,
            "compaction deleted fewer rows than selected"
        );
    }

    conn.execute(
        "UPDATE compaction_summary SET events_deleted = ?2 WHERE id = ?1",
        params![summary_id, deleted as i64],
    )
    .map_err(|e| map_sqlite_err("update events_deleted", e))?;

    let mut committed = summary.clone();
    committed.id = Some(summary_id);
    committed.events_deleted = deleted as u64;
    Ok(committed)
}

/// Append one summary row and return its id.
pub fn insert_summary(conn: &Connection, summary: &CompactionSummary) -> CausewayResult<i64> {
    let by_type = serde_json::to_string(&summary.events_by_type)?;
    let by_status = serde_json::to_string(&summary.events_by_status)?;
    conn.execute(
        "INSERT INTO compaction_summary (
            run_id, created_at, dry_run, events_by_type, events_by_status,
            total_events_compacted, total_duration_ms, avg_duration_ms,
            earliest_event_at, latest_event_at, events_deleted, success, error_message
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            summary.run_id,
            format_ts(summary.created_at),
            summary.dry_run,
            by_type,
            by_status,
            summary.total_events_compacted as i64,
            summary.total_duration_ms,
            summary.avg_duration_ms,
            summary.earliest_event_at.map(format_ts),
            summary.latest_event_at.map(format_ts),
            summary.events_deleted as i64,
            summary.success,
            summary.error_message,
        ],
    )
    .map_err(|e| map_sqlite_err("insert_summary", e))?;
    let id = conn.last_insert_rowid();
    debug!(summary_id = id, run_id = %summary.run_id, success = summary.success, "recorded compaction summary");
    Ok(id)
}

fn delete_events(conn: &Connection, ids: &[EventId]) -> CausewayResult<usize> {
    let mut deleted = 0;
    for chunk in ids.chunks(MAX_SQL_IN_CHUNK) {
        let sql = format!(
            "DELETE FROM event_ledger WHERE id IN ({})",
            placeholders(chunk.len())
        );
        deleted += conn
            .execute(&sql, params_from_iter(chunk.iter()))
            .map_err(|e| map_sqlite_err("delete compacted events", e))?;
    }
    Ok(deleted)
}

/// Most recent summaries first.
pub fn compaction_history(conn: &Connection, limit: usize) -> CausewayResult<Vec<CompactionSummary>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, run_id, created_at, dry_run, events_by_type, events_by_status,
                    total_events_compacted, total_duration_ms, avg_duration_ms,
                    earliest_event_at, latest_event_at, events_deleted, success, error_message
             FROM compaction_summary ORDER BY id DESC LIMIT ?1",
        )
        .map_err(|e| map_sqlite_err("prepare compaction_history", e))?;

    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(RawSummary {
                id: row.get(0)?,
                run_id: row.get(1)?,
                created_at: row.get(2)?,
                dry_run: row.get(3)?,
                events_by_type: row.get(4)?,
                events_by_status: row.get(5)?,
                total_events_compacted: row.get(6)?,
                total_duration_ms: row.get(7)?,
                avg_duration_ms: row.get(8)?,
                earliest_event_at: row.get(9)?,
                latest_event_at: row.get(10)?,
                events_deleted: row.get(11)?,
                success: row.get(12)?,
                error_message: row.get(13)?,
            })
        })
        .map_err(|e| map_sqlite_err("compaction_history", e))?;

    let mut history = Vec::new();
    for raw in rows {
        let raw = raw.map_err(|e| map_sqlite_err("compaction_history row", e))?;
        history.push(raw.into_summary()?);
    }
    Ok(history)
}

struct RawSummary {
    id: i64,
    run_id: String,
    created_at: String,
    dry_run: bool,
    events_by_type: String,
    events_by_status: String,
    total_events_compacted: i64,
    total_duration_ms: i64,
    avg_duration_ms: Option<f64>,
    earliest_event_at: Option<String>,
    latest_event_at: Option<String>,
    events_deleted: i64,
    success: bool,
    error_message: Option<String>,
}

impl RawSummary {
    fn into_summary(self) -> CausewayResult<CompactionSummary> {
        Ok(CompactionSummary {
            id: Some(self.id),
            run_id: self.run_id,
            created_at: parse_ts(&self.created_at)?,
            dry_run: self.dry_run,
            events_by_type: serde_json::from_str::<BTreeMap<String, u64>>(&self.events_by_type)?,
            events_by_status: serde_json::from_str::<BTreeMap<String, u64>>(&self.events_by_status)?,
            total_events_compacted: self.total_events_compacted as u64,
            total_duration_ms: self.total_duration_ms,
            avg_duration_ms: self.avg_duration_ms,
            earliest_event_at: parse_opt_ts(self.earliest_event_at)?,
            latest_event_at: parse_opt_ts(self.latest_event_at)?,
            events_deleted: self.events_deleted as u64,
            success: self.success,
            error_message: self.error_message,
        })
    }
}
