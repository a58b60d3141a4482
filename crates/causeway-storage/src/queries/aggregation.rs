//! Counts and per-trace statistics.

use rusqlite::{params, Connection};

use causeway_core::errors::CausewayResult;
use causeway_core::models::TraceStats;

use super::row::parse_opt_ts;
use crate::map_sqlite_err;

pub fn trace_stats(conn: &Connection, trace_id: &str) -> CausewayResult<TraceStats> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT status, event_type, COUNT(*), COALESCE(SUM(duration_ms), 0),
                    COUNT(duration_ms), MAX(duration_ms), MIN(created_at), MAX(created_at)
             FROM event_ledger WHERE trace_id = ?1
             GROUP BY status, event_type",
        )
        .map_err(|e| map_sqlite_err("prepare trace_stats", e))?;

    let rows = stmt
        .query_map(params![trace_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<i64>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })
        .map_err(|e| map_sqlite_err("trace_stats", e))?;

    let mut stats = TraceStats {
        trace_id: trace_id.to_string(),
        ..TraceStats::default()
    };
    let mut timed = 0i64;

    for row in rows {
        let (status, event_type, count, sum, with_duration, max, first, last) =
            row.map_err(|e| map_sqlite_err("trace_stats row", e))?;
        let count = count as u64;
        stats.total_events += count;
        *stats.by_status.entry(status).or_insert(0) += count;
        *stats.by_type.entry(event_type).or_insert(0) += count;
        stats.total_duration_ms += sum;
        timed += with_duration;
        stats.max_duration_ms = stats.max_duration_ms.max(max);

        if let Some(first) = parse_opt_ts(first)? {
            stats.first_event_at = Some(stats.first_event_at.map_or(first, |f| f.min(first)));
        }
        if let Some(last) = parse_opt_ts(last)? {
            stats.last_event_at = Some(stats.last_event_at.map_or(last, |l| l.max(last)));
        }
    }

    stats.avg_duration_ms = (timed > 0).then(|| stats.total_duration_ms as f64 / timed as f64);
    Ok(stats)
}

pub fn event_count(conn: &Connection) -> CausewayResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM event_ledger", [], |row| row.get(0))
        .map_err(|e| map_sqlite_err("event_count", e))?;
    Ok(count as usize)
}
