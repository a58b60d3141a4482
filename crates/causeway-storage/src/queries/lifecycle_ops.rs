//! Status transitions and conflict bookkeeping on existing records.

use rusqlite::{params, Connection};
use tracing::debug;

use causeway_core::errors::{CausewayResult, LedgerError};
use causeway_core::models::{EventId, EventRecord, EventStatus, StatusTransition};

use super::event_crud::get_event;
use super::row::format_ts;
use crate::map_sqlite_err;

/// Append `?N` to the record's note instead of replacing it, so a review
/// cross-reference survives a later failure or skip.
fn append_note(param: usize) -> String {
    format!(
        "CASE WHEN error_message IS NULL OR error_message = '' THEN ?{param} \
         ELSE error_message || '; ' || ?{param} END"
    )
}

/// Apply one lifecycle step, guarded by the status the caller read.
///
/// Each step writes only the columns it owns. Steps that apply the record
/// (`processing`, `completed`) additionally require that it has not been
/// superseded. Returns the stored record, or `None` if the guard missed.
pub fn transition_event(
    conn: &Connection,
    transition: &StatusTransition,
) -> CausewayResult<Option<EventRecord>> {
    let guard = if transition.applies() {
        "id = ?1 AND status = ?2 AND superseded_by IS NULL"
    } else {
        "id = ?1 AND status = ?2"
    };
    let id = transition.event_id;
    let from = transition.from.as_str();
    let to = transition.to.as_str();
    let at = format_ts(transition.at);

    let result = match transition.to {
        EventStatus::Processing => conn.execute(
            &format!("UPDATE event_ledger SET status = ?3, started_at = ?4 WHERE {guard}"),
            params![id, from, to, at],
        ),
        EventStatus::Completed => conn.execute(
            &format!(
                "UPDATE event_ledger
                 SET status = ?3, completed_at = ?4, duration_ms = ?5, last_applied_id = id
                 WHERE {guard}"
            ),
            params![id, from, to, at, transition.duration_ms],
        ),
        EventStatus::Failed | EventStatus::Skipped => conn.execute(
            &format!(
                "UPDATE event_ledger
                 SET status = ?3, completed_at = ?4, duration_ms = ?5, error_message = {}
                 WHERE {guard}",
                append_note(6)
            ),
            params![id, from, to, at, transition.duration_ms, transition.message],
        ),
        EventStatus::Pending => {
            return Err(LedgerError::InvalidTransition {
                event_id: id,
                from: transition.from,
                to: transition.to,
            }
            .into())
        }
    };
    let rows = result.map_err(|e| map_sqlite_err("transition_event", e))?;

    debug!(
        event_id = id,
        from = %transition.from,
        to = %transition.to,
        applied = rows == 1,
        "status transition"
    );
    if rows == 0 {
        return Ok(None);
    }
    get_event(conn, id)
}

pub fn set_last_applied(conn: &Connection, id: EventId, last_applied_id: EventId) -> CausewayResult<()> {
    let rows = conn
        .execute(
            "UPDATE event_ledger SET last_applied_id = ?2 WHERE id = ?1",
            params![id, last_applied_id],
        )
        .map_err(|e| map_sqlite_err("set_last_applied", e))?;
    ensure_found(rows, id)
}

/// Exclude `loser` from future application in favour of `winner`.
pub fn mark_superseded(conn: &Connection, loser: EventId, winner: EventId) -> CausewayResult<()> {
    let rows = conn
        .execute(
            "UPDATE event_ledger SET superseded_by = ?2 WHERE id = ?1",
            params![loser, winner],
        )
        .map_err(|e| map_sqlite_err("mark_superseded", e))?;
    ensure_found(rows, loser)
}

pub fn flag_for_review(conn: &Connection, id: EventId, message: &str) -> CausewayResult<()> {
    let rows = conn
        .execute(
            &format!(
                "UPDATE event_ledger SET review_required = 1, error_message = {} WHERE id = ?1",
                append_note(2)
            ),
            params![id, message],
        )
        .map_err(|e| map_sqlite_err("flag_for_review", e))?;
    ensure_found(rows, id)
}

fn ensure_found(rows: usize, id: EventId) -> CausewayResult<()> {
    if rows == 0 {
        return Err(LedgerError::EventNotFound { event_id: id }.into());
    }
    Ok(())
}
