//! Typed payloads, one struct per [`EventType`], plus the registry that
//! validates them at ledger-write time and decodes them on read.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EventId, EventType};
use crate::errors::{CausewayResult, LedgerError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStarted {
    pub session_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEnded {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingChunkReceived {
    pub session_id: String,
    pub chunk_index: u32,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptGenerated {
    pub session_id: String,
    pub transcript_id: String,
    pub word_count: u32,
}

/// A task candidate pulled out of a transcript, before dedup decides whether
/// it becomes a real task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExtracted {
    pub task_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub origin_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCreated {
    pub task_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdated {
    pub task_id: String,
    pub changes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompleted {
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDeleted {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingCreated {
    pub meeting_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingUpdated {
    pub meeting_id: String,
    pub changes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryGenerated {
    pub meeting_id: String,
    pub summary_id: String,
    pub word_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineQueueReplayed {
    pub client_id: String,
    pub submitted: u32,
    pub created: u32,
    pub existing: u32,
    pub conflicts: u32,
    /// Submissions refused by validation; absent on rows written before it
    /// was recorded.
    #[serde(default)]
    pub rejected: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolved {
    pub target_id: String,
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loser_id: Option<EventId>,
    pub review_required: bool,
}

/// Tagged union of every payload shape. The `type` tag matches
/// [`EventType::as_str`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    SessionStarted(SessionStarted),
    SessionEnded(SessionEnded),
    RecordingChunkReceived(RecordingChunkReceived),
    TranscriptGenerated(TranscriptGenerated),
    TaskExtracted(TaskExtracted),
    TaskCreated(TaskCreated),
    TaskUpdated(TaskUpdated),
    TaskCompleted(TaskCompleted),
    TaskDeleted(TaskDeleted),
    MeetingCreated(MeetingCreated),
    MeetingUpdated(MeetingUpdated),
    SummaryGenerated(SummaryGenerated),
    OfflineQueueReplayed(OfflineQueueReplayed),
    ConflictResolved(ConflictResolved),
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::SessionStarted(_) => EventType::SessionStarted,
            EventPayload::SessionEnded(_) => EventType::SessionEnded,
            EventPayload::RecordingChunkReceived(_) => EventType::RecordingChunkReceived,
            EventPayload::TranscriptGenerated(_) => EventType::TranscriptGenerated,
            EventPayload::TaskExtracted(_) => EventType::TaskExtracted,
            EventPayload::TaskCreated(_) => EventType::TaskCreated,
            EventPayload::TaskUpdated(_) => EventType::TaskUpdated,
            EventPayload::TaskCompleted(_) => EventType::TaskCompleted,
            EventPayload::TaskDeleted(_) => EventType::TaskDeleted,
            EventPayload::MeetingCreated(_) => EventType::MeetingCreated,
            EventPayload::MeetingUpdated(_) => EventType::MeetingUpdated,
            EventPayload::SummaryGenerated(_) => EventType::SummaryGenerated,
            EventPayload::OfflineQueueReplayed(_) => EventType::OfflineQueueReplayed,
            EventPayload::ConflictResolved(_) => EventType::ConflictResolved,
        }
    }

    /// The logical target this event mutates (task, meeting, session).
    pub fn target_id(&self) -> Option<&str> {
        match self {
            EventPayload::SessionStarted(p) => Some(&p.session_id),
            EventPayload::SessionEnded(p) => Some(&p.session_id),
            EventPayload::RecordingChunkReceived(p) => Some(&p.session_id),
            EventPayload::TranscriptGenerated(p) => Some(&p.session_id),
            EventPayload::TaskExtracted(p) => Some(&p.task_id),
            EventPayload::TaskCreated(p) => Some(&p.task_id),
            EventPayload::TaskUpdated(p) => Some(&p.task_id),
            EventPayload::TaskCompleted(p) => Some(&p.task_id),
            EventPayload::TaskDeleted(p) => Some(&p.task_id),
            EventPayload::MeetingCreated(p) => Some(&p.meeting_id),
            EventPayload::MeetingUpdated(p) => Some(&p.meeting_id),
            EventPayload::SummaryGenerated(p) => Some(&p.meeting_id),
            EventPayload::OfflineQueueReplayed(_) => None,
            EventPayload::ConflictResolved(p) => Some(&p.target_id),
        }
    }

    /// One-line human description, used by trace timelines.
    pub fn describe(&self) -> String {
        match self {
            EventPayload::SessionStarted(p) => format!("Session started by {}", p.user_id),
            EventPayload::SessionEnded(p) => match &p.reason {
                Some(reason) => format!("Session ended ({reason})"),
                None => "Session ended".to_string(),
            },
            EventPayload::RecordingChunkReceived(p) => {
                format!("Recording chunk #{} received ({} bytes)", p.chunk_index, p.byte_len)
            }
            EventPayload::TranscriptGenerated(p) => {
                format!("Transcript generated ({} words)", p.word_count)
            }
            EventPayload::TaskExtracted(p) => format!("Task extracted: {}", p.title),
            EventPayload::TaskCreated(p) => format!("Task created: {}", p.title),
            EventPayload::TaskUpdated(p) => {
                let fields: Vec<&str> = p.changes.keys().map(|k| k.as_str()).collect();
                format!("Task updated: {}", fields.join(", "))
            }
            EventPayload::TaskCompleted(p) => format!("Task {} completed", p.task_id),
            EventPayload::TaskDeleted(p) => format!("Task {} deleted", p.task_id),
            EventPayload::MeetingCreated(p) => format!("Meeting created: {}", p.title),
            EventPayload::MeetingUpdated(p) => {
                let fields: Vec<&str> = p.changes.keys().map(|k| k.as_str()).collect();
                format!("Meeting updated: {}", fields.join(", "))
            }
            EventPayload::SummaryGenerated(p) => {
                format!("Summary generated ({} words)", p.word_count)
            }
            EventPayload::OfflineQueueReplayed(p) if p.rejected > 0 => format!(
                "Offline queue from {} replayed: {} submitted, {} new, {} rejected",
                p.client_id, p.submitted, p.created, p.rejected
            ),
            EventPayload::OfflineQueueReplayed(p) => format!(
                "Offline queue from {} replayed: {} submitted, {} new",
                p.client_id, p.submitted, p.created
            ),
            EventPayload::ConflictResolved(p) => {
                if p.review_required {
                    format!("Conflict on {} flagged for review", p.target_id)
                } else {
                    format!("Conflict on {} resolved ({})", p.target_id, p.strategy)
                }
            }
        }
    }

    /// Structural checks beyond what serde enforces.
    fn check_fields(&self) -> Result<(), String> {
        fn required(name: &str, value: &str) -> Result<(), String> {
            if value.trim().is_empty() {
                Err(format!("{name} must not be empty"))
            } else {
                Ok(())
            }
        }

        match self {
            EventPayload::SessionStarted(p) => {
                required("session_id", &p.session_id)?;
                required("user_id", &p.user_id)
            }
            EventPayload::SessionEnded(p) => required("session_id", &p.session_id),
            EventPayload::RecordingChunkReceived(p) => required("session_id", &p.session_id),
            EventPayload::TranscriptGenerated(p) => {
                required("session_id", &p.session_id)?;
                required("transcript_id", &p.transcript_id)
            }
            EventPayload::TaskExtracted(p) => {
                required("task_id", &p.task_id)?;
                required("title", &p.title)?;
                required("origin_hash", &p.origin_hash)
            }
            EventPayload::TaskCreated(p) => {
                required("task_id", &p.task_id)?;
                required("title", &p.title)
            }
            EventPayload::TaskUpdated(p) => {
                required("task_id", &p.task_id)?;
                if p.changes.is_empty() {
                    return Err("changes must not be empty".into());
                }
                Ok(())
            }
            EventPayload::TaskCompleted(p) => required("task_id", &p.task_id),
            EventPayload::TaskDeleted(p) => required("task_id", &p.task_id),
            EventPayload::MeetingCreated(p) => {
                required("meeting_id", &p.meeting_id)?;
                required("title", &p.title)
            }
            EventPayload::MeetingUpdated(p) => {
                required("meeting_id", &p.meeting_id)?;
                if p.changes.is_empty() {
                    return Err("changes must not be empty".into());
                }
                Ok(())
            }
            EventPayload::SummaryGenerated(p) => {
                required("meeting_id", &p.meeting_id)?;
                required("summary_id", &p.summary_id)
            }
            EventPayload::OfflineQueueReplayed(p) => required("client_id", &p.client_id),
            EventPayload::ConflictResolved(p) => {
                required("target_id", &p.target_id)?;
                required("strategy", &p.strategy)
            }
        }
    }
}

/// Versioned schema registry for event payloads.
pub struct PayloadRegistry;

impl PayloadRegistry {
    /// Current schema version written for each event type.
    pub fn schema_version(event_type: EventType) -> u32 {
        match event_type {
            // v2 added origin_hash.
            EventType::TaskExtracted => 2,
            EventType::SessionStarted
            | EventType::SessionEnded
            | EventType::RecordingChunkReceived
            | EventType::TranscriptGenerated
            | EventType::TaskCreated
            | EventType::TaskUpdated
            | EventType::TaskCompleted
            | EventType::TaskDeleted
            | EventType::MeetingCreated
            | EventType::MeetingUpdated
            | EventType::SummaryGenerated
            | EventType::OfflineQueueReplayed
            | EventType::ConflictResolved => 1,
        }
    }

    /// Validate a payload against the declared event type before it is written.
    pub fn validate(declared: EventType, payload: &EventPayload) -> CausewayResult<()> {
        let actual = payload.event_type();
        if actual != declared {
            return Err(LedgerError::PayloadMismatch { declared, actual }.into());
        }
        payload.check_fields().map_err(|reason| {
            LedgerError::InvalidPayload {
                event_type: declared,
                reason,
            }
            .into()
        })
    }

    /// Decode a stored payload, checking its version and tag against the row.
    pub fn decode(
        event_type: EventType,
        version: u32,
        raw: &serde_json::Value,
    ) -> CausewayResult<EventPayload> {
        let supported = Self::schema_version(event_type);
        if version == 0 || version > supported {
            return Err(LedgerError::UnsupportedSchema {
                event_type,
                version,
                supported,
            }
            .into());
        }
        let payload: EventPayload = serde_json::from_value(raw.clone())?;
        if payload.event_type() != event_type {
            return Err(LedgerError::PayloadMismatch {
                declared: event_type,
                actual: payload.event_type(),
            }
            .into());
        }
        Ok(payload)
    }
}
