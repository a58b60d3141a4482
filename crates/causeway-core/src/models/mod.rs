mod compaction;
mod conflict;
mod duplicate;
mod envelope;
mod event_record;
mod event_status;
mod event_type;
pub mod payload;
mod trace;

pub use compaction::{CompactionCandidate, CompactionSummary, RetentionCutoffs};
pub use conflict::{ConflictPair, ConflictStrategy, Resolution};
pub use duplicate::{DomainRecordRef, DuplicateCheck, DuplicateKind, SimilarMatch};
pub use envelope::{EventEnvelope, EventSubmission};
pub use event_record::{EventId, EventRecord, InsertOutcome, NewEvent, StatusTransition};
pub use event_status::{BroadcastStatus, EventStatus};
pub use event_type::EventType;
pub use payload::{EventPayload, PayloadRegistry};
pub use trace::{TimelineEntry, TraceStats};
