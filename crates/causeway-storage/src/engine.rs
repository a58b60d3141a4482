//! StorageEngine: owns the ConnectionPool and implements the ledger,
//! compaction, and domain-index storage traits.

use std::path::Path;

use causeway_core::config::StorageConfig;
use causeway_core::errors::CausewayResult;
use causeway_core::models::{
    BroadcastStatus, CompactionCandidate, CompactionSummary, DomainRecordRef, EventId, EventRecord,
    EventType, InsertOutcome, NewEvent, RetentionCutoffs, StatusTransition, TraceStats,
};
use causeway_core::traits::{ICompactionStorage, IDomainRecordIndex, ILedgerStorage};

use crate::migrations;
use crate::pool::{ConnectionPool, PoolConfig};
use crate::queries::{
    aggregation, broadcast_ops, compaction_ops, domain_ops, event_crud, event_query,
    lifecycle_ops, sequence_ops,
};
use crate::sequence::StoreSequencer;

pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    /// Open a file-backed engine with default pool settings.
    pub fn open(path: &Path) -> CausewayResult<Self> {
        Self::open_with(path, &PoolConfig::default())
    }

    /// Open the database named by `config.db_path`.
    pub fn open_with_config(config: &StorageConfig) -> CausewayResult<Self> {
        Self::open_with(Path::new(&config.db_path), &PoolConfig::from(config))
    }

    pub fn open_with(path: &Path, config: &PoolConfig) -> CausewayResult<Self> {
        Self::initialize(ConnectionPool::open(path, config)?)
    }

    /// Open an in-memory engine (for testing).
    pub fn open_in_memory() -> CausewayResult<Self> {
        Self::initialize(ConnectionPool::open_in_memory()?)
    }

    fn initialize(pool: ConnectionPool) -> CausewayResult<Self> {
        pool.writer.with_conn(migrations::run_migrations)?;
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool (for advanced operations).
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// A store-backed sequence assigner sharing this engine's writer.
    pub fn sequencer(&self) -> StoreSequencer {
        StoreSequencer::new(self.pool.writer.clone())
    }

    fn with_reader<F, T>(&self, f: F) -> CausewayResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> CausewayResult<T>,
    {
        self.pool.read(f)
    }
}

impl ILedgerStorage for StorageEngine {
    fn insert_event(&self, event: &NewEvent) -> CausewayResult<InsertOutcome> {
        self.pool
            .writer
            .with_conn(|conn| event_crud::insert_event(conn, event))
    }

    fn transition_event(
        &self,
        transition: &StatusTransition,
    ) -> CausewayResult<Option<EventRecord>> {
        self.pool
            .writer
            .with_conn(|conn| lifecycle_ops::transition_event(conn, transition))
    }

    fn set_last_applied(&self, id: EventId, last_applied_id: EventId) -> CausewayResult<()> {
        self.pool
            .writer
            .with_conn(|conn| lifecycle_ops::set_last_applied(conn, id, last_applied_id))
    }

    fn mark_superseded(&self, loser: EventId, winner: EventId) -> CausewayResult<()> {
        self.pool
            .writer
            .with_conn(|conn| lifecycle_ops::mark_superseded(conn, loser, winner))
    }

    fn flag_for_review(&self, id: EventId, message: &str) -> CausewayResult<()> {
        self.pool
            .writer
            .with_conn(|conn| lifecycle_ops::flag_for_review(conn, id, message))
    }

    fn get_event(&self, id: EventId) -> CausewayResult<Option<EventRecord>> {
        self.with_reader(|conn| event_crud::get_event(conn, id))
    }

    fn find_by_idempotency_key(&self, key: &str) -> CausewayResult<Option<EventRecord>> {
        self.with_reader(|conn| event_crud::find_by_idempotency_key(conn, key))
    }

    fn events_for_trace(&self, trace_id: &str) -> CausewayResult<Vec<EventRecord>> {
        self.with_reader(|conn| event_query::events_for_trace(conn, trace_id))
    }

    fn events_for_session(&self, session_id: &str) -> CausewayResult<Vec<EventRecord>> {
        self.with_reader(|conn| event_query::events_for_session(conn, session_id))
    }

    fn events_for_target(&self, target_id: &str, limit: usize) -> CausewayResult<Vec<EventRecord>> {
        self.with_reader(|conn| event_query::events_for_target(conn, target_id, limit))
    }

    fn latest_event_for_target(
        &self,
        event_type: EventType,
        target_id: &str,
    ) -> CausewayResult<Option<EventRecord>> {
        self.with_reader(|conn| event_query::latest_event_for_target(conn, event_type, target_id))
    }

    fn trace_has_event_type(&self, trace_id: &str, event_type: EventType) -> CausewayResult<bool> {
        // Guards a write decision, so read from the writer's snapshot.
        self.pool
            .writer
            .with_conn(|conn| event_query::trace_has_event_type(conn, trace_id, event_type))
    }

    fn verify_stored_checksum(&self, id: EventId) -> CausewayResult<Option<bool>> {
        self.with_reader(|conn| event_crud::verify_stored_checksum(conn, id))
    }

    fn pending_broadcasts(&self, limit: usize) -> CausewayResult<Vec<EventRecord>> {
        self.with_reader(|conn| broadcast_ops::pending_broadcasts(conn, limit))
    }

    fn mark_broadcast(&self, ids: &[EventId], status: BroadcastStatus) -> CausewayResult<usize> {
        self.pool
            .writer
            .with_conn(|conn| broadcast_ops::mark_broadcast(conn, ids, status))
    }

    fn trace_stats(&self, trace_id: &str) -> CausewayResult<TraceStats> {
        self.with_reader(|conn| aggregation::trace_stats(conn, trace_id))
    }

    fn event_count(&self) -> CausewayResult<usize> {
        self.with_reader(aggregation::event_count)
    }

    fn max_sequence(&self) -> CausewayResult<i64> {
        self.pool.writer.with_conn(sequence_ops::current_sequence)
    }
}

impl ICompactionStorage for StorageEngine {
    fn select_compaction_candidates(
        &self,
        cutoffs: &RetentionCutoffs,
        limit: usize,
    ) -> CausewayResult<Vec<CompactionCandidate>> {
        self.pool
            .writer
            .with_conn(|conn| compaction_ops::select_candidates(conn, cutoffs, limit))
    }

    fn commit_compaction(
        &self,
        summary: &CompactionSummary,
        ids: &[EventId],
    ) -> CausewayResult<CompactionSummary> {
        self.pool
            .writer
            .with_conn(|conn| compaction_ops::commit_compaction(conn, summary, ids))
    }

    fn record_summary(&self, summary: &CompactionSummary) -> CausewayResult<i64> {
        self.pool
            .writer
            .with_conn(|conn| compaction_ops::insert_summary(conn, summary))
    }

    fn compaction_history(&self, limit: usize) -> CausewayResult<Vec<CompactionSummary>> {
        self.with_reader(|conn| compaction_ops::compaction_history(conn, limit))
    }
}

impl IDomainRecordIndex for StorageEngine {
    fn find_by_origin_hash(
        &self,
        origin_hash: &str,
        scope: &str,
    ) -> CausewayResult<Option<DomainRecordRef>> {
        self.with_reader(|conn| domain_ops::find_by_origin_hash(conn, origin_hash, scope))
    }

    fn list_candidates(&self, scope: &str, limit: usize) -> CausewayResult<Vec<DomainRecordRef>> {
        self.with_reader(|conn| domain_ops::list_candidates(conn, scope, limit))
    }

    fn register_domain_record(&self, record: &DomainRecordRef) -> CausewayResult<()> {
        self.pool
            .writer
            .with_conn(|conn| domain_ops::register_domain_record(conn, record))
    }
}
