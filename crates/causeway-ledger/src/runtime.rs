//! CausewayRuntime: composition root owning the storage engine and every
//! service built on it.
//!
//! There is no process-wide instance. The embedding application constructs
//! one runtime and hands out references (or clones of the cheap service
//! handles) to its request workers.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use causeway_core::config::{CausewayConfig, SequenceBackend};
use causeway_core::errors::CausewayResult;
use causeway_core::traits::{ILedgerStorage, ISequenceAssigner};
use causeway_dedup::Deduplicator;
use causeway_storage::{InProcessSequencer, StorageEngine};

use crate::broadcast::BroadcastQueue;
use crate::compactor::Compactor;
use crate::conflict::ConflictCoordinator;
use crate::replay::ReplayEngine;
use crate::service::LedgerService;

/// The runtime owning all Causeway services.
pub struct CausewayRuntime {
    pub storage: Arc<StorageEngine>,
    pub ledger: LedgerService,
    pub conflicts: ConflictCoordinator,
    pub replay: ReplayEngine,
    pub compactor: Compactor,
    pub broadcast: BroadcastQueue,
    pub dedup: Deduplicator,
    pub config: CausewayConfig,
}

/// Options for initializing the runtime.
#[derive(Debug, Default)]
pub struct RuntimeOptions {
    /// Path to the SQLite database. Overrides `storage.db_path`.
    pub db_path: Option<PathBuf>,
    /// TOML configuration string. If None, uses defaults.
    pub config_toml: Option<String>,
    /// Use an in-memory database and ignore any path.
    pub in_memory: bool,
}

impl CausewayRuntime {
    pub fn new(opts: RuntimeOptions) -> CausewayResult<Self> {
        let mut config = match &opts.config_toml {
            Some(toml_str) => CausewayConfig::from_toml(toml_str)?,
            None => CausewayConfig::default(),
        };
        if let Some(path) = &opts.db_path {
            config.storage.db_path = path.to_string_lossy().into_owned();
        }

        let storage = if opts.in_memory {
            StorageEngine::open_in_memory()?
        } else {
            StorageEngine::open_with_config(&config.storage)?
        };
        Self::from_engine(storage, config)
    }

    /// Runtime over an in-memory database with default config (for testing).
    pub fn in_memory() -> CausewayResult<Self> {
        Self::new(RuntimeOptions {
            in_memory: true,
            ..Default::default()
        })
    }

    /// Runtime over a file-backed database at `config.storage`.
    pub fn open(config: CausewayConfig) -> CausewayResult<Self> {
        config.validate()?;
        let storage = StorageEngine::open_with_config(&config.storage)?;
        Self::from_engine(storage, config)
    }

    fn from_engine(storage: StorageEngine, config: CausewayConfig) -> CausewayResult<Self> {
        let storage = Arc::new(storage);

        let sequencer: Arc<dyn ISequenceAssigner> = match config.sequence.backend {
            SequenceBackend::Store => Arc::new(storage.sequencer()),
            SequenceBackend::InProcess => {
                Arc::new(InProcessSequencer::starting_after(storage.max_sequence()?))
            }
        };

        let ledger = LedgerService::new(
            storage.clone(),
            sequencer,
            config.sequence.max_retries,
        );
        let conflicts = ConflictCoordinator::new(ledger.clone(), config.conflict.default_strategy);
        let replay = ReplayEngine::new(ledger.clone(), conflicts.clone());
        let compactor = Compactor::new(storage.clone(), config.retention.clone());
        let broadcast = BroadcastQueue::new(storage.clone(), config.broadcast.batch_size);
        let dedup = Deduplicator::new(storage.clone(), config.dedup.clone());

        info!(
            backend = ?config.sequence.backend,
            strategy = %config.conflict.default_strategy,
            "causeway runtime initialized"
        );

        Ok(Self {
            storage,
            ledger,
            conflicts,
            replay,
            compactor,
            broadcast,
            dedup,
            config,
        })
    }
}
