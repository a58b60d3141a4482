mod compaction_storage;
mod domain_index;
mod ledger_storage;
mod sequence;

pub use compaction_storage::ICompactionStorage;
pub use domain_index::IDomainRecordIndex;
pub use ledger_storage::ILedgerStorage;
pub use sequence::ISequenceAssigner;
