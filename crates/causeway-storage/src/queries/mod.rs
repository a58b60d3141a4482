//! Raw SQL operations, one module per concern. Every function takes a
//! `&Connection` so it can run on the writer, a reader, or inside a
//! transaction.

pub mod aggregation;
pub mod broadcast_ops;
pub mod compaction_ops;
pub mod domain_ops;
pub mod event_crud;
pub mod event_query;
pub mod lifecycle_ops;
pub mod sequence_ops;

mod row;
