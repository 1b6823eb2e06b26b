//! Repository layer for data access.

mod document;
mod document_store;
pub mod entities;
mod memory_store;
mod pg_store;

pub use document::{
    to_fields, BulkWriteResult, Fields, Filter, IndexDefinition, ListQuery, Record, WriteOp,
};
pub use document_store::{DocumentStore, RecordStream};
pub use memory_store::MemoryStore;
pub use pg_store::PgStore;

#[cfg(any(test, feature = "test-utils"))]
pub use document_store::MockDocumentStore;
