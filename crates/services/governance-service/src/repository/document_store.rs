//! Document store gateway consumed by the governance kernel.

use async_trait::async_trait;
use futures::stream::BoxStream;

use common::{AppResult, Page};

use super::document::{BulkWriteResult, Fields, Filter, IndexDefinition, ListQuery, Record, WriteOp};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Cursor over the documents matched by [`DocumentStore::find`].
pub type RecordStream = BoxStream<'static, AppResult<Record>>;

/// Generic per-collection document access.
///
/// By default, reads exclude soft-deleted documents; `include_archived`
/// switches that filter off. `find` is a raw scan and sees every document.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find a document by id
    async fn get(&self, collection: &str, id: &str, include_archived: bool)
        -> AppResult<Option<Record>>;

    /// List documents matching a filter, one page at a time
    async fn list(&self, collection: &str, query: ListQuery) -> AppResult<Page<Record>>;

    /// Insert a new document
    async fn create(&self, collection: &str, fields: Fields) -> AppResult<Record>;

    /// Merge `patch` into a live document; `None` when there is no such document
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> AppResult<Option<Record>>;

    /// Set `deletedAt` on a live document
    async fn soft_delete(&self, collection: &str, id: &str) -> AppResult<bool>;

    /// Clear `deletedAt` on a soft-deleted document
    async fn restore(&self, collection: &str, id: &str) -> AppResult<bool>;

    /// Permanently remove a document, live or archived
    async fn hard_delete(&self, collection: &str, id: &str) -> AppResult<bool>;

    /// Create indexes; an existing index with the same name is left untouched
    async fn create_indexes(&self, collection: &str, indexes: Vec<IndexDefinition>)
        -> AppResult<()>;

    /// Apply every operation, unordered; the first failure is reported after all ran
    async fn bulk_write(&self, collection: &str, ops: Vec<WriteOp>) -> AppResult<BulkWriteResult>;

    /// Scan documents matching `filter`, optionally projecting body fields
    fn find(&self, collection: &str, filter: Filter, projection: Option<Vec<String>>)
        -> RecordStream;
}
