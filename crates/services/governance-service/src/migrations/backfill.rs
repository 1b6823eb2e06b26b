//! Reusable data backfill: fill a field on every record that lacks it.

use futures::TryStreamExt;
use serde_json::Value;
use tracing::{debug, info};

use common::AppResult;

use crate::repository::{DocumentStore, Fields, Filter, Record, WriteOp};

/// Set `field` on every record of `collection` where it is missing or null.
///
/// `derive` computes the value from the record; records it returns `None`
/// for are left untouched. Updates are sent as unordered bulk writes of at
/// most `batch_size` operations and the cursor is always drained. Returns the
/// number of modified records. Selecting only records missing the field makes
/// a second run a no-op.
pub async fn backfill_missing_field<F>(
    store: &dyn DocumentStore,
    collection: &str,
    field: &str,
    batch_size: usize,
    derive: F,
) -> AppResult<u64>
where
    F: Fn(&Record) -> Option<Value> + Send + Sync,
{
    let batch_size = batch_size.max(1);
    let mut cursor = store.find(collection, Filter::missing(field), None);
    let mut batch = Vec::with_capacity(batch_size);
    let mut matched = 0u64;
    let mut modified = 0u64;

    while let Some(record) = cursor.try_next().await? {
        matched += 1;
        let Some(value) = derive(&record) else {
            debug!(collection, field, id = %record.id, "No value derivable, skipping");
            continue;
        };

        let mut set = Fields::new();
        set.insert(field.to_string(), value);
        batch.push(WriteOp::UpdateOne { id: record.id, set });

        if batch.len() >= batch_size {
            let ops = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
            modified += store.bulk_write(collection, ops).await?.modified;
        }
    }

    if !batch.is_empty() {
        modified += store.bulk_write(collection, batch).await?.modified;
    }

    if matched == 0 {
        info!(collection, field, "No records to backfill");
    } else {
        info!(collection, field, matched, modified, "Backfill complete");
    }

    Ok(modified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream::{self, StreamExt};
    use mockall::predicate::always;
    use serde_json::json;

    use common::AppError;

    use crate::repository::{BulkWriteResult, MockDocumentStore};

    fn missing_name(id: usize) -> Record {
        let now = chrono::Utc::now();
        Record {
            id: format!("r{}", id),
            fields: json!({ "slug": "leg-day" }).as_object().cloned().unwrap(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_writes_in_batches() {
        let mut store = MockDocumentStore::new();
        store.expect_find().times(1).returning(|_, _, _| {
            stream::iter((0..5).map(|i| Ok::<Record, AppError>(missing_name(i)))).boxed()
        });
        store
            .expect_bulk_write()
            .with(always(), always())
            .times(3)
            .returning(|_, ops| {
                assert!(ops.len() <= 2);
                let n = ops.len() as u64;
                Ok(BulkWriteResult { matched: n, modified: n })
            });

        let modified = backfill_missing_field(&store, "exercise_categories", "name", 2, |_| {
            Some(json!("Leg Day"))
        })
        .await
        .unwrap();

        assert_eq!(modified, 5);
    }

    #[tokio::test]
    async fn test_no_matches_is_noop() {
        let mut store = MockDocumentStore::new();
        store
            .expect_find()
            .returning(|_, _, _| stream::empty::<AppResult<Record>>().boxed());
        store.expect_bulk_write().never();

        let modified = backfill_missing_field(&store, "coach_athletes", "is_active", 500, |_| {
            Some(Value::Bool(true))
        })
        .await
        .unwrap();

        assert_eq!(modified, 0);
    }

    #[tokio::test]
    async fn test_bulk_write_failure_propagates() {
        let mut store = MockDocumentStore::new();
        store.expect_find().returning(|_, _, _| {
            stream::iter(vec![Ok::<Record, AppError>(missing_name(1))]).boxed()
        });
        store
            .expect_bulk_write()
            .returning(|_, _| Err(AppError::internal("write concern failed")));

        let result =
            backfill_missing_field(&store, "coach_athletes", "is_active", 10, |_| Some(json!(true)))
                .await;

        assert!(result.is_err());
    }
}
