//! In-memory document store.
//!
//! Thread-safe implementation using RwLock. Enforces unique and live-only
//! unique indexes the way the database does, which makes it suitable for
//! development and for exercising the kernel in tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use uuid::Uuid;

use common::{AppError, AppResult, Page};

use super::document::{BulkWriteResult, Fields, Filter, IndexDefinition, ListQuery, Record, WriteOp};
use super::document_store::{DocumentStore, RecordStream};

#[derive(Debug, Default)]
struct CollectionState {
    records: Vec<Record>,
    indexes: Vec<IndexDefinition>,
}

impl CollectionState {
    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Reject `candidate` if it collides with another document on a unique index.
    fn check_unique(&self, collection: &str, candidate: &Record) -> AppResult<()> {
        for index in self.indexes.iter().filter(|i| i.unique) {
            if index.live_only && candidate.is_archived() {
                continue;
            }
            let key = index_key(index, &candidate.fields);
            let collides = self
                .records
                .iter()
                .filter(|other| other.id != candidate.id)
                .filter(|other| !(index.live_only && other.is_archived()))
                .any(|other| index_key(index, &other.fields) == key);
            if collides {
                return Err(AppError::conflict(format!(
                    "{} record with key ({})",
                    collection,
                    index.keys.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Replace the document at `pos` if the new version satisfies every index.
    fn replace(&mut self, collection: &str, pos: usize, updated: Record) -> AppResult<()> {
        self.check_unique(collection, &updated)?;
        self.records[pos] = updated;
        Ok(())
    }
}

fn index_key(index: &IndexDefinition, fields: &Fields) -> Vec<Value> {
    index
        .keys
        .iter()
        .map(|k| fields.get(k).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Process-local [`DocumentStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, CollectionState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes currently defined on a collection
    pub fn indexes(&self, collection: &str) -> AppResult<Vec<IndexDefinition>> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default())
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, HashMap<String, CollectionState>>> {
        self.collections
            .read()
            .map_err(|_| AppError::internal("Failed to acquire read lock"))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, HashMap<String, CollectionState>>> {
        self.collections
            .write()
            .map_err(|_| AppError::internal("Failed to acquire write lock"))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(
        &self,
        collection: &str,
        id: &str,
        include_archived: bool,
    ) -> AppResult<Option<Record>> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|c| c.records.iter().find(|r| r.id == id))
            .filter(|r| include_archived || !r.is_archived())
            .cloned())
    }

    async fn list(&self, collection: &str, query: ListQuery) -> AppResult<Page<Record>> {
        let collections = self.read()?;
        let matching: Vec<&Record> = collections
            .get(collection)
            .map(|c| {
                c.records
                    .iter()
                    .filter(|r| query.include_archived || !r.is_archived())
                    .filter(|r| query.filter.matches(&r.fields))
                    .collect()
            })
            .unwrap_or_default();

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(query.page.offset()).unwrap_or(usize::MAX))
            .take(query.page.limit() as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, total, query.page))
    }

    async fn create(&self, collection: &str, fields: Fields) -> AppResult<Record> {
        let mut collections = self.write()?;
        let state = collections.entry(collection.to_string()).or_default();

        let now = Utc::now();
        let record = Record {
            id: Uuid::new_v4().to_string(),
            fields,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.check_unique(collection, &record)?;
        state.records.push(record.clone());

        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> AppResult<Option<Record>> {
        let mut collections = self.write()?;
        let Some(state) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(pos) = state.position(id).filter(|&p| !state.records[p].is_archived()) else {
            return Ok(None);
        };

        let mut updated = state.records[pos].clone();
        updated.fields.extend(patch);
        updated.updated_at = Utc::now();
        state.replace(collection, pos, updated.clone())?;

        Ok(Some(updated))
    }

    async fn soft_delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let mut collections = self.write()?;
        let Some(state) = collections.get_mut(collection) else {
            return Ok(false);
        };

        match state.records.iter_mut().find(|r| r.id == id && !r.is_archived()) {
            Some(record) => {
                let now = Utc::now();
                record.deleted_at = Some(now);
                record.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn restore(&self, collection: &str, id: &str) -> AppResult<bool> {
        let mut collections = self.write()?;
        let Some(state) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(pos) = state.position(id).filter(|&p| state.records[p].is_archived()) else {
            return Ok(false);
        };

        let mut restored = state.records[pos].clone();
        restored.deleted_at = None;
        restored.updated_at = Utc::now();
        state.replace(collection, pos, restored)?;

        Ok(true)
    }

    async fn hard_delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let mut collections = self.write()?;
        let Some(state) = collections.get_mut(collection) else {
            return Ok(false);
        };

        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        Ok(state.records.len() < before)
    }

    async fn create_indexes(
        &self,
        collection: &str,
        indexes: Vec<IndexDefinition>,
    ) -> AppResult<()> {
        let mut collections = self.write()?;
        let state = collections.entry(collection.to_string()).or_default();

        for index in indexes {
            if state.indexes.iter().any(|existing| existing.name == index.name) {
                continue;
            }

            // Existing data must already satisfy a new unique index
            state.indexes.push(index);
            let violation = state
                .records
                .iter()
                .find_map(|record| state.check_unique(collection, record).err());
            if let Some(err) = violation {
                state.indexes.pop();
                return Err(err);
            }
        }

        Ok(())
    }

    async fn bulk_write(&self, collection: &str, ops: Vec<WriteOp>) -> AppResult<BulkWriteResult> {
        let mut collections = self.write()?;
        let state = collections.entry(collection.to_string()).or_default();

        let mut result = BulkWriteResult::default();
        let mut first_error = None;

        for op in ops {
            match op {
                WriteOp::UpdateOne { id, set } => {
                    let Some(pos) = state.position(&id) else {
                        continue;
                    };
                    result.matched += 1;

                    let mut updated = state.records[pos].clone();
                    let before = updated.fields.clone();
                    updated.fields.extend(set);
                    if updated.fields == before {
                        continue;
                    }
                    updated.updated_at = Utc::now();
                    match state.replace(collection, pos, updated) {
                        Ok(()) => result.modified += 1,
                        Err(err) => {
                            first_error.get_or_insert(err);
                        }
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    fn find(&self, collection: &str, filter: Filter, projection: Option<Vec<String>>) -> RecordStream {
        let snapshot: AppResult<Vec<Record>> = self.read().map(|collections| {
            collections
                .get(collection)
                .map(|c| {
                    c.records
                        .iter()
                        .filter(|r| filter.matches(&r.fields))
                        .cloned()
                        .map(|r| r.project(projection.as_deref()))
                        .collect()
                })
                .unwrap_or_default()
        });

        match snapshot {
            Ok(records) => stream::iter(records.into_iter().map(Ok::<Record, AppError>)).boxed(),
            Err(err) => stream::once(async move { Err(err) }).boxed(),
        }
    }
}
