//! Migration contract and the ordered registry of known migrations.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::warn;

use common::{AppError, AppResult, MigrationConfig};
use domain::follows_id_convention;

use crate::repository::DocumentStore;

/// A forward-only change to persisted collections.
///
/// `up` must be safe to re-run after a partial failure: structural steps are
/// idempotent by index name and backfills only select unprocessed records.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Stable identifier, `NNNN_slug`
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    async fn up(&self, store: &dyn DocumentStore, config: &MigrationConfig) -> AppResult<()>;
}

/// Migrations in declaration order, ids unique.
pub struct MigrationRegistry {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new(migrations: Vec<Box<dyn Migration>>) -> AppResult<Self> {
        let mut seen = HashSet::new();

        for migration in &migrations {
            let id = migration.id();
            if id.trim().is_empty() {
                return Err(AppError::migration(id, "migration id must not be empty"));
            }
            if !seen.insert(id) {
                return Err(AppError::migration(id, "duplicate migration id"));
            }
            if !follows_id_convention(id) {
                warn!(id, "Migration id does not follow the NNNN_slug convention");
            }
        }

        Ok(Self { migrations })
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.iter().map(|m| m.id()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.iter().any(|m| m.id() == id)
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}
