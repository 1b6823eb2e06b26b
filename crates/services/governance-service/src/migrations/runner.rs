//! Sequential, record-keeping migration runner.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use tracing::{debug, info, instrument, warn};

use common::{AppError, AppResult, MigrationConfig};
use domain::MigrationRecord;

use super::{Migration, MigrationRegistry};
use crate::repository::{to_fields, DocumentStore, Filter, IndexDefinition};

const MIGRATION_ID_FIELD: &str = "migrationId";

/// Outcome of a runner invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Migrations applied by this run, in order
    pub applied: Vec<String>,
    /// Migrations found already applied
    pub skipped: Vec<String>,
}

/// Whether a registered migration has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub id: String,
    pub description: String,
    pub applied_at: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Applies pending migrations one at a time and records each success.
///
/// Concurrent runners against the same store are not supported.
pub struct MigrationRunner {
    store: Arc<dyn DocumentStore>,
    config: MigrationConfig,
}

impl MigrationRunner {
    pub fn new(store: Arc<dyn DocumentStore>, config: MigrationConfig) -> Self {
        Self { store, config }
    }

    /// Apply every pending migration in registry order.
    ///
    /// Stops at the first failure; migrations applied before it stay recorded.
    pub async fn run(&self, registry: &MigrationRegistry) -> AppResult<RunReport> {
        self.ensure_applied_index().await?;
        let applied = self.applied().await?;

        for id in applied.keys().filter(|id| !registry.contains(id)) {
            warn!(id = %id, "Applied migration is not in the registry");
        }

        let mut report = RunReport::default();
        for migration in registry.iter() {
            if applied.contains_key(migration.id()) {
                debug!(id = migration.id(), "Migration already applied, skipping");
                report.skipped.push(migration.id().to_string());
                continue;
            }

            self.apply(migration).await?;
            report.applied.push(migration.id().to_string());
        }

        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "Migrations up to date"
        );
        Ok(report)
    }

    /// Applied state of every registered migration, without changing anything.
    pub async fn status(&self, registry: &MigrationRegistry) -> AppResult<Vec<MigrationStatus>> {
        let applied = self.applied().await?;

        Ok(registry
            .iter()
            .map(|migration| MigrationStatus {
                id: migration.id().to_string(),
                description: migration.description().to_string(),
                applied_at: applied.get(migration.id()).map(|r| r.applied_at),
            })
            .collect())
    }

    #[instrument(name = "migration", skip(self, migration), fields(id = migration.id()))]
    async fn apply(&self, migration: &dyn Migration) -> AppResult<()> {
        let id = migration.id();
        info!(description = migration.description(), "Applying migration");

        migration
            .up(self.store.as_ref(), &self.config)
            .await
            .map_err(|e| AppError::migration(id, e.to_string()))?;

        // Recorded right after `up`; a crash in between re-runs an idempotent `up`
        let record = MigrationRecord::new(id, migration.description());
        let fields = to_fields(&record)?;
        self.store
            .create(&self.config.collection, fields)
            .await
            .map_err(|e| AppError::migration(id, format!("failed to record migration: {}", e)))?;

        info!("Migration applied");
        Ok(())
    }

    async fn ensure_applied_index(&self) -> AppResult<()> {
        self.store
            .create_indexes(
                &self.config.collection,
                vec![IndexDefinition::new("unique_migration_id", &[MIGRATION_ID_FIELD]).unique()],
            )
            .await
    }

    async fn applied(&self) -> AppResult<HashMap<String, MigrationRecord>> {
        let records: Vec<_> = self
            .store
            .find(&self.config.collection, Filter::All, None)
            .try_collect()
            .await?;

        records
            .iter()
            .map(|record| {
                let applied = record.decode::<MigrationRecord>()?;
                Ok::<_, AppError>((applied.migration_id.clone(), applied))
            })
            .collect()
    }
}

/// Run every pending migration with the default configuration.
pub async fn run_migrations(
    registry: &MigrationRegistry,
    store: Arc<dyn DocumentStore>,
) -> AppResult<RunReport> {
    MigrationRunner::new(store, MigrationConfig::default())
        .run(registry)
        .await
}
