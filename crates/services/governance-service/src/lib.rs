//! Governance Service Library
//!
//! This crate provides the entity governance kernel: ownership checks,
//! the soft/hard delete lifecycle, coach-athlete visibility and the
//! collection migration runner. It can be embedded by use cases or run as
//! a CLI for deploy-time migrations.

pub mod config;
pub mod infra;
pub mod migrations;
pub mod repository;
pub mod service;

use std::sync::Arc;

use tracing::info;

use crate::config::GovernanceConfig;
use crate::infra::Database;
use crate::migrations::MigrationRunner;
use crate::repository::{DocumentStore, PgStore};

pub use service::{EntityManager, EntityService, Kernel, LifecycleManager, VisibilityResolver};

/// Run migrations (for CLI commands).
pub async fn run_migrate_command(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = GovernanceConfig::from_env();
    let registry = migrations::registry()?;

    match action {
        MigrateAction::Up => {
            let db = Database::connect(&config.database).await?;
            let runner = MigrationRunner::new(pg_store(&db, &config), config.migrations.clone());

            let report = runner.run(&registry).await?;
            for id in &report.applied {
                println!("applied {}", id);
            }
            info!(
                applied = report.applied.len(),
                skipped = report.skipped.len(),
                "Migrations applied successfully"
            );
        }
        MigrateAction::Status => {
            let db = Database::connect_without_bootstrap(&config.database).await?;

            // Before bootstrap there is no documents table, hence nothing applied
            if !db.is_bootstrapped().await? {
                for migration in registry.iter() {
                    println!("[ ] {}  {}", migration.id(), migration.description());
                }
                return Ok(());
            }

            let runner = MigrationRunner::new(pg_store(&db, &config), config.migrations.clone());
            for status in runner.status(&registry).await? {
                let marker = if status.is_applied() { "[x]" } else { "[ ]" };
                println!("{} {}  {}", marker, status.id, status.description);
            }
        }
    }

    Ok(())
}

fn pg_store(db: &Database, config: &GovernanceConfig) -> Arc<dyn DocumentStore> {
    Arc::new(PgStore::new(
        db.get_connection(),
        config.migrations.batch_size as u64,
    ))
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Status,
}
