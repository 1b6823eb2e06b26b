//! Database connection and initialization.

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use common::DatabaseConfig;

use super::schema::Migrator;

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
}

impl Database {
    /// Initialize database connection and bootstrap the document schema.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let db = Self::connect_without_bootstrap(config).await?;

        Migrator::up(&db.connection, None).await?;
        tracing::info!("Database connected and document schema ready");

        Ok(db)
    }

    /// Connect without touching the schema (for status commands).
    pub async fn connect_without_bootstrap(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .sqlx_logging(false);

        let connection = SeaDatabase::connect(options).await?;
        Ok(Self { connection })
    }

    /// Get a clone of the database connection.
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Whether every schema bootstrap step has been applied.
    pub async fn is_bootstrapped(&self) -> Result<bool, DbErr> {
        let pending = Migrator::get_pending_migrations(&self.connection).await?;
        for migration in &pending {
            tracing::debug!(name = migration.name(), "Schema bootstrap step pending");
        }
        Ok(pending.is_empty())
    }
}
