//! Governance service configuration.

use std::env;

use common::{DatabaseConfig, MigrationConfig};

/// Governance service configuration.
#[derive(Debug, Clone, Default)]
pub struct GovernanceConfig {
    pub database: DatabaseConfig,
    pub migrations: MigrationConfig,
}

impl GovernanceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database: DatabaseConfig {
                url: env::var("GOVERNANCE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or(defaults.database.max_connections),
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or(defaults.database.min_connections),
            },
            migrations: MigrationConfig {
                collection: env::var("MIGRATION_COLLECTION")
                    .ok()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or(defaults.migrations.collection),
                batch_size: parse_var("MIGRATION_BATCH_SIZE")
                    .filter(|&size: &usize| size > 0)
                    .unwrap_or(defaults.migrations.batch_size),
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GovernanceConfig::default();
        assert_eq!(config.migrations.collection, "migrations_applied");
        assert_eq!(config.migrations.batch_size, 500);
        assert!(config.database.max_connections >= config.database.min_connections);
    }
}
