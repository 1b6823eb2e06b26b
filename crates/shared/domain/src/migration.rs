//! Applied-migration bookkeeping.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `0009_create_meal_day`: zero-padded sequence number followed by a slug
static MIGRATION_ID_CONVENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}_[a-z0-9]+(_[a-z0-9]+)*$").expect("valid regex"));

/// One applied migration, persisted in the migrations-applied collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    pub migration_id: String,
    pub description: String,
    pub applied_at: DateTime<Utc>,
}

impl MigrationRecord {
    pub fn new(migration_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            migration_id: migration_id.into(),
            description: description.into(),
            applied_at: Utc::now(),
        }
    }
}

/// Check an id against the `NNNN_slug` naming convention.
pub fn follows_id_convention(id: &str) -> bool {
    MIGRATION_ID_CONVENTION.is_match(id)
}
