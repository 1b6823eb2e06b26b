//! Migration: derive display names for exercise categories from their slug.

use async_trait::async_trait;
use serde_json::Value;

use common::{AppResult, MigrationConfig};
use domain::{humanize_slug, EntityKind};

use super::{backfill_missing_field, Migration};
use crate::repository::{DocumentStore, Record};

pub struct BackfillExerciseCategoryNames;

fn name_from_slug(record: &Record) -> Option<Value> {
    let slug = record.get("slug")?.as_str()?;
    let name = humanize_slug(slug);
    (!name.is_empty()).then(|| Value::String(name))
}

#[async_trait]
impl Migration for BackfillExerciseCategoryNames {
    fn id(&self) -> &str {
        "0004_backfill_exercise_category_names"
    }

    fn description(&self) -> &str {
        "Fill missing exercise category names from slugs"
    }

    async fn up(&self, store: &dyn DocumentStore, config: &MigrationConfig) -> AppResult<()> {
        backfill_missing_field(
            store,
            EntityKind::ExerciseCategory.collection(),
            "name",
            config.batch_size,
            name_from_slug,
        )
        .await?;
        Ok(())
    }
}
