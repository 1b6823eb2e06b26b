//! Migration: category slugs are unique per locale among live categories.

use async_trait::async_trait;

use common::{AppResult, MigrationConfig};
use domain::EntityKind;

use super::Migration;
use crate::repository::{DocumentStore, IndexDefinition};

pub struct UniqueLiveExerciseCategorySlug;

#[async_trait]
impl Migration for UniqueLiveExerciseCategorySlug {
    fn id(&self) -> &str {
        "0005_unique_live_exercise_category_slug"
    }

    fn description(&self) -> &str {
        "Unique (slug, locale) over non-deleted exercise categories"
    }

    async fn up(&self, store: &dyn DocumentStore, _config: &MigrationConfig) -> AppResult<()> {
        let index = IndexDefinition::new("unique_live_slug_locale", &["slug", "locale"])
            .unique()
            .live_only();

        store
            .create_indexes(EntityKind::ExerciseCategory.collection(), vec![index])
            .await
    }
}
