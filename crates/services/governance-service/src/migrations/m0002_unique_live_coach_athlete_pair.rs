//! Migration: at most one live link per coach-athlete pair.

use async_trait::async_trait;

use common::{AppResult, MigrationConfig};
use domain::{EntityKind, FIELD_ATHLETE_ID, FIELD_COACH_ID};

use super::Migration;
use crate::repository::{DocumentStore, IndexDefinition};

pub struct UniqueLiveCoachAthletePair;

#[async_trait]
impl Migration for UniqueLiveCoachAthletePair {
    fn id(&self) -> &str {
        "0002_unique_live_coach_athlete_pair"
    }

    fn description(&self) -> &str {
        "Unique (coachId, athleteId) over non-deleted links"
    }

    async fn up(&self, store: &dyn DocumentStore, _config: &MigrationConfig) -> AppResult<()> {
        // Archived links are history and may repeat a pair
        let index = IndexDefinition::new("unique_live_pair", &[FIELD_COACH_ID, FIELD_ATHLETE_ID])
            .unique()
            .live_only();

        store
            .create_indexes(EntityKind::CoachAthlete.collection(), vec![index])
            .await
    }
}
