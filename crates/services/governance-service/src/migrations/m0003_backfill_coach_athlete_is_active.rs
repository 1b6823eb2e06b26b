//! Migration: links created before `is_active` existed are active.

use async_trait::async_trait;
use serde_json::Value;

use common::{AppResult, MigrationConfig};
use domain::{EntityKind, FIELD_IS_ACTIVE};

use super::{backfill_missing_field, Migration};
use crate::repository::DocumentStore;

pub struct BackfillCoachAthleteIsActive;

#[async_trait]
impl Migration for BackfillCoachAthleteIsActive {
    fn id(&self) -> &str {
        "0003_backfill_coach_athlete_is_active"
    }

    fn description(&self) -> &str {
        "Set is_active = true on links missing it"
    }

    async fn up(&self, store: &dyn DocumentStore, config: &MigrationConfig) -> AppResult<()> {
        backfill_missing_field(
            store,
            EntityKind::CoachAthlete.collection(),
            FIELD_IS_ACTIVE,
            config.batch_size,
            |_| Some(Value::Bool(true)),
        )
        .await?;
        Ok(())
    }
}
