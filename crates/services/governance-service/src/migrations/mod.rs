//! Collection migrations.
//!
//! Each migration is a separate module. Ids follow the pattern
//! `{NNNN}_{slug}` and are applied in the order [`registry`] declares them.

mod backfill;
mod registry;
mod runner;

mod m0001_owner_indexes;
mod m0002_unique_live_coach_athlete_pair;
mod m0003_backfill_coach_athlete_is_active;
mod m0004_backfill_exercise_category_names;
mod m0005_unique_live_exercise_category_slug;

use common::AppResult;

pub use backfill::backfill_missing_field;
pub use registry::{Migration, MigrationRegistry};
pub use runner::{run_migrations, MigrationRunner, MigrationStatus, RunReport};

/// The platform's migrations, in application order.
pub fn registry() -> AppResult<MigrationRegistry> {
    MigrationRegistry::new(vec![
        Box::new(m0001_owner_indexes::OwnerIndexes),
        Box::new(m0002_unique_live_coach_athlete_pair::UniqueLiveCoachAthletePair),
        Box::new(m0003_backfill_coach_athlete_is_active::BackfillCoachAthleteIsActive),
        Box::new(m0004_backfill_exercise_category_names::BackfillExerciseCategoryNames),
        Box::new(m0005_unique_live_exercise_category_slug::UniqueLiveExerciseCategorySlug),
    ])
}
