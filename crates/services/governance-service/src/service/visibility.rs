//! Coach-athlete visibility resolution.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use tracing::warn;

use common::AppResult;
use domain::{CoachAthleteLink, EntityKind, FIELD_ATHLETE_ID, FIELD_COACH_ID, FIELD_IS_ACTIVE};

use crate::repository::{DocumentStore, Filter};

/// Decides whether a coach currently sees an athlete.
///
/// Reads links straight from the store on every call.
#[derive(Clone)]
pub struct VisibilityResolver {
    store: Arc<dyn DocumentStore>,
}

impl VisibilityResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// True when an active, live link for the pair covers `at` (defaults to now).
    ///
    /// Overlapping links are tolerated; the first matching one wins.
    pub async fn is_visible(
        &self,
        coach_id: &str,
        athlete_id: &str,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<bool> {
        let at = at.unwrap_or_else(Utc::now);
        let filter = Filter::eq(FIELD_COACH_ID, coach_id)
            .and(Filter::eq(FIELD_ATHLETE_ID, athlete_id))
            .and(Filter::eq(FIELD_IS_ACTIVE, true));

        let mut links = self
            .store
            .find(EntityKind::CoachAthlete.collection(), filter, None);

        while let Some(record) = links.try_next().await? {
            if record.is_archived() {
                continue;
            }

            let link = match record.decode::<CoachAthleteLink>() {
                Ok(link) => link,
                Err(e) => {
                    warn!(id = %record.id, error = %e, "Skipping malformed coach-athlete link");
                    continue;
                }
            };

            if link.grants_visibility(at) {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use futures::stream::{self, StreamExt};
    use serde_json::json;

    use common::AppError;

    use crate::repository::{MockDocumentStore, Record};

    fn link_record(id: &str, body: serde_json::Value, archived: bool) -> Record {
        let now = Utc::now();
        Record {
            id: id.to_string(),
            fields: body.as_object().cloned().unwrap(),
            created_at: now,
            updated_at: now,
            deleted_at: archived.then_some(now),
        }
    }

    fn store_with(records: Vec<Record>) -> Arc<dyn DocumentStore> {
        let mut store = MockDocumentStore::new();
        store.expect_find().times(1).returning(move |_, _, _| {
            stream::iter(records.clone().into_iter().map(Ok::<Record, AppError>)).boxed()
        });
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_archived_and_malformed_links_are_skipped() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let records = vec![
            link_record(
                "archived",
                json!({
                    "coachId": "c1",
                    "athleteId": "a1",
                    "startDate": "2024-01-01T00:00:00Z",
                    "is_active": true
                }),
                true,
            ),
            link_record("broken", json!({ "coachId": "c1", "is_active": true }), false),
        ];

        let resolver = VisibilityResolver::new(store_with(records));
        let visible = resolver.is_visible("c1", "a1", Some(at)).await.unwrap();

        assert!(!visible);
    }

    #[tokio::test]
    async fn test_first_covering_link_wins() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let records = vec![
            link_record(
                "expired",
                json!({
                    "coachId": "c1",
                    "athleteId": "a1",
                    "startDate": "2023-01-01T00:00:00Z",
                    "endDate": "2023-06-01T00:00:00Z",
                    "is_active": true
                }),
                false,
            ),
            link_record(
                "current",
                json!({
                    "coachId": "c1",
                    "athleteId": "a1",
                    "startDate": "2024-01-01T00:00:00Z",
                    "is_active": true
                }),
                false,
            ),
        ];

        let resolver = VisibilityResolver::new(store_with(records));
        assert!(resolver.is_visible("c1", "a1", Some(at)).await.unwrap());
    }

    #[tokio::test]
    async fn test_cursor_errors_propagate() {
        let mut store = MockDocumentStore::new();
        store.expect_find().returning(|_, _, _| {
            stream::iter(vec![Err::<Record, AppError>(AppError::internal("cursor closed"))]).boxed()
        });

        let resolver = VisibilityResolver::new(Arc::new(store));
        let result = resolver.is_visible("c1", "a1", None).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
