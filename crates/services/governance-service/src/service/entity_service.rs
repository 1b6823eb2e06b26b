//! Generic entity use case.
//!
//! Thin adapter every entity-specific use case builds on: ownership checks on
//! reads and writes, owner stamping on create, lifecycle delegation, and
//! normalization of every error that leaves it.

use std::sync::Arc;

use async_trait::async_trait;

use common::{AppError, AppResult, OptionExt, Page, PageRequest, ResultExt};
use domain::{can_act, normalize_owner, Action, EntityKind, OwnerField, Session, FIELD_CREATED_BY};

use super::LifecycleManager;
use crate::repository::{DocumentStore, Fields, Filter, ListQuery, Record};

/// Entity use case trait for dependency injection.
///
/// By default, reads exclude soft-deleted records.
#[async_trait]
pub trait EntityService: Send + Sync {
    /// Fetch a record the session may read; `None` when absent
    async fn get(&self, id: &str, session: &Session, include_archived: bool)
        -> AppResult<Option<Record>>;

    /// List records; non-admin sessions only see records they own
    async fn list(
        &self,
        session: &Session,
        filter: Filter,
        page: PageRequest,
        include_archived: bool,
    ) -> AppResult<Page<Record>>;

    /// Create a record owned by the session (or by the subject it names)
    async fn create(&self, session: &Session, fields: Fields) -> AppResult<Record>;

    /// Merge `patch` into a live record; the owner cannot be changed
    async fn update(&self, id: &str, session: &Session, patch: Fields) -> AppResult<Record>;

    async fn soft_delete(&self, id: &str, session: &Session) -> AppResult<bool>;

    async fn hard_delete(&self, id: &str, session: &Session) -> AppResult<bool>;

    async fn restore(&self, id: &str, session: &Session) -> AppResult<bool>;
}

/// Concrete [`EntityService`] for one entity kind.
pub struct EntityManager {
    store: Arc<dyn DocumentStore>,
    kind: EntityKind,
    lifecycle: LifecycleManager,
    usecase_code: String,
}

impl EntityManager {
    pub fn new(store: Arc<dyn DocumentStore>, kind: EntityKind) -> Self {
        Self {
            lifecycle: LifecycleManager::new(store.clone(), kind),
            usecase_code: kind.usecase_code(),
            store,
            kind,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    fn owner_of(&self, record: &Record) -> Option<String> {
        record.owner(self.kind.owner_field())
    }

    fn ensure_allowed(&self, record: &Record, session: &Session, action: Action) -> AppResult<()> {
        if can_act(session, self.owner_of(record).as_deref(), action) {
            Ok(())
        } else {
            Err(AppError::forbidden(self.kind.forbidden_code(action)))
        }
    }

    /// Stamp ownership fields before insertion.
    fn stamp_owner(&self, session: &Session, mut fields: Fields) -> Fields {
        fields.insert(FIELD_CREATED_BY.to_string(), session.user_id().into());

        if self.kind.owner_field() == OwnerField::Subject {
            let key = OwnerField::Subject.key();
            let subject = fields
                .get(key)
                .and_then(normalize_owner)
                .unwrap_or_else(|| session.user_id().to_string());
            fields.insert(key.to_string(), subject.into());
        }

        fields
    }

    async fn load_live(&self, id: &str) -> AppResult<Record> {
        self.store
            .get(self.kind.collection(), id, false)
            .await?
            .ok_or_not_found(self.kind.not_found_code())
    }
}

#[async_trait]
impl EntityService for EntityManager {
    async fn get(
        &self,
        id: &str,
        session: &Session,
        include_archived: bool,
    ) -> AppResult<Option<Record>> {
        let found = async {
            let record = self
                .store
                .get(self.kind.collection(), id, include_archived)
                .await?;
            if let Some(record) = &record {
                self.ensure_allowed(record, session, Action::Read)?;
            }
            Ok::<_, AppError>(record)
        };

        found.await.normalize_err(&self.usecase_code)
    }

    async fn list(
        &self,
        session: &Session,
        filter: Filter,
        page: PageRequest,
        include_archived: bool,
    ) -> AppResult<Page<Record>> {
        let filter = if session.is_admin() {
            filter
        } else {
            filter.and(Filter::owned_by(self.kind.owner_field().key(), session.user_id()))
        };
        let query = ListQuery::new(filter, page).include_archived(include_archived);

        self.store
            .list(self.kind.collection(), query)
            .await
            .normalize_err(&self.usecase_code)
    }

    async fn create(&self, session: &Session, fields: Fields) -> AppResult<Record> {
        let fields = self.stamp_owner(session, fields);

        self.store
            .create(self.kind.collection(), fields)
            .await
            .normalize_err(&self.usecase_code)
    }

    async fn update(&self, id: &str, session: &Session, mut patch: Fields) -> AppResult<Record> {
        // Ownership is fixed at creation
        patch.remove(FIELD_CREATED_BY);
        patch.remove(self.kind.owner_field().key());

        let updated = async {
            let record = self.load_live(id).await?;
            self.ensure_allowed(&record, session, Action::Update)?;

            self.store
                .update(self.kind.collection(), id, patch)
                .await?
                .ok_or_not_found(self.kind.not_found_code())
        };

        updated.await.normalize_err(&self.usecase_code)
    }

    async fn soft_delete(&self, id: &str, session: &Session) -> AppResult<bool> {
        self.lifecycle
            .soft_delete(id, session)
            .await
            .normalize_err(&self.usecase_code)
    }

    async fn hard_delete(&self, id: &str, session: &Session) -> AppResult<bool> {
        self.lifecycle
            .hard_delete(id, session)
            .await
            .normalize_err(&self.usecase_code)
    }

    async fn restore(&self, id: &str, session: &Session) -> AppResult<bool> {
        self.lifecycle
            .restore(id, session)
            .await
            .normalize_err(&self.usecase_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::{json, Value};

    use domain::Role;

    use crate::repository::MockDocumentStore;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn stored(fields: Fields) -> Record {
        let now = Utc::now();
        Record {
            id: "r1".to_string(),
            fields,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn db_failure() -> AppError {
        AppError::internal("connection refused")
    }

    #[tokio::test]
    async fn test_store_failure_becomes_usecase_code() {
        let mut store = MockDocumentStore::new();
        store.expect_get().returning(|_, _, _| Err(db_failure()));

        let service = EntityManager::new(Arc::new(store), EntityKind::Client);
        let err = service
            .get("r1", &Session::new("u1", Role::Coach), false)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Usecase(ref code) if code == "CLIENT_USECASE"));
    }

    #[tokio::test]
    async fn test_lifecycle_failure_becomes_usecase_code() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .returning(|_, _, _| Ok(Some(stored(fields(json!({ "createdBy": "u1" }))))));
        store.expect_soft_delete().returning(|_, _| Err(db_failure()));

        let service = EntityManager::new(Arc::new(store), EntityKind::MealDay);
        let err = service
            .soft_delete("r1", &Session::new("u1", Role::Coach))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "MEAL_DAY_USECASE");
    }

    #[tokio::test]
    async fn test_coded_errors_pass_through() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .returning(|_, _, _| Ok(Some(stored(fields(json!({ "createdBy": "u2" }))))));

        let service = EntityManager::new(Arc::new(store), EntityKind::Prospect);
        let err = service
            .get("r1", &Session::new("u1", Role::Athlete), false)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "PROSPECT_FORBIDDEN");
    }

    #[tokio::test]
    async fn test_conflict_passes_through() {
        let mut store = MockDocumentStore::new();
        store
            .expect_create()
            .returning(|_, _| Err(AppError::conflict("coach_athletes record")));

        let service = EntityManager::new(Arc::new(store), EntityKind::CoachAthlete);
        let err = service
            .create(&Session::new("c1", Role::Coach), Fields::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_stamps_creator() {
        let mut store = MockDocumentStore::new();
        store.expect_create().returning(|_, fields| Ok(stored(fields)));

        let service = EntityManager::new(Arc::new(store), EntityKind::Note);
        let record = service
            .create(
                &Session::new("u1", Role::Coach),
                fields(json!({ "title": "Check-in", "createdBy": "someone-else" })),
            )
            .await
            .unwrap();

        assert_eq!(record.get("createdBy"), Some(&json!("u1")));
    }

    #[tokio::test]
    async fn test_create_keeps_named_subject() {
        let mut store = MockDocumentStore::new();
        store.expect_create().returning(|_, fields| Ok(stored(fields)));

        let service = EntityManager::new(Arc::new(store), EntityKind::Program);
        let session = Session::new("coach-1", Role::Coach);

        let named = service
            .create(&session, fields(json!({ "userId": { "id": "athlete-9" } })))
            .await
            .unwrap();
        assert_eq!(named.get("userId"), Some(&json!("athlete-9")));
        assert_eq!(named.get("createdBy"), Some(&json!("coach-1")));

        let unnamed = service.create(&session, Fields::new()).await.unwrap();
        assert_eq!(unnamed.get("userId"), Some(&json!("coach-1")));
    }

    #[tokio::test]
    async fn test_update_cannot_change_owner() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .returning(|_, _, _| Ok(Some(stored(fields(json!({ "createdBy": "u1" }))))));
        store.expect_update().returning(|_, _, patch| {
            let mut body = fields(json!({ "createdBy": "u1" }));
            body.extend(patch);
            Ok(Some(stored(body)))
        });

        let service = EntityManager::new(Arc::new(store), EntityKind::Task);
        let record = service
            .update(
                "r1",
                &Session::new("u1", Role::Coach),
                fields(json!({ "title": "Done", "createdBy": "u2" })),
            )
            .await
            .unwrap();

        assert_eq!(record.get("createdBy"), Some(&json!("u1")));
        assert_eq!(record.get("title"), Some(&json!("Done")));
    }

    #[tokio::test]
    async fn test_update_absent_and_denied() {
        let session = Session::new("u1", Role::Coach);

        let mut empty = MockDocumentStore::new();
        empty.expect_get().returning(|_, _, _| Ok(None));
        empty.expect_update().never();
        let service = EntityManager::new(Arc::new(empty), EntityKind::Exercise);

        let absent = service.update("r1", &session, Fields::new()).await.unwrap_err();
        assert_eq!(absent.code(), "EXERCISE_NOT_FOUND");

        let mut foreign = MockDocumentStore::new();
        foreign
            .expect_get()
            .returning(|_, _, _| Ok(Some(stored(fields(json!({ "createdBy": "u2" }))))));
        foreign.expect_update().never();
        let service = EntityManager::new(Arc::new(foreign), EntityKind::Exercise);

        let denied = service.update("r1", &session, Fields::new()).await.unwrap_err();
        assert_eq!(denied.code(), "EXERCISE_UPDATE_FORBIDDEN");
    }

    #[tokio::test]
    async fn test_list_scopes_non_admins_to_own_records() {
        let mut store = MockDocumentStore::new();
        store
            .expect_list()
            .withf(|_, query| query.filter == Filter::owned_by("createdBy", "u1"))
            .times(1)
            .returning(|_, query| Ok(Page::new(vec![], 0, query.page)));
        store
            .expect_list()
            .withf(|_, query| query.filter == Filter::All)
            .times(1)
            .returning(|_, query| Ok(Page::new(vec![], 0, query.page)));

        let service = EntityManager::new(Arc::new(store), EntityKind::Client);

        let coach = service
            .list(&Session::new("u1", Role::Coach), Filter::All, PageRequest::default(), false)
            .await;
        assert!(coach.is_ok());

        let admin = service
            .list(&Session::new("a1", Role::Admin), Filter::All, PageRequest::default(), false)
            .await;
        assert!(admin.is_ok());
    }
}
