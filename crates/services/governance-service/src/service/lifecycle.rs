//! Two-tier deletion lifecycle shared by every entity kind.
//!
//! Soft delete is reversible and restricted to owners and admins. Hard delete
//! physically removes the record, archived or not.

use std::sync::Arc;

use tracing::{debug, info};

use common::{AppError, AppResult};
use domain::{can_act, Action, EntityKind, Session};

use crate::repository::{DocumentStore, Record};

/// Lifecycle operations for one entity kind.
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn DocumentStore>,
    kind: EntityKind,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn DocumentStore>, kind: EntityKind) -> Self {
        Self { store, kind }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Archive a live record.
    ///
    /// Returns `false` when no live record exists, whoever asks.
    pub async fn soft_delete(&self, id: &str, session: &Session) -> AppResult<bool> {
        let collection = self.kind.collection();
        let Some(record) = self.store.get(collection, id, false).await? else {
            debug!(collection, id, "No live record to soft delete");
            return Ok(false);
        };

        self.authorize(&record, session, Action::Delete, self.kind.forbidden_code(Action::Delete))?;

        let deleted = self.store.soft_delete(collection, id).await?;
        if deleted {
            info!(collection, id, user_id = session.user_id(), "Record soft deleted");
        }
        Ok(deleted)
    }

    /// Permanently remove a record, live or archived.
    ///
    /// A missing record is a silent `false` for admins and `<P>_NOT_FOUND`
    /// for everyone else.
    pub async fn hard_delete(&self, id: &str, session: &Session) -> AppResult<bool> {
        let collection = self.kind.collection();
        let Some(record) = self.store.get(collection, id, true).await? else {
            if session.is_admin() {
                debug!(collection, id, "No record to hard delete");
                return Ok(false);
            }
            return Err(AppError::not_found(self.kind.not_found_code()));
        };

        self.authorize(
            &record,
            session,
            Action::HardDelete,
            self.kind.forbidden_code(Action::HardDelete),
        )?;

        let deleted = self.store.hard_delete(collection, id).await?;
        if deleted {
            info!(collection, id, user_id = session.user_id(), "Record permanently deleted");
        }
        Ok(deleted)
    }

    /// Bring an archived record back to life.
    ///
    /// Returns `false` when the record is absent or already live.
    pub async fn restore(&self, id: &str, session: &Session) -> AppResult<bool> {
        let collection = self.kind.collection();
        let record = match self.store.get(collection, id, true).await? {
            Some(record) if record.is_archived() => record,
            _ => {
                debug!(collection, id, "No archived record to restore");
                return Ok(false);
            }
        };

        self.authorize(&record, session, Action::Update, self.kind.restore_forbidden_code())?;

        let restored = self.store.restore(collection, id).await?;
        if restored {
            info!(collection, id, user_id = session.user_id(), "Record restored");
        }
        Ok(restored)
    }

    fn authorize(
        &self,
        record: &Record,
        session: &Session,
        action: Action,
        denied_code: String,
    ) -> AppResult<()> {
        let owner = record.owner(self.kind.owner_field());
        if can_act(session, owner.as_deref(), action) {
            Ok(())
        } else {
            Err(AppError::forbidden(denied_code))
        }
    }
}
