//! Service layer: lifecycle, visibility and the generic entity use case.

mod entity_service;
mod lifecycle;
mod visibility;

use std::sync::Arc;

use domain::{Action, EntityKind, Session};

use crate::repository::DocumentStore;

pub use entity_service::{EntityManager, EntityService};
pub use lifecycle::LifecycleManager;
pub use visibility::VisibilityResolver;

/// Entry point handing out kernel services bound to one store.
#[derive(Clone)]
pub struct Kernel {
    store: Arc<dyn DocumentStore>,
}

impl Kernel {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Get the entity use case for `kind`
    pub fn entity(&self, kind: EntityKind) -> Arc<dyn EntityService> {
        Arc::new(EntityManager::new(self.store.clone(), kind))
    }

    pub fn lifecycle(&self, kind: EntityKind) -> LifecycleManager {
        LifecycleManager::new(self.store.clone(), kind)
    }

    pub fn visibility(&self) -> VisibilityResolver {
        VisibilityResolver::new(self.store.clone())
    }

    /// Pure authorization decision, see [`domain::can_act`]
    pub fn can_act(&self, session: &Session, owner_id: Option<&str>, action: Action) -> bool {
        domain::can_act(session, owner_id, action)
    }
}
