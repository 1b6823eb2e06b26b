//! Ownership-based authorization.
//!
//! Every entity use case asks the same question: may this session act on a
//! record owned by `owner_id`? The answer depends only on whether the caller
//! is an admin and whether the caller is the owner.

use serde::{Deserialize, Serialize};

use crate::session::Session;

/// Action requested on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Read,
    Update,
    Delete,
    HardDelete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Update, Action::Delete, Action::HardDelete];
}

/// The two facts an authorization decision is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipCheck {
    pub is_owner: bool,
    pub is_admin: bool,
}

impl OwnershipCheck {
    /// Derive ownership facts for a session and an already-normalized owner id.
    ///
    /// A record without a resolvable owner is owned by nobody.
    pub fn of(session: &Session, owner_id: Option<&str>) -> Self {
        Self {
            is_owner: owner_id.is_some_and(|owner| owner == session.user_id()),
            is_admin: session.is_admin(),
        }
    }

    /// Uniform rule applied to every action.
    pub fn permits(&self, _action: Action) -> bool {
        self.is_admin || self.is_owner
    }
}

/// Decide whether `session` may perform `action` on a record owned by `owner_id`.
///
/// Never fails: callers turn `false` into their own forbidden error.
pub fn can_act(session: &Session, owner_id: Option<&str>, action: Action) -> bool {
    OwnershipCheck::of(session, owner_id).permits(action)
}
