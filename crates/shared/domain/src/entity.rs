//! Entity kinds managed by the platform and how their ownership is resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::authorization::Action;
use crate::constants::{FIELD_CREATED_BY, FIELD_USER_ID};

/// Lifecycle state of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityState {
    Live,
    SoftDeleted,
}

impl EntityState {
    pub fn of(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            None => EntityState::Live,
            Some(_) => EntityState::SoftDeleted,
        }
    }
}

/// Field holding the identifier authoritative for access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerField {
    /// The user who created the record (`createdBy`)
    CreatedBy,
    /// The user the record is about (`userId`), e.g. a program built for an athlete
    Subject,
}

impl OwnerField {
    pub fn key(&self) -> &'static str {
        match self {
            OwnerField::CreatedBy => FIELD_CREATED_BY,
            OwnerField::Subject => FIELD_USER_ID,
        }
    }

    /// Extract and normalize the owner id from a document body.
    pub fn extract(&self, fields: &Map<String, Value>) -> Option<String> {
        fields.get(self.key()).and_then(normalize_owner)
    }
}

/// Reduce an owner reference to a plain string id.
///
/// Accepts a raw string or an embedded reference object carrying `id` or `_id`.
pub fn normalize_owner(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Object(reference) => reference
            .get("id")
            .or_else(|| reference.get("_id"))
            .and_then(normalize_owner),
        _ => None,
    }
}

/// Collections governed by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Client,
    Prospect,
    Exercise,
    ExerciseCategory,
    Program,
    MealPlan,
    MealDay,
    Task,
    Note,
    CoachAthlete,
}

impl EntityKind {
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Client,
        EntityKind::Prospect,
        EntityKind::Exercise,
        EntityKind::ExerciseCategory,
        EntityKind::Program,
        EntityKind::MealPlan,
        EntityKind::MealDay,
        EntityKind::Task,
        EntityKind::Note,
        EntityKind::CoachAthlete,
    ];

    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Client => "clients",
            EntityKind::Prospect => "prospects",
            EntityKind::Exercise => "exercises",
            EntityKind::ExerciseCategory => "exercise_categories",
            EntityKind::Program => "programs",
            EntityKind::MealPlan => "meal_plans",
            EntityKind::MealDay => "meal_days",
            EntityKind::Task => "tasks",
            EntityKind::Note => "notes",
            EntityKind::CoachAthlete => "coach_athletes",
        }
    }

    /// Program and meal plan records are owned by the athlete they describe.
    pub fn owner_field(&self) -> OwnerField {
        match self {
            EntityKind::Program | EntityKind::MealPlan => OwnerField::Subject,
            _ => OwnerField::CreatedBy,
        }
    }

    /// Upper-case prefix used to build error codes.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            EntityKind::Client => "CLIENT",
            EntityKind::Prospect => "PROSPECT",
            EntityKind::Exercise => "EXERCISE",
            EntityKind::ExerciseCategory => "EXERCISE_CATEGORY",
            EntityKind::Program => "PROGRAM",
            EntityKind::MealPlan => "MEAL_PLAN",
            EntityKind::MealDay => "MEAL_DAY",
            EntityKind::Task => "TASK",
            EntityKind::Note => "NOTE",
            EntityKind::CoachAthlete => "COACH_ATHLETE",
        }
    }

    /// Code raised when `action` is denied on a record of this kind.
    pub fn forbidden_code(&self, action: Action) -> String {
        let prefix = self.code_prefix();
        match action {
            Action::Read => format!("{}_FORBIDDEN", prefix),
            Action::Update => format!("{}_UPDATE_FORBIDDEN", prefix),
            Action::Delete => format!("{}_DELETE_FORBIDDEN", prefix),
            Action::HardDelete => format!("UNAUTHORIZED_TO_HARD_DELETE_{}", prefix),
        }
    }

    pub fn restore_forbidden_code(&self) -> String {
        format!("{}_RESTORE_FORBIDDEN", self.code_prefix())
    }

    pub fn not_found_code(&self) -> String {
        format!("{}_NOT_FOUND", self.code_prefix())
    }

    /// Fallback code for failures that carry no recognized code.
    pub fn usecase_code(&self) -> String {
        format!("{}_USECASE", self.code_prefix())
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.collection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_extract_plain_string_owner() {
        let fields = body(json!({ "createdBy": "u1" }));
        assert_eq!(OwnerField::CreatedBy.extract(&fields), Some("u1".to_string()));
    }

    #[test]
    fn test_extract_nested_reference_owner() {
        let fields = body(json!({ "userId": { "id": "athlete-7", "name": "Sam" } }));
        assert_eq!(OwnerField::Subject.extract(&fields), Some("athlete-7".to_string()));

        let fields = body(json!({ "createdBy": { "_id": "u9" } }));
        assert_eq!(OwnerField::CreatedBy.extract(&fields), Some("u9".to_string()));
    }

    #[test]
    fn test_extract_missing_or_malformed_owner() {
        let fields = body(json!({ "createdBy": 42, "userId": "" }));
        assert_eq!(OwnerField::CreatedBy.extract(&fields), None);
        assert_eq!(OwnerField::Subject.extract(&fields), None);
        assert_eq!(OwnerField::CreatedBy.extract(&Map::new()), None);
    }

    #[test]
    fn test_subject_owned_kinds() {
        assert_eq!(EntityKind::Program.owner_field(), OwnerField::Subject);
        assert_eq!(EntityKind::MealPlan.owner_field(), OwnerField::Subject);
        assert_eq!(EntityKind::Client.owner_field(), OwnerField::CreatedBy);
    }

    #[test]
    fn test_error_codes() {
        let kind = EntityKind::Client;
        assert_eq!(kind.forbidden_code(Action::Read), "CLIENT_FORBIDDEN");
        assert_eq!(kind.forbidden_code(Action::Delete), "CLIENT_DELETE_FORBIDDEN");
        assert_eq!(
            kind.forbidden_code(Action::HardDelete),
            "UNAUTHORIZED_TO_HARD_DELETE_CLIENT"
        );
        assert_eq!(kind.not_found_code(), "CLIENT_NOT_FOUND");
        assert_eq!(kind.usecase_code(), "CLIENT_USECASE");
    }

    #[test]
    fn test_entity_state() {
        assert_eq!(EntityState::of(None), EntityState::Live);
        assert_eq!(EntityState::of(Some(Utc::now())), EntityState::SoftDeleted);
    }
}
