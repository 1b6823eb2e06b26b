//! Store-agnostic document types: records, filters, index and write definitions.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use common::{AppError, AppResult, PageRequest};
use domain::{normalize_owner, EntityState, OwnerField};

/// Document body: a JSON object of domain fields.
pub type Fields = Map<String, Value>;

/// Serialize a typed value into a document body.
pub fn to_fields<T: Serialize>(value: &T) -> AppResult<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(AppError::internal(format!(
            "document body must be an object, got {}",
            other
        ))),
    }
}

/// A stored document with its bookkeeping timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp (None = live)
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn state(&self) -> EntityState {
        EntityState::of(self.deleted_at)
    }

    pub fn is_archived(&self) -> bool {
        self.state() == EntityState::SoftDeleted
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn owner(&self, field: OwnerField) -> Option<String> {
        field.extract(&self.fields)
    }

    /// Deserialize the body into a typed domain value.
    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }

    /// Keep only the projected fields of the body.
    pub fn project(mut self, projection: Option<&[String]>) -> Self {
        if let Some(keep) = projection {
            self.fields.retain(|key, _| keep.iter().any(|k| k == key));
        }
        self
    }
}

/// Minimal query language understood by every store.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Field equals the given JSON value
    Eq(String, Value),
    /// Field absent or null
    Missing(String),
    /// Field present and not null
    Exists(String),
    /// Field names the given owner, as a plain id or an `{ id }` / `{ _id }` reference
    OwnedBy(String, String),
    /// Every nested filter matches
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Filter::Missing(field.into())
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Filter::Exists(field.into())
    }

    pub fn owned_by(field: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Filter::OwnedBy(field.into(), owner_id.into())
    }

    /// Combine with another filter, flattening nested conjunctions
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, other) | (other, Filter::All) => other,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), other) => {
                left.push(other);
                Filter::And(left)
            }
            (one, other) => Filter::And(vec![one, other]),
        }
    }

    /// Evaluate against a document body
    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => fields.get(field) == Some(value),
            Filter::Missing(field) => fields.get(field).map_or(true, Value::is_null),
            Filter::Exists(field) => fields.get(field).is_some_and(|v| !v.is_null()),
            Filter::OwnedBy(field, owner_id) => fields
                .get(field)
                .and_then(normalize_owner)
                .is_some_and(|owner| owner == *owner_id),
            Filter::And(filters) => filters.iter().all(|f| f.matches(fields)),
        }
    }
}

/// Index over one or more body fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: String,
    pub keys: Vec<String>,
    pub unique: bool,
    /// Only live (non soft-deleted) documents participate
    pub live_only: bool,
}

impl IndexDefinition {
    pub fn new(name: impl Into<String>, keys: &[&str]) -> Self {
        Self {
            name: name.into(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            unique: false,
            live_only: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Restrict the index to documents without `deletedAt`
    pub fn live_only(mut self) -> Self {
        self.live_only = true;
        self
    }
}

/// Single operation of a bulk write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Merge `set` into the body of document `id`
    UpdateOne { id: String, set: Fields },
}

/// Acknowledgement of a bulk write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    pub matched: u64,
    pub modified: u64,
}

/// Parameters of a paginated list query.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: Filter,
    pub page: PageRequest,
    pub include_archived: bool,
}

impl ListQuery {
    pub fn new(filter: Filter, page: PageRequest) -> Self {
        Self {
            filter,
            page,
            include_archived: false,
        }
    }

    pub fn include_archived(mut self, include: bool) -> Self {
        self.include_archived = include;
        self
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(Filter::All, PageRequest::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_matching() {
        let body = fields(json!({ "slug": "leg-day", "name": null, "is_active": true }));

        assert!(Filter::eq("slug", "leg-day").matches(&body));
        assert!(!Filter::eq("slug", "arm-day").matches(&body));
        assert!(Filter::missing("name").matches(&body));
        assert!(Filter::missing("locale").matches(&body));
        assert!(Filter::exists("slug").matches(&body));
        assert!(Filter::eq("slug", "leg-day")
            .and(Filter::eq("is_active", true))
            .matches(&body));
    }

    #[test]
    fn test_owned_by_accepts_embedded_references() {
        let plain = fields(json!({ "createdBy": "u1" }));
        let by_id = fields(json!({ "createdBy": { "id": "u1", "name": "Ann" } }));
        let by_mongo_id = fields(json!({ "createdBy": { "_id": "u1" } }));
        let foreign = fields(json!({ "createdBy": { "_id": "u2" } }));
        let unowned = fields(json!({ "title": "orphan" }));

        let filter = Filter::owned_by("createdBy", "u1");
        assert!(filter.matches(&plain));
        assert!(filter.matches(&by_id));
        assert!(filter.matches(&by_mongo_id));
        assert!(!filter.matches(&foreign));
        assert!(!filter.matches(&unowned));
    }

    #[test]
    fn test_filter_and_flattens() {
        let filter = Filter::All
            .and(Filter::eq("a", 1))
            .and(Filter::eq("b", 2))
            .and(Filter::And(vec![Filter::eq("c", 3)]));

        assert_eq!(
            filter,
            Filter::And(vec![Filter::eq("a", 1), Filter::eq("b", 2), Filter::eq("c", 3)])
        );
    }

    #[test]
    fn test_projection() {
        let now = Utc::now();
        let record = Record {
            id: "1".into(),
            fields: fields(json!({ "slug": "x", "name": "X", "locale": "en" })),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let projected = record.project(Some(&["slug".to_string()]));
        assert_eq!(projected.fields.len(), 1);
        assert!(projected.get("slug").is_some());
    }
}
