//! Document row entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::repository::document::{Fields, Record};

/// One row per document; the body holds the domain fields as JSONB.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub collection: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub body: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Soft delete timestamp (NULL = live, set = archived)
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to store record
impl From<Model> for Record {
    fn from(model: Model) -> Self {
        let fields = match model.body {
            Json::Object(map) => map,
            _ => Fields::new(),
        };

        Record {
            id: model.id.to_string(),
            fields,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
        }
    }
}
