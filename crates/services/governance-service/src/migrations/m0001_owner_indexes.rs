//! Migration: index owner fields on every governed collection.

use async_trait::async_trait;

use common::{AppResult, MigrationConfig};
use domain::{EntityKind, OwnerField, FIELD_CREATED_BY};

use super::Migration;
use crate::repository::{DocumentStore, IndexDefinition};

pub struct OwnerIndexes;

#[async_trait]
impl Migration for OwnerIndexes {
    fn id(&self) -> &str {
        "0001_owner_indexes"
    }

    fn description(&self) -> &str {
        "Index createdBy and userId owner fields"
    }

    async fn up(&self, store: &dyn DocumentStore, _config: &MigrationConfig) -> AppResult<()> {
        for kind in EntityKind::ALL {
            let mut indexes = vec![IndexDefinition::new("owner_created_by", &[FIELD_CREATED_BY])];
            if kind.owner_field() == OwnerField::Subject {
                indexes.push(IndexDefinition::new(
                    "owner_user_id",
                    &[OwnerField::Subject.key()],
                ));
            }

            store.create_indexes(kind.collection(), indexes).await?;
        }
        Ok(())
    }
}
