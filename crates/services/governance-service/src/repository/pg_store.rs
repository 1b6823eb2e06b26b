//! PostgreSQL document store backed by a single JSONB `documents` table.
//!
//! Every collection shares the table and is distinguished by the `collection`
//! column. Filters and indexes share one JSONB expression per field,
//! `(body -> 'field')`, so the planner can serve filters from the expression
//! indexes (partial over `deleted_at IS NULL` when live-only).

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, Statement, Value as DbValue,
};
use serde_json::Value;
use uuid::Uuid;

use common::{AppError, AppResult, Page};

use super::document::{BulkWriteResult, Fields, Filter, IndexDefinition, ListQuery, Record, WriteOp};
use super::document_store::{DocumentStore, RecordStream};
use super::entities::document::{self, ActiveModel, Entity as DocumentEntity};

/// Identifiers interpolated into DDL must match this pattern
static SAFE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Concrete [`DocumentStore`] over PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    db: DatabaseConnection,
    scan_batch_size: u64,
}

impl PgStore {
    /// Create new store instance; `scan_batch_size` bounds rows fetched per cursor page
    pub fn new(db: DatabaseConnection, scan_batch_size: u64) -> Self {
        Self {
            db,
            scan_batch_size: scan_batch_size.max(1),
        }
    }
}

/// Unique violations become conflicts; everything else stays a raw database error.
fn map_db_err(collection: &str, err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => unique_conflict(collection, &detail),
        _ => AppError::from(err),
    }
}

/// Conflict with a stable message; the driver detail names indexes and stays in the logs.
fn unique_conflict(collection: &str, detail: &str) -> AppError {
    tracing::debug!(collection, detail, "Unique index violation");
    AppError::conflict(format!("{} record", collection))
}

fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

fn filter_condition(filter: &Filter) -> AppResult<Condition> {
    let condition = match filter {
        Filter::All => Condition::all(),
        Filter::Eq(field, value) => Condition::all().add(Expr::cust_with_values(
            format!("{} = $1::jsonb", field_expr(field)?),
            [value.to_string()],
        )),
        Filter::Missing(field) => Condition::all().add(Expr::cust(format!(
            "coalesce({}, 'null'::jsonb) = 'null'::jsonb",
            field_expr(field)?
        ))),
        Filter::Exists(field) => Condition::all().add(Expr::cust(format!(
            "coalesce({}, 'null'::jsonb) <> 'null'::jsonb",
            field_expr(field)?
        ))),
        Filter::OwnedBy(field, owner_id) => {
            let owner = Value::String(owner_id.clone()).to_string();
            let reference = format!(
                "coalesce({field} -> 'id', {field} -> '_id') = $1::jsonb",
                field = field_expr(field)?
            );
            Condition::any()
                .add(Expr::cust_with_values(
                    format!("{} = $1::jsonb", field_expr(field)?),
                    [owner.clone()],
                ))
                .add(Expr::cust_with_values(reference, [owner]))
        }
        Filter::And(filters) => filters.iter().try_fold(Condition::all(), |condition, f| {
            Ok::<_, AppError>(condition.add(filter_condition(f)?))
        })?,
    };
    Ok(condition)
}

/// JSONB expression for a body field, shared by filters and index definitions.
fn field_expr(field: &str) -> AppResult<String> {
    ensure_identifier("field", field)?;
    Ok(format!("(body -> '{}')", field))
}

fn ensure_identifier(kind: &str, value: &str) -> AppResult<()> {
    if SAFE_IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(AppError::validation(format!("invalid {} '{}'", kind, value)))
    }
}

/// Build the `CREATE INDEX` statement for one definition.
fn index_sql(collection: &str, index: &IndexDefinition) -> AppResult<String> {
    ensure_identifier("collection", collection)?;
    ensure_identifier("index name", &index.name)?;
    if index.keys.is_empty() {
        return Err(AppError::validation(format!("index '{}' has no keys", index.name)));
    }
    let columns = index
        .keys
        .iter()
        .map(|key| field_expr(key))
        .collect::<AppResult<Vec<_>>>()?
        .join(", ");
    let mut predicate = format!("collection = '{}'", collection);
    if index.live_only {
        predicate.push_str(" AND deleted_at IS NULL");
    }

    Ok(format!(
        "CREATE {}INDEX IF NOT EXISTS \"idx_{}_{}\" ON documents ({}) WHERE {}",
        if index.unique { "UNIQUE " } else { "" },
        collection,
        index.name,
        columns,
        predicate
    ))
}

enum ScanState {
    Start,
    After(Uuid),
    Done,
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(
        &self,
        collection: &str,
        id: &str,
        include_archived: bool,
    ) -> AppResult<Option<Record>> {
        let Some(uuid) = parse_id(id) else {
            return Ok(None);
        };

        let mut query = DocumentEntity::find_by_id(uuid)
            .filter(document::Column::Collection.eq(collection));
        if !include_archived {
            query = query.filter(document::Column::DeletedAt.is_null());
        }

        let result = query.one(&self.db).await.map_err(|e| map_db_err(collection, e))?;
        Ok(result.map(Record::from))
    }

    async fn list(&self, collection: &str, query: ListQuery) -> AppResult<Page<Record>> {
        let mut select = DocumentEntity::find()
            .filter(document::Column::Collection.eq(collection))
            .filter(filter_condition(&query.filter)?);
        if !query.include_archived {
            select = select.filter(document::Column::DeletedAt.is_null());
        }

        let paginator = select
            .order_by_asc(document::Column::CreatedAt)
            .order_by_asc(document::Column::Id)
            .paginate(&self.db, query.page.limit());
        let total = paginator.num_items().await.map_err(|e| map_db_err(collection, e))?;
        let models = paginator
            .fetch_page(query.page.page() - 1)
            .await
            .map_err(|e| map_db_err(collection, e))?;

        Ok(Page::new(
            models.into_iter().map(Record::from).collect(),
            total,
            query.page,
        ))
    }

    async fn create(&self, collection: &str, fields: Fields) -> AppResult<Record> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            collection: Set(collection.to_string()),
            body: Set(Value::Object(fields)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = active_model.insert(&self.db).await.map_err(|e| map_db_err(collection, e))?;
        Ok(Record::from(model))
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> AppResult<Option<Record>> {
        let Some(uuid) = parse_id(id) else {
            return Ok(None);
        };

        // Shallow merge of the patch into the stored body
        let result = DocumentEntity::update_many()
            .col_expr(
                document::Column::Body,
                Expr::cust_with_values("body || $1::jsonb", [Value::Object(patch).to_string()]),
            )
            .col_expr(document::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(document::Column::Id.eq(uuid))
            .filter(document::Column::Collection.eq(collection))
            .filter(document::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| map_db_err(collection, e))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get(collection, id, false).await
    }

    async fn soft_delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let Some(uuid) = parse_id(id) else {
            return Ok(false);
        };

        let now = Utc::now();
        let result = DocumentEntity::update_many()
            .col_expr(document::Column::DeletedAt, Expr::value(now))
            .col_expr(document::Column::UpdatedAt, Expr::value(now))
            .filter(document::Column::Id.eq(uuid))
            .filter(document::Column::Collection.eq(collection))
            .filter(document::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| map_db_err(collection, e))?;

        Ok(result.rows_affected > 0)
    }

    async fn restore(&self, collection: &str, id: &str) -> AppResult<bool> {
        let Some(uuid) = parse_id(id) else {
            return Ok(false);
        };

        let result = DocumentEntity::update_many()
            .col_expr(
                document::Column::DeletedAt,
                Expr::value(DbValue::ChronoDateTimeUtc(None)),
            )
            .col_expr(document::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(document::Column::Id.eq(uuid))
            .filter(document::Column::Collection.eq(collection))
            .filter(document::Column::DeletedAt.is_not_null())
            .exec(&self.db)
            .await
            .map_err(|e| map_db_err(collection, e))?;

        Ok(result.rows_affected > 0)
    }

    async fn hard_delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let Some(uuid) = parse_id(id) else {
            return Ok(false);
        };

        let result = DocumentEntity::delete_many()
            .filter(document::Column::Id.eq(uuid))
            .filter(document::Column::Collection.eq(collection))
            .exec(&self.db)
            .await
            .map_err(|e| map_db_err(collection, e))?;

        Ok(result.rows_affected > 0)
    }

    async fn create_indexes(
        &self,
        collection: &str,
        indexes: Vec<IndexDefinition>,
    ) -> AppResult<()> {
        let backend = self.db.get_database_backend();
        for index in &indexes {
            let sql = index_sql(collection, index)?;
            tracing::debug!(collection, index = %index.name, "Creating index");
            self.db
                .execute(Statement::from_string(backend, sql))
                .await
                .map_err(|e| map_db_err(collection, e))?;
        }
        Ok(())
    }

    async fn bulk_write(&self, collection: &str, ops: Vec<WriteOp>) -> AppResult<BulkWriteResult> {
        let mut result = BulkWriteResult::default();
        let mut first_error = None;

        for op in ops {
            match op {
                WriteOp::UpdateOne { id, set } => {
                    let Some(uuid) = parse_id(&id) else {
                        continue;
                    };
                    let outcome = DocumentEntity::update_many()
                        .col_expr(
                            document::Column::Body,
                            Expr::cust_with_values(
                                "body || $1::jsonb",
                                [Value::Object(set).to_string()],
                            ),
                        )
                        .col_expr(document::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(document::Column::Id.eq(uuid))
                        .filter(document::Column::Collection.eq(collection))
                        .exec(&self.db)
                        .await;

                    match outcome {
                        Ok(updated) => {
                            result.matched += updated.rows_affected;
                            result.modified += updated.rows_affected;
                        }
                        Err(err) => {
                            first_error.get_or_insert(map_db_err(collection, err));
                        }
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    fn find(&self, collection: &str, filter: Filter, projection: Option<Vec<String>>) -> RecordStream {
        let condition = match filter_condition(&filter) {
            Ok(condition) => condition,
            Err(err) => return stream::iter([Err(err)]).boxed(),
        };
        let db = self.db.clone();
        let collection = collection.to_string();
        let batch_size = self.scan_batch_size;

        // Keyset pagination on id: documents updated mid-scan never shift the window
        let batches = stream::try_unfold(ScanState::Start, move |state| {
            let db = db.clone();
            let collection = collection.clone();
            let condition = condition.clone();
            async move {
                let after = match state {
                    ScanState::Done => return Ok(None),
                    ScanState::Start => None,
                    ScanState::After(id) => Some(id),
                };

                let mut query = DocumentEntity::find()
                    .filter(document::Column::Collection.eq(collection.as_str()))
                    .filter(condition)
                    .order_by_asc(document::Column::Id)
                    .limit(batch_size);
                if let Some(id) = after {
                    query = query.filter(document::Column::Id.gt(id));
                }

                let models = query.all(&db).await.map_err(|e| map_db_err(&collection, e))?;
                let next = match models.last() {
                    Some(last) if models.len() as u64 == batch_size => ScanState::After(last.id),
                    Some(_) => ScanState::Done,
                    None => return Ok(None),
                };
                Ok::<_, AppError>(Some((models, next)))
            }
        });

        batches
            .map_ok(move |models| {
                let projection = projection.clone();
                stream::iter(models.into_iter().map(move |model| {
                    Ok::<Record, AppError>(Record::from(model).project(projection.as_deref()))
                }))
            })
            .try_flatten()
            .boxed()
    }
}
