use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{Document, Store, StoreError};
use crate::query::{Condition, QueryEngine, QuerySpec};

/// SQL-backed document store. Each collection is a table of shape
/// (id uuid primary key, doc jsonb, created_at, updated_at); uniqueness is
/// enforced with expression indexes over `doc` fields.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the collection table and its unique expression indexes if they
    /// do not exist yet. Called once per collection at startup.
    pub async fn ensure_collection(
        &self,
        collection: &str,
        unique_field_sets: &[&[&str]],
    ) -> Result<(), StoreError> {
        QueryEngine::validate_collection_name(collection)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let create = format!(
            "CREATE TABLE IF NOT EXISTS \"{collection}\" (\
             id UUID PRIMARY KEY, \
             doc JSONB NOT NULL, \
             created_at TIMESTAMPTZ NOT NULL DEFAULT now(), \
             updated_at TIMESTAMPTZ NOT NULL DEFAULT now())"
        );
        sqlx::query(&create)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error(collection))?;

        for fields in unique_field_sets {
            let index_name = format!("{}_{}_unique", collection, fields.join("_"));
            let exprs: Vec<String> = fields.iter().map(|f| format!("(doc->>'{f}')")).collect();
            let index = format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"{index_name}\" ON \"{collection}\" ({})",
                exprs.join(", ")
            );
            sqlx::query(&index)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error(collection))?;
        }
        Ok(())
    }

    async fn fetch(&self, collection: &str, spec: &QuerySpec) -> Result<Vec<PgRow>, StoreError> {
        let plan = QueryEngine::to_sql(collection, spec)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut query = sqlx::query(&plan.query);
        for param in &plan.params {
            query = query.bind(param.clone());
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error(collection))
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn find(&self, collection: &str, spec: &QuerySpec) -> Result<Vec<Document>, StoreError> {
        let rows = self.fetch(collection, spec).await?;
        let docs = rows
            .iter()
            .map(row_to_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(docs
            .into_iter()
            .map(|doc| QueryEngine::project(&spec.projection, doc))
            .collect())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        QueryEngine::validate_collection_name(collection)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let query = format!(
            "SELECT id, doc, created_at, updated_at FROM \"{collection}\" WHERE id = $1"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error(collection))?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn find_one(
        &self,
        collection: &str,
        conditions: &[Condition],
    ) -> Result<Option<Document>, StoreError> {
        let spec = QuerySpec {
            conditions: conditions.to_vec(),
            page: 1,
            limit: Some(1),
            ..Default::default()
        };
        let rows = self.fetch(collection, &spec).await?;
        rows.first().map(row_to_document).transpose()
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError> {
        QueryEngine::validate_collection_name(collection)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let id = Uuid::new_v4();
        let body = strip_bookkeeping(doc);
        let query = format!(
            "INSERT INTO \"{collection}\" (id, doc) VALUES ($1, $2) \
             RETURNING id, doc, created_at, updated_at"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(Value::Object(body))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error(collection))?;
        row_to_document(&row)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: Uuid,
        doc: Document,
    ) -> Result<Option<Document>, StoreError> {
        QueryEngine::validate_collection_name(collection)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let body = strip_bookkeeping(doc);
        let query = format!(
            "UPDATE \"{collection}\" SET doc = $2, updated_at = now() WHERE id = $1 \
             RETURNING id, doc, created_at, updated_at"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(Value::Object(body))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error(collection))?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn delete_by_id(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        QueryEngine::validate_collection_name(collection)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let query = format!("DELETE FROM \"{collection}\" WHERE id = $1");
        let result = sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error(collection))?;
        Ok(result.rows_affected() > 0)
    }
}

/// Bookkeeping columns live outside the jsonb body and are re-merged on read.
fn strip_bookkeeping(mut doc: Document) -> Document {
    doc.remove("id");
    doc.remove("created_at");
    doc.remove("updated_at");
    doc
}

fn row_to_document(row: &PgRow) -> Result<Document, StoreError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    let doc: Value = row
        .try_get("doc")
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| StoreError::Backend(e.to_string()))?;

    let mut out = match doc {
        Value::Object(map) => map,
        other => {
            return Err(StoreError::Backend(format!(
                "Document column is not an object: {other}"
            )))
        }
    };
    out.insert("id".to_string(), Value::String(id.to_string()));
    out.insert(
        "created_at".to_string(),
        Value::String(created_at.to_rfc3339()),
    );
    out.insert(
        "updated_at".to_string(),
        Value::String(updated_at.to_rfc3339()),
    );
    Ok(out)
}

fn map_sqlx_error(collection: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation {
            collection: collection.to_string(),
        },
        _ => StoreError::Backend(err.to_string()),
    }
}
