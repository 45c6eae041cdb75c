use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::query_builder::QueryBuilder;
use crate::database::record::Document;
use crate::database::store::DocumentStore;
use crate::filter::Filter;

const FETCH_DOCUMENT: &str =
    r#"SELECT "data" FROM "documents" WHERE "collection" = $1 AND "id" = $2"#;

const INSERT_DOCUMENT: &str = r#"
    INSERT INTO "documents" ("collection", "id", "data") VALUES ($1, $2, $3)
    ON CONFLICT DO NOTHING
    RETURNING "data"
"#;

// `||` is a single-statement top-level merge, so concurrent patches to
// different fields of one document never lose each other.
const MERGE_DOCUMENT: &str = r#"
    UPDATE "documents" SET "data" = "data" || $3
    WHERE "collection" = $1 AND "id" = $2
    RETURNING "data"
"#;

const DELETE_DOCUMENT: &str = r#"DELETE FROM "documents" WHERE "collection" = $1 AND "id" = $2"#;

/// Document store backed by a single JSONB table in Postgres
pub struct PgDocumentStore {
    manager: Arc<DatabaseManager>,
}

impl PgDocumentStore {
    pub fn new(manager: Arc<DatabaseManager>) -> Self {
        Self { manager }
    }

    fn into_document(value: Value) -> Result<Document, DatabaseError> {
        Document::from_stored(value).ok_or_else(|| DatabaseError::Corrupt("data is not an object".to_string()))
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn query(&self, filter: &Filter) -> Result<Vec<Document>, DatabaseError> {
        let pool = self.manager.pool().await?;
        QueryBuilder::new(filter)
            .select_all(&pool)
            .await?
            .into_iter()
            .map(Self::into_document)
            .collect()
    }

    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Document>, DatabaseError> {
        let pool = self.manager.pool().await?;
        let row = sqlx::query_scalar::<_, Value>(FETCH_DOCUMENT)
            .bind(collection)
            .bind(id)
            .fetch_optional(&pool)
            .await?;
        row.map(Self::into_document).transpose()
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, DatabaseError> {
        let id = doc
            .id()
            .ok_or_else(|| DatabaseError::Corrupt("document has no id".to_string()))?
            .to_string();

        let pool = self.manager.pool().await?;
        let row = sqlx::query_scalar::<_, Value>(INSERT_DOCUMENT)
            .bind(collection)
            .bind(&id)
            .bind(doc.into_value())
            .fetch_optional(&pool)
            .await?;

        match row {
            Some(value) => Self::into_document(value),
            None => Err(DatabaseError::Conflict(format!("{}/{}", collection, id))),
        }
    }

    async fn merge(&self, collection: &str, id: &str, patch: Document) -> Result<Option<Document>, DatabaseError> {
        let pool = self.manager.pool().await?;
        let row = sqlx::query_scalar::<_, Value>(MERGE_DOCUMENT)
            .bind(collection)
            .bind(id)
            .bind(patch.into_value())
            .fetch_optional(&pool)
            .await?;
        row.map(Self::into_document).transpose()
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, DatabaseError> {
        let pool = self.manager.pool().await?;
        let result = sqlx::query(DELETE_DOCUMENT)
            .bind(collection)
            .bind(id)
            .execute(&pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.manager.health_check().await
    }
}
