use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::lazy::LazyResource;
use crate::database::record::RecordError;
use crate::filter::error::FilterError;

/// Errors from the document store layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    Conflict(String),

    #[error("Stored document is malformed: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Query(#[from] FilterError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const CREATE_DOCUMENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS "documents" (
        "collection" TEXT NOT NULL,
        "id" TEXT NOT NULL,
        "data" JSONB NOT NULL,
        PRIMARY KEY ("collection", "id")
    )
"#;

/// Owns the Postgres connection pool. The pool is created on first use;
/// concurrent first callers share a single connect.
pub struct DatabaseManager {
    url: String,
    max_connections: u32,
    connection_timeout: Duration,
    pool: LazyResource<PgPool>,
}

impl DatabaseManager {
    pub fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .clone()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        Self::validate_url(&url)?;

        Ok(Self {
            url,
            max_connections: config.max_connections,
            connection_timeout: Duration::from_secs(config.connection_timeout),
            pool: LazyResource::new(),
        })
    }

    /// Get the pool, connecting and creating the documents table on first call
    pub async fn pool(&self) -> Result<PgPool, DatabaseError> {
        self.pool.get_or_try_load(|| self.connect()).await
    }

    async fn connect(&self) -> Result<PgPool, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connection_timeout)
            .connect(&self.url)
            .await?;

        sqlx::query(CREATE_DOCUMENTS_TABLE).execute(&pool).await?;

        info!("Created database pool ({} max connections)", self.max_connections);
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let pool = self.pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown). The next `pool()` call reconnects.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.take().await {
            pool.close().await;
            info!("Closed database pool");
        }
    }

    fn validate_url(raw: &str) -> Result<(), DatabaseError> {
        let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => Ok(()),
            _ => Err(DatabaseError::InvalidDatabaseUrl),
        }
    }
}
