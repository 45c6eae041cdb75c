use serde_json::Value;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::filter::Filter;

/// Executes a [`Filter`] against the Postgres documents table
pub struct QueryBuilder<'f> {
    filter: &'f Filter,
}

impl<'f> QueryBuilder<'f> {
    pub fn new(filter: &'f Filter) -> Self {
        Self { filter }
    }

    /// Returns the raw `data` column of every matching row
    pub async fn select_all(&self, pool: &PgPool) -> Result<Vec<Value>, DatabaseError> {
        let sql_result = self.filter.to_sql();
        tracing::debug!("document query: {}", sql_result.query);

        let mut q = sqlx::query_scalar::<_, Value>(&sql_result.query).bind(self.filter.collection());
        for p in sql_result.params.iter() {
            q = q.bind(p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }
}
