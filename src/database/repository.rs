use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::record::{Document, RecordError};
use crate::database::store::DocumentStore;
use crate::filter::{Filter, FilterData};

/// Uniform query/write surface over one named collection
#[derive(Clone)]
pub struct EntityRepository {
    collection: String,
    store: Arc<dyn DocumentStore>,
    max_limit: Option<usize>,
}

impl EntityRepository {
    pub fn new(collection: impl Into<String>, store: Arc<dyn DocumentStore>) -> Result<Self, DatabaseError> {
        let collection = collection.into();
        Filter::validate_collection(&collection)
            .map_err(|_| DatabaseError::InvalidCollection(collection.clone()))?;
        Ok(Self {
            collection,
            store,
            max_limit: None,
        })
    }

    pub fn with_max_limit(mut self, max_limit: Option<usize>) -> Self {
        self.max_limit = max_limit;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Records ordered by `order` (`"-field"` for descending, most-recent-first
    /// when absent), at most `max_results` (100 when absent)
    pub async fn list(&self, order: Option<&str>, max_results: Option<i64>) -> Result<Vec<Document>, DatabaseError> {
        self.find(FilterData {
            where_clause: None,
            order: order.map(str::to_string),
            limit: max_results,
        })
        .await
    }

    /// Like `list`, restricted to records where every given field equals its value
    pub async fn filter(
        &self,
        equals: &Value,
        order: Option<&str>,
        max_results: Option<i64>,
    ) -> Result<Vec<Document>, DatabaseError> {
        self.find(FilterData {
            where_clause: Some(equals.clone()),
            order: order.map(str::to_string),
            limit: max_results,
        })
        .await
    }

    pub async fn find(&self, filter_data: FilterData) -> Result<Vec<Document>, DatabaseError> {
        let mut filter = Filter::new(&self.collection)?.max_limit(self.max_limit);
        filter.assign(filter_data)?;
        self.store.query(&filter).await
    }

    /// `None` when absent; never an error for "not found"
    pub async fn get(&self, id: &str) -> Result<Option<Document>, DatabaseError> {
        self.store.fetch(&self.collection, id).await
    }

    /// Store a new record under a generated id
    pub async fn create(&self, fields: Document, caller: Option<&str>) -> Result<Document, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        self.create_with_id(&id, fields, caller).await
    }

    /// Store a new record under a caller-chosen id (e.g. a profile keyed by account id)
    pub async fn create_with_id(
        &self,
        id: &str,
        mut fields: Document,
        caller: Option<&str>,
    ) -> Result<Document, DatabaseError> {
        if let Some(field) = fields.has_system_field() {
            return Err(RecordError::SystemFieldNotAllowed(field.to_string()).into());
        }
        fields.stamp_created(id, caller);
        let stored = self.store.insert(&self.collection, fields).await?;
        tracing::debug!("Created {}/{}", self.collection, id);
        Ok(stored)
    }

    /// Merge `fields` into an existing record; unspecified fields are preserved
    pub async fn update(&self, id: &str, mut fields: Document) -> Result<Document, DatabaseError> {
        if let Some(field) = fields.has_system_field() {
            return Err(RecordError::SystemFieldNotAllowed(field.to_string()).into());
        }
        fields.stamp_updated();
        self.store
            .merge(&self.collection, id, fields)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{}/{} not found", self.collection, id)))
    }

    /// Remove a record; succeeds when it is already gone
    pub async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        let existed = self.store.remove(&self.collection, id).await?;
        if !existed {
            tracing::debug!("Delete of missing {}/{} ignored", self.collection, id);
        }
        Ok(())
    }
}
