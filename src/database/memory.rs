use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::record::Document;
use crate::database::store::DocumentStore;
use crate::filter::filter_order::FilterOrder;
use crate::filter::Filter;

/// Process-local document store for development (`DATABASE_BACKEND=memory`)
/// and tests. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, filter: &Filter) -> Result<Vec<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(filter.collection()) else {
            return Ok(vec![]);
        };

        let order = filter.order_info();
        let mut matched: Vec<&Document> = docs.values().filter(|d| filter.matches(d.as_map())).collect();
        matched.sort_by(|a, b| {
            FilterOrder::compare(order, a.get(&order.column), b.get(&order.column))
                .then_with(|| a.id().cmp(&b.id()))
        });

        Ok(matched.into_iter().take(filter.get_limit()).cloned().collect())
    }

    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Document>, DatabaseError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, DatabaseError> {
        let id = doc
            .id()
            .ok_or_else(|| DatabaseError::Corrupt("document has no id".to_string()))?
            .to_string();

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(DatabaseError::Conflict(format!("{}/{}", collection, id)));
        }
        docs.insert(id, doc.clone());
        Ok(doc)
    }

    async fn merge(&self, collection: &str, id: &str, patch: Document) -> Result<Option<Document>, DatabaseError> {
        let mut collections = self.collections.write().await;
        let Some(existing) = collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) else {
            return Ok(None);
        };
        existing.merge(patch);
        Ok(Some(existing.clone()))
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<bool, DatabaseError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
