use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::record::Document;
use crate::filter::Filter;

/// Backend seam for the entity repository.
///
/// Implementations store each document under `(collection, id)`. `merge` must
/// apply the patch atomically against the current stored document (field-level
/// last-write-wins); no other coordination is expected.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, filter: &Filter) -> Result<Vec<Document>, DatabaseError>;

    async fn fetch(&self, collection: &str, id: &str) -> Result<Option<Document>, DatabaseError>;

    /// Store a document that already carries its `id`; `Conflict` if the id is taken
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, DatabaseError>;

    /// Merge `patch` into the stored document; `None` if it does not exist
    async fn merge(&self, collection: &str, id: &str, patch: Document) -> Result<Option<Document>, DatabaseError>;

    /// Remove a document, returning whether one existed
    async fn remove(&self, collection: &str, id: &str) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
