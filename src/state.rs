use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseError, DatabaseManager, DocumentStore, EntityRepository, MemoryStore, PgDocumentStore};
use crate::providers::{HttpIdentityProvider, HttpPushProvider, IdentityProvider, PlacesClient, PushProvider};

/// Shared application state handed to every handler.
///
/// Everything here is either immutable or internally synchronized; handlers
/// clone the `Arc`s and never hold locks across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub push: Arc<dyn PushProvider>,
    pub places: Arc<PlacesClient>,
    /// Present with the Postgres backend so the pool can be closed on shutdown
    pub database: Option<Arc<DatabaseManager>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        push: Arc<dyn PushProvider>,
        places: Arc<PlacesClient>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            identity,
            push,
            places,
            database: None,
        }
    }

    /// Build the store backend and real provider clients described by `config`
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let timeout = config.api.upstream_timeout_secs;
        let identity = Arc::new(HttpIdentityProvider::new(&config.identity, timeout)?);
        let push = Arc::new(HttpPushProvider::new(&config.push, timeout)?);
        let places = Arc::new(PlacesClient::new(&config.places, timeout)?);

        let database = match config.database.backend {
            StoreBackend::Memory => None,
            StoreBackend::Postgres => Some(Arc::new(DatabaseManager::new(&config.database)?)),
        };
        let store: Arc<dyn DocumentStore> = match &database {
            Some(manager) => Arc::new(PgDocumentStore::new(manager.clone())),
            None => {
                tracing::warn!("Using in-memory document store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let mut state = Self::new(config, store, identity, push, places);
        state.database = database;
        Ok(state)
    }

    /// Repository over `collection`, bounded by the configured max limit
    pub fn repository(&self, collection: &str) -> Result<EntityRepository, DatabaseError> {
        Ok(EntityRepository::new(collection, self.store.clone())?.with_max_limit(self.config.filter.max_limit))
    }
}
