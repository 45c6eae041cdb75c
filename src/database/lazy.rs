use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};

/// A lazily loaded, resettable shared resource.
///
/// Concurrent callers of [`LazyResource::get_or_try_load`] share one in-flight
/// load; a failed load leaves the slot empty so the next caller retries.
/// [`LazyResource::take`] resets the slot and hands back the loaded value.
pub struct LazyResource<T> {
    cell: RwLock<Arc<OnceCell<T>>>,
}

impl<T> Default for LazyResource<T> {
    fn default() -> Self {
        Self {
            cell: RwLock::new(Arc::new(OnceCell::new())),
        }
    }
}

impl<T: Clone> LazyResource<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_load<E, F, Fut>(&self, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = self.cell.read().await.clone();
        cell.get_or_try_init(load).await.cloned()
    }

    pub async fn is_loaded(&self) -> bool {
        self.cell.read().await.initialized()
    }

    pub async fn take(&self) -> Option<T> {
        let mut guard = self.cell.write().await;
        let previous = std::mem::replace(&mut *guard, Arc::new(OnceCell::new()));
        previous.get().cloned()
    }
}
