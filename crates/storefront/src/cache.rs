//! Single-snapshot list cache with a fixed time-to-live.
//!
//! Each resource repository keeps its last full list here. Reads within the
//! TTL are answered locally; a failed refresh falls back to a snapshot that
//! is still within its TTL instead of surfacing the error.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, warn};

use crate::api::ApiError;

/// Cached snapshot of one resource list.
#[derive(Clone)]
pub struct ListCache<T> {
    name: &'static str,
    cache: Cache<(), Arc<Vec<T>>>,
}

impl<T> std::fmt::Debug for ListCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListCache")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> ListCache<T> {
    /// Create an empty cache whose snapshots live for `ttl`.
    #[must_use]
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { name, cache }
    }

    /// The current snapshot, if one is still valid.
    pub async fn snapshot(&self) -> Option<Arc<Vec<T>>> {
        self.cache.get(&()).await
    }

    /// Replace the snapshot.
    pub async fn store(&self, items: Vec<T>) -> Arc<Vec<T>> {
        let items = Arc::new(items);
        self.cache.insert((), Arc::clone(&items)).await;
        items
    }

    /// Drop the snapshot so the next read goes to the backend.
    pub async fn invalidate(&self) {
        debug!(cache = self.name, "Invalidating list cache");
        self.cache.invalidate(&()).await;
    }

    /// Return the valid snapshot unless `force`, otherwise fetch and store.
    ///
    /// When the fetch fails and a valid snapshot exists, the snapshot is
    /// returned instead of the error.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when there is no valid snapshot to fall back to.
    pub async fn get_or_fetch<F, Fut>(&self, force: bool, fetch: F) -> Result<Vec<T>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ApiError>>,
    {
        if !force && let Some(items) = self.snapshot().await {
            debug!(cache = self.name, count = items.len(), "Cache hit");
            return Ok(items.as_ref().clone());
        }

        match fetch().await {
            Ok(items) => {
                self.store(items.clone()).await;
                Ok(items)
            }
            Err(err) => match self.snapshot().await {
                Some(items) => {
                    warn!(cache = self.name, error = %err, "Refresh failed, serving cached list");
                    Ok(items.as_ref().clone())
                }
                None => Err(err),
            },
        }
    }

    /// Find an item in the valid snapshot.
    pub async fn find<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.snapshot()
            .await
            .and_then(|items| items.iter().find(|item| predicate(item)).cloned())
    }
}
