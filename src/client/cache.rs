//! Response cache keyed by [`QueryKey`]
//!
//! The view marks the key it currently renders with [`QueryCache::watch`].
//! Responses are stored under the key that produced them, and
//! [`QueryCache::current`] only ever returns data for the watched key, so a
//! late response for an abandoned filter set cannot replace a newer render.
//!
//! The cache holds at most `capacity` entries. When full, the least recently
//! stored or hit entry that is not watched is dropped.

use crate::core::error::RevOpsResult;
use crate::core::query::QueryKey;
use indexmap::IndexMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

/// Entries kept per cache unless configured otherwise
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

struct CacheState<T> {
    /// Oldest first
    entries: IndexMap<QueryKey, Arc<T>>,
    watched: Option<QueryKey>,
}

impl<T> CacheState<T> {
    fn evict_over(&mut self, capacity: usize) {
        while self.entries.len() > capacity {
            let victim = self
                .entries
                .keys()
                .position(|key| self.watched.as_ref() != Some(key));
            match victim {
                Some(index) => {
                    if let Some((key, _)) = self.entries.shift_remove_index(index) {
                        tracing::debug!(key = %key, "evicted query");
                    }
                }
                None => break,
            }
        }
    }
}

pub struct QueryCache<T> {
    state: RwLock<CacheState<T>>,
    capacity: usize,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueryCache<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// A cache keeping at most `capacity` entries (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: IndexMap::new(),
                watched: None,
            }),
            capacity: capacity.max(1),
        }
    }

    /// Make `key` the one the view renders
    pub fn watch(&self, key: QueryKey) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(key = %key, "watching query");
        state.watched = Some(key);
    }

    pub fn watched(&self) -> Option<QueryKey> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.watched.clone()
    }

    pub fn is_watched(&self, key: &QueryKey) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.watched.as_ref() == Some(key)
    }

    /// Store a response; returns whether it belongs to the watched key
    pub fn insert(&self, key: QueryKey, value: T) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let current = state.watched.as_ref() == Some(&key);
        if !current {
            tracing::debug!(key = %key, "cached response for a query no longer rendered");
        }
        state.entries.shift_remove(&key);
        state.entries.insert(key, Arc::new(value));
        state.evict_over(self.capacity);
        current
    }

    /// Move `key` to the most recent position
    fn touch(&self, key: &QueryKey) -> Option<Arc<T>> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let value = state.entries.shift_remove(key)?;
        state.entries.insert(key.clone(), Arc::clone(&value));
        Some(value)
    }

    pub fn get(&self, key: &QueryKey) -> Option<Arc<T>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.get(key).cloned()
    }

    /// Data for the watched key, if it has arrived
    pub fn current(&self) -> Option<Arc<T>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .watched
            .as_ref()
            .and_then(|key| state.entries.get(key))
            .cloned()
    }

    /// Drop every entry of `resource`, e.g. after a mutation
    pub fn invalidate_resource(&self, resource: &str) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.entries.retain(|key, _| key.resource != resource);
    }

    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Watch `key` and return its data, fetching on a miss
    ///
    /// Returns `Ok(None)` when the view moved on to another key while the
    /// fetch was in flight; the response is still cached under its own key.
    pub async fn load<F, Fut>(&self, key: QueryKey, fetch: F) -> RevOpsResult<Option<Arc<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RevOpsResult<T>>,
    {
        self.watch(key.clone());
        if let Some(hit) = self.touch(&key) {
            tracing::debug!(key = %key, "query cache hit");
            return Ok(Some(hit));
        }

        let value = fetch().await?;
        if self.insert(key.clone(), value) {
            Ok(self.get(&key))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RevOpsError;
    use crate::core::query::{ListQueryState, SortDirection};
    use crate::core::scope::OwnershipScope;

    fn key(search: &str) -> QueryKey {
        QueryKey::new(
            "accounts",
            &ListQueryState {
                scope: OwnershipScope::Mine,
                filters: Vec::new(),
                search: search.to_string(),
                sort_field: "Name".to_string(),
                sort_direction: SortDirection::Asc,
            },
        )
    }

    #[test]
    fn test_late_response_is_not_rendered() {
        let cache = QueryCache::new();
        cache.watch(key("old"));
        cache.watch(key("new"));

        assert!(cache.insert(key("new"), vec!["fresh"]));
        assert!(!cache.insert(key("old"), vec!["stale"]));

        assert_eq!(*cache.current().unwrap(), vec!["fresh"]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_current_is_none_until_watched_key_arrives() {
        let cache: QueryCache<Vec<&str>> = QueryCache::new();
        assert!(cache.current().is_none());

        cache.watch(key("acme"));
        cache.insert(key("other"), vec!["x"]);
        assert!(cache.current().is_none());
    }

    #[test]
    fn test_invalidate_resource() {
        let cache = QueryCache::new();
        cache.insert(key("a"), 1);
        cache.insert(key("b"), 2);
        cache.invalidate_resource("opportunities");
        assert_eq!(cache.len(), 2);
        cache.invalidate_resource("accounts");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_full_cache_drops_oldest_unwatched_entry() {
        let cache = QueryCache::with_capacity(2);
        cache.watch(key("a"));
        cache.insert(key("a"), 1);
        cache.insert(key("b"), 2);
        cache.insert(key("c"), 3);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("b")).is_none());
        assert_eq!(cache.current().as_deref(), Some(&1));
        assert_eq!(cache.get(&key("c")).as_deref(), Some(&3));
    }

    #[tokio::test]
    async fn test_cache_hit_refreshes_recency() {
        let cache = QueryCache::with_capacity(2);
        cache.insert(key("a"), 1);
        cache.insert(key("b"), 2);
        cache.load(key("a"), || async { Ok(0) }).await.unwrap();
        cache.watch(key("c"));
        cache.insert(key("c"), 3);

        assert!(cache.get(&key("b")).is_none());
        assert_eq!(cache.get(&key("a")).as_deref(), Some(&1));
    }

    #[tokio::test]
    async fn test_load_hits_cache_on_second_call() {
        let cache = QueryCache::new();
        let first = cache.load(key("a"), || async { Ok(1) }).await.unwrap();
        assert_eq!(first.as_deref(), Some(&1));

        let second = cache
            .load(key("a"), || async {
                Err(RevOpsError::Internal("refetched a cached key".to_string()))
            })
            .await
            .unwrap();
        assert_eq!(second.as_deref(), Some(&1));
    }
}
