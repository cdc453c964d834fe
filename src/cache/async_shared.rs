//! Async Cache Handle
//!
//! Shares a [`CacheStore`] between tokio tasks behind a `tokio::sync::Mutex`,
//! which can be held across the await of an async loader.

use std::borrow::Borrow;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::cache::{CacheStats, CacheStore};
use crate::config::CacheConfig;
use crate::error::Result;

// == Async Cache ==
/// Async counterpart of [`Cache`](crate::Cache) for loaders that need to await.
///
/// Locking semantics are the same: one exclusive lock, held for the whole of
/// every operation including the loader future in
/// [`load_or_compute`](Self::load_or_compute).
#[derive(Debug)]
pub struct AsyncCache<K, V> {
    inner: Mutex<CacheStore<K, V>>,
}

impl<K: Eq + Hash + Clone, V> AsyncCache<K, V> {
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries, each live for `ttl`
    /// after its last write.
    ///
    /// Fails with [`CacheError::InvalidConfig`](crate::CacheError::InvalidConfig)
    /// when `capacity` is zero.
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self> {
        CacheStore::new(capacity, ttl).map(Self::from_store)
    }

    /// Creates a cache from a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        CacheStore::from_config(config).map(Self::from_store)
    }

    /// Wraps an existing store.
    pub fn from_store(store: CacheStore<K, V>) -> Self {
        Self {
            inner: Mutex::new(store),
        }
    }

    // == Put ==
    /// Inserts or overwrites `key`, making it the most recently used entry.
    ///
    /// See [`CacheStore::put`].
    pub async fn put(&self, key: K, value: V) {
        self.inner.lock().await.put(key, value);
    }

    // == Remove ==
    /// Removes `key` if present. Removing an absent key is a no-op.
    pub async fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().await.remove(key)
    }

    // == Remove Expired ==
    /// Drops expired entries from the least recently used end.
    ///
    /// See [`CacheStore::remove_expired`].
    pub async fn remove_expired(&self) -> usize {
        self.inner.lock().await.remove_expired()
    }

    /// Returns true if `key` has a live entry, without touching its recency.
    pub async fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().await.contains(key)
    }

    /// Time left before the live entry for `key` expires.
    pub async fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().await.ttl_remaining(key)
    }

    /// Keys from most to least recently used.
    ///
    /// Expired entries not yet removed are included.
    pub async fn keys(&self) -> Vec<K> {
        self.inner.lock().await.keys().cloned().collect()
    }

    /// Drops every entry. Statistics are kept.
    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats()
    }

    /// Number of stored entries, including expired ones not yet removed.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    pub async fn capacity(&self) -> usize {
        self.inner.lock().await.capacity()
    }

    pub async fn ttl(&self) -> Duration {
        self.inner.lock().await.ttl()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> AsyncCache<K, V> {
    // == Get ==
    /// Returns a clone of the live value for `key` and marks it most recently used.
    ///
    /// An expired entry is removed and `None` returned.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().await.get(key).cloned()
    }

    /// Returns the live value for `key` without touching its recency.
    pub async fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().await.peek(key).cloned()
    }

    // == Load Or Compute ==
    /// Returns the live value for `key`, awaiting `loader` to produce it on a miss.
    ///
    /// The lock stays held while the loader future runs, so a loader that
    /// never completes wedges the cache and a loader that touches the same
    /// cache deadlocks. Dropping the returned future before the loader
    /// finishes releases the lock and caches nothing.
    pub async fn load_or_compute<F, Fut, E>(&self, key: K, loader: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>>,
    {
        let mut store = self.inner.lock().await;

        if let Some(index) = store.touch_live(&key) {
            return Ok(store.value_at(index).clone());
        }

        match loader().await {
            Ok(value) => {
                let index = store.insert_loaded(key, value);
                Ok(store.value_at(index).clone())
            }
            Err(err) => {
                store.record_load_failure();
                Err(err)
            }
        }
    }
}
