//! Thread-safe Cache Handle
//!
//! Wraps a [`CacheStore`] in a single mutex so it can be shared across threads.

use std::borrow::Borrow;
use std::hash::Hash;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{CacheStats, CacheStore};
use crate::config::CacheConfig;
use crate::error::Result;

// == Cache ==
/// A bounded LRU cache with TTL expiration, safe to share between threads.
///
/// Every operation takes one exclusive lock for its whole duration, so
/// operations on unrelated keys still serialize. Share it with `Arc<Cache<K, V>>`.
///
/// Values are handed out as clones.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use lru_ttl_cache::Cache;
///
/// let cache = Cache::new(2, Duration::from_secs(300)).unwrap();
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.put("c", 3);
///
/// assert_eq!(cache.get("a"), None);
/// assert_eq!(cache.get("b"), Some(2));
/// assert_eq!(cache.get("c"), Some(3));
/// ```
#[derive(Debug)]
pub struct Cache<K, V> {
    inner: Mutex<CacheStore<K, V>>,
}

impl<K: Eq + Hash + Clone, V> Cache<K, V> {
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
    pub fn put(&self, key: K, value: V) {
        self.inner.lock().put(key, value);
    }

    // == Remove ==
    /// Removes `key` if present. Removing an absent key is a no-op.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().remove(key)
    }

    // == Remove Expired ==
    /// Drops expired entries from the least recently used end.
    ///
    /// See [`CacheStore::remove_expired`].
    pub fn remove_expired(&self) -> usize {
        self.inner.lock().remove_expired()
    }

    /// Returns true if `key` has a live entry, without touching its recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().contains(key)
    }

    /// Time left before the live entry for `key` expires.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().ttl_remaining(key)
    }

    /// Keys from most to least recently used.
    ///
    /// Expired entries not yet removed are included.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    /// Number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn ttl(&self) -> Duration {
        self.inner.lock().ttl()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Cache<K, V> {
    // == Get ==
    /// Returns a clone of the live value for `key` and marks it most recently used.
    ///
    /// An expired entry is removed and `None` returned. Reads never extend an
    /// entry's lifetime.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Returns the live value for `key` without touching its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().peek(key).cloned()
    }

    // == Load Or Compute ==
    /// Returns the live value for `key`, running `loader` to produce it on a miss.
    ///
    /// The cache lock is held while `loader` runs. At most one loader is in
    /// flight per cache, so concurrent misses on the same key run the loader
    /// once and the others see its result. The flip side:
    ///
    /// - a slow loader blocks every other operation on this cache until it returns;
    /// - a loader that calls back into the same cache deadlocks.
    ///
    /// A loader error is returned unchanged and nothing is cached.
    pub fn load_or_compute<F, E>(&self, key: K, loader: F) -> std::result::Result<V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        self.inner.lock().load_or_compute(key, loader).cloned()
    }
}
