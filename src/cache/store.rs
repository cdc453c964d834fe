//! Cache Store Module
//!
//! Main cache engine combining the recency list with TTL expiration.
//!
//! `CacheStore` is not synchronized. The shared handles in this module's
//! siblings wrap it in a lock and expose it to multiple threads or tasks.

use std::borrow::Borrow;
use std::hash::Hash;
use std::time::Duration;

use generational_arena::Index;
use tracing::{debug, info, trace};

use crate::cache::{CacheStats, Entry, LruList};
use crate::config::CacheConfig;
use crate::error::Result;

// Upper bound on storage reserved up front; larger caches grow on demand.
const MAX_PREALLOCATED: usize = 1024;

// == Cache Store ==
/// Bounded key-value storage with LRU eviction and TTL expiration.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Entries in recency order plus the key lookup
    list: LruList<K, V>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Maximum age of an entry since its last refresh
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V> CacheStore<K, V> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and TTL.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries the cache can hold, must be > 0
    /// * `ttl` - Age after which an entry is treated as absent
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self> {
        Self::from_config(&CacheConfig::new(capacity, ttl))
    }

    /// Creates a new CacheStore from a validated configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        info!(
            capacity = config.capacity,
            ttl = ?config.ttl,
            "Cache store initialized"
        );

        Ok(Self {
            list: LruList::with_capacity(config.capacity.min(MAX_PREALLOCATED)),
            stats: CacheStats::new(),
            capacity: config.capacity,
            ttl: config.ttl,
        })
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// An expired entry is removed as a side effect and reported as absent.
    /// Reads never refresh the entry's timestamp.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.touch_live(key)?;
        Some(&self.list.entry(index).value)
    }

    // == Put ==
    /// Stores a key-value pair.
    ///
    /// An existing key has its value overwritten, its timestamp refreshed and
    /// is moved to the front. This happens even if the existing entry had
    /// already expired. A new key at capacity first evicts the least recently
    /// used entry.
    pub fn put(&mut self, key: K, value: V) {
        if let Some(index) = self.list.index_of(&key) {
            self.list.entry_mut(index).refresh(value);
            self.list.move_to_front(index);
            return;
        }
        self.insert(key, value);
    }

    // == Remove ==
    /// Removes an entry by key, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.list.index_of(key)?;
        self.list.remove(index).map(|entry| entry.value)
    }

    // == Remove Expired ==
    /// Removes expired entries starting from the least recently used end.
    ///
    /// The scan stops at the first live entry: every write refreshes the
    /// timestamp and the recency position together, so entries nearer the
    /// front are never older than the one that stopped the scan.
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&mut self) -> usize {
        let mut removed = 0;
        while let Some(index) = self.list.back() {
            if !self.list.entry(index).is_expired(self.ttl) {
                break;
            }
            self.list.remove(index);
            self.stats.record_expiration();
            removed += 1;
        }

        if removed > 0 {
            debug!(removed, remaining = self.list.len(), "Removed expired entries");
        }
        removed
    }

    // == Load Or Compute ==
    /// Returns the live value for `key`, computing and caching it on a miss.
    ///
    /// The loader runs at most once and only when no live entry exists. Its
    /// error is returned unchanged and nothing is cached. On success the value
    /// is inserted exactly as [`put`](Self::put) inserts a new key.
    pub fn load_or_compute<F, E>(&mut self, key: K, loader: F) -> std::result::Result<&V, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        if let Some(index) = self.touch_live(&key) {
            return Ok(&self.list.entry(index).value);
        }

        match loader() {
            Ok(value) => {
                let index = self.insert_loaded(key, value);
                Ok(&self.list.entry(index).value)
            }
            Err(err) => {
                self.record_load_failure();
                Err(err)
            }
        }
    }

    // == Contains ==
    /// Returns true if `key` has a live entry.
    ///
    /// Does not affect recency and never removes anything.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek(key).is_some()
    }

    // == Peek ==
    /// Returns the live value for `key` without marking it as used.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.list.entry(self.list.index_of(key)?);
        if entry.is_expired(self.ttl) {
            None
        } else {
            Some(&entry.value)
        }
    }

    // == Time To Live ==
    /// Time left before the live entry for `key` expires.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.list.entry(self.list.index_of(key)?);
        if entry.is_expired(self.ttl) {
            None
        } else {
            Some(entry.ttl_remaining(self.ttl))
        }
    }

    /// Keys from most to least recently used, expired ones included.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.list.iter().map(|entry| &entry.key)
    }

    // == Clear ==
    /// Drops every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.list.clear();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.list.len());
        stats
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Loader Plumbing ==
    // Shared with the async handle, which awaits its loader between these calls.

    /// Finds a live entry, moves it to the front and records a hit.
    ///
    /// A missing entry records a miss. An expired entry is removed first and
    /// also counts as a miss.
    pub(crate) fn touch_live<Q>(&mut self, key: &Q) -> Option<Index>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(index) = self.list.index_of(key) else {
            self.stats.record_miss();
            trace!("Cache miss");
            return None;
        };

        if self.list.entry(index).is_expired(self.ttl) {
            self.list.remove(index);
            self.stats.record_expiration();
            self.stats.record_miss();
            debug!(remaining = self.list.len(), "Removed expired entry on access");
            return None;
        }

        self.list.move_to_front(index);
        self.stats.record_hit();
        trace!("Cache hit");
        Some(index)
    }

    pub(crate) fn value_at(&self, index: Index) -> &V {
        &self.list.entry(index).value
    }

    /// Inserts a freshly loaded value for a key that has no entry.
    pub(crate) fn insert_loaded(&mut self, key: K, value: V) -> Index {
        self.stats.record_load();
        self.insert(key, value)
    }

    pub(crate) fn record_load_failure(&mut self) {
        self.stats.record_load_failure();
        debug!("Loader failed, nothing cached");
    }

    // Inserts an absent key at the front, evicting the tail when full.
    fn insert(&mut self, key: K, value: V) -> Index {
        if self.list.len() >= self.capacity && self.list.pop_back().is_some() {
            self.stats.record_eviction();
            debug!(capacity = self.capacity, "Evicted least recently used entry");
        }
        self.list.push_front(Entry::new(key, value))
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self)
    where
        K: std::fmt::Debug,
    {
        self.list.check_invariants();
        assert!(self.list.len() <= self.capacity, "capacity exceeded");
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use std::thread::sleep;

    const LONG_TTL: Duration = Duration::from_secs(300);
    const SHORT_TTL: Duration = Duration::from_millis(50);
    const PAST_SHORT_TTL: Duration = Duration::from_millis(80);

    fn store(capacity: usize, ttl: Duration) -> CacheStore<String, i32> {
        CacheStore::new(capacity, ttl).unwrap()
    }

    fn keys(store: &CacheStore<String, i32>) -> Vec<&str> {
        store.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_store_new() {
        let store = store(100, LONG_TTL);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 100);
        assert_eq!(store.ttl(), LONG_TTL);
    }

    #[test]
    fn test_store_zero_capacity_rejected() {
        let result = CacheStore::<String, i32>::new(0, LONG_TTL);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_store_put_and_get() {
        let mut store = store(100, LONG_TTL);

        store.put("key1".to_string(), 1);

        assert_eq!(store.get("key1"), Some(&1));
        assert_eq!(store.len(), 1);
        store.check_invariants();
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = store(100, LONG_TTL);
        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_store_overwrite() {
        let mut store = store(100, LONG_TTL);

        store.put("key1".to_string(), 1);
        store.put("key1".to_string(), 2);

        assert_eq!(store.get("key1"), Some(&2));
        assert_eq!(store.len(), 1);
        store.check_invariants();
    }

    #[test]
    fn test_store_remove() {
        let mut store = store(100, LONG_TTL);

        store.put("key1".to_string(), 1);
        assert_eq!(store.remove("key1"), Some(1));

        assert!(store.is_empty());
        assert_eq!(store.get("key1"), None);
        store.check_invariants();
    }

    #[test]
    fn test_store_remove_nonexistent() {
        let mut store = store(100, LONG_TTL);
        store.put("key1".to_string(), 1);

        assert_eq!(store.remove("nonexistent"), None);
        assert_eq!(store.remove("nonexistent"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_capacity_scenario() {
        let mut store = store(2, LONG_TTL);

        store.put("a".to_string(), 1);
        store.put("b".to_string(), 2);
        store.put("c".to_string(), 3);

        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), Some(&2));
        assert_eq!(store.get("c"), Some(&3));
        assert_eq!(store.stats().evictions, 1);
        store.check_invariants();
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = store(3, LONG_TTL);

        store.put("key1".to_string(), 1);
        store.put("key2".to_string(), 2);
        store.put("key3".to_string(), 3);

        // Access key1 to make it most recently used
        store.get("key1");

        // Adding key4 should evict key2 (now oldest)
        store.put("key4".to_string(), 4);

        assert_eq!(keys(&store), vec!["key4", "key1", "key3"]);
        assert_eq!(store.get("key2"), None);
    }

    #[test]
    fn test_store_lru_touch_on_put() {
        let mut store = store(2, LONG_TTL);

        store.put("a".to_string(), 1);
        store.put("b".to_string(), 2);
        store.put("a".to_string(), 10);
        store.put("c".to_string(), 3);

        assert_eq!(store.get("b"), None);
        assert_eq!(store.get("a"), Some(&10));
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = store(100, SHORT_TTL);

        store.put("key1".to_string(), 1);
        assert_eq!(store.get("key1"), Some(&1));

        sleep(PAST_SHORT_TTL);

        assert_eq!(store.get("key1"), None);
        // Evicted, not merely hidden
        assert_eq!(store.len(), 0);
        assert_eq!(store.get("key1"), None);
        assert_eq!(store.stats().expirations, 1);
        store.check_invariants();
    }

    // Ages the entry for `key` without sleeping.
    fn backdate(store: &mut CacheStore<String, i32>, key: &str, by: Duration) {
        let index = store.list.index_of(key).unwrap();
        let entry = store.list.entry_mut(index);
        entry.timestamp = entry.timestamp.checked_sub(by).unwrap();
    }

    #[test]
    fn test_store_get_does_not_refresh() {
        let mut store = store(100, Duration::from_secs(10));

        store.put("key1".to_string(), 1);
        backdate(&mut store, "key1", Duration::from_secs(6));
        let before = store.list.entry(store.list.index_of("key1").unwrap()).timestamp;

        assert_eq!(store.get("key1"), Some(&1));
        let after = store.list.entry(store.list.index_of("key1").unwrap()).timestamp;
        assert_eq!(before, after);

        // 12s since the put, the read in between did not extend it
        backdate(&mut store, "key1", Duration::from_secs(6));
        assert_eq!(store.get("key1"), None);
    }

    #[test]
    fn test_store_put_refreshes_timestamp() {
        let mut store = store(100, Duration::from_secs(10));

        store.put("key1".to_string(), 1);
        backdate(&mut store, "key1", Duration::from_secs(6));
        store.put("key1".to_string(), 2);
        backdate(&mut store, "key1", Duration::from_secs(6));

        assert_eq!(store.get("key1"), Some(&2));
    }

    #[test]
    fn test_store_put_revives_expired_entry() {
        let mut store = store(100, SHORT_TTL);

        store.put("key1".to_string(), 1);
        sleep(PAST_SHORT_TTL);

        // The stale entry is overwritten in place rather than expired first
        store.put("key1".to_string(), 2);

        assert_eq!(store.get("key1"), Some(&2));
        assert_eq!(store.stats().expirations, 0);
    }

    #[test]
    fn test_store_remove_expired() {
        let mut store = store(100, Duration::from_millis(100));

        store.put("old1".to_string(), 1);
        store.put("old2".to_string(), 2);
        sleep(Duration::from_millis(130));
        store.put("fresh".to_string(), 3);

        assert_eq!(store.remove_expired(), 2);
        assert_eq!(keys(&store), vec!["fresh"]);
        assert_eq!(store.remove_expired(), 0);
        store.check_invariants();
    }

    #[test]
    fn test_store_remove_expired_stops_at_live_entry() {
        let mut store = store(100, Duration::from_millis(100));

        store.put("old".to_string(), 1);
        store.put("stale_front".to_string(), 2);
        sleep(Duration::from_millis(130));
        // Refreshing "old" moves it to the front, leaving only stale_front expired
        store.put("old".to_string(), 10);

        assert_eq!(store.remove_expired(), 1);
        assert_eq!(keys(&store), vec!["old"]);
    }

    #[test]
    fn test_store_load_or_compute_miss_then_hit() {
        let mut store = store(2, LONG_TTL);

        let loaded: std::result::Result<&i32, String> = store.load_or_compute("k".to_string(), || Ok(1));
        assert_eq!(loaded, Ok(&1));

        let mut called = false;
        let cached: std::result::Result<&i32, String> = store.load_or_compute("k".to_string(), || {
            called = true;
            Ok(2)
        });
        assert_eq!(cached, Ok(&1));
        assert!(!called, "loader must not run for a live key");

        let stats = store.stats();
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_store_load_or_compute_failure_leaves_no_trace() {
        let mut store = store(2, LONG_TTL);

        let result = store.load_or_compute("k".to_string(), || Err::<i32, _>("boom"));

        assert_eq!(result, Err("boom"));
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
        assert_eq!(store.stats().load_failures, 1);
    }

    #[test]
    fn test_store_load_or_compute_reloads_expired() {
        let mut store = store(2, SHORT_TTL);

        let _ = store.load_or_compute("k".to_string(), || Ok::<_, ()>(1));
        sleep(PAST_SHORT_TTL);

        let reloaded = store.load_or_compute("k".to_string(), || Ok::<_, ()>(2));
        assert_eq!(reloaded, Ok(&2));
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().expirations, 1);
        store.check_invariants();
    }

    #[test]
    fn test_store_load_or_compute_evicts_lru() {
        let mut store = store(2, LONG_TTL);

        let _ = store.load_or_compute("key1".to_string(), || Ok::<_, ()>(1));
        let _ = store.load_or_compute("key2".to_string(), || Ok::<_, ()>(3));
        let third = store.load_or_compute("key3".to_string(), || Ok::<_, ()>(4));
        assert_eq!(third, Ok(&4));

        assert_eq!(store.get("key1"), None);
        assert_eq!(store.get("key2"), Some(&3));
        assert_eq!(store.get("key3"), Some(&4));
    }

    #[test]
    fn test_store_peek_and_contains() {
        let mut store = store(2, LONG_TTL);

        store.put("a".to_string(), 1);
        store.put("b".to_string(), 2);

        // Peeking at the LRU entry must not save it from eviction
        assert_eq!(store.peek("a"), Some(&1));
        assert!(store.contains("a"));
        store.put("c".to_string(), 3);

        assert!(!store.contains("a"));
        assert_eq!(store.peek("missing"), None);
    }

    #[test]
    fn test_store_peek_hides_expired_without_removing() {
        let mut store = store(2, SHORT_TTL);

        store.put("a".to_string(), 1);
        sleep(PAST_SHORT_TTL);

        assert_eq!(store.peek("a"), None);
        assert!(!store.contains("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_ttl_remaining() {
        let mut store = store(2, Duration::from_secs(10));

        store.put("a".to_string(), 1);

        let remaining = store.ttl_remaining("a").unwrap();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
        assert_eq!(store.ttl_remaining("missing"), None);
    }

    #[test]
    fn test_store_clear_keeps_stats() {
        let mut store = store(4, LONG_TTL);

        store.put("a".to_string(), 1);
        store.get("a");
        store.clear();

        assert!(store.is_empty());
        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_store_stats() {
        let mut store = store(100, LONG_TTL);

        store.put("key1".to_string(), 1);
        store.get("key1"); // hit
        store.get("nonexistent"); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
