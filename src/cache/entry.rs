//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached key/value pair plus the instant it was last refreshed.
///
/// The timestamp is set on insertion and refreshed on every overwrite or
/// reload. Plain reads leave it untouched.
#[derive(Debug, Clone)]
pub struct Entry<K, V> {
    /// The key this entry is stored under
    pub key: K,
    /// The stored value
    pub value: V,
    /// Last insertion or refresh
    pub timestamp: Instant,
}

impl<K, V> Entry<K, V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current instant.
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            timestamp: Instant::now(),
        }
    }

    // == Refresh ==
    /// Replaces the value and restarts the TTL window.
    pub fn refresh(&mut self, value: V) {
        self.value = value;
        self.timestamp = Instant::now();
    }

    // == Age ==
    /// Time elapsed since the last refresh.
    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl`.
    ///
    /// Boundary condition: the entry is expired only once its age is strictly
    /// greater than `ttl`.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }

    // == Time To Live ==
    /// Remaining time before the entry expires, zero if it already has.
    pub fn ttl_remaining(&self, ttl: Duration) -> Duration {
        ttl.saturating_sub(self.age())
    }
}
