//! LRU TTL Cache - A generic in-process key-value cache
//!
//! Bounded by entry count with least-recently-used eviction, and by age with a
//! single time-to-live shared by every entry. Expired entries are dropped
//! lazily when a lookup finds them or when [`Cache::remove_expired`] is called.
//!
//! [`Cache`] is the thread-safe handle, [`AsyncCache`] accepts async loaders,
//! and [`CacheStore`] is the unsynchronized core both of them wrap.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{AsyncCache, Cache, CacheStats, CacheStore};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
