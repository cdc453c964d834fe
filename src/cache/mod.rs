//! Cache Module
//!
//! Provides a bounded in-memory cache with LRU eviction and TTL expiration.

mod async_shared;
mod entry;
mod lru;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use async_shared::AsyncCache;
pub use shared::Cache;
pub use stats::CacheStats;
pub use store::CacheStore;

pub(crate) use entry::Entry;
pub(crate) use lru::LruList;
