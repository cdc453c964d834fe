//! Error types for the cache
//!
//! Provides unified error handling using thiserror.
//!
//! Lookups, inserts and removals never fail. The only errors the cache itself
//! produces come from building it with an unusable configuration. Loader
//! failures are handed back to the caller as the loader's own error type.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised while constructing or configuring a cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Configuration values are out of range or could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache construction.
pub type Result<T> = std::result::Result<T, CacheError>;
