//! Configuration Module
//!
//! Handles building cache configuration from defaults, environment variables
//! or any serde-compatible source.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Defaults ==
/// Default maximum number of entries
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default time-to-live in seconds
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Cache configuration parameters.
///
/// The TTL is serialized as whole milliseconds under `ttl_ms`. A TTL that
/// is not a whole number of milliseconds is rejected rather than truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of live entries the cache can hold
    pub capacity: usize,
    /// Maximum age of an entry since its last refresh
    #[serde(rename = "ttl_ms", with = "duration_millis")]
    pub ttl: Duration,
}

impl CacheConfig {
    /// Creates a config with explicit capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self { capacity, ttl }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CACHE_TTL_SECS` - TTL in seconds (default: 300)
    ///
    /// Unset variables fall back to their defaults. A variable that is set but
    /// does not parse is reported as [`CacheError::InvalidConfig`].
    pub fn from_env() -> Result<Self> {
        let capacity = read_env("CACHE_CAPACITY")?.unwrap_or(DEFAULT_CAPACITY);
        let ttl_secs = read_env("CACHE_TTL_SECS")?.unwrap_or(DEFAULT_TTL_SECS);

        let config = Self::new(capacity, Duration::from_secs(ttl_secs));
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration can back a cache.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }
}

fn read_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            CacheError::InvalidConfig(format!("{} has an invalid value: {:?}", name, raw))
        }),
        Err(_) => Ok(None),
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{ser::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if ttl.subsec_nanos() % 1_000_000 != 0 {
            return Err(S::Error::custom(format!(
                "ttl {:?} is not a whole number of milliseconds",
                ttl
            )));
        }
        let millis = u64::try_from(ttl.as_millis())
            .map_err(|_| S::Error::custom(format!("ttl {:?} does not fit in u64 milliseconds", ttl)))?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
