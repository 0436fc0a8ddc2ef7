//! Cache configuration

use std::time::Duration;

/// Default time-to-live for cached lookups (seconds).
pub const DEFAULT_TTL_SECS: u64 = 600;

/// Longest accepted time-to-live (one year, in seconds).
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Default maximum number of entries per operation cache.
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Settings shared by all operation caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long an entry stays valid after it was loaded.
    pub ttl: Duration,

    /// Maximum number of entries per operation.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl CacheConfig {
    /// Config with the given TTL and capacity.
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self { ttl, max_capacity }
    }

    /// TTL handed to the caches, capped at [`MAX_TTL_SECS`].
    pub fn effective_ttl(&self) -> Duration {
        self.ttl.min(Duration::from_secs(MAX_TTL_SECS))
    }
}
