//! Cache configuration.

use std::time::Duration;

/// Configuration for one cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_capacity: u64,

    /// Time-to-idle for cache entries.
    /// Entries are evicted if not accessed within this duration.
    pub tti: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            tti: None,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with the given max capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity,
            ..Default::default()
        }
    }

    /// Set time-to-idle for cache entries (builder pattern).
    #[must_use]
    pub fn tti(mut self, duration: Duration) -> Self {
        self.tti = Some(duration);
        self
    }

    /// Config for entities that are cheap to reconstruct from an ID alone.
    /// Entries expire after ten minutes without access.
    pub fn transient() -> Self {
        Self {
            max_capacity: 10_000,
            tti: Some(Duration::from_secs(600)),
        }
    }

    /// Config for entities that are expensive or impossible to reconstruct
    /// (no fetch-by-ID endpoint). Kept until capacity pressure evicts them.
    pub fn resident() -> Self {
        Self {
            max_capacity: 50_000,
            tti: None,
        }
    }
}
