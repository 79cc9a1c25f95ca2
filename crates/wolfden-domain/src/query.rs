//! Per-call query options

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default cache TTL for query results (5 minutes)
pub const DEFAULT_QUERY_TTL_SECS: u64 = 300;

/// Default per-call timeout (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5000;

/// Default retry budget
pub const DEFAULT_QUERY_RETRIES: u32 = 2;

/// Options supplied per query execution, never persisted
///
/// # Example
///
/// ```
/// use wolfden_domain::QueryOptions;
/// use std::time::Duration;
///
/// let options = QueryOptions::cached("menu-items_all")
///     .with_ttl(Duration::from_secs(600))
///     .with_retries(1);
/// assert!(options.use_cache);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Whether the result may be served from and written to cache
    pub use_cache: bool,
    /// Cache key; required for caching to take effect
    pub cache_key: Option<String>,
    /// Cache entry time-to-live
    pub cache_ttl: Duration,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retry budget for retry-eligible failures
    pub retries: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            use_cache: false,
            cache_key: None,
            cache_ttl: Duration::from_secs(DEFAULT_QUERY_TTL_SECS),
            timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
            retries: DEFAULT_QUERY_RETRIES,
        }
    }
}

impl QueryOptions {
    /// Options for an uncached call
    pub fn uncached() -> Self {
        Self::default()
    }

    /// Options for a cached call under the given key
    pub fn cached<S: Into<String>>(key: S) -> Self {
        Self {
            use_cache: true,
            cache_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Set the cache TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// The effective cache key, if caching applies to this call
    pub fn effective_cache_key(&self) -> Option<&str> {
        if self.use_cache {
            self.cache_key.as_deref()
        } else {
            None
        }
    }
}
