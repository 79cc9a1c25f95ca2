//! Cache store port
//!
//! Contract for cache backends. Values travel as JSON strings so the
//! store stays type-agnostic; typed get/set lives on the query
//! executor. Pattern invalidation uses substring matching, which is
//! what the domain wrappers' `"<domain>_<discriminator>"` key templates
//! rely on.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache operation statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Current number of live entries
    pub entries: u64,
}

impl CacheStats {
    /// Hit rate in `[0.0, 1.0]`; zero when nothing was looked up yet
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Cache backend contract
///
/// # Expiry semantics
///
/// A read before `ttl` has elapsed returns the stored value; after
/// that the entry is treated as absent and evicted on the next
/// encounter. Implementations expire lazily; there is no background
/// reaper.
#[async_trait]
pub trait CacheStore: Send + Sync + std::fmt::Debug {
    /// Get a value as a JSON string, `None` if absent or expired
    async fn get_json(&self, key: &str) -> Result<Option<String>>;

    /// Store a JSON string under `key` with the given TTL
    async fn set_json(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Remove a single key
    ///
    /// Returns true if the key was present.
    async fn invalidate(&self, key: &str) -> Result<bool>;

    /// Remove every key containing `pattern` as a substring
    ///
    /// Returns the number of entries removed.
    async fn invalidate_pattern(&self, pattern: &str) -> Result<usize>;

    /// Remove all entries
    async fn clear(&self) -> Result<()>;

    /// Number of entries currently stored (including not-yet-swept
    /// expired ones)
    async fn len(&self) -> Result<usize>;

    /// Whether the store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Hit/miss statistics
    async fn stats(&self) -> Result<CacheStats>;

    /// Identifier for this store implementation (e.g. "memory", "null")
    fn store_name(&self) -> &str;
}
