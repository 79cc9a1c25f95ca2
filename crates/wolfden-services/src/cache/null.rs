//! Null cache store
//!
//! Discards all writes and misses every read. Used when caching is
//! disabled in configuration and as a drop-in for executor tests that
//! must always hit the backend.

use async_trait::async_trait;
use std::time::Duration;
use wolfden_domain::error::Result;
use wolfden_domain::ports::{CacheStats, CacheStore};

/// No-op cache store
#[derive(Debug, Default)]
pub struct NullCacheStore;

impl NullCacheStore {
    /// Create a new null store
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheStore for NullCacheStore {
    async fn get_json(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set_json(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    async fn invalidate(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    async fn invalidate_pattern(&self, _pattern: &str) -> Result<usize> {
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(0)
    }

    async fn stats(&self) -> Result<CacheStats> {
        Ok(CacheStats::default())
    }

    fn store_name(&self) -> &str {
        "null"
    }
}
