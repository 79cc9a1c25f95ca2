//! In-memory cache store
//!
//! TTL semantics: an entry read before its TTL elapses is returned;
//! after that it is treated as absent and evicted on the next
//! encounter. Expiry is lazy - there is no background reaper. A write
//! that pushes the store past the sweep threshold triggers an
//! opportunistic sweep that removes only expired entries.
//!
//! Timing uses `tokio::time::Instant` so the TTL behavior is fully
//! testable under a paused test clock.

use crate::constants::CACHE_SWEEP_THRESHOLD;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use wolfden_domain::error::Result;
use wolfden_domain::ports::{CacheStats, CacheStore};

struct Entry {
    json: String,
    stored_at: Instant,
    ttl: Duration,
}

impl Entry {
    fn expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// Process-local cache store backed by a hash map
///
/// All mutable state sits behind a `Mutex`; lock scopes never cross an
/// await point.
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    sweep_threshold: usize,
}

impl MemoryCacheStore {
    /// Create a store with the default sweep threshold
    pub fn new() -> Self {
        Self::with_sweep_threshold(CACHE_SWEEP_THRESHOLD)
    }

    /// Create a store that sweeps expired entries once a write pushes
    /// the entry count past `threshold`
    pub fn with_sweep_threshold(threshold: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sweep_threshold: threshold,
        }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_json(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if !entry.expired() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.json.clone()))
            }
            Some(_) => {
                // Lazy expiry: evict on encounter
                entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set_json(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                json: value.to_string(),
                stored_at: Instant::now(),
                ttl,
            },
        );

        if entries.len() > self.sweep_threshold {
            let before = entries.len();
            entries.retain(|_, entry| !entry.expired());
            let swept = before - entries.len();
            if swept > 0 {
                debug!(swept, remaining = entries.len(), "swept expired cache entries");
            }
        }

        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.remove(key).is_some())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(pattern, removed, "invalidated cache entries by pattern");
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.len())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: entries.len() as u64,
        })
    }

    fn store_name(&self) -> &str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self
            .entries
            .lock()
            .map(|entries| entries.len())
            .unwrap_or(0);
        f.debug_struct("MemoryCacheStore")
            .field("entries", &len)
            .field("sweep_threshold", &self.sweep_threshold)
            .finish()
    }
}
