//! Generic query execution engine
//!
//! Contract: given a re-invocable thunk producing a raw backend result,
//! an operation name, and per-call [`QueryOptions`], return the value
//! or fail with a classified [`AppError`].
//!
//! Execution order within one call is strictly sequential: cache check,
//! thunk invocation, cache write. The timeout race uses
//! `tokio::time::timeout`, which drops the thunk future on loss - a
//! late success can never resurrect the cache. Concurrent identical
//! misses coalesce through an in-flight map keyed by cache key: the
//! leader executes, followers wait and re-read the cache, and a
//! follower whose leader failed executes on its own.

use crate::errors::{ErrorReporter, failure_is_retryable};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};
use wolfden_domain::error::{AppError, BackendError, Result};
use wolfden_domain::ports::backend::BackendResult;
use wolfden_domain::ports::{CacheStats, CacheStore};
use wolfden_domain::query::QueryOptions;

type FlightMap = Arc<Mutex<HashMap<String, watch::Receiver<()>>>>;

/// Largest backoff exponent; delays top out at `2^6 = 64` seconds
const BACKOFF_EXPONENT_CAP: u32 = 6;

/// Which side of a coalesced flight this call landed on
enum Flight {
    Leader(FlightGuard),
    Follower(watch::Receiver<()>),
}

/// Removes the in-flight entry (and wakes followers by dropping the
/// sender) when the leader finishes, fails, or is cancelled.
struct FlightGuard {
    key: String,
    map: FlightMap,
    _tx: watch::Sender<()>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if let Ok(mut map) = self.map.lock() {
            map.remove(&self.key);
        }
    }
}

/// Generic cached/retried query executor
///
/// Injectable service: owns no domain knowledge, only the execution
/// policy. Domain wrappers live in [`super::DomainQueries`].
pub struct QueryExecutor {
    cache: Arc<dyn CacheStore>,
    reporter: Arc<ErrorReporter>,
    in_flight: FlightMap,
    defaults: QueryOptions,
}

impl QueryExecutor {
    /// Create an executor over the given cache store and reporter
    ///
    /// `defaults` seeds the per-call options handed out by
    /// [`Self::options`] and [`Self::cached_options`] - this is where
    /// the configured timeout, retry budget, and default TTL enter the
    /// execution path. The caching fields of `defaults` are reset; a
    /// cache key is always chosen per call.
    pub fn new(
        cache: Arc<dyn CacheStore>,
        reporter: Arc<ErrorReporter>,
        defaults: QueryOptions,
    ) -> Self {
        Self {
            cache,
            reporter,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            defaults: QueryOptions {
                use_cache: false,
                cache_key: None,
                ..defaults
            },
        }
    }

    /// Uncached per-call options seeded from the configured defaults
    pub fn options(&self) -> QueryOptions {
        self.defaults.clone()
    }

    /// Cached per-call options under `key`, seeded from the configured
    /// defaults
    pub fn cached_options<S: Into<String>>(&self, key: S) -> QueryOptions {
        QueryOptions {
            use_cache: true,
            cache_key: Some(key.into()),
            ..self.defaults.clone()
        }
    }

    /// Execute one query
    ///
    /// The thunk must be re-invocable: it is called once per attempt
    /// and once more by a follower whose leader failed.
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        options: QueryOptions,
        thunk: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = BackendResult<T>> + Send,
    {
        let Some(key) = options.effective_cache_key().map(str::to_string) else {
            return self.run_attempts(operation, &options, &thunk).await;
        };

        if let Some(hit) = self.cache_read::<T>(&key).await {
            debug!(operation, %key, "cache hit");
            return Ok(hit);
        }

        match self.join_flight(&key) {
            Flight::Leader(guard) => {
                let result = self.run_attempts(operation, &options, &thunk).await;
                if let Ok(value) = &result {
                    self.cache_write(&key, value, options.cache_ttl).await;
                }
                drop(guard);
                result
            }
            Flight::Follower(mut rx) => {
                // Wakes when the leader's sender drops
                let _ = rx.changed().await;
                if let Some(hit) = self.cache_read::<T>(&key).await {
                    debug!(operation, %key, "cache hit after coalesced flight");
                    return Ok(hit);
                }
                // Leader failed or did not cache; run independently
                let result = self.run_attempts(operation, &options, &thunk).await;
                if let Ok(value) = &result {
                    self.cache_write(&key, value, options.cache_ttl).await;
                }
                result
            }
        }
    }

    /// Run N independent operations with all-settled semantics
    ///
    /// Partial failure never aborts the batch: successes are returned
    /// in settlement order, and failures are aggregated into one
    /// reported business-logic error carrying only the count.
    pub async fn batch_execute<T>(
        &self,
        operation: &str,
        tasks: Vec<BoxFuture<'_, BackendResult<T>>>,
    ) -> Result<Vec<T>> {
        let total = tasks.len();
        let mut settled = tasks.into_iter().collect::<FuturesUnordered<_>>();

        let mut successes = Vec::with_capacity(total);
        let mut failed = 0usize;
        while let Some(outcome) = settled.next().await {
            match outcome {
                Ok(value) => successes.push(value),
                Err(raw) => {
                    debug!(operation, "batch operation failed: {}", raw.message);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            self.reporter.business_logic_error(
                format!("{failed} of {total} batch operations failed"),
                operation,
            );
        }

        Ok(successes)
    }

    // ------------------------------------------------------------------
    // Invalidation surface
    // ------------------------------------------------------------------

    /// Remove one cache key
    pub async fn invalidate_key(&self, key: &str) -> Result<bool> {
        self.cache.invalidate(key).await
    }

    /// Remove every cache key containing `pattern`
    pub async fn invalidate_cache_pattern(&self, pattern: &str) -> Result<usize> {
        self.cache.invalidate_pattern(pattern).await
    }

    /// Drop the whole cache
    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear().await
    }

    /// Cache hit/miss statistics
    pub async fn cache_stats(&self) -> Result<CacheStats> {
        self.cache.stats().await
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn join_flight(&self, key: &str) -> Flight {
        let mut map = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(rx) = map.get(key) {
            return Flight::Follower(rx.clone());
        }
        let (tx, rx) = watch::channel(());
        map.insert(key.to_string(), rx);
        Flight::Leader(FlightGuard {
            key: key.to_string(),
            map: Arc::clone(&self.in_flight),
            _tx: tx,
        })
    }

    /// Timeout race + retry loop around the thunk
    async fn run_attempts<T, F, Fut>(
        &self,
        operation: &str,
        options: &QueryOptions,
        thunk: &F,
    ) -> Result<T>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = BackendResult<T>> + Send,
    {
        let mut attempt: u32 = 0;
        loop {
            let raw = match timeout(options.timeout, thunk()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(raw)) => raw,
                Err(_) => BackendError::new(format!(
                    "{operation}: query timeout after {} ms",
                    options.timeout.as_millis()
                )),
            };

            if attempt < options.retries && failure_is_retryable(&raw) {
                attempt += 1;
                // Delay doubles per attempt, capped so a large per-call
                // retry budget can neither overflow nor stall forever
                let delay =
                    Duration::from_secs(2u64.saturating_pow(attempt.min(BACKOFF_EXPONENT_CAP)));
                debug!(
                    operation,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "retrying after eligible failure: {}",
                    raw.message
                );
                sleep(delay).await;
                continue;
            }

            return Err(self.classify(raw, operation));
        }
    }

    fn classify(&self, raw: BackendError, operation: &str) -> AppError {
        self.reporter.database_error(raw, operation)
    }

    async fn cache_read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get_json(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(parse_err) => {
                    // A stale shape from an older build; drop it and miss
                    warn!(key, "discarding undecodable cache entry: {parse_err}");
                    let _ = self.cache.invalidate(key).await;
                    None
                }
            },
            Ok(None) => None,
            Err(cache_err) => {
                warn!(key, "cache read failed: {cache_err}");
                None
            }
        }
    }

    /// Best-effort: a cache-write failure never fails a successful query
    async fn cache_write<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(cache_err) = self.cache.set_json(key, &json, ttl).await {
                    warn!(key, "cache write failed: {cache_err}");
                }
            }
            Err(ser_err) => warn!(key, "could not serialize value for cache: {ser_err}"),
        }
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("cache", &self.cache.store_name())
            .finish()
    }
}
