//! Wolfden service core
//!
//! The centralized service layer of the Wolfden nightlife app: cached
//! and retried query execution, authentication/session lifecycle with
//! role-derived permissions, and a single error-classification funnel.
//! UI and feature modules call the public methods here and register
//! listeners; they never touch internal state.
//!
//! Everything is an injectable service object assembled by
//! [`ServiceLayer::initialize`] - there are no module-level singletons
//! and no import-time side effects.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use wolfden_services::{ServiceLayer, config::ServiceConfig};
//! # use wolfden_domain::ports::BackendClient;
//! # async fn bootstrap(backend: Arc<dyn BackendClient>) -> wolfden_domain::Result<()> {
//! let config = ServiceConfig::default();
//! let layer = ServiceLayer::initialize(config, backend, None).await?;
//! let members = layer.queries.wolfpack_members().await?;
//! # let _ = members;
//! # Ok(())
//! # }
//! ```

/// Cache store implementations
pub mod cache;
/// Configuration types and loader
pub mod config;
/// Service layer constants
pub mod constants;
/// Error classification and reporting
pub mod errors;
/// Typed publish/subscribe registries
pub mod listeners;
/// Logging bootstrap
pub mod logging;
/// Query execution and domain wrappers
pub mod query;
/// Session and permission management
pub mod session;

use crate::cache::{MemoryCacheStore, NullCacheStore};
use crate::config::ServiceConfig;
use crate::errors::ErrorReporter;
use crate::query::{DomainQueries, QueryExecutor};
use crate::session::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use wolfden_domain::QueryOptions;
use wolfden_domain::error::Result;
use wolfden_domain::ports::{BackendClient, CacheStore, MonitorSink};

pub use wolfden_domain as domain;

/// Assembled service layer
///
/// Construct exactly one per process (or per tenant) through
/// [`ServiceLayer::initialize`] and share it by `Arc`.
pub struct ServiceLayer {
    /// Error classification funnel
    pub reporter: Arc<ErrorReporter>,
    /// Cache store backing the executor
    pub cache: Arc<dyn CacheStore>,
    /// Generic query executor
    pub executor: Arc<QueryExecutor>,
    /// Domain query wrappers
    pub queries: Arc<DomainQueries>,
    /// Session and permission manager
    pub sessions: Arc<SessionManager>,
}

impl ServiceLayer {
    /// Validate config, build every service, and restore any persisted
    /// session
    ///
    /// Must be called explicitly from the host's startup sequence.
    /// Session-restore failures are reported and leave the layer
    /// anonymous; only configuration errors propagate.
    pub async fn initialize(
        config: ServiceConfig,
        backend: Arc<dyn BackendClient>,
        monitor: Option<Arc<dyn MonitorSink>>,
    ) -> Result<Self> {
        config.validate()?;

        let reporter = Arc::new(ErrorReporter::with_monitor(
            monitor,
            config.monitoring.forward_errors,
        ));

        let cache: Arc<dyn CacheStore> = if config.cache.enabled {
            Arc::new(MemoryCacheStore::with_sweep_threshold(
                config.cache.max_entries,
            ))
        } else {
            Arc::new(NullCacheStore::new())
        };

        let query_defaults = QueryOptions::uncached()
            .with_timeout(Duration::from_millis(config.query.timeout_ms))
            .with_retries(config.query.retries)
            .with_ttl(Duration::from_secs(config.cache.default_ttl_secs));
        let executor = Arc::new(QueryExecutor::new(
            Arc::clone(&cache),
            Arc::clone(&reporter),
            query_defaults,
        ));
        let queries = Arc::new(DomainQueries::new(
            Arc::clone(&executor),
            Arc::clone(&backend),
        ));
        let sessions = SessionManager::new(
            backend,
            Arc::clone(&reporter),
            Duration::from_secs(config.session.refresh_interval_secs),
        );
        sessions.initialize().await;

        Ok(Self {
            reporter,
            cache,
            executor,
            queries,
            sessions,
        })
    }
}

impl std::fmt::Debug for ServiceLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLayer")
            .field("cache", &self.cache.store_name())
            .field("sessions", &self.sessions)
            .finish()
    }
}
