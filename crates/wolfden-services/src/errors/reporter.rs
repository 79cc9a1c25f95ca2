//! Error classifier and reporting funnel
//!
//! Every category has a dedicated constructor encoding a fixed policy
//! (severity, retryability, user message). All of them funnel through
//! [`ErrorReporter::report`]: ring-buffer append, severity-mapped log
//! emit, synchronous listener fan-out, and (when enabled) an async
//! forward to the monitoring sink that can never fail the caller.

use crate::constants::ERROR_BUFFER_CAPACITY;
use crate::listeners::{ListenerSet, Subscription};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use wolfden_domain::error::{retry_eligible, AppError, BackendError, ErrorCategory, ErrorSeverity};
use wolfden_domain::ports::MonitorSink;

/// Aggregate counts over the recent-error buffer
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorStats {
    /// Total errors currently buffered
    pub total: usize,
    /// Counts keyed by category name
    pub by_category: BTreeMap<String, usize>,
    /// Counts keyed by severity name
    pub by_severity: BTreeMap<String, usize>,
}

/// Centralized error classifier and reporter
///
/// Injectable service: construct one per process (or per tenant) and
/// share it by `Arc`. Holds the bounded recent-error buffer, the error
/// listener registry, and the optional monitoring sink.
pub struct ErrorReporter {
    buffer: Mutex<VecDeque<AppError>>,
    listeners: ListenerSet<AppError>,
    monitor: Option<Arc<dyn MonitorSink>>,
    forward_to_monitor: bool,
    capacity: usize,
}

impl ErrorReporter {
    /// Create a reporter with no monitoring sink
    pub fn new() -> Self {
        Self::with_monitor(None, false)
    }

    /// Create a reporter with an optional monitoring sink
    ///
    /// `forward_to_monitor` is config-driven (production deployments
    /// enable it); there is no runtime environment sniffing.
    pub fn with_monitor(monitor: Option<Arc<dyn MonitorSink>>, forward_to_monitor: bool) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(ERROR_BUFFER_CAPACITY)),
            listeners: ListenerSet::new("errors"),
            monitor,
            forward_to_monitor,
            capacity: ERROR_BUFFER_CAPACITY,
        }
    }

    // ------------------------------------------------------------------
    // Category constructors (fixed policy table)
    // ------------------------------------------------------------------

    /// Failed or expired credential check: high severity, retryable
    pub fn authentication_error(&self, raw: BackendError, operation: &str) -> AppError {
        let err = AppError::new(
            ErrorCategory::Authentication,
            ErrorSeverity::High,
            true,
            raw.message.clone(),
            "Authentication failed. Please sign in again.",
        )
        .with_operation(operation);
        self.report(err)
    }

    /// Permission denial: high severity, not retryable
    ///
    /// Raised before any mutation is attempted, so a denied action has
    /// no partial side effects.
    pub fn authorization_error(&self, message: impl Into<String>, operation: &str) -> AppError {
        let err = AppError::new(
            ErrorCategory::Authorization,
            ErrorSeverity::High,
            false,
            message,
            "You don't have permission to perform this action.",
        )
        .with_operation(operation);
        self.report(err)
    }

    /// Backend query/write failure: connection/timeout messages are
    /// high severity, everything else medium; always retryable
    pub fn database_error(&self, raw: BackendError, operation: &str) -> AppError {
        let lowered = raw.message.to_lowercase();
        let severity = if lowered.contains("connection") || lowered.contains("timeout") {
            ErrorSeverity::High
        } else {
            ErrorSeverity::Medium
        };
        let err = AppError::new(
            ErrorCategory::Database,
            severity,
            true,
            raw.message.clone(),
            "Something went wrong. Please try again.",
        )
        .with_operation(operation);
        self.report(err)
    }

    /// Connectivity failure: offline is high severity, timeouts medium;
    /// always retryable
    pub fn network_error(&self, raw: BackendError, offline: bool, operation: &str) -> AppError {
        let (severity, user_message) = if offline {
            (
                ErrorSeverity::High,
                "You appear to be offline. Check your connection and try again.",
            )
        } else {
            (ErrorSeverity::Medium, "Network problem. Please try again.")
        };
        let err = AppError::new(
            ErrorCategory::Network,
            severity,
            true,
            raw.message.clone(),
            user_message,
        )
        .with_operation(operation)
        .with_context("offline", offline);
        self.report(err)
    }

    /// Field-level input failure: low severity, never retryable
    pub fn validation_error(&self, field: &str, message: impl Into<String>) -> AppError {
        let message = message.into();
        let err = AppError::new(
            ErrorCategory::Validation,
            ErrorSeverity::Low,
            false,
            format!("validation failed for '{field}': {message}"),
            message,
        )
        .with_context("field", field);
        self.report(err)
    }

    /// Business rule violation: medium severity, never retryable
    pub fn business_logic_error(&self, message: impl Into<String>, operation: &str) -> AppError {
        let message = message.into();
        let err = AppError::new(
            ErrorCategory::BusinessLogic,
            ErrorSeverity::Medium,
            false,
            message.clone(),
            message,
        )
        .with_operation(operation);
        self.report(err)
    }

    /// Third-party collaborator failure: high severity, retryable
    pub fn external_service_error(&self, service: &str, raw: BackendError) -> AppError {
        let err = AppError::new(
            ErrorCategory::ExternalService,
            ErrorSeverity::High,
            true,
            raw.message.clone(),
            "An external service is unavailable. Please try again shortly.",
        )
        .with_context("service", service);
        self.report(err)
    }

    /// Anything unclassified
    ///
    /// A structured backend code wins over message sniffing; the
    /// substring heuristics are only a fallback enrichment for backends
    /// that never set codes.
    pub fn unknown_error(&self, raw: BackendError, operation: &str) -> AppError {
        let category = classify_unknown(&raw);
        let retryable = raw.is_retry_eligible();
        let err = AppError::new(
            category,
            ErrorSeverity::Medium,
            retryable,
            raw.message.clone(),
            "Something unexpected went wrong. Please try again.",
        )
        .with_operation(operation);
        self.report(err)
    }

    // ------------------------------------------------------------------
    // Reporting funnel
    // ------------------------------------------------------------------

    /// Append, log, fan out, and (optionally) forward one error
    ///
    /// Returns the error unchanged so call sites can report and
    /// propagate in one expression.
    pub fn report(&self, error: AppError) -> AppError {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push_back(error.clone());
            while buffer.len() > self.capacity {
                buffer.pop_front();
            }
        }

        match error.severity {
            ErrorSeverity::Critical | ErrorSeverity::High => error!(
                error_id = %error.id,
                category = %error.category,
                severity = %error.severity,
                retryable = error.retryable,
                "{}",
                error.message
            ),
            ErrorSeverity::Medium => warn!(
                error_id = %error.id,
                category = %error.category,
                retryable = error.retryable,
                "{}",
                error.message
            ),
            ErrorSeverity::Low => info!(
                error_id = %error.id,
                category = %error.category,
                "{}",
                error.message
            ),
        }

        self.listeners.emit(&error);

        if self.forward_to_monitor {
            if let Some(monitor) = &self.monitor {
                let monitor = Arc::clone(monitor);
                let forwarded = error.clone();
                tokio::spawn(async move {
                    if let Err(send_err) = monitor.report(&forwarded).await {
                        warn!(
                            error_id = %forwarded.id,
                            "failed to forward error to monitoring sink: {send_err}"
                        );
                    }
                });
            }
        }

        error
    }

    /// Register an error listener; delivery is synchronous, ordered,
    /// and isolated from panicking listeners
    pub fn add_error_listener<F>(&self, callback: F) -> Subscription<AppError>
    where
        F: Fn(&AppError) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    // ------------------------------------------------------------------
    // Buffer access
    // ------------------------------------------------------------------

    /// The most recent `limit` errors, newest last
    pub fn recent_errors(&self, limit: usize) -> Vec<AppError> {
        self.buffer
            .lock()
            .map(|buffer| {
                let skip = buffer.len().saturating_sub(limit);
                buffer.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    /// Aggregate counts over the buffer
    pub fn error_stats(&self) -> ErrorStats {
        let mut stats = ErrorStats::default();
        if let Ok(buffer) = self.buffer.lock() {
            stats.total = buffer.len();
            for err in buffer.iter() {
                *stats
                    .by_category
                    .entry(err.category.to_string())
                    .or_default() += 1;
                *stats
                    .by_severity
                    .entry(err.severity.to_string())
                    .or_default() += 1;
            }
        }
        stats
    }

    /// Drop all buffered errors
    pub fn clear_errors(&self) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.clear();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("buffered", &self.buffer.lock().map(|b| b.len()).unwrap_or(0))
            .field("forward_to_monitor", &self.forward_to_monitor)
            .finish()
    }
}

/// Map an unclassified backend failure to a category
///
/// Structured codes first, then keyword sniffing on the raw message.
fn classify_unknown(raw: &BackendError) -> ErrorCategory {
    if let Some(code) = raw.code.as_deref() {
        let code = code.to_lowercase();
        if code.starts_with("auth") || code == "401" {
            return ErrorCategory::Authentication;
        }
        if code.starts_with("perm") || code == "403" || code == "42501" {
            return ErrorCategory::Authorization;
        }
        if code.starts_with("net") {
            return ErrorCategory::Network;
        }
    }

    let lowered = raw.message.to_lowercase();
    if lowered.contains("auth") || lowered.contains("credential") {
        ErrorCategory::Authentication
    } else if lowered.contains("permission") || lowered.contains("forbidden") {
        ErrorCategory::Authorization
    } else if lowered.contains("network") || lowered.contains("fetch") {
        ErrorCategory::Network
    } else {
        ErrorCategory::Unknown
    }
}

// Used by the query executor to avoid re-deriving eligibility rules.
pub(crate) fn failure_is_retryable(raw: &BackendError) -> bool {
    retry_eligible(&raw.message)
}
