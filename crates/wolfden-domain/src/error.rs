//! Error taxonomy
//!
//! `AppError` is the single normalized error value crossing the service
//! boundary: every internal failure is reclassified into one before it
//! reaches a caller. `BackendError` is the raw shape the backend
//! collaborator returns; classification policy (which severity, whether
//! retryable, the user-facing message) lives in
//! `wolfden_services::errors::ErrorReporter`.

use crate::constants::{CODE_NOT_FOUND, RETRY_HINTS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, AppError>;

/// Error severity levels, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Informational failures (field validation, user-correctable)
    Low,
    /// Degraded behavior, operation failed but system healthy
    Medium,
    /// Operation failed in a way that needs attention
    High,
    /// System-level failure
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Error categories mirroring the failure domains of the service layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Credential or session failures
    Authentication,
    /// Permission denials
    Authorization,
    /// Backend query/write failures
    Database,
    /// Connectivity failures
    Network,
    /// Field-level input failures
    Validation,
    /// Business rule violations
    BusinessLogic,
    /// Third-party collaborator failures
    ExternalService,
    /// Anything unclassified
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::Database => "database",
            Self::Network => "network",
            Self::Validation => "validation",
            Self::BusinessLogic => "business_logic",
            Self::ExternalService => "external_service",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Normalized application error
///
/// Immutable once created. Carries both a developer-facing `message`
/// and a `user_message` safe to surface in UI, plus the policy fields
/// (`severity`, `retryable`) the classifier assigned.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("[{category}] {message}")]
pub struct AppError {
    /// Unique error id (uuid v4)
    pub id: String,
    /// Developer-facing description
    pub message: String,
    /// User-facing description, safe for display
    pub user_message: String,
    /// Assigned severity
    pub severity: ErrorSeverity,
    /// Assigned category
    pub category: ErrorCategory,
    /// Whether a retry of the failed operation may succeed
    pub retryable: bool,
    /// Structured call-site context
    pub context: BTreeMap<String, serde_json::Value>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl AppError {
    /// Create a new error with the given classification
    pub fn new<M, U>(
        category: ErrorCategory,
        severity: ErrorSeverity,
        retryable: bool,
        message: M,
        user_message: U,
    ) -> Self
    where
        M: Into<String>,
        U: Into<String>,
    {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
            user_message: user_message.into(),
            severity,
            category,
            retryable,
            context: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attach a context value (builder style, consumed before the error
    /// is reported and becomes immutable)
    pub fn with_context<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attach the name of the operation that failed
    pub fn with_operation<S: Into<String>>(self, operation: S) -> Self {
        self.with_context("operation", operation.into())
    }
}

/// Raw failure returned by the backend collaborator
///
/// Carries the raw message plus an optional structured code. Codes are
/// classified before message sniffing; the substring heuristics exist
/// only as a fallback for backends that never set a code.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct BackendError {
    /// Raw failure message from the backend
    pub message: String,
    /// Structured error code, when the backend provides one
    pub code: Option<String>,
}

impl BackendError {
    /// Create a backend error from a raw message
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Create a backend error with a structured code
    pub fn with_code<M: Into<String>, C: Into<String>>(message: M, code: C) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Create a missing-row error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::with_code(format!("{} not found", resource.into()), CODE_NOT_FOUND)
    }

    /// Whether this failure represents a missing row
    pub fn is_not_found(&self) -> bool {
        self.code.as_deref() == Some(CODE_NOT_FOUND)
            || self.message.to_lowercase().contains("not found")
    }

    /// Whether a retry of the failed operation is eligible per the
    /// raw-message hint list
    pub fn is_retry_eligible(&self) -> bool {
        retry_eligible(&self.message)
    }
}

/// Case-insensitive substring check against [`RETRY_HINTS`]
pub fn retry_eligible(message: &str) -> bool {
    let lowered = message.to_lowercase();
    RETRY_HINTS.iter().any(|hint| lowered.contains(hint))
}
