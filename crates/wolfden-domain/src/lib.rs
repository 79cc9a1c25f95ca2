//! Domain layer for the Wolfden service core
//!
//! Pure types and boundary contracts shared by the service layer:
//! the normalized error taxonomy, the role/permission matrix, the
//! auth/session value objects, catalog records, and the ports the
//! backend collaborator must implement.
//!
//! This crate has no runtime dependencies beyond serde/chrono/uuid;
//! all policy (classification, caching, retries) lives in
//! `wolfden-services`.

/// Auth/session value objects
pub mod auth;
/// Domain-wide constants
pub mod constants;
/// Error taxonomy and backend error shape
pub mod error;
/// Boundary contracts implemented by external layers
pub mod ports;
/// Per-call query options
pub mod query;
/// Role and permission matrix
pub mod rbac;
/// Catalog record types (members, menu, events, messages)
pub mod records;

// Re-export the most commonly used types
pub use auth::{AuthUser, Credentials, Identity, NewProfile, SessionTokens, SignUpData, UserProfile};
pub use error::{AppError, BackendError, ErrorCategory, ErrorSeverity, Result};
pub use query::QueryOptions;
pub use rbac::{Permission, Role};
