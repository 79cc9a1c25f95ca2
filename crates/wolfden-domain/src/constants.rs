//! Domain layer constants
//!
//! Constants that belong to the domain model itself. Service-side
//! tunables (cache sizes, timeouts) are defined in
//! `wolfden_services::constants`.

// ============================================================================
// ERROR CLASSIFICATION CONSTANTS
// ============================================================================

/// Raw-message fragments that mark a failure as retry-eligible.
///
/// Matching is case-insensitive substring search on the backend's raw
/// message; anything else is treated as a permanent failure.
pub const RETRY_HINTS: [&str; 5] = ["timeout", "connection", "network", "temporary", "rate limit"];

/// Structured backend code for a missing row
pub const CODE_NOT_FOUND: &str = "not_found";

// ============================================================================
// SESSION CONSTANTS
// ============================================================================

/// Default display name used when an identity carries no usable metadata
pub const DEFAULT_DISPLAY_NAME: &str = "New Member";
