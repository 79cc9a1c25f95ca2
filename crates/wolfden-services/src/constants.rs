//! Service layer constants
//!
//! Tunables and cache-key templates for the service layer. Domain
//! constants (retry hints, structured codes) live in
//! `wolfden_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "wolfden.toml";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "WOLFDEN";

// ============================================================================
// CACHE CONSTANTS
// ============================================================================

/// Entry count past which a write triggers an expired-entry sweep
pub const CACHE_SWEEP_THRESHOLD: usize = 1000;

/// Default cache TTL in seconds (5 minutes)
pub const CACHE_DEFAULT_TTL_SECS: u64 = 300;

/// TTL for live/social/message data (30 seconds)
pub const TTL_VOLATILE_SECS: u64 = 30;

/// TTL for catalog/profile data (5 minutes)
pub const TTL_CATALOG_SECS: u64 = 300;

/// TTL for near-static catalog data (10 minutes)
pub const TTL_STATIC_SECS: u64 = 600;

// ============================================================================
// CACHE KEY TEMPLATES
// ============================================================================

/// Wolfpack member list keys
pub const KEY_WOLFPACK_MEMBERS: &str = "wolf-pack-members_";

/// Menu category keys
pub const KEY_MENU_CATEGORIES: &str = "menu-categories_";

/// Menu item keys
pub const KEY_MENU_ITEMS: &str = "menu-items_";

/// DJ event keys
pub const KEY_DJ_EVENTS: &str = "dj-events_";

/// Private message keys
pub const KEY_PRIVATE_MESSAGES: &str = "private-messages_";

/// User profile keys
pub const KEY_USERS: &str = "users_";

// ============================================================================
// QUERY CONSTANTS
// ============================================================================

/// Default per-attempt timeout in milliseconds
pub const QUERY_TIMEOUT_MS: u64 = 5000;

/// Default retry budget
pub const QUERY_DEFAULT_RETRIES: u32 = 2;

// ============================================================================
// ERROR REPORTING CONSTANTS
// ============================================================================

/// Ring buffer capacity for recent errors
pub const ERROR_BUFFER_CAPACITY: usize = 1000;

// ============================================================================
// SESSION CONSTANTS
// ============================================================================

/// Interval between background token refreshes (10 minutes)
pub const SESSION_REFRESH_INTERVAL_SECS: u64 = 600;
