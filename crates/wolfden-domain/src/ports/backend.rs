//! Backend collaborator port
//!
//! The single external dependency of the service layer: a remote
//! relational + identity backend. All methods return the raw
//! [`BackendError`] shape; classification into [`crate::AppError`]
//! happens in the service layer, never here.
//!
//! The backend's realtime change channel is out of scope; its payloads
//! reach the service layer only as caller-forwarded cache-invalidation
//! triggers.

use crate::auth::{Credentials, Identity, NewProfile, SessionTokens, SignUpData, UserProfile};
use crate::error::BackendError;
use crate::rbac::Role;
use crate::records::{DjEvent, MemberRecord, MenuCategory, MenuItem, NewUser, PrivateMessage, UserUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result shape for raw backend calls
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Remote relational + identity backend
#[async_trait]
pub trait BackendClient: Send + Sync {
    // ------------------------------------------------------------------
    // Identity interface
    // ------------------------------------------------------------------

    /// Authenticate with email/password credentials
    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<Identity>;

    /// Register a new identity
    async fn sign_up(&self, data: &SignUpData) -> BackendResult<Identity>;

    /// Invalidate the current session server-side
    async fn sign_out(&self) -> BackendResult<()>;

    /// Exchange a refresh token for a fresh token pair
    async fn refresh_session(&self, refresh_token: &str) -> BackendResult<SessionTokens>;

    /// Retrieve a previously persisted session, if any
    async fn restore_session(&self) -> BackendResult<Option<Identity>>;

    // ------------------------------------------------------------------
    // Profile rows
    // ------------------------------------------------------------------

    /// Load the local profile keyed by the external identity id
    async fn load_profile(&self, auth_id: &str) -> BackendResult<UserProfile>;

    /// Create a minimal profile row (first-login repair path)
    async fn create_profile(&self, profile: &NewProfile) -> BackendResult<()>;

    // ------------------------------------------------------------------
    // Catalog reads
    // ------------------------------------------------------------------

    /// List all wolfpack members
    async fn list_wolfpack_members(&self) -> BackendResult<Vec<MemberRecord>>;

    /// List menu categories
    async fn list_menu_categories(&self) -> BackendResult<Vec<MenuCategory>>;

    /// List menu items, optionally filtered by category
    async fn list_menu_items(&self, category_id: Option<&str>) -> BackendResult<Vec<MenuItem>>;

    /// List DJ events, optionally filtered by DJ
    async fn list_dj_events(&self, dj_id: Option<&str>) -> BackendResult<Vec<DjEvent>>;

    /// List private messages for a user
    async fn list_private_messages(&self, user_id: &str) -> BackendResult<Vec<PrivateMessage>>;

    /// Persist a private message
    async fn send_private_message(&self, message: &PrivateMessage) -> BackendResult<()>;

    // ------------------------------------------------------------------
    // User CRUD
    // ------------------------------------------------------------------

    /// Load a user profile by local id
    async fn get_user(&self, id: &str) -> BackendResult<UserProfile>;

    /// Create a user
    async fn create_user(&self, user: &NewUser) -> BackendResult<UserProfile>;

    /// Update a user
    async fn update_user(&self, id: &str, update: &UserUpdate) -> BackendResult<UserProfile>;

    /// Delete a user
    async fn delete_user(&self, id: &str) -> BackendResult<()>;

    /// Change a user's role
    async fn update_user_role(&self, id: &str, role: Role) -> BackendResult<()>;

    /// Persist wolfpack membership (flag, join timestamp, role upgrade)
    async fn set_wolfpack_membership(
        &self,
        user_id: &str,
        joined_at: DateTime<Utc>,
    ) -> BackendResult<()>;
}
