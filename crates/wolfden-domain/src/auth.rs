//! Auth and session value objects

use crate::rbac::{Permission, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sign-in request shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Plaintext password, forwarded to the identity API only
    pub password: String,
}

/// Sign-up request shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpData {
    /// Account email
    pub email: String,
    /// Plaintext password, forwarded to the identity API only
    pub password: String,
    /// Requested display name
    pub display_name: Option<String>,
}

/// Session token pair issued by the identity API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Short-lived access token
    pub access_token: String,
    /// Long-lived refresh token
    pub refresh_token: String,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
}

/// What the identity API returns on sign-in, sign-up, or session restore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// External identity id
    pub auth_id: String,
    /// Verified email
    pub email: String,
    /// Free-form metadata attached at the identity provider
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Issued token pair
    pub tokens: SessionTokens,
}

impl Identity {
    /// Best-effort display name: identity metadata first, then the
    /// local part of the email
    pub fn derived_display_name(&self) -> String {
        if let Some(name) = self
            .metadata
            .get("display_name")
            .or_else(|| self.metadata.get("name"))
            .and_then(|v| v.as_str())
        {
            return name.to_string();
        }
        self.email
            .split('@')
            .next()
            .filter(|s| !s.is_empty())
            .map_or_else(
                || crate::constants::DEFAULT_DISPLAY_NAME.to_string(),
                ToString::to_string,
            )
    }
}

/// Local profile row keyed by the external identity id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Local profile id
    pub id: String,
    /// External identity id this profile belongs to
    pub auth_id: String,
    /// Display name
    pub display_name: String,
    /// Account email
    pub email: String,
    /// Assigned role; permissions are always derived from this
    pub role: Role,
    /// Wolfpack membership flag
    pub wolfpack_member: bool,
    /// When the wolfpack was joined, if ever
    pub wolfpack_joined_at: Option<DateTime<Utc>>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last row update time
    pub updated_at: DateTime<Utc>,
}

/// Minimal profile record for the first-login repair path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    /// External identity id
    pub auth_id: String,
    /// Display name derived from identity metadata
    pub display_name: String,
    /// Account email
    pub email: String,
    /// Initial role, always the lowest member tier
    pub role: Role,
}

/// The authenticated user occupying the single current-user slot
///
/// `permissions` is derived from `profile.role` on every load and is
/// never persisted independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Local profile id
    pub id: String,
    /// Current role
    pub role: Role,
    /// Permission set derived from `role`
    pub permissions: Vec<Permission>,
    /// The loaded profile row
    pub profile: UserProfile,
    /// Current token pair
    pub session: SessionTokens,
    /// Identity-provider metadata
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AuthUser {
    /// Assemble a user from an identity and its loaded profile,
    /// deriving the permission set from the profile role
    pub fn from_parts(identity: &Identity, profile: UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            role: profile.role,
            permissions: profile.role.permissions().to_vec(),
            profile,
            session: identity.tokens.clone(),
            metadata: identity.metadata.clone(),
        }
    }

    /// Refresh the token pair without touching profile or permissions
    pub fn with_tokens(mut self, tokens: SessionTokens) -> Self {
        self.session = tokens;
        self
    }
}
