//! Catalog record types
//!
//! Rows the domain query wrappers read and write: wolfpack members,
//! menu catalog, DJ events, and private messages. These are plain
//! serde structs; volatility (and therefore cache TTL) is decided by
//! the query layer, not here.

use crate::rbac::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A wolfpack member as shown in the members list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Profile id
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// When the wolfpack was joined
    pub joined_at: DateTime<Utc>,
    /// Whether the member is currently checked in at the venue
    pub checked_in: bool,
}

/// Menu category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuCategory {
    /// Category id
    pub id: String,
    /// Category name
    pub name: String,
    /// Display ordering
    pub sort_order: i32,
    /// Whether the category is currently offered
    pub active: bool,
}

/// Menu item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    /// Item id
    pub id: String,
    /// Owning category id
    pub category_id: String,
    /// Item name
    pub name: String,
    /// Item description
    pub description: Option<String>,
    /// Price in cents
    pub price_cents: i64,
    /// Item image URL
    pub image_url: Option<String>,
    /// Whether the item is currently available
    pub available: bool,
}

/// DJ event (scheduled or live set)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DjEvent {
    /// Event id
    pub id: String,
    /// Performing DJ's profile id
    pub dj_id: String,
    /// Event title
    pub title: String,
    /// Scheduled start
    pub starts_at: DateTime<Utc>,
    /// Scheduled end
    pub ends_at: Option<DateTime<Utc>>,
    /// Whether the set is currently live
    pub live: bool,
}

/// Private message between two members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateMessage {
    /// Message id
    pub id: String,
    /// Sender profile id
    pub sender_id: String,
    /// Recipient profile id
    pub recipient_id: String,
    /// Message body
    pub body: String,
    /// Send time
    pub sent_at: DateTime<Utc>,
    /// Whether the recipient has read it
    pub read: bool,
}

/// Payload for creating a user through the admin CRUD surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Account email
    pub email: String,
    /// Display name
    pub display_name: String,
    /// Initial role
    pub role: Role,
}

/// Partial update for an existing user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    /// New display name, if changing
    pub display_name: Option<String>,
    /// New email, if changing
    pub email: Option<String>,
    /// New role, if changing
    pub role: Option<Role>,
}
