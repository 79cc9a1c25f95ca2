//! Role and permission matrix
//!
//! A static, total mapping from each of the eight ordered roles to a
//! fixed permission set. Permissions are never granted per-user; they
//! are always re-derived from the role on every profile load.

use serde::{Deserialize, Serialize};

/// Application roles, ordered from least to most privileged
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unauthenticated browsing
    #[default]
    Guest,
    /// Signed-in member, lowest authenticated tier
    Member,
    /// Member who joined the wolfpack
    WolfpackMember,
    /// Resident or guest DJ
    Dj,
    /// Bar staff
    Bartender,
    /// Venue manager
    Manager,
    /// Application administrator
    Admin,
    /// Unrestricted administrator
    SuperAdmin,
}

/// Individual capabilities the UI gates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Browse the menu
    ViewMenu,
    /// Browse DJ events
    ViewEvents,
    /// Watch the social video feed
    ViewVideoFeed,
    /// Send private messages
    SendMessages,
    /// Upload videos to the feed
    UploadVideos,
    /// Join the wolfpack
    JoinWolfpack,
    /// Access wolfpack-only content
    WolfpackContent,
    /// Broadcast live DJ sets
    BroadcastSets,
    /// Create and edit DJ events
    ManageEvents,
    /// Edit menu categories and items
    ManageMenu,
    /// Moderate feed and message content
    ModerateContent,
    /// View analytics dashboards
    ViewAnalytics,
    /// Create, update, and delete users
    ManageUsers,
    /// Grant and revoke admin roles
    ManageAdmins,
    /// Emergency overrides (lockouts, venue-wide broadcast)
    EmergencyAccess,
}

impl Permission {
    /// The full permission enumeration
    pub const ALL: [Permission; 15] = [
        Permission::ViewMenu,
        Permission::ViewEvents,
        Permission::ViewVideoFeed,
        Permission::SendMessages,
        Permission::UploadVideos,
        Permission::JoinWolfpack,
        Permission::WolfpackContent,
        Permission::BroadcastSets,
        Permission::ManageEvents,
        Permission::ManageMenu,
        Permission::ModerateContent,
        Permission::ViewAnalytics,
        Permission::ManageUsers,
        Permission::ManageAdmins,
        Permission::EmergencyAccess,
    ];
}

impl Role {
    /// All roles, in privilege order
    pub const ALL: [Role; 8] = [
        Role::Guest,
        Role::Member,
        Role::WolfpackMember,
        Role::Dj,
        Role::Bartender,
        Role::Manager,
        Role::Admin,
        Role::SuperAdmin,
    ];

    /// The static permission set for this role
    ///
    /// Total over all roles. `SuperAdmin` holds the full enumeration;
    /// `Admin` holds everything except `ManageAdmins` and
    /// `EmergencyAccess`.
    pub fn permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Role::Guest => &[ViewMenu, ViewEvents],
            Role::Member => &[ViewMenu, ViewEvents, ViewVideoFeed, SendMessages, JoinWolfpack],
            Role::WolfpackMember => &[
                ViewMenu,
                ViewEvents,
                ViewVideoFeed,
                SendMessages,
                JoinWolfpack,
                UploadVideos,
                WolfpackContent,
            ],
            Role::Dj => &[
                ViewMenu,
                ViewEvents,
                ViewVideoFeed,
                SendMessages,
                UploadVideos,
                WolfpackContent,
                BroadcastSets,
                ManageEvents,
            ],
            Role::Bartender => &[
                ViewMenu,
                ViewEvents,
                ViewVideoFeed,
                SendMessages,
                ManageMenu,
                ModerateContent,
            ],
            Role::Manager => &[
                ViewMenu,
                ViewEvents,
                ViewVideoFeed,
                SendMessages,
                UploadVideos,
                WolfpackContent,
                BroadcastSets,
                ManageEvents,
                ManageMenu,
                ModerateContent,
                ViewAnalytics,
            ],
            Role::Admin => &[
                ViewMenu,
                ViewEvents,
                ViewVideoFeed,
                SendMessages,
                UploadVideos,
                JoinWolfpack,
                WolfpackContent,
                BroadcastSets,
                ManageEvents,
                ManageMenu,
                ModerateContent,
                ViewAnalytics,
                ManageUsers,
            ],
            Role::SuperAdmin => &Permission::ALL,
        }
    }

    /// Whether this role's set contains the given permission
    pub fn grants(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Guest => "guest",
            Role::Member => "member",
            Role::WolfpackMember => "wolfpack_member",
            Role::Dj => "dj",
            Role::Bartender => "bartender",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        };
        f.write_str(s)
    }
}
