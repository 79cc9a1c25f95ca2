//! Domain query wrappers
//!
//! Thin wrappers binding the generic executor to the backend: each read
//! has a fixed `"<domain>_<discriminator>"` cache-key template and a
//! TTL tuned to the data's volatility (30 s for live/social/message
//! data, 5-10 min for catalog/profile data). Every mutating wrapper
//! calls pattern invalidation immediately after a successful write, so
//! the next read is guaranteed to miss cache.

use crate::constants::{
    KEY_DJ_EVENTS, KEY_MENU_CATEGORIES, KEY_MENU_ITEMS, KEY_PRIVATE_MESSAGES, KEY_USERS,
    KEY_WOLFPACK_MEMBERS, TTL_CATALOG_SECS, TTL_STATIC_SECS, TTL_VOLATILE_SECS,
};
use crate::query::QueryExecutor;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use wolfden_domain::error::Result;
use wolfden_domain::ports::BackendClient;
use wolfden_domain::rbac::Role;
use wolfden_domain::records::{
    DjEvent, MemberRecord, MenuCategory, MenuItem, NewUser, PrivateMessage, UserUpdate,
};

/// Domain-facing query surface
///
/// Owns nothing mutable itself; composes the executor (policy) with the
/// backend (I/O).
pub struct DomainQueries {
    executor: Arc<QueryExecutor>,
    backend: Arc<dyn BackendClient>,
}

impl DomainQueries {
    /// Create the wrapper set
    pub fn new(executor: Arc<QueryExecutor>, backend: Arc<dyn BackendClient>) -> Self {
        Self { executor, backend }
    }

    /// The underlying executor, for callers composing bespoke queries
    pub fn executor(&self) -> &Arc<QueryExecutor> {
        &self.executor
    }

    // ------------------------------------------------------------------
    // Cached reads
    // ------------------------------------------------------------------

    /// Wolfpack member list (live/social data, 30 s TTL)
    pub async fn wolfpack_members(&self) -> Result<Vec<MemberRecord>> {
        let backend = Arc::clone(&self.backend);
        self.executor
            .execute(
                "wolfpack_members",
                self.executor
                    .cached_options(format!("{KEY_WOLFPACK_MEMBERS}all"))
                    .with_ttl(Duration::from_secs(TTL_VOLATILE_SECS)),
                move || {
                    let backend = Arc::clone(&backend);
                    async move { backend.list_wolfpack_members().await }
                },
            )
            .await
    }

    /// Menu categories (near-static catalog data, 10 min TTL)
    pub async fn menu_categories(&self) -> Result<Vec<MenuCategory>> {
        let backend = Arc::clone(&self.backend);
        self.executor
            .execute(
                "menu_categories",
                self.executor
                    .cached_options(format!("{KEY_MENU_CATEGORIES}all"))
                    .with_ttl(Duration::from_secs(TTL_STATIC_SECS)),
                move || {
                    let backend = Arc::clone(&backend);
                    async move { backend.list_menu_categories().await }
                },
            )
            .await
    }

    /// Menu items, optionally for one category (catalog data, 5 min TTL)
    pub async fn menu_items(&self, category_id: Option<&str>) -> Result<Vec<MenuItem>> {
        let discriminator = category_id.unwrap_or("all");
        let backend = Arc::clone(&self.backend);
        let category = category_id.map(str::to_string);
        self.executor
            .execute(
                "menu_items",
                self.executor
                    .cached_options(format!("{KEY_MENU_ITEMS}{discriminator}"))
                    .with_ttl(Duration::from_secs(TTL_CATALOG_SECS)),
                move || {
                    let backend = Arc::clone(&backend);
                    let category = category.clone();
                    async move { backend.list_menu_items(category.as_deref()).await }
                },
            )
            .await
    }

    /// DJ events, optionally for one DJ (live data, 30 s TTL)
    pub async fn dj_events(&self, dj_id: Option<&str>) -> Result<Vec<DjEvent>> {
        let discriminator = dj_id.unwrap_or("all");
        let backend = Arc::clone(&self.backend);
        let dj = dj_id.map(str::to_string);
        self.executor
            .execute(
                "dj_events",
                self.executor
                    .cached_options(format!("{KEY_DJ_EVENTS}{discriminator}"))
                    .with_ttl(Duration::from_secs(TTL_VOLATILE_SECS)),
                move || {
                    let backend = Arc::clone(&backend);
                    let dj = dj.clone();
                    async move { backend.list_dj_events(dj.as_deref()).await }
                },
            )
            .await
    }

    /// Private messages for a user (message data, 30 s TTL)
    pub async fn private_messages(&self, user_id: &str) -> Result<Vec<PrivateMessage>> {
        let backend = Arc::clone(&self.backend);
        let user = user_id.to_string();
        self.executor
            .execute(
                "private_messages",
                self.executor
                    .cached_options(format!("{KEY_PRIVATE_MESSAGES}{user_id}"))
                    .with_ttl(Duration::from_secs(TTL_VOLATILE_SECS)),
                move || {
                    let backend = Arc::clone(&backend);
                    let user = user.clone();
                    async move { backend.list_private_messages(&user).await }
                },
            )
            .await
    }

    /// One user profile (profile data, 5 min TTL)
    pub async fn get_user(&self, id: &str) -> Result<wolfden_domain::UserProfile> {
        let backend = Arc::clone(&self.backend);
        let user_id = id.to_string();
        self.executor
            .execute(
                "get_user",
                self.executor
                    .cached_options(format!("{KEY_USERS}{id}"))
                    .with_ttl(Duration::from_secs(TTL_CATALOG_SECS)),
                move || {
                    let backend = Arc::clone(&backend);
                    let user_id = user_id.clone();
                    async move { backend.get_user(&user_id).await }
                },
            )
            .await
    }

    // ------------------------------------------------------------------
    // Mutations (uncached; invalidate after a successful write)
    // ------------------------------------------------------------------

    /// Create a user and invalidate every cached user read
    pub async fn create_user(&self, user: NewUser) -> Result<wolfden_domain::UserProfile> {
        let backend = Arc::clone(&self.backend);
        let payload = user;
        let created = self
            .executor
            .execute("create_user", self.executor.options(), move || {
                let backend = Arc::clone(&backend);
                let payload = payload.clone();
                async move { backend.create_user(&payload).await }
            })
            .await?;
        self.executor.invalidate_cache_pattern(KEY_USERS).await?;
        Ok(created)
    }

    /// Update a user and invalidate every cached user read
    pub async fn update_user(
        &self,
        id: &str,
        update: UserUpdate,
    ) -> Result<wolfden_domain::UserProfile> {
        let backend = Arc::clone(&self.backend);
        let user_id = id.to_string();
        let updated = self
            .executor
            .execute("update_user", self.executor.options(), move || {
                let backend = Arc::clone(&backend);
                let user_id = user_id.clone();
                let update = update.clone();
                async move { backend.update_user(&user_id, &update).await }
            })
            .await?;
        self.executor.invalidate_cache_pattern(KEY_USERS).await?;
        Ok(updated)
    }

    /// Delete a user and invalidate every cached user read
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        let backend = Arc::clone(&self.backend);
        let user_id = id.to_string();
        self.executor
            .execute("delete_user", self.executor.options(), move || {
                let backend = Arc::clone(&backend);
                let user_id = user_id.clone();
                async move { backend.delete_user(&user_id).await }
            })
            .await?;
        self.executor.invalidate_cache_pattern(KEY_USERS).await?;
        Ok(())
    }

    /// Change a user's role and invalidate every cached user read
    pub async fn update_user_role(&self, id: &str, role: Role) -> Result<()> {
        let backend = Arc::clone(&self.backend);
        let user_id = id.to_string();
        self.executor
            .execute("update_user_role", self.executor.options(), move || {
                let backend = Arc::clone(&backend);
                let user_id = user_id.clone();
                async move { backend.update_user_role(&user_id, role).await }
            })
            .await?;
        self.executor.invalidate_cache_pattern(KEY_USERS).await?;
        Ok(())
    }

    /// Send a private message and invalidate cached message reads
    pub async fn send_private_message(&self, message: PrivateMessage) -> Result<()> {
        let backend = Arc::clone(&self.backend);
        self.executor
            .execute("send_private_message", self.executor.options(), move || {
                let backend = Arc::clone(&backend);
                let message = message.clone();
                async move { backend.send_private_message(&message).await }
            })
            .await?;
        self.executor
            .invalidate_cache_pattern(KEY_PRIVATE_MESSAGES)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Realtime-change invalidation
    // ------------------------------------------------------------------

    /// Invalidate the cache domain a realtime change payload refers to
    ///
    /// Callers forward the backend's change notifications here; the
    /// channel protocol itself is not this layer's concern. Unknown
    /// tables are ignored.
    pub async fn handle_change_event(&self, table: &str) -> Result<usize> {
        let prefix = match table {
            "wolfpack_members" | "wolfpack_memberships" => KEY_WOLFPACK_MEMBERS,
            "menu_categories" => KEY_MENU_CATEGORIES,
            "menu_items" => KEY_MENU_ITEMS,
            "dj_events" => KEY_DJ_EVENTS,
            "private_messages" => KEY_PRIVATE_MESSAGES,
            "users" | "profiles" => KEY_USERS,
            _ => {
                debug!(table, "ignoring change event for unmapped table");
                return Ok(0);
            }
        };
        self.executor.invalidate_cache_pattern(prefix).await
    }
}

impl std::fmt::Debug for DomainQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainQueries").finish()
    }
}
