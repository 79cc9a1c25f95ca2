//! Session manager
//!
//! Owns the single current-user slot, the auth listener registry, and
//! the background token-refresh task. State machine:
//! `anonymous → authenticating → authenticated → (refresh loop) →
//! signed-out → anonymous`; every terminal failure re-enters anonymous.
//!
//! The permission set is recomputed from the role on every profile load
//! path (sign-in, sign-up, refresh-triggered reload, role update,
//! wolfpack join) and never cached independently of the role.

use crate::errors::ErrorReporter;
use crate::listeners::{ListenerSet, Subscription};
use chrono::Utc;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wolfden_domain::auth::{
    AuthUser, Credentials, Identity, NewProfile, SessionTokens, SignUpData, UserProfile,
};
use wolfden_domain::error::Result;
use wolfden_domain::ports::BackendClient;
use wolfden_domain::rbac::{Permission, Role};

/// Authentication lifecycle and permission service
///
/// Injectable; construct one per process and share by `Arc`. There is
/// no multi-user mode: exactly one `AuthUser` occupies the slot at a
/// time, replaced wholesale on sign-in/refresh and cleared on sign-out.
pub struct SessionManager {
    backend: Arc<dyn BackendClient>,
    reporter: Arc<ErrorReporter>,
    current: RwLock<Option<AuthUser>>,
    listeners: ListenerSet<Option<AuthUser>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    refresh_interval: Duration,
    // Handed to the refresh task so it never keeps the manager alive
    self_ref: Weak<SessionManager>,
}

impl SessionManager {
    /// Create an anonymous session manager
    pub fn new(
        backend: Arc<dyn BackendClient>,
        reporter: Arc<ErrorReporter>,
        refresh_interval: Duration,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            backend,
            reporter,
            current: RwLock::new(None),
            listeners: ListenerSet::new("auth"),
            refresh_task: Mutex::new(None),
            refresh_interval,
            self_ref: weak.clone(),
        })
    }

    /// Restore a persisted session, if the backend has one
    ///
    /// Called once from the host's startup sequence. Bootstrap failures
    /// are reported and leave the manager anonymous; they never
    /// propagate.
    pub async fn initialize(&self) {
        match self.backend.restore_session().await {
            Ok(Some(identity)) => match self.load_profile_with_repair(&identity).await {
                Ok(profile) => {
                    self.install_user(AuthUser::from_parts(&identity, profile));
                    self.start_refresh_task();
                    info!("session restored");
                }
                Err(err) => {
                    warn!("session restore failed, staying anonymous: {err}");
                }
            },
            Ok(None) => debug!("no persisted session to restore"),
            Err(raw) => {
                self.reporter.authentication_error(raw, "restore_session");
            }
        }
    }

    // ------------------------------------------------------------------
    // Sign-in / sign-up / sign-out
    // ------------------------------------------------------------------

    /// Authenticate and load (or repair) the local profile
    ///
    /// If the profile row is missing - identities created before
    /// profile-creation was wired up server-side - a minimal profile is
    /// synthesized (display name from identity metadata, lowest member
    /// tier) and the load retried exactly once. This is a one-shot
    /// repair, not a retry loop; a second failure propagates.
    pub async fn sign_in(&self, credentials: Credentials) -> Result<AuthUser> {
        let identity = self
            .backend
            .sign_in(&credentials)
            .await
            .map_err(|raw| self.reporter.authentication_error(raw, "sign_in"))?;

        let profile = self.load_profile_with_repair(&identity).await?;
        let user = AuthUser::from_parts(&identity, profile);
        self.install_user(user.clone());
        self.start_refresh_task();
        info!(user_id = %user.id, role = %user.role, "signed in");
        Ok(user)
    }

    /// Register a new identity and create its profile
    pub async fn sign_up(&self, data: SignUpData) -> Result<AuthUser> {
        let identity = self
            .backend
            .sign_up(&data)
            .await
            .map_err(|raw| self.reporter.authentication_error(raw, "sign_up"))?;

        let display_name = data
            .display_name
            .clone()
            .unwrap_or_else(|| identity.derived_display_name());
        self.backend
            .create_profile(&NewProfile {
                auth_id: identity.auth_id.clone(),
                display_name,
                email: identity.email.clone(),
                role: Role::Member,
            })
            .await
            .map_err(|raw| self.reporter.database_error(raw, "create_profile"))?;

        let profile = self
            .backend
            .load_profile(&identity.auth_id)
            .await
            .map_err(|raw| self.reporter.database_error(raw, "load_profile"))?;

        let user = AuthUser::from_parts(&identity, profile);
        self.install_user(user.clone());
        self.start_refresh_task();
        info!(user_id = %user.id, "signed up");
        Ok(user)
    }

    /// Sign out: backend invalidation, timer cancel, slot clear
    ///
    /// A failing backend sign-out is reported but does not keep the
    /// local session alive.
    pub async fn sign_out(&self) {
        if let Err(raw) = self.backend.sign_out().await {
            self.reporter.authentication_error(raw, "sign_out");
        }
        self.stop_refresh_task();
        if let Ok(mut slot) = self.current.write() {
            *slot = None;
        }
        self.listeners.emit(&None);
        info!("signed out");
    }

    // ------------------------------------------------------------------
    // Permission checks (current-user slot only)
    // ------------------------------------------------------------------

    /// The current user, if any
    pub fn current_user(&self) -> Option<AuthUser> {
        self.current.read().ok().and_then(|slot| slot.clone())
    }

    /// Whether anyone is signed in
    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Whether the current user holds `permission`
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.current
            .read()
            .ok()
            .and_then(|slot| {
                slot.as_ref()
                    .map(|user| user.permissions.contains(&permission))
            })
            .unwrap_or(false)
    }

    /// Whether the current user holds at least one of `permissions`
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(*p))
    }

    /// Whether the current user holds every one of `permissions`
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }

    /// Whether the current user has exactly `role`
    pub fn has_role(&self, role: Role) -> bool {
        self.current
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|user| user.role == role))
            .unwrap_or(false)
    }

    /// Whether the current user has any of `roles`
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    // ------------------------------------------------------------------
    // Guarded transitions
    // ------------------------------------------------------------------

    /// Join the wolfpack
    ///
    /// The permission check runs before any write, so a denied join has
    /// zero side effects. The membership write and the profile reload
    /// are two separate backend operations; a concurrent role change
    /// landing between them is an accepted race.
    pub async fn join_wolfpack(&self) -> Result<AuthUser> {
        let user = self.current_user().ok_or_else(|| {
            self.reporter
                .authorization_error("join_wolfpack requires a signed-in user", "join_wolfpack")
        })?;
        if !user.permissions.contains(&Permission::JoinWolfpack) {
            return Err(self.reporter.authorization_error(
                format!("role '{}' may not join the wolfpack", user.role),
                "join_wolfpack",
            ));
        }

        self.backend
            .set_wolfpack_membership(&user.id, Utc::now())
            .await
            .map_err(|raw| self.reporter.database_error(raw, "join_wolfpack"))?;

        let updated = self.reload_profile().await?;
        info!(user_id = %updated.id, "joined the wolfpack");
        Ok(updated)
    }

    /// Change a user's role (admin surface)
    ///
    /// Requires `ManageUsers`; assigning an admin tier additionally
    /// requires `ManageAdmins`. Checks precede the write. If the target
    /// is the current user, the profile is reloaded so the permission
    /// set is re-derived immediately.
    pub async fn update_user_role(&self, target_id: &str, role: Role) -> Result<()> {
        if !self.has_permission(Permission::ManageUsers) {
            return Err(self
                .reporter
                .authorization_error("role changes require ManageUsers", "update_user_role"));
        }
        if role >= Role::Admin && !self.has_permission(Permission::ManageAdmins) {
            return Err(self.reporter.authorization_error(
                "assigning admin tiers requires ManageAdmins",
                "update_user_role",
            ));
        }

        self.backend
            .update_user_role(target_id, role)
            .await
            .map_err(|raw| self.reporter.database_error(raw, "update_user_role"))?;

        let is_self = self
            .current_user()
            .is_some_and(|user| user.id == target_id);
        if is_self {
            self.reload_profile().await?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Token refresh
    // ------------------------------------------------------------------

    /// React to an external "token refreshed" event
    ///
    /// Swaps the token pair and reloads the full profile to pick up
    /// server-side role changes.
    pub async fn handle_token_refreshed(&self, tokens: SessionTokens) -> Result<()> {
        {
            let mut slot = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match slot.as_mut() {
                Some(user) => user.session = tokens,
                None => return Ok(()),
            }
        }
        self.reload_profile().await.map(|_| ())
    }

    /// Register an auth listener
    ///
    /// Invoked synchronously with the current `Option<AuthUser>` on
    /// every sign-in, sign-out, and refresh-driven reload, in
    /// registration order; a panicking listener never blocks delivery
    /// to the rest.
    pub fn add_auth_listener<F>(&self, callback: F) -> Subscription<Option<AuthUser>>
    where
        F: Fn(&Option<AuthUser>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn load_profile_with_repair(&self, identity: &Identity) -> Result<UserProfile> {
        match self.backend.load_profile(&identity.auth_id).await {
            Ok(profile) => Ok(profile),
            Err(raw) if raw.is_not_found() => {
                debug!(auth_id = %identity.auth_id, "profile missing, synthesizing");
                self.backend
                    .create_profile(&NewProfile {
                        auth_id: identity.auth_id.clone(),
                        display_name: identity.derived_display_name(),
                        email: identity.email.clone(),
                        role: Role::Member,
                    })
                    .await
                    .map_err(|raw| self.reporter.database_error(raw, "create_profile"))?;
                self.backend
                    .load_profile(&identity.auth_id)
                    .await
                    .map_err(|raw| self.reporter.database_error(raw, "load_profile"))
            }
            Err(raw) => Err(self.reporter.database_error(raw, "load_profile")),
        }
    }

    /// Reload the current profile and re-derive the permission set
    async fn reload_profile(&self) -> Result<AuthUser> {
        let (auth_id, session, metadata) = {
            let slot = self
                .current
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match slot.as_ref() {
                Some(user) => (
                    user.profile.auth_id.clone(),
                    user.session.clone(),
                    user.metadata.clone(),
                ),
                None => {
                    return Err(self
                        .reporter
                        .authorization_error("no session to reload", "reload_profile"));
                }
            }
        };

        let profile = self
            .backend
            .load_profile(&auth_id)
            .await
            .map_err(|raw| self.reporter.database_error(raw, "reload_profile"))?;

        let user = AuthUser {
            id: profile.id.clone(),
            role: profile.role,
            permissions: profile.role.permissions().to_vec(),
            profile,
            session,
            metadata,
        };
        self.install_user(user.clone());
        Ok(user)
    }

    fn install_user(&self, user: AuthUser) {
        {
            let mut slot = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *slot = Some(user.clone());
        }
        self.listeners.emit(&Some(user));
    }

    fn start_refresh_task(&self) {
        let weak = self.self_ref.clone();
        let interval = self.refresh_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would refresh right after sign-in
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = weak.upgrade() else { break };
                manager.refresh_once().await;
            }
        });

        let mut guard = self
            .refresh_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = guard.replace(handle) {
            previous.abort();
        }
    }

    fn stop_refresh_task(&self) {
        let mut guard = self
            .refresh_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }

    /// One background refresh: exchange the refresh token, swap the
    /// pair in place. Failures are reported and the session kept; the
    /// next tick tries again.
    async fn refresh_once(&self) {
        let refresh_token = match self.current_user() {
            Some(user) => user.session.refresh_token,
            None => return,
        };
        match self.backend.refresh_session(&refresh_token).await {
            Ok(tokens) => {
                let mut slot = self
                    .current
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if let Some(user) = slot.as_mut() {
                    user.session = tokens;
                    debug!(user_id = %user.id, "session tokens refreshed");
                }
            }
            Err(raw) => {
                self.reporter.authentication_error(raw, "refresh_session");
            }
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.refresh_task.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("authenticated", &self.is_authenticated())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
