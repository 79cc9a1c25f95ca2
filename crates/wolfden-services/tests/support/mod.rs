//! Shared test doubles for the service layer tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use wolfden_domain::auth::{
    Credentials, Identity, NewProfile, SessionTokens, SignUpData, UserProfile,
};
use wolfden_domain::error::{AppError, BackendError};
use wolfden_domain::ports::backend::BackendResult;
use wolfden_domain::ports::{BackendClient, MonitorSink};
use wolfden_domain::rbac::Role;
use wolfden_domain::records::{
    DjEvent, MemberRecord, MenuCategory, MenuItem, NewUser, PrivateMessage, UserUpdate,
};

pub fn tokens() -> SessionTokens {
    SessionTokens {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: Utc::now() + ChronoDuration::hours(1),
    }
}

pub fn identity(auth_id: &str, email: &str) -> Identity {
    Identity {
        auth_id: auth_id.to_string(),
        email: email.to_string(),
        metadata: BTreeMap::new(),
        tokens: tokens(),
    }
}

pub fn profile(auth_id: &str, role: Role) -> UserProfile {
    UserProfile {
        id: format!("user-{auth_id}"),
        auth_id: auth_id.to_string(),
        display_name: "Test User".to_string(),
        email: format!("{auth_id}@example.com"),
        role,
        wolfpack_member: role == Role::WolfpackMember,
        wolfpack_joined_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn menu_item(id: &str) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        category_id: "drinks".to_string(),
        name: format!("Item {id}"),
        description: None,
        price_cents: 950,
        image_url: None,
        available: true,
    }
}

/// Programmable in-memory backend with call counters
#[derive(Default)]
pub struct MockBackend {
    /// Profile rows keyed by auth id
    pub profiles: Mutex<HashMap<String, UserProfile>>,
    /// Session returned by `restore_session`
    pub restorable: Mutex<Option<Identity>>,
    /// Menu items returned by `list_menu_items`
    pub menu_items: Mutex<Vec<MenuItem>>,
    /// Artificial latency for `list_menu_items`
    pub menu_items_delay: Mutex<std::time::Duration>,
    /// When set, `sign_in` fails with an invalid-credentials error
    pub fail_sign_in: AtomicBool,

    pub sign_in_calls: AtomicUsize,
    pub load_profile_calls: AtomicUsize,
    pub create_profile_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub wolfpack_writes: AtomicUsize,
    pub list_menu_items_calls: AtomicUsize,
    pub get_user_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a profile row
    pub fn seed_profile(&self, row: UserProfile) {
        self.profiles
            .lock()
            .unwrap()
            .insert(row.auth_id.clone(), row);
    }

    /// Overwrite a seeded profile's role (simulates a server-side change)
    pub fn set_role(&self, auth_id: &str, role: Role) {
        if let Some(row) = self.profiles.lock().unwrap().get_mut(auth_id) {
            row.role = role;
            row.updated_at = Utc::now();
        }
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<Identity> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_in.load(Ordering::SeqCst) {
            return Err(BackendError::with_code(
                "invalid login credentials",
                "auth_invalid_credentials",
            ));
        }
        let auth_id = credentials
            .email
            .split('@')
            .next()
            .unwrap_or("anon")
            .to_string();
        Ok(identity(&auth_id, &credentials.email))
    }

    async fn sign_up(&self, data: &SignUpData) -> BackendResult<Identity> {
        let auth_id = data.email.split('@').next().unwrap_or("anon").to_string();
        Ok(identity(&auth_id, &data.email))
    }

    async fn sign_out(&self) -> BackendResult<()> {
        Ok(())
    }

    async fn refresh_session(&self, _refresh_token: &str) -> BackendResult<SessionTokens> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(tokens())
    }

    async fn restore_session(&self) -> BackendResult<Option<Identity>> {
        Ok(self.restorable.lock().unwrap().clone())
    }

    async fn load_profile(&self, auth_id: &str) -> BackendResult<UserProfile> {
        self.load_profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profiles
            .lock()
            .unwrap()
            .get(auth_id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("profile"))
    }

    async fn create_profile(&self, new: &NewProfile) -> BackendResult<()> {
        self.create_profile_calls.fetch_add(1, Ordering::SeqCst);
        let mut row = profile(&new.auth_id, new.role);
        row.display_name = new.display_name.clone();
        row.email = new.email.clone();
        row.wolfpack_member = false;
        self.profiles.lock().unwrap().insert(new.auth_id.clone(), row);
        Ok(())
    }

    async fn list_wolfpack_members(&self) -> BackendResult<Vec<MemberRecord>> {
        Ok(Vec::new())
    }

    async fn list_menu_categories(&self) -> BackendResult<Vec<MenuCategory>> {
        Ok(Vec::new())
    }

    async fn list_menu_items(&self, _category_id: Option<&str>) -> BackendResult<Vec<MenuItem>> {
        self.list_menu_items_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.menu_items_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.menu_items.lock().unwrap().clone())
    }

    async fn list_dj_events(&self, _dj_id: Option<&str>) -> BackendResult<Vec<DjEvent>> {
        Ok(Vec::new())
    }

    async fn list_private_messages(&self, _user_id: &str) -> BackendResult<Vec<PrivateMessage>> {
        Ok(Vec::new())
    }

    async fn send_private_message(&self, _message: &PrivateMessage) -> BackendResult<()> {
        Ok(())
    }

    async fn get_user(&self, id: &str) -> BackendResult<UserProfile> {
        self.get_user_calls.fetch_add(1, Ordering::SeqCst);
        self.profiles
            .lock()
            .unwrap()
            .values()
            .find(|row| row.id == id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("user"))
    }

    async fn create_user(&self, user: &NewUser) -> BackendResult<UserProfile> {
        let auth_id = user.email.split('@').next().unwrap_or("anon").to_string();
        let mut row = profile(&auth_id, user.role);
        row.display_name = user.display_name.clone();
        row.email = user.email.clone();
        self.profiles
            .lock()
            .unwrap()
            .insert(auth_id.clone(), row.clone());
        Ok(row)
    }

    async fn update_user(&self, id: &str, update: &UserUpdate) -> BackendResult<UserProfile> {
        let mut profiles = self.profiles.lock().unwrap();
        let row = profiles
            .values_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| BackendError::not_found("user"))?;
        if let Some(name) = &update.display_name {
            row.display_name = name.clone();
        }
        if let Some(email) = &update.email {
            row.email = email.clone();
        }
        if let Some(role) = update.role {
            row.role = role;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_user(&self, id: &str) -> BackendResult<()> {
        self.profiles
            .lock()
            .unwrap()
            .retain(|_, row| row.id != id);
        Ok(())
    }

    async fn update_user_role(&self, id: &str, role: Role) -> BackendResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        let row = profiles
            .values_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| BackendError::not_found("user"))?;
        row.role = role;
        Ok(())
    }

    async fn set_wolfpack_membership(
        &self,
        user_id: &str,
        joined_at: DateTime<Utc>,
    ) -> BackendResult<()> {
        self.wolfpack_writes.fetch_add(1, Ordering::SeqCst);
        let mut profiles = self.profiles.lock().unwrap();
        let row = profiles
            .values_mut()
            .find(|row| row.id == user_id)
            .ok_or_else(|| BackendError::not_found("user"))?;
        row.wolfpack_member = true;
        row.wolfpack_joined_at = Some(joined_at);
        row.role = Role::WolfpackMember;
        Ok(())
    }
}

/// Monitoring sink that records every forwarded error
#[derive(Default)]
pub struct RecordingMonitor {
    pub reported: Mutex<Vec<AppError>>,
}

#[async_trait]
impl MonitorSink for RecordingMonitor {
    async fn report(&self, error: &AppError) -> Result<(), BackendError> {
        self.reported.lock().unwrap().push(error.clone());
        Ok(())
    }
}
