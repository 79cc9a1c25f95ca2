//! Session manager tests: sign-in repair, listener delivery, guarded
//! transitions, and the refresh loop

mod support;

use std::sync::{Arc, Mutex};
use std::sync::atomic::Ordering;
use std::time::Duration;
use support::{MockBackend, identity, profile, tokens};
use wolfden_domain::auth::Credentials;
use wolfden_domain::error::ErrorCategory;
use wolfden_domain::ports::BackendClient;
use wolfden_domain::rbac::{Permission, Role};
use wolfden_services::errors::ErrorReporter;
use wolfden_services::session::SessionManager;

fn manager_over(backend: Arc<MockBackend>) -> (Arc<SessionManager>, Arc<ErrorReporter>) {
    let reporter = Arc::new(ErrorReporter::new());
    let manager = SessionManager::new(
        Arc::clone(&backend) as Arc<dyn BackendClient>,
        Arc::clone(&reporter),
        Duration::from_secs(60),
    );
    (manager, reporter)
}

fn credentials() -> Credentials {
    Credentials {
        email: "wolfie@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

#[tokio::test]
async fn sign_in_loads_profile_and_derives_permissions() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(profile("wolfie", Role::Member));
    let (manager, _) = manager_over(Arc::clone(&backend));

    let user = manager.sign_in(credentials()).await.unwrap();

    assert_eq!(user.role, Role::Member);
    assert_eq!(user.permissions, Role::Member.permissions().to_vec());
    assert!(manager.is_authenticated());
    assert!(manager.has_permission(Permission::JoinWolfpack));
    assert!(!manager.has_permission(Permission::ManageUsers));
}

#[tokio::test]
async fn missing_profile_is_created_exactly_once() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _) = manager_over(Arc::clone(&backend));

    let user = manager.sign_in(credentials()).await.unwrap();
    assert_eq!(user.role, Role::Member);
    assert_eq!(backend.create_profile_calls.load(Ordering::SeqCst), 1);

    manager.sign_out().await;

    // The repaired profile now exists; no further creation calls
    manager.sign_in(credentials()).await.unwrap();
    assert_eq!(backend.create_profile_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_sign_in_is_classified_and_leaves_anonymous() {
    let backend = Arc::new(MockBackend::new());
    backend.fail_sign_in.store(true, Ordering::SeqCst);
    let (manager, reporter) = manager_over(backend);

    let err = manager.sign_in(credentials()).await.unwrap_err();
    assert_eq!(err.category, ErrorCategory::Authentication);
    assert!(!manager.is_authenticated());
    assert_eq!(reporter.recent_errors(5).len(), 1);
}

#[tokio::test]
async fn listeners_fire_in_order_and_survive_a_panicking_listener() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(profile("wolfie", Role::Member));
    let (manager, _) = manager_over(backend);
    manager.sign_in(credentials()).await.unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    let (o1, o2, o3) = (Arc::clone(&order), Arc::clone(&order), Arc::clone(&order));

    let _s1 = manager.add_auth_listener(move |user| {
        o1.lock().unwrap().push((1, user.is_none()));
        panic!("listener one always panics");
    });
    let _s2 = manager.add_auth_listener(move |user| {
        o2.lock().unwrap().push((2, user.is_none()));
    });
    let _s3 = manager.add_auth_listener(move |user| {
        o3.lock().unwrap().push((3, user.is_none()));
    });

    // Silence the expected panic's default backtrace print
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    manager.sign_out().await;
    std::panic::set_hook(previous_hook);

    let delivered = order.lock().unwrap().clone();
    assert_eq!(delivered, vec![(1, true), (2, true), (3, true)]);
}

#[tokio::test]
async fn unsubscribed_listener_is_not_invoked() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(profile("wolfie", Role::Member));
    let (manager, _) = manager_over(backend);

    let seen = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&seen);
    let subscription = manager.add_auth_listener(move |_| {
        *counter.lock().unwrap() += 1;
    });

    manager.sign_in(credentials()).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), 1);

    subscription.unsubscribe();
    manager.sign_out().await;
    assert_eq!(*seen.lock().unwrap(), 1);
}

#[tokio::test]
async fn join_wolfpack_upgrades_role_and_rederives_permissions() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(profile("wolfie", Role::Member));
    let (manager, _) = manager_over(Arc::clone(&backend));
    manager.sign_in(credentials()).await.unwrap();

    assert!(!manager.has_permission(Permission::WolfpackContent));
    let updated = manager.join_wolfpack().await.unwrap();

    assert_eq!(updated.role, Role::WolfpackMember);
    assert!(updated.profile.wolfpack_member);
    assert!(updated.profile.wolfpack_joined_at.is_some());
    assert!(manager.has_permission(Permission::WolfpackContent));
    assert_eq!(backend.wolfpack_writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn denied_join_has_zero_side_effects() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(profile("wolfie", Role::Bartender));
    let (manager, _) = manager_over(Arc::clone(&backend));
    manager.sign_in(credentials()).await.unwrap();

    let err = manager.join_wolfpack().await.unwrap_err();

    assert_eq!(err.category, ErrorCategory::Authorization);
    assert!(!err.retryable);
    assert_eq!(backend.wolfpack_writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn token_refresh_event_picks_up_server_side_role_changes() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(profile("wolfie", Role::Member));
    let (manager, _) = manager_over(Arc::clone(&backend));
    manager.sign_in(credentials()).await.unwrap();

    backend.set_role("wolfie", Role::Dj);
    manager.handle_token_refreshed(tokens()).await.unwrap();

    let user = manager.current_user().unwrap();
    assert_eq!(user.role, Role::Dj);
    assert!(manager.has_permission(Permission::BroadcastSets));
}

#[tokio::test]
async fn role_update_requires_manage_users() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(profile("wolfie", Role::Member));
    let (manager, _) = manager_over(Arc::clone(&backend));
    manager.sign_in(credentials()).await.unwrap();

    let err = manager
        .update_user_role("user-someone", Role::Dj)
        .await
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::Authorization);
}

#[tokio::test]
async fn admin_tier_assignment_requires_manage_admins() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(profile("wolfie", Role::Admin));
    backend.seed_profile(profile("target", Role::Member));
    let (manager, _) = manager_over(Arc::clone(&backend));
    manager.sign_in(credentials()).await.unwrap();

    // Admin may hand out non-admin roles...
    manager
        .update_user_role("user-target", Role::Dj)
        .await
        .unwrap();

    // ...but not admin tiers
    let err = manager
        .update_user_role("user-target", Role::Admin)
        .await
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::Authorization);
}

#[tokio::test(start_paused = true)]
async fn refresh_timer_ticks_until_sign_out() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(profile("wolfie", Role::Member));
    let (manager, _) = manager_over(Arc::clone(&backend));
    manager.sign_in(credentials()).await.unwrap();

    tokio::time::sleep(Duration::from_secs(125)).await;
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 2);

    manager.sign_out().await;
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn initialize_restores_a_persisted_session() {
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(profile("wolfie", Role::WolfpackMember));
    *backend.restorable.lock().unwrap() =
        Some(identity("wolfie", "wolfie@example.com"));
    let (manager, _) = manager_over(backend);

    manager.initialize().await;
    assert!(manager.is_authenticated());
    assert!(manager.has_role(Role::WolfpackMember));
}

#[tokio::test]
async fn initialize_without_session_stays_anonymous() {
    let backend = Arc::new(MockBackend::new());
    let (manager, reporter) = manager_over(backend);

    manager.initialize().await;
    assert!(!manager.is_authenticated());
    assert!(reporter.recent_errors(5).is_empty());
}
