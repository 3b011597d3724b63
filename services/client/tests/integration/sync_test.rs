use std::sync::Arc;

use slotbook_client::domain::repository::LocalStore;
use slotbook_client::domain::types::Session;
use slotbook_client::guard::{GuardContext, Resolution, Route, navigate};
use slotbook_client::infra::local::MemoryLocalStore;
use slotbook_client::state::{StateSync, Store};
use slotbook_domain::user::Role;

use crate::helpers::{MemVolunteers, session_channel, signed_in, test_profile};

fn sync_with(
    local: Arc<MemoryLocalStore>,
    volunteers: MemVolunteers,
) -> StateSync<Arc<MemoryLocalStore>, MemVolunteers> {
    StateSync {
        store: Store::new(),
        local,
        volunteers,
    }
}

// ── role persistence ─────────────────────────────────────────────────────────

#[tokio::test]
async fn should_restore_role_chosen_in_an_earlier_run() {
    let local = Arc::new(MemoryLocalStore::new());

    let first = sync_with(Arc::clone(&local), MemVolunteers::default());
    first.apply_session(&signed_in("u1")).unwrap();
    first.select_role(Role::Client).await.unwrap();
    assert_eq!(local.get("user-role-u1").as_deref(), Some("client"));

    let second = sync_with(Arc::clone(&local), MemVolunteers::default());
    second.apply_session(&signed_in("u1")).unwrap();
    assert_eq!(second.store.snapshot().role(), Some(Role::Client));
}

#[tokio::test]
async fn should_keep_roles_separate_per_user() {
    let local = Arc::new(MemoryLocalStore::new());
    let sync = sync_with(Arc::clone(&local), MemVolunteers::default());
    sync.apply_session(&signed_in("u1")).unwrap();
    sync.select_role(Role::Volunteer).await.unwrap();

    sync.apply_session(&signed_in("u2")).unwrap();
    assert_eq!(sync.store.snapshot().role(), None);
}

// ── profile loading ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_load_volunteer_profile_after_sign_in() {
    let local = Arc::new(MemoryLocalStore::new());
    local.set("user-role-vol", "volunteer").unwrap();
    let profile = test_profile("vol", "Asha", 500, &["Yoga"]);
    let sync = sync_with(local, MemVolunteers::new(vec![profile.clone()]));

    sync.apply_session(&signed_in("vol")).unwrap();
    sync.settle().await;

    assert_eq!(sync.store.snapshot().current_profile, Some(profile));
}

#[tokio::test]
async fn should_clear_profile_on_sign_out() {
    let local = Arc::new(MemoryLocalStore::new());
    local.set("user-role-vol", "volunteer").unwrap();
    let sync = sync_with(
        local,
        MemVolunteers::new(vec![test_profile("vol", "Asha", 500, &[])]),
    );
    sync.apply_session(&signed_in("vol")).unwrap();
    sync.settle().await;
    assert!(sync.store.snapshot().current_profile.is_some());

    sync.apply_session(&Session::SignedOut).unwrap();
    let state = sync.store.snapshot();
    assert!(state.user.is_none());
    assert!(!state.is_authenticated);
    assert!(state.current_profile.is_none());
}

#[tokio::test]
async fn should_follow_session_changes_until_channel_closes() {
    let local = Arc::new(MemoryLocalStore::new());
    local.set("user-role-vol", "volunteer").unwrap();
    let profile = test_profile("vol", "Asha", 500, &[]);
    let sync = sync_with(local, MemVolunteers::new(vec![profile.clone()]));
    let (tx, rx) = session_channel(Session::Loading);

    let driver = async {
        tx.send_replace(signed_in("vol"));
        let mut states = sync.store.subscribe();
        while states.borrow_and_update().current_profile.is_none() {
            states.changed().await.unwrap();
        }
        drop(tx);
    };
    tokio::join!(sync.run(rx), driver);

    assert_eq!(sync.store.snapshot().current_profile, Some(profile));
}

// ── guard over synced state ──────────────────────────────────────────────────

#[tokio::test]
async fn should_route_through_role_selection_to_dashboard() {
    let sync = sync_with(Arc::new(MemoryLocalStore::new()), MemVolunteers::default());
    let session = signed_in("u1");
    sync.apply_session(&session).unwrap();

    let ctx = GuardContext::new(&session, &sync.store.snapshot());
    assert_eq!(
        navigate("/my-bookings", &ctx),
        Resolution::Render(Route::RoleSelection)
    );

    sync.select_role(Role::Client).await.unwrap();
    let ctx = GuardContext::new(&session, &sync.store.snapshot());
    assert_eq!(navigate("/", &ctx), Resolution::Render(Route::ClientDashboard));
    assert_eq!(
        navigate("/role-selection", &ctx),
        Resolution::Render(Route::ClientDashboard)
    );
    assert_eq!(
        navigate("/nowhere", &ctx),
        Resolution::Render(Route::NotFound("/nowhere".into()))
    );
}
