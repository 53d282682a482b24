use super::*;
use crate::backend::memory::MemoryBackend;
use crate::backend::{AuthProvider, Backend};
use crate::state::test_helpers::profile_row;
use std::sync::Arc;

async fn signed_in(backend: &MemoryBackend) -> (AppSession, Uuid) {
    let auth: Arc<dyn AuthProvider> = backend.auth();
    let app = AppSession::new(auth);
    let signup = app.sign_up("p@x.io", "hunter22", json!({})).await.unwrap();
    let id = signup.user.unwrap().id;
    (app, id)
}

#[test]
fn unknown_columns_land_in_extra() {
    let id = Uuid::new_v4();
    let mut row = profile_row(id, "ada");
    row.insert("website".into(), json!("https://ada.dev"));
    let profile: Profile = decode_row(row).unwrap();
    assert_eq!(profile.username.as_deref(), Some("ada"));
    assert_eq!(profile.full_name, None);
    assert_eq!(profile.extra.get("website"), Some(&json!("https://ada.dev")));

    let out = serde_json::to_value(&profile).unwrap();
    assert_eq!(out["website"], json!("https://ada.dev"));
}

#[tokio::test]
async fn upsert_username_merges_on_id() {
    let backend = MemoryBackend::new();
    let store = backend.memory_store();
    let id = Uuid::new_v4();
    let mut existing = profile_row(id, "old");
    existing.insert("full_name".into(), json!("Ada Lovelace"));
    store.seed(PROFILES, [existing]);

    upsert_username(&**store, id, "new").await.unwrap();

    let rows = store.rows(PROFILES);
    assert_eq!(rows.len(), 1);
    let profile: Profile = decode_row(rows[0].clone()).unwrap();
    assert_eq!(profile.username.as_deref(), Some("new"));
    assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));
}

#[tokio::test]
async fn usernames_only_returns_requested_ids() {
    let backend = MemoryBackend::new();
    let store = backend.memory_store();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    store.seed(PROFILES, [profile_row(a, "a"), profile_row(b, "b")]);

    let names = usernames(&**store, &[a]).await.unwrap();
    assert_eq!(names, vec![(a, Some("a".to_owned()))]);
}

#[tokio::test]
async fn page_shows_profile_of_current_user() {
    let backend = MemoryBackend::new();
    let (app, id) = signed_in(&backend).await;
    backend.memory_store().seed(PROFILES, [profile_row(id, "ada")]);

    let mut view = ProfileView::mount(ViewScope::detached());
    view.load(&app, backend.store(None).as_ref()).await;

    assert!(!view.loading);
    assert!(!view.error.is_set());
    assert_eq!(view.profile.unwrap().username.as_deref(), Some("ada"));
}

#[tokio::test]
async fn page_without_profile_row_reports_missing() {
    let backend = MemoryBackend::new();
    let (app, _) = signed_in(&backend).await;

    let mut view = ProfileView::mount(ViewScope::detached());
    view.load(&app, backend.store(None).as_ref()).await;

    assert!(view.profile.is_none());
    assert_eq!(view.error.message(), Some(PROFILE_MISSING));
    assert_eq!(view.error.kind(), Some(Failure::NotFound));
}

#[tokio::test]
async fn page_store_failure_reports_missing_as_remote() {
    let backend = MemoryBackend::new();
    let (app, _) = signed_in(&backend).await;
    backend.memory_store().fail_collection(PROFILES);

    let mut view = ProfileView::mount(ViewScope::detached());
    view.load(&app, backend.store(None).as_ref()).await;

    assert_eq!(view.error.message(), Some(PROFILE_MISSING));
    assert_eq!(view.error.kind(), Some(Failure::Remote));
    assert!(!view.loading);
}

#[tokio::test]
async fn cancelled_page_is_left_untouched() {
    let backend = MemoryBackend::new();
    let (app, id) = signed_in(&backend).await;
    backend.memory_store().seed(PROFILES, [profile_row(id, "ada")]);

    let scope = ViewScope::detached();
    scope.cancel();
    let mut view = ProfileView::mount(scope);
    view.load(&app, backend.store(None).as_ref()).await;

    assert!(view.loading);
    assert!(view.profile.is_none());
    assert!(!view.error.is_set());
}
