use super::*;
use crate::backend::memory::{MemoryBackend, StoreOp};
use crate::backend::Backend;
use crate::services::posts::POSTS;
use serde_json::json;

fn input(title: &str, content: &str) -> DraftInput {
    DraftInput { title: title.into(), content: content.into(), status: PostStatus::Draft }
}

async fn signed_in() -> (MemoryBackend, AppSession) {
    let backend = MemoryBackend::new();
    let app = AppSession::new(backend.auth());
    app.sign_up("w@x.io", "hunter22", json!({})).await.unwrap();
    (backend, app)
}

#[test]
fn validate_rules() {
    assert_eq!(validate("", "body"), Err(DraftError::Empty));
    assert_eq!(validate("title", "   "), Err(DraftError::Empty));
    assert_eq!(validate(&["w"; 20].join(" "), "body"), Ok(()));
    assert_eq!(validate(&["w"; 21].join(" "), "body"), Err(DraftError::TitleTooLong));
    assert_eq!(DraftError::TitleTooLong.to_string(), "Title cannot exceed 20 words.");
}

#[test]
fn status_defaults_to_draft() {
    let parsed: DraftInput = serde_json::from_value(json!({"title": "t", "content": "c"})).unwrap();
    assert_eq!(parsed.status, PostStatus::Draft);
}

#[tokio::test]
async fn long_title_rejected_without_any_call() {
    let (backend, app) = signed_in().await;
    let store = backend.store(None);
    let mut view = EditorView::mount(ViewScope::detached());

    let next = view.submit(&app, store.as_ref(), input(&["word"; 21].join(" "), "body")).await;

    assert_eq!(next, Next::Stay);
    assert_eq!(view.error.message(), Some("Title cannot exceed 20 words."));
    assert_eq!(view.error.kind(), Some(Failure::Validation));
    assert!(backend.memory_store().calls().is_empty());
    assert!(!view.loading);
}

#[tokio::test]
async fn empty_fields_rejected_without_any_call() {
    let (backend, app) = signed_in().await;
    let store = backend.store(None);
    let mut view = EditorView::mount(ViewScope::detached());

    view.submit(&app, store.as_ref(), input("  ", "body")).await;

    assert_eq!(view.error.message(), Some("Title and content cannot be empty."));
    assert_eq!(backend.memory_store().count_calls(StoreOp::Insert, POSTS), 0);
}

#[tokio::test]
async fn valid_draft_is_inserted_and_navigates_home() {
    let (backend, app) = signed_in().await;
    let store = backend.store(None);
    let mut view = EditorView::mount(ViewScope::detached());
    let user = app.current_user().await.unwrap().unwrap();

    let next = view
        .submit(
            &app,
            store.as_ref(),
            DraftInput { title: "Hello".into(), content: "# Body".into(), status: PostStatus::Published },
        )
        .await;

    assert_eq!(next, Next::Navigate("/"));
    assert!(!view.error.is_set());
    let rows = backend.memory_store().rows(POSTS);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user_id"], json!(user.id.to_string()));
    assert_eq!(rows[0]["status"], json!("published"));
    assert_eq!(rows[0]["title"], json!("Hello"));
}

#[tokio::test]
async fn signed_out_user_cannot_create() {
    let backend = MemoryBackend::new();
    let app = AppSession::new(backend.auth());
    let store = backend.store(None);
    let mut view = EditorView::mount(ViewScope::detached());

    let next = view.submit(&app, store.as_ref(), input("t", "c")).await;

    assert_eq!(next, Next::Stay);
    assert_eq!(view.error.message(), Some(NOT_SIGNED_IN));
    assert!(!view.loading);
    assert!(backend.memory_store().calls().is_empty());
}

#[tokio::test]
async fn insert_failure_keeps_form() {
    let (backend, app) = signed_in().await;
    backend.memory_store().fail_collection(POSTS);
    let store = backend.store(None);
    let mut view = EditorView::mount(ViewScope::detached());

    let next = view.submit(&app, store.as_ref(), input("kept", "also kept")).await;

    assert_eq!(next, Next::Stay);
    assert_eq!(view.error.message(), Some(CREATE_FAILED));
    assert_eq!(view.title, "kept");
    assert_eq!(view.content, "also kept");
    assert!(!view.loading);
}
