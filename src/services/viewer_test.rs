use super::*;
use crate::backend::memory::{MemoryStore, StoreOp};
use crate::backend::Filter;
use crate::services::posts::POSTS;
use crate::state::test_helpers::{post_row, test_user};

async fn loaded(store: &MemoryStore, id: Uuid) -> PostView {
    let mut view = PostView::mount(ViewScope::detached());
    view.load(store, id).await;
    view
}

#[tokio::test]
async fn load_shows_post() {
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    store.seed(POSTS, [post_row(id, Uuid::new_v4(), "hello", "draft", "2024-01-01T00:00:00Z")]);

    let view = loaded(&store, id).await;
    assert!(!view.loading);
    assert_eq!(view.post.as_ref().unwrap().title, "hello");
    assert_eq!(view.control(), Some(PublishControl::Publish));
}

#[tokio::test]
async fn missing_post_reports_not_found() {
    let store = MemoryStore::new();
    let view = loaded(&store, Uuid::new_v4()).await;
    assert!(view.post.is_none());
    assert_eq!(view.error.message(), Some(NOT_FOUND));
    assert_eq!(view.error.kind(), Some(Failure::NotFound));
    assert_eq!(view.control(), None);
}

#[tokio::test]
async fn store_failure_reports_same_message() {
    let store = MemoryStore::new();
    store.fail_collection(POSTS);
    let view = loaded(&store, Uuid::new_v4()).await;
    assert_eq!(view.error.message(), Some(NOT_FOUND));
    assert_eq!(view.error.kind(), Some(Failure::Remote));
    assert!(!view.loading);
}

#[tokio::test]
async fn publish_flips_locally_with_one_scoped_update() {
    let user = test_user();
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    store.seed(POSTS, [post_row(id, user.id, "draft", "draft", "2024-01-01T00:00:00Z")]);
    let mut view = loaded(&store, id).await;

    let next = view.publish(&store, &user).await;

    assert_eq!(next, Next::Navigate("/"));
    assert_eq!(view.post.as_ref().unwrap().status, PostStatus::Published);
    assert_eq!(view.control(), Some(PublishControl::Published));
    assert!(!view.publishing);
    assert_eq!(store.count_calls(StoreOp::Update, POSTS), 1);
    assert_eq!(store.count_calls(StoreOp::Select, POSTS), 1);
    let call = store.calls().into_iter().find(|c| c.op == StoreOp::Update).unwrap();
    assert_eq!(
        call.filters,
        vec![Filter::eq("id", id.to_string()), Filter::eq("user_id", user.id.to_string())]
    );
}

#[tokio::test]
async fn published_post_has_disabled_control_and_issues_no_call() {
    let user = test_user();
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    store.seed(POSTS, [post_row(id, user.id, "live", "published", "2024-01-01T00:00:00Z")]);
    let mut view = loaded(&store, id).await;

    let control = view.control().unwrap();
    assert_eq!(control, PublishControl::Published);
    assert!(control.disabled());
    assert_eq!(control.label(), "Published");

    assert_eq!(view.publish(&store, &user).await, Next::Stay);
    assert_eq!(store.count_calls(StoreOp::Update, POSTS), 0);
}

#[tokio::test]
async fn publishing_someone_elses_post_fails() {
    let store = MemoryStore::new();
    let id = Uuid::new_v4();
    store.seed(POSTS, [post_row(id, Uuid::new_v4(), "theirs", "draft", "2024-01-01T00:00:00Z")]);
    let mut view = loaded(&store, id).await;

    let next = view.publish(&store, &test_user()).await;

    assert_eq!(next, Next::Stay);
    assert_eq!(view.error.message(), Some(PUBLISH_FAILED));
    assert_eq!(view.post.as_ref().unwrap().status, PostStatus::Draft);
    assert!(!view.publishing);
}

#[test]
fn control_labels() {
    assert_eq!(PublishControl::Publish.label(), "Publish");
    assert!(!PublishControl::Publish.disabled());
    assert_eq!(PublishControl::Publishing.label(), "Publishing...");
    assert!(PublishControl::Publishing.disabled());
}
