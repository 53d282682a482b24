use crate::backend::memory::StoreOp;
use crate::services::posts::POSTS;
use crate::services::profiles::PROFILES;
use crate::state::test_helpers::{post_row, profile_row, request, send, signed_in_browser, test_app_state};
use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

const PROTECTED: [(&str, &str); 4] = [
    ("GET", "/dashboard"),
    ("GET", "/content/new"),
    ("GET", "/profile"),
    ("POST", "/content/new"),
];

#[tokio::test]
async fn protected_pages_redirect_to_login_without_running() {
    let (state, backend) = test_app_state();
    for (method, uri) in PROTECTED {
        let method: Method = method.parse().unwrap();
        let body = (method == Method::POST).then(|| json!({"title": "t", "content": "c"}));
        let res = send(&state, request(method, uri, None, body)).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(res.location(), Some("/login"), "{uri}");
    }
    let id = Uuid::new_v4();
    for uri in [format!("/content/{id}"), format!("/content/{id}/publish"), format!("/dashboard/posts/{id}")] {
        let method = if uri.ends_with("publish") {
            Method::POST
        } else if uri.starts_with("/dashboard") {
            Method::DELETE
        } else {
            Method::GET
        };
        let res = send(&state, request(method, &uri, Some("unknown-cookie"), None)).await;
        assert_eq!(res.location(), Some("/login"), "{uri}");
    }
    assert!(backend.memory_store().calls().is_empty());
}

#[tokio::test]
async fn gate_fails_closed_when_session_check_errors() {
    let (state, backend) = test_app_state();
    backend.memory_auth().set_token_ttl_secs(0);
    let (key, _) = signed_in_browser(&state, "a@b.c").await;
    backend.memory_auth().set_unavailable(true);

    let res = send(&state, request(Method::GET, "/dashboard", Some(&key), None)).await;
    assert_eq!(res.location(), Some("/login"));
    assert!(backend.memory_store().calls().is_empty());
}

#[tokio::test]
async fn feed_is_public_and_joins_authors() {
    let (state, backend) = test_app_state();
    let author = Uuid::new_v4();
    backend.memory_store().seed(
        POSTS,
        [
            post_row(Uuid::new_v4(), author, "by ada", "published", "2024-01-02T00:00:00Z"),
            post_row(Uuid::new_v4(), Uuid::new_v4(), "by nobody", "published", "2024-01-01T00:00:00Z"),
        ],
    );
    backend.memory_store().seed(PROFILES, [profile_row(author, "ada")]);

    let res = send(&state, request(Method::GET, "/", None, None)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["posts"][0]["author"], "ada");
    assert_eq!(body["posts"][1]["author"], "Anonymous");
    assert_eq!(body["empty"], serde_json::Value::Null);
}

#[tokio::test]
async fn empty_feed_reports_no_posts() {
    let (state, _) = test_app_state();
    let res = send(&state, request(Method::GET, "/", None, None)).await;
    assert_eq!(res.json()["empty"], "No posts found.");
}

#[tokio::test]
async fn dashboard_lists_own_posts() {
    let (state, backend) = test_app_state();
    let (key, app) = signed_in_browser(&state, "a@b.c").await;
    let me = app.current_user().await.unwrap().unwrap().id;
    backend.memory_store().seed(
        POSTS,
        [
            post_row(Uuid::new_v4(), me, "mine", "draft", "2024-01-01T00:00:00Z"),
            post_row(Uuid::new_v4(), Uuid::new_v4(), "theirs", "draft", "2024-01-01T00:00:00Z"),
        ],
    );

    let res = send(&state, request(Method::GET, "/dashboard", Some(&key), None)).await;
    assert_eq!(res.status, StatusCode::OK);
    let posts = res.json()["posts"].as_array().unwrap().clone();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "mine");
}

#[tokio::test]
async fn dashboard_load_failure_is_bad_gateway() {
    let (state, backend) = test_app_state();
    let (key, _) = signed_in_browser(&state, "a@b.c").await;
    backend.memory_store().fail_collection(POSTS);

    let res = send(&state, request(Method::GET, "/dashboard", Some(&key), None)).await;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert_eq!(res.json()["error"], "Failed to load posts.");
}

#[tokio::test]
async fn delete_returns_dashboard_without_the_post() {
    let (state, backend) = test_app_state();
    let (key, app) = signed_in_browser(&state, "a@b.c").await;
    let me = app.current_user().await.unwrap().unwrap().id;
    let doomed = Uuid::new_v4();
    backend
        .memory_store()
        .seed(POSTS, [post_row(doomed, me, "bye", "draft", "2024-01-01T00:00:00Z")]);

    let res = send(&state, request(Method::DELETE, &format!("/dashboard/posts/{doomed}"), Some(&key), None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.json()["posts"].as_array().unwrap().is_empty());
    assert_eq!(backend.memory_store().count_calls(StoreOp::Delete, POSTS), 1);
}

#[tokio::test]
async fn create_post_validates_then_inserts() {
    let (state, backend) = test_app_state();
    let (key, _) = signed_in_browser(&state, "a@b.c").await;

    let long_title = ["word"; 21].join(" ");
    let res = send(
        &state,
        request(Method::POST, "/content/new", Some(&key), Some(json!({"title": long_title, "content": "c"}))),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json()["error"], "Title cannot exceed 20 words.");
    assert_eq!(res.json()["title"], long_title);
    assert_eq!(backend.memory_store().count_calls(StoreOp::Insert, POSTS), 0);

    let res = send(
        &state,
        request(
            Method::POST,
            "/content/new",
            Some(&key),
            Some(json!({"title": "Fine", "content": "Body", "status": "published"})),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), Some("/"));
    assert_eq!(backend.memory_store().count_calls(StoreOp::Insert, POSTS), 1);
}

#[tokio::test]
async fn view_post_exposes_publish_control() {
    let (state, backend) = test_app_state();
    let (key, app) = signed_in_browser(&state, "a@b.c").await;
    let me = app.current_user().await.unwrap().unwrap().id;
    let draft = Uuid::new_v4();
    let live = Uuid::new_v4();
    backend.memory_store().seed(
        POSTS,
        [
            post_row(draft, me, "draft", "draft", "2024-01-01T00:00:00Z"),
            post_row(live, me, "live", "published", "2024-01-01T00:00:00Z"),
        ],
    );

    let res = send(&state, request(Method::GET, &format!("/content/{draft}"), Some(&key), None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["control"], json!({"state": "publish", "label": "Publish", "disabled": false}));

    let res = send(&state, request(Method::GET, &format!("/content/{live}"), Some(&key), None)).await;
    assert_eq!(res.json()["control"]["disabled"], true);
    assert_eq!(res.json()["control"]["label"], "Published");
    assert_eq!(res.json()["post"]["title"], "live");
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let (state, _) = test_app_state();
    let (key, _) = signed_in_browser(&state, "a@b.c").await;
    let res = send(&state, request(Method::GET, &format!("/content/{}", Uuid::new_v4()), Some(&key), None)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["error"], "Post not found or there was an error fetching it.");
    assert_eq!(res.json()["control"], serde_json::Value::Null);
}

#[tokio::test]
async fn publish_flips_status_and_redirects_home() {
    let (state, backend) = test_app_state();
    let (key, app) = signed_in_browser(&state, "a@b.c").await;
    let me = app.current_user().await.unwrap().unwrap().id;
    let id = Uuid::new_v4();
    backend
        .memory_store()
        .seed(POSTS, [post_row(id, me, "draft", "draft", "2024-01-01T00:00:00Z")]);

    let res = send(&state, request(Method::POST, &format!("/content/{id}/publish"), Some(&key), None)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), Some("/"));
    assert_eq!(backend.memory_store().rows(POSTS)[0]["status"], "published");
    assert_eq!(backend.memory_store().count_calls(StoreOp::Update, POSTS), 1);

    let res = send(&state, request(Method::POST, &format!("/content/{id}/publish"), Some(&key), None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(backend.memory_store().count_calls(StoreOp::Update, POSTS), 1);
}

#[tokio::test]
async fn profile_page_shows_username() {
    let (state, backend) = test_app_state();
    let (key, app) = signed_in_browser(&state, "a@b.c").await;
    let me = app.current_user().await.unwrap().unwrap().id;
    backend.memory_store().seed(PROFILES, [profile_row(me, "ada")]);

    let res = send(&state, request(Method::GET, "/profile", Some(&key), None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["profile"]["username"], "ada");
}

#[tokio::test]
async fn profile_page_without_row_is_not_found() {
    let (state, _) = test_app_state();
    let (key, _) = signed_in_browser(&state, "a@b.c").await;
    let res = send(&state, request(Method::GET, "/profile", Some(&key), None)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["error"], "You are not logged in or profile not found.");
}
