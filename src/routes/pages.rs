//! Page routes: feed, dashboard, editor, post viewer, profile.
//!
//! Each handler mounts the page's view model, runs its operation and
//! renders the resulting view as JSON. Protected pages take `SignedIn`, so
//! the gate has already run by the time the body executes.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json, Redirect, Response};
use serde::Serialize;
use uuid::Uuid;

use super::auth::{Browser, SignedIn};
use super::render;
use crate::services::dashboard::DashboardView;
use crate::services::editor::{DraftInput, EditorView};
use crate::services::feed::{FeedEntry, FeedView};
use crate::services::profiles::ProfileView;
use crate::services::view::Next;
use crate::services::viewer::{PostView, PublishControl};
use crate::state::AppState;

#[derive(Serialize)]
struct FeedPage<'a> {
    posts: &'a [FeedEntry],
    loading: bool,
    empty: Option<&'static str>,
}

/// `GET /`
pub async fn feed(State(state): State<AppState>, browser: Browser) -> Response {
    let session = match &browser.app {
        Some(app) => app.current_session().await.ok().flatten(),
        None => None,
    };
    let store = state.store_for(session.as_ref());
    let mut view = FeedView::mount(state.scope());
    view.load(store.as_ref()).await;
    Json(FeedPage { posts: &view.posts, loading: view.loading, empty: view.empty_message() }).into_response()
}

/// `GET /dashboard`
pub async fn dashboard(State(state): State<AppState>, signed_in: SignedIn) -> Response {
    let store = state.store_for(Some(&signed_in.session));
    let mut view = DashboardView::mount(state.scope());
    view.load(store.as_ref(), Some(&signed_in.session.user)).await;
    render(&view, &view.error)
}

/// `DELETE /dashboard/posts/{id}`: the dashboard after the delete.
pub async fn delete_post(State(state): State<AppState>, signed_in: SignedIn, Path(id): Path<Uuid>) -> Response {
    let user = &signed_in.session.user;
    let store = state.store_for(Some(&signed_in.session));
    let mut view = DashboardView::mount(state.scope());
    view.load(store.as_ref(), Some(user)).await;
    if view.error.is_set() {
        return render(&view, &view.error);
    }
    view.delete(store.as_ref(), user, id).await;
    render(&view, &view.error)
}

/// `GET /content/new`
pub async fn new_post(State(state): State<AppState>, _signed_in: SignedIn) -> Response {
    let view = EditorView::mount(state.scope());
    render(&view, &view.error)
}

/// `POST /content/new`
pub async fn create_post(
    State(state): State<AppState>,
    signed_in: SignedIn,
    Json(input): Json<DraftInput>,
) -> Response {
    let store = state.store_for(Some(&signed_in.session));
    let mut view = EditorView::mount(state.scope());
    match view.submit(&signed_in.app, store.as_ref(), input).await {
        Next::Navigate(to) => Redirect::to(to).into_response(),
        Next::Stay => render(&view, &view.error),
    }
}

#[derive(Serialize)]
struct PostPage<'a> {
    #[serde(flatten)]
    view: &'a PostView,
    control: Option<ControlState>,
}

#[derive(Serialize)]
struct ControlState {
    state: PublishControl,
    label: &'static str,
    disabled: bool,
}

fn post_page(view: &PostView) -> Response {
    let control = view
        .control()
        .map(|c| ControlState { state: c, label: c.label(), disabled: c.disabled() });
    render(&PostPage { view, control }, &view.error)
}

/// `GET /content/{id}`
pub async fn view_post(State(state): State<AppState>, signed_in: SignedIn, Path(id): Path<Uuid>) -> Response {
    let store = state.store_for(Some(&signed_in.session));
    let mut view = PostView::mount(state.scope());
    view.load(store.as_ref(), id).await;
    post_page(&view)
}

/// `POST /content/{id}/publish`
pub async fn publish_post(State(state): State<AppState>, signed_in: SignedIn, Path(id): Path<Uuid>) -> Response {
    let store = state.store_for(Some(&signed_in.session));
    let mut view = PostView::mount(state.scope());
    view.load(store.as_ref(), id).await;
    if view.post.is_none() {
        return post_page(&view);
    }
    match view.publish(store.as_ref(), &signed_in.session.user).await {
        Next::Navigate(to) => Redirect::to(to).into_response(),
        Next::Stay => post_page(&view),
    }
}

/// `GET /profile`
pub async fn profile(State(state): State<AppState>, signed_in: SignedIn) -> Response {
    let store = state.store_for(Some(&signed_in.session));
    let mut view = ProfileView::mount(state.scope());
    view.load(&signed_in.app, store.as_ref()).await;
    render(&view, &view.error)
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
