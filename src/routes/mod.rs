//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Page routes render view models as JSON; guest-only and protected pages
//! are gated by the `Guest` / `SignedIn` extractors. API routes (hello,
//! navigation, auth event stream) carry a permissive CORS layer.

pub mod api;
pub mod auth;
pub mod pages;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::view::{ErrorNotice, Failure};
use crate::state::AppState;

/// HTTP status for a rendered view.
pub(crate) fn status_for(error: &ErrorNotice) -> StatusCode {
    match error.kind() {
        None => StatusCode::OK,
        Some(Failure::Validation) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(Failure::NotFound) => StatusCode::NOT_FOUND,
        Some(Failure::Remote) => StatusCode::BAD_GATEWAY,
    }
}

pub(crate) fn render<V: Serialize>(view: &V, error: &ErrorNotice) -> Response {
    (status_for(error), Json(view)).into_response()
}

fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::feed))
        .route("/login", get(auth::account_page).post(auth::login))
        .route("/signup", get(auth::account_page).post(auth::signup))
        .route("/logout", post(auth::logout))
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/posts/{id}", delete(pages::delete_post))
        .route("/content/new", get(pages::new_post).post(pages::create_post))
        .route("/content/{id}", get(pages::view_post))
        .route("/content/{id}/publish", post(pages::publish_post))
        .route("/profile", get(pages::profile))
}

fn api_routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/hello", get(api::hello))
        .route("/api/nav", get(api::nav))
        .route("/api/auth/events", get(api::auth_events))
        .layer(cors)
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(page_routes())
        .merge(api_routes())
        .route("/healthz", get(api::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
