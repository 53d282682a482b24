//! API routes: hello check, navigation model, auth event stream.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::CookieJar;
use futures::{Stream, StreamExt};
use serde_json::json;

use super::auth::{Browser, browser_cookie};
use crate::services::nav::{NavChrome, NavObserver};
use crate::state::AppState;

/// `GET /api/hello`: requires `Authorization: Bearer <hello token>`.
pub async fn hello(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let expected = format!("Bearer {}", state.config.hello_token);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response();
    }
    Json(json!({ "message": "Hello, authorized user!" })).into_response()
}

/// `GET /api/nav`: the header links for this browser right now.
pub async fn nav(browser: Browser) -> Json<NavChrome> {
    let logged_in = match &browser.app {
        Some(app) => app.current_session().await.ok().flatten().is_some(),
        None => false,
    };
    Json(NavChrome::for_state(logged_in))
}

/// `GET /api/auth/events`: one `nav` event now, then one per auth change.
/// The subscription is held by the stream and released when the client
/// disconnects or the server shuts down.
pub async fn auth_events(State(state): State<AppState>, browser: Browser, jar: CookieJar) -> impl IntoResponse {
    let (key, app) = state.sessions.get_or_insert(browser.key.as_deref(), &state.backend.auth());
    let jar = jar.add(browser_cookie(key, state.config.cookie_secure));

    let observer = NavObserver::mount(&app, state.scope()).await;
    (jar, Sse::new(nav_events(observer)).keep_alive(KeepAlive::default()))
}

fn nav_events(observer: NavObserver) -> impl Stream<Item = Result<Event, axum::Error>> {
    let initial = observer.chrome();
    let changes = futures::stream::unfold(observer, |mut observer| async move {
        let chrome = observer.changed().await?;
        Some((chrome, observer))
    });
    futures::stream::once(async move { initial })
        .chain(changes)
        .map(|chrome| Event::default().event("nav").json_data(chrome))
}

pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
