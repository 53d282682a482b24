//! Auth routes: browser cookie, gate extractors, login/signup/logout.

use std::sync::Arc;

use axum::extract::{FromRef, State};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::render;
use crate::backend::Session;
use crate::services::account::{self, AccountView, LoginInput, SignupInput};
use crate::services::gate::{self, Access, GateDecision};
use crate::services::view::Next;
use crate::session::AppSession;
use crate::state::AppState;

pub const COOKIE_NAME: &str = "inkpost_session";

/// The browser-session cookie. Carries only the registry key.
pub(crate) fn browser_cookie(key: String, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, key))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

// =============================================================================
// EXTRACTORS
// =============================================================================

/// Whatever the cookie says about this browser. Never rejects.
pub struct Browser {
    pub key: Option<String>,
    pub app: Option<Arc<AppSession>>,
}

impl Browser {
    fn lookup(parts: &axum::http::request::Parts, state: &AppState) -> Self {
        let jar = CookieJar::from_headers(&parts.headers);
        let key = jar
            .get(COOKIE_NAME)
            .map(Cookie::value)
            .filter(|v| !v.is_empty())
            .map(str::to_owned);
        let app = key.as_deref().and_then(|k| state.sessions.get(k));
        Self { key, app }
    }
}

impl<S> axum::extract::FromRequestParts<S> for Browser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::lookup(parts, &AppState::from_ref(state)))
    }
}

/// A signed-in browser. Use as a handler parameter to protect a page: a
/// browser without a session is sent to `/login` before the handler runs.
pub struct SignedIn {
    pub app: Arc<AppSession>,
    pub session: Session,
}

impl<S> axum::extract::FromRequestParts<S> for SignedIn
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let browser = Browser::lookup(parts, &AppState::from_ref(state));
        let decision = gate::check(Access::Protected, browser.app.as_deref()).await;
        match (decision, browser.app) {
            (GateDecision::Render(Some(session)), Some(app)) => Ok(Self { app, session }),
            (GateDecision::Redirect(to), _) => Err(Redirect::to(to)),
            _ => Err(Redirect::to(gate::LOGIN_PATH)),
        }
    }
}

/// A browser without a session. Signed-in browsers are sent to `/`.
pub struct Guest {
    pub key: Option<String>,
}

impl<S> axum::extract::FromRequestParts<S> for Guest
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let browser = Browser::lookup(parts, &AppState::from_ref(state));
        match gate::check(Access::GuestOnly, browser.app.as_deref()).await {
            GateDecision::Redirect(to) => Err(Redirect::to(to)),
            GateDecision::Render(_) => Ok(Self { key: browser.key }),
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `GET /login` and `GET /signup`: the empty form.
pub async fn account_page(_guest: Guest, State(state): State<AppState>) -> Response {
    let view = AccountView::mount(state.scope());
    render(&view, &view.error)
}

/// `POST /login`
pub async fn login(
    guest: Guest,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<LoginInput>,
) -> Response {
    let (key, app) = state.sessions.get_or_insert(guest.key.as_deref(), &state.backend.auth());

    let mut view = AccountView::mount(state.scope());
    match view.login(&app, input).await {
        Next::Navigate(to) => finish_sign_in(&state, &key, &app, jar, to),
        Next::Stay => (jar.add(browser_cookie(key, state.config.cookie_secure)), render(&view, &view.error)).into_response(),
    }
}

/// `POST /signup`
pub async fn signup(
    guest: Guest,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<SignupInput>,
) -> Response {
    let (key, app) = state.sessions.get_or_insert(guest.key.as_deref(), &state.backend.auth());

    let mut view = AccountView::mount(state.scope());
    match view.signup(&app, state.backend.as_ref(), input).await {
        Next::Navigate(to) => finish_sign_in(&state, &key, &app, jar, to),
        Next::Stay => (jar.add(browser_cookie(key, state.config.cookie_secure)), render(&view, &view.error)).into_response(),
    }
}

/// Re-key the browser session after authentication and redirect. The
/// pre-login cookie value stops naming any session.
fn finish_sign_in(state: &AppState, key: &str, app: &Arc<AppSession>, jar: CookieJar, to: &'static str) -> Response {
    let key = state.sessions.rekey(key, app);
    (jar.add(browser_cookie(key, state.config.cookie_secure)), Redirect::to(to)).into_response()
}

/// `POST /logout`. The cookie is kept so open event streams stay attached.
pub async fn logout(browser: Browser) -> Redirect {
    let next = match &browser.app {
        Some(app) => account::logout(app).await,
        None => Next::Navigate(gate::LOGIN_PATH),
    };
    match next {
        Next::Navigate(to) => Redirect::to(to),
        Next::Stay => Redirect::to(gate::LOGIN_PATH),
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
