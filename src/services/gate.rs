//! Session gate for protected and guest-only pages.
//!
//! The decision is a pure function of the page's access level and the
//! session lookup. Extractors in `routes::auth` run it before any handler
//! body, so a redirected page never does work.

use tracing::warn;

use crate::backend::{BackendError, Session};
use crate::session::AppSession;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Requires a session; otherwise go to `/login`.
    Protected,
    /// Requires no session; otherwise go to `/`.
    GuestOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Render(Option<Session>),
    Redirect(&'static str),
}

/// A failed lookup counts as signed out.
#[must_use]
pub fn decide(access: Access, lookup: Result<Option<Session>, BackendError>) -> GateDecision {
    let session = lookup.unwrap_or_else(|e| {
        warn!(error = %e, "session lookup failed, treating as signed out");
        None
    });
    match (access, session) {
        (Access::Protected, None) => GateDecision::Redirect(LOGIN_PATH),
        (Access::GuestOnly, Some(_)) => GateDecision::Redirect(HOME_PATH),
        (_, session) => GateDecision::Render(session),
    }
}

/// Gate a request from a browser that may not have an application session yet.
pub async fn check(access: Access, app: Option<&AppSession>) -> GateDecision {
    let lookup = match app {
        Some(app) => app.current_session().await,
        None => Ok(None),
    };
    decide(access, lookup)
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
