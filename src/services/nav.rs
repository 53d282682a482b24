//! Navigation chrome that follows the browser's auth state.
//!
//! `NavObserver` subscribes before it checks the initial state, so a change
//! racing with mount is never lost. The subscription goes away with the
//! observer.

use serde::Serialize;
use tracing::{debug, warn};

use super::view::ViewScope;
use crate::session::{AppSession, AuthSubscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
    pub method: &'static str,
}

const fn get(label: &'static str, href: &'static str) -> NavLink {
    NavLink { label, href, method: "GET" }
}

const SIGNED_OUT_LINKS: [NavLink; 3] = [get("Home", "/"), get("Login", "/login"), get("Signup", "/signup")];

const SIGNED_IN_LINKS: [NavLink; 4] = [
    get("Home", "/"),
    get("Dashboard", "/dashboard"),
    get("Profile", "/profile"),
    NavLink { label: "Logout", href: "/logout", method: "POST" },
];

/// What the header renders. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavChrome {
    pub logged_in: bool,
    pub links: Vec<NavLink>,
}

impl NavChrome {
    #[must_use]
    pub fn for_state(logged_in: bool) -> Self {
        let links = if logged_in { SIGNED_IN_LINKS.to_vec() } else { SIGNED_OUT_LINKS.to_vec() };
        Self { logged_in, links }
    }
}

pub struct NavObserver {
    logged_in: bool,
    subscription: Option<AuthSubscription>,
    scope: ViewScope,
}

impl NavObserver {
    pub async fn mount(app: &AppSession, scope: ViewScope) -> Self {
        let subscription = app.subscribe();
        let logged_in = match scope.run(app.current_session()).await {
            Some(Ok(session)) => session.is_some(),
            Some(Err(e)) => {
                warn!(error = %e, "initial session check failed, showing signed-out nav");
                false
            }
            None => false,
        };
        Self { logged_in, subscription: Some(subscription), scope }
    }

    #[must_use]
    pub fn logged_in(&self) -> bool {
        self.logged_in
    }

    #[must_use]
    pub fn chrome(&self) -> NavChrome {
        NavChrome::for_state(self.logged_in)
    }

    /// Wait for the next auth change and return the updated chrome. `None`
    /// when the observer is unmounted, its scope is cancelled or the session
    /// is gone.
    pub async fn changed(&mut self) -> Option<NavChrome> {
        let subscription = self.subscription.as_mut()?;
        let change = tokio::select! {
            biased;
            () = self.scope.cancelled() => None,
            change = subscription.recv() => change,
        };
        let Some(change) = change else {
            self.unsubscribe();
            return None;
        };
        debug!(event = ?change.event, "auth change observed");
        self.logged_in = change.session.is_some();
        Some(self.chrome())
    }

    /// Release the subscription. Idempotent; dropping the observer does the same.
    pub fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
#[path = "nav_test.rs"]
mod tests;
