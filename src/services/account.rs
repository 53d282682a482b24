//! Login, signup and logout.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use super::profiles;
use super::view::{ErrorNotice, Failure, Next, ViewScope};
use crate::backend::Backend;
use crate::session::AppSession;

pub const LOGIN_FIELDS_REQUIRED: &str = "Email and password are required.";
pub const SIGNUP_FIELDS_REQUIRED: &str = "Email, password, and username are required.";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub username: String,
}

/// Shared by the login and signup pages. The password is never echoed back.
#[derive(Debug, Default, Serialize)]
pub struct AccountView {
    pub email: String,
    pub username: String,
    pub loading: bool,
    pub error: ErrorNotice,
    #[serde(skip)]
    scope: ViewScope,
}

impl AccountView {
    #[must_use]
    pub fn mount(scope: ViewScope) -> Self {
        Self { scope, ..Self::default() }
    }

    pub async fn login(&mut self, app: &AppSession, input: LoginInput) -> Next {
        self.email = input.email;
        self.error.clear();
        if self.email.is_empty() || input.password.is_empty() {
            self.error.set(Failure::Validation, LOGIN_FIELDS_REQUIRED);
            return Next::Stay;
        }

        self.loading = true;
        let Some(result) = self
            .scope
            .run(app.sign_in_with_password(&self.email, &input.password))
            .await
        else {
            return Next::Stay;
        };
        self.loading = false;
        match result {
            Ok(session) => {
                info!(user_id = %session.user.id, "signed in");
                Next::Navigate("/")
            }
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                self.error.set(Failure::Remote, e.to_string());
                Next::Stay
            }
        }
    }

    /// Create the account, then record the username in `profiles` as the new
    /// user. A profile failure is shown but does not undo the account.
    pub async fn signup(&mut self, app: &AppSession, backend: &dyn Backend, input: SignupInput) -> Next {
        self.email = input.email;
        self.username = input.username;
        self.error.clear();
        if self.email.is_empty() || input.password.is_empty() || self.username.is_empty() {
            self.error.set(Failure::Validation, SIGNUP_FIELDS_REQUIRED);
            return Next::Stay;
        }

        self.loading = true;
        let metadata = json!({ "username": self.username });
        let Some(result) = self
            .scope
            .run(app.sign_up(&self.email, &input.password, metadata))
            .await
        else {
            return Next::Stay;
        };
        let signup = match result {
            Ok(signup) => signup,
            Err(e) => {
                warn!(error = %e, "sign-up failed");
                self.error.set(Failure::Remote, e.to_string());
                self.loading = false;
                return Next::Stay;
            }
        };

        if let Some(user) = &signup.user {
            info!(user_id = %user.id, confirmed = signup.session.is_some(), "signed up");
            let store = backend.store(signup.session.as_ref());
            let upsert = profiles::upsert_username(store.as_ref(), user.id, &self.username);
            let Some(result) = self.scope.run(upsert).await else {
                return Next::Stay;
            };
            if let Err(e) = result {
                error!(user_id = %user.id, error = %e, "profile upsert failed");
                self.error.set(Failure::Remote, format!("Profile insert/update error: {e}"));
                self.loading = false;
                return Next::Stay;
            }
        }
        self.loading = false;
        Next::Navigate("/")
    }
}

/// Sign out. A provider failure is logged; the browser is signed out locally
/// regardless.
pub async fn logout(app: &AppSession) -> Next {
    match app.sign_out().await {
        Ok(()) => info!("signed out"),
        Err(e) => warn!(error = %e, "provider sign-out failed, cleared locally"),
    }
    Next::Navigate("/login")
}

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;
