//! GoTrue client: password grant, refresh grant, signup, logout, user.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use time::{Duration, OffsetDateTime};

use super::{SupabaseConfig, send};
use crate::backend::AuthProvider;
use crate::backend::types::{BackendError, Session, SignUp, User};

pub struct GoTrueAuth {
    http: reqwest::Client,
    config: Arc<SupabaseConfig>,
}

impl GoTrueAuth {
    pub(crate) fn new(http: reqwest::Client, config: Arc<SupabaseConfig>) -> Self {
        Self { http, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.config.url)
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, BackendError> {
        let request = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.config.anon_key)
            .json(&body);
        let text = send(request).await?;
        parse_session(&text, OffsetDateTime::now_utc())
    }
}

#[async_trait::async_trait]
impl AuthProvider for GoTrueAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: serde_json::Value) -> Result<SignUp, BackendError> {
        let request = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "email": email, "password": password, "data": metadata }));
        let text = send(request).await?;
        parse_signup(&text, OffsetDateTime::now_utc())
    }

    async fn sign_out(&self, session: &Session) -> Result<(), BackendError> {
        let request = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&session.access_token);
        send(request).await.map(|_| ())
    }

    async fn get_user(&self, access_token: &str) -> Result<User, BackendError> {
        let request = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token);
        let text = send(request).await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, BackendError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Deserialize)]
struct WireSession {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl WireSession {
    fn into_session(self, now: OffsetDateTime) -> Result<Session, BackendError> {
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => {
                OffsetDateTime::from_unix_timestamp(at).map_err(|e| BackendError::Decode(e.to_string()))?
            }
            (None, Some(secs)) => now + Duration::seconds(secs),
            (None, None) => return Err(BackendError::Decode("session without expiry".into())),
        };
        Ok(Session { access_token: self.access_token, refresh_token: self.refresh_token, expires_at, user: self.user })
    }
}

/// Parse a token-grant response body.
pub(crate) fn parse_session(body: &str, now: OffsetDateTime) -> Result<Session, BackendError> {
    let wire: WireSession = serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))?;
    wire.into_session(now)
}

/// Parse a signup response: a full session when auto-confirm is on, a bare
/// user when email confirmation is pending.
pub(crate) fn parse_signup(body: &str, now: OffsetDateTime) -> Result<SignUp, BackendError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))?;
    if value.get("access_token").is_some() {
        let wire: WireSession = serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))?;
        let session = wire.into_session(now)?;
        return Ok(SignUp { user: Some(session.user.clone()), session: Some(session) });
    }
    let nested = value.get("user").filter(|u| !u.is_null()).cloned();
    let user = serde_json::from_value::<User>(nested.unwrap_or(value)).ok();
    Ok(SignUp { user, session: None })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
