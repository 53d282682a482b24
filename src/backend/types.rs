//! Backend types: sessions, users, auth events and errors.
//!
//! Provider-neutral types shared by the in-memory and Supabase adapters.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A row as exchanged with the data store: a flat JSON object.
pub type Row = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by auth provider and data store operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, code: Option<String>, message: String },

    /// A single-row query matched nothing.
    #[error("no rows returned")]
    NotFound,

    /// The response body could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The backend is deliberately offline (failure injection, shutdown).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// True when the backend refused the credential or token itself, as
    /// opposed to failing to answer.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Api { status: 400 | 401 | 403 | 422, .. })
    }
}

// =============================================================================
// USER / SESSION
// =============================================================================

/// Authenticated user as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
}

/// Token-bearing session issued by the auth provider.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
    pub user: User,
}

impl Session {
    /// Whether the access token has passed its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Result of a sign-up call. Providers that require email confirmation
/// return the user without a session.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user: Option<User>,
    pub session: Option<Session>,
}

// =============================================================================
// AUTH EVENTS
// =============================================================================

/// Kind of auth-state change broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// One auth-state change: the event and the session that is current after it.
#[derive(Debug, Clone)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}
