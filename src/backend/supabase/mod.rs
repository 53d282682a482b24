//! Supabase adapter: GoTrue auth and PostgREST data over HTTP.
//!
//! DESIGN
//! ======
//! One shared `reqwest::Client` (timeouts from config) backs both halves.
//! `store()` returns a lightweight `RestStore` carrying the caller's access
//! token so the hosted row-level policies evaluate as that user; anonymous
//! callers fall back to the anon key. Response parsing is kept in pure
//! functions for testability.

pub mod auth;
pub mod rest;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::types::{BackendError, Session};
use super::{AuthProvider, Backend, DataStore};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Connection settings for a Supabase project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project base URL without trailing slash, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anon key, sent as `apikey` on every request.
    pub anon_key: String,
    pub timeouts: Timeouts,
}

impl SupabaseConfig {
    /// Load from `SUPABASE_URL` and `SUPABASE_ANON_KEY`, with optional
    /// `BACKEND_REQUEST_TIMEOUT_SECS` / `BACKEND_CONNECT_TIMEOUT_SECS`.
    /// Returns `None` if either required variable is missing or empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SUPABASE_URL").ok()?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY").ok()?;
        let url = url.trim().trim_end_matches('/').to_owned();
        if url.is_empty() || anon_key.trim().is_empty() {
            return None;
        }
        let timeouts = Timeouts {
            request_secs: crate::config::env_parse("BACKEND_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: crate::config::env_parse("BACKEND_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        Some(Self { url, anon_key: anon_key.trim().to_owned(), timeouts })
    }
}

// =============================================================================
// BACKEND
// =============================================================================

pub struct SupabaseBackend {
    http: reqwest::Client,
    config: Arc<SupabaseConfig>,
    auth: Arc<auth::GoTrueAuth>,
}

impl SupabaseBackend {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: SupabaseConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let config = Arc::new(config);
        let auth = Arc::new(auth::GoTrueAuth::new(http.clone(), config.clone()));
        Ok(Self { http, config, auth })
    }
}

impl Backend for SupabaseBackend {
    fn auth(&self) -> Arc<dyn AuthProvider> {
        self.auth.clone()
    }

    fn store(&self, session: Option<&Session>) -> Arc<dyn DataStore> {
        Arc::new(rest::RestStore::new(
            self.http.clone(),
            self.config.clone(),
            session.map(|s| s.access_token.clone()),
        ))
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

// =============================================================================
// SHARED HTTP HELPERS
// =============================================================================

/// Error body shapes used by GoTrue (`msg`, `error_description`) and
/// PostgREST (`message`, `code`).
#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<String>,
}

/// Map a non-success response to a `BackendError`, keeping the provider's
/// own message when it sent one.
pub(crate) fn parse_error(status: u16, body: &str) -> BackendError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.error_code.or_else(|| {
        parsed.code.map(|c| match c {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
    });
    if code.as_deref() == Some("PGRST116") {
        return BackendError::NotFound;
    }
    let message = parsed
        .msg
        .or(parsed.message)
        .or(parsed.error_description)
        .or(parsed.error)
        .unwrap_or_else(|| format!("request failed with status {status}"));
    BackendError::Api { status, code, message }
}

/// Send a request and return the body text of a successful response.
pub(crate) async fn send(request: reqwest::RequestBuilder) -> Result<String, BackendError> {
    let response = request
        .send()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| BackendError::Network(e.to_string()))?;
    if !status.is_success() {
        return Err(parse_error(status.as_u16(), &text));
    }
    Ok(text)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
