//! Backend: adapters for the hosted auth provider and data store.
//!
//! DESIGN
//! ======
//! The blog owns no data. Everything goes through two traits:
//! `AuthProvider` (credential exchange, token refresh, user lookup) and
//! `DataStore` (select/insert/update/delete/upsert over JSON rows). A
//! `Backend` hands out both; the store is scoped to the caller's session so
//! the remote row-level policies see the right bearer token.
//!
//! Two implementations exist: `supabase` (GoTrue + PostgREST over HTTP) and
//! `memory` (in-process, used when no backend URL is configured and as the
//! test double).

pub mod memory;
pub mod query;
pub mod supabase;
pub mod types;

use std::sync::Arc;

pub use query::{Filter, Select};
pub use types::{AuthChange, AuthEvent, BackendError, Row, Session, SignUp, User};

/// Remote authentication operations. Client-side session state (current
/// session, change notifications) lives in `crate::session::AppSession`.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError>;

    async fn sign_up(&self, email: &str, password: &str, metadata: serde_json::Value) -> Result<SignUp, BackendError>;

    async fn sign_out(&self, session: &Session) -> Result<(), BackendError>;

    /// Validate an access token against the provider and return its user.
    async fn get_user(&self, access_token: &str) -> Result<User, BackendError>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, BackendError>;
}

/// Row-level CRUD over named collections.
#[async_trait::async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, BackendError>;

    /// Insert one row, returning it as stored (with generated columns).
    async fn insert(&self, collection: &str, row: Row) -> Result<Row, BackendError>;

    /// Apply `patch` to every row matching `filters`, returning the updated rows.
    async fn update(&self, collection: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, BackendError>;

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<(), BackendError>;

    /// Insert or merge on `conflict_key`, returning the stored row.
    async fn upsert(&self, collection: &str, row: Row, conflict_key: &str) -> Result<Row, BackendError>;
}

/// Factory for the two collaborators.
pub trait Backend: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthProvider>;

    /// Data store acting on behalf of `session` (anonymous when `None`).
    fn store(&self, session: Option<&Session>) -> Arc<dyn DataStore>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

/// Decode a store row into a typed record.
///
/// # Errors
///
/// Returns `BackendError::Decode` when the row does not match `T`.
pub fn decode_row<T: serde::de::DeserializeOwned>(row: Row) -> Result<T, BackendError> {
    serde_json::from_value(serde_json::Value::Object(row)).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Encode a typed record as a store row.
///
/// # Errors
///
/// Returns `BackendError::Decode` when `value` does not serialize to a JSON object.
pub fn encode_row<T: serde::Serialize>(value: &T) -> Result<Row, BackendError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(row)) => Ok(row),
        Ok(other) => Err(BackendError::Decode(format!("expected object, got {other}"))),
        Err(e) => Err(BackendError::Decode(e.to_string())),
    }
}
