//! In-memory backend: auth accounts and JSON tables held in process.
//!
//! DESIGN
//! ======
//! Mirrors the observable contract of the hosted backend closely enough for
//! local development and tests: password sign-in, rotating refresh tokens,
//! eq/in filtering, ordering with RFC 3339 awareness, and upsert on a
//! conflict key. Every store call is appended to a call log, and individual
//! collections can be switched into a failing state, so tests can assert
//! exactly which remote calls a view issued.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::query::{Filter, Order, Select, encode_value};
use super::types::{BackendError, Row, Session, SignUp, User};
use super::{AuthProvider, Backend, DataStore};
use crate::session::generate_token;

const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const MIN_PASSWORD_LEN: usize = 6;

fn api_error(status: u16, code: &str, message: &str) -> BackendError {
    BackendError::Api { status, code: Some(code.to_owned()), message: message.to_owned() }
}

// =============================================================================
// AUTH
// =============================================================================

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct AuthInner {
    /// Accounts keyed by lowercased email.
    accounts: HashMap<String, Account>,
    /// Access token -> (user id, expiry).
    access: HashMap<String, (Uuid, OffsetDateTime)>,
    /// Refresh token -> user id. Tokens are single use.
    refresh: HashMap<String, Uuid>,
}

/// Password accounts with opaque bearer tokens.
pub struct MemoryAuth {
    inner: Mutex<AuthInner>,
    token_ttl_secs: AtomicI64,
    unavailable: AtomicBool,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(AuthInner::default()),
            token_ttl_secs: AtomicI64::new(DEFAULT_TOKEN_TTL_SECS),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Lifetime of access tokens issued from now on. Zero or negative issues
    /// already-expired tokens.
    pub fn set_token_ttl_secs(&self, secs: i64) {
        self.token_ttl_secs.store(secs, std::sync::atomic::Ordering::Relaxed);
    }

    /// Make every call fail as if the provider could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, std::sync::atomic::Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(BackendError::Unavailable("auth provider offline".into()));
        }
        Ok(())
    }

    fn issue(&self, inner: &mut AuthInner, user: &User) -> Session {
        let ttl = Duration::seconds(self.token_ttl_secs.load(std::sync::atomic::Ordering::Relaxed));
        let expires_at = OffsetDateTime::now_utc() + ttl;
        let access_token = generate_token();
        let refresh_token = generate_token();
        inner.access.insert(access_token.clone(), (user.id, expires_at));
        inner.refresh.insert(refresh_token.clone(), user.id);
        Session { access_token, refresh_token, expires_at, user: user.clone() }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AuthInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn find_user(inner: &AuthInner, user_id: Uuid) -> Option<User> {
    inner
        .accounts
        .values()
        .find(|a| a.user.id == user_id)
        .map(|a| a.user.clone())
}

#[async_trait::async_trait]
impl AuthProvider for MemoryAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        self.check_available()?;
        let mut inner = self.lock();
        let user = match inner.accounts.get(&email.trim().to_ascii_lowercase()) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(api_error(400, "invalid_credentials", "Invalid login credentials")),
        };
        Ok(self.issue(&mut inner, &user))
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> Result<SignUp, BackendError> {
        self.check_available()?;
        let key = email.trim().to_ascii_lowercase();
        if key.is_empty() || !key.contains('@') {
            return Err(api_error(400, "validation_failed", "Unable to validate email address: invalid format"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(api_error(422, "weak_password", "Password should be at least 6 characters."));
        }

        let mut inner = self.lock();
        if inner.accounts.contains_key(&key) {
            return Err(api_error(422, "user_already_exists", "User already registered"));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: Some(key.clone()),
            user_metadata: match metadata {
                Value::Object(map) => map,
                _ => serde_json::Map::new(),
            },
        };
        inner.accounts.insert(key, Account { user: user.clone(), password: password.to_owned() });
        let session = self.issue(&mut inner, &user);
        Ok(SignUp { user: Some(user), session: Some(session) })
    }

    async fn sign_out(&self, session: &Session) -> Result<(), BackendError> {
        self.check_available()?;
        let mut inner = self.lock();
        inner.access.remove(&session.access_token);
        inner.refresh.remove(&session.refresh_token);
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<User, BackendError> {
        self.check_available()?;
        let inner = self.lock();
        let Some(&(user_id, expires_at)) = inner.access.get(access_token) else {
            return Err(api_error(401, "bad_jwt", "invalid JWT: unable to parse or verify signature"));
        };
        if expires_at <= OffsetDateTime::now_utc() {
            return Err(api_error(401, "bad_jwt", "invalid JWT: token is expired"));
        }
        find_user(&inner, user_id).ok_or_else(|| api_error(404, "user_not_found", "User not found"))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, BackendError> {
        self.check_available()?;
        let mut inner = self.lock();
        let Some(user_id) = inner.refresh.remove(refresh_token) else {
            return Err(api_error(400, "refresh_token_not_found", "Invalid Refresh Token: Refresh Token Not Found"));
        };
        let user = find_user(&inner, user_id).ok_or_else(|| api_error(404, "user_not_found", "User not found"))?;
        Ok(self.issue(&mut inner, &user))
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
    Delete,
    Upsert,
}

/// One recorded call against the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub collection: String,
    pub filters: Vec<Filter>,
}

/// JSON tables with a call log and per-collection failure injection.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    calls: Mutex<Vec<StoreCall>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows directly, bypassing the call log.
    pub fn seed(&self, collection: &str, rows: impl IntoIterator<Item = Row>) {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables
            .entry(collection.to_owned())
            .or_default()
            .extend(rows);
    }

    /// Snapshot of a collection's rows.
    #[must_use]
    pub fn rows(&self, collection: &str) -> Vec<Row> {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.get(collection).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn count_calls(&self, op: StoreOp, collection: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.op == op && c.collection == collection)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Every subsequent call on `collection` fails (the call is still logged).
    pub fn fail_collection(&self, collection: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection.to_owned());
    }

    pub fn heal_collection(&self, collection: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(collection);
    }

    fn record(&self, op: StoreOp, collection: &str, filters: &[Filter]) -> Result<(), BackendError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(StoreCall { op, collection: collection.to_owned(), filters: filters.to_vec() });
        let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        if failing.contains(collection) {
            return Err(api_error(503, "PGRST000", &format!("injected failure on {collection}")));
        }
        Ok(())
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    a == b || (!a.is_null() && !b.is_null() && encode_value(a) == encode_value(b))
}

fn row_matches(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq(column, value) => row.get(column).is_some_and(|v| values_equal(v, value)),
        Filter::In(column, values) => row
            .get(column)
            .is_some_and(|v| values.iter().any(|candidate| values_equal(v, candidate))),
    })
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), Some(_)) => Ordering::Greater,
        (Some(_), None | Some(Value::Null)) => Ordering::Less,
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (OffsetDateTime::parse(x, &Rfc3339), OffsetDateTime::parse(y, &Rfc3339)) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => encode_value(x).cmp(&encode_value(y)),
    }
}

fn sort_rows(rows: &mut [Row], order: &Order) {
    rows.sort_by(|a, b| {
        let ord = compare_values(a.get(&order.column), b.get(&order.column));
        if order.ascending { ord } else { ord.reverse() }
    });
}

fn project(row: &Row, columns: Option<&Vec<String>>) -> Row {
    match columns {
        None => row.clone(),
        Some(cols) => cols
            .iter()
            .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
            .collect(),
    }
}

/// Fill columns the hosted schema generates on insert.
fn with_defaults(mut row: Row) -> Result<Row, BackendError> {
    if !row.contains_key("id") {
        row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    if !row.contains_key("created_at") {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        row.insert("created_at".into(), Value::String(now));
    }
    Ok(row)
}

#[async_trait::async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, BackendError> {
        self.record(StoreOp::Select, &query.collection, &query.filters)?;
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<Row> = tables
            .get(&query.collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| row_matches(r, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if let Some(order) = &query.order {
            sort_rows(&mut rows, order);
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows
            .iter()
            .map(|r| project(r, query.columns.as_ref()))
            .collect())
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<Row, BackendError> {
        self.record(StoreOp::Insert, collection, &[])?;
        let row = with_defaults(row)?;
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables
            .entry(collection.to_owned())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, collection: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, BackendError> {
        self.record(StoreOp::Update, collection, filters)?;
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(collection) {
            for row in rows.iter_mut().filter(|r| row_matches(r, filters)) {
                for (k, v) in &patch {
                    row.insert(k.clone(), v.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<(), BackendError> {
        self.record(StoreOp::Delete, collection, filters)?;
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(rows) = tables.get_mut(collection) {
            rows.retain(|r| !row_matches(r, filters));
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, row: Row, conflict_key: &str) -> Result<Row, BackendError> {
        let key = row.get(conflict_key).cloned().unwrap_or(Value::Null);
        self.record(StoreOp::Upsert, collection, &[Filter::Eq(conflict_key.to_owned(), key.clone())])?;
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = tables.entry(collection.to_owned()).or_default();
        if !key.is_null() {
            if let Some(existing) = rows
                .iter_mut()
                .find(|r| r.get(conflict_key).is_some_and(|v| values_equal(v, &key)))
            {
                for (k, v) in row {
                    existing.insert(k, v);
                }
                return Ok(existing.clone());
            }
        }
        let row = with_defaults(row)?;
        rows.push(row.clone());
        Ok(row)
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// In-process backend. The store ignores the caller's session: there are no
/// row-level policies to evaluate.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    auth: Arc<MemoryAuth>,
    store: Arc<MemoryStore>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn memory_auth(&self) -> &Arc<MemoryAuth> {
        &self.auth
    }

    #[must_use]
    pub fn memory_store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

impl Backend for MemoryBackend {
    fn auth(&self) -> Arc<dyn AuthProvider> {
        self.auth.clone()
    }

    fn store(&self, _session: Option<&Session>) -> Arc<dyn DataStore> {
        self.store.clone()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
