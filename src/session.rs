//! Per-browser application session and auth-change subscriptions.
//!
//! ARCHITECTURE
//! ============
//! `AppSession` is the explicit stand-in for the auth SDK's client-side
//! state: it caches the provider-issued `Session` for one browser, refreshes
//! it when the access token expires, and broadcasts every change
//! (`SignedIn`, `SignedOut`, `TokenRefreshed`) to subscribers. Handlers get
//! it injected through extractors; nothing reads a global.
//!
//! `SessionRegistry` maps the opaque browser cookie to its `AppSession`.
//! Entries are created on sign-in/sign-up or when a browser opens the auth
//! event stream, and re-keyed on every successful sign-in so a cookie value
//! issued before authentication never names an authenticated session. The
//! sweeper evicts unobserved entries once idle: signed-out ones after the
//! idle TTL, signed-in ones after the longer signed-in TTL.
//!
//! TRADE-OFFS
//! ==========
//! The cached session sits behind an async mutex held across the refresh
//! call, so concurrent requests from one browser never spend the same
//! single-use refresh token twice.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use rand::Rng;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backend::{AuthChange, AuthEvent, AuthProvider, BackendError, Session, SignUp, User};

/// Refresh slightly before the provider would reject the token.
const REFRESH_MARGIN_SECS: i64 = 10;
const CHANGE_CHANNEL_CAPACITY: usize = 16;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

// =============================================================================
// APP SESSION
// =============================================================================

pub struct AppSession {
    auth: Arc<dyn AuthProvider>,
    current: tokio::sync::Mutex<Option<Session>>,
    changes: broadcast::Sender<AuthChange>,
    last_seen: Mutex<Instant>,
}

impl AppSession {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { auth, current: tokio::sync::Mutex::new(None), changes, last_seen: Mutex::new(Instant::now()) }
    }

    /// The current session, refreshed first if its access token has expired.
    ///
    /// A refresh the provider rejects ends the session (`SignedOut`, `Ok(None)`);
    /// a refresh that fails to complete is returned as an error and the cached
    /// session is kept for the next attempt.
    ///
    /// # Errors
    ///
    /// Returns the provider error when an expired session could not be refreshed.
    pub async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        let mut current = self.current.lock().await;
        let Some(session) = current.as_ref() else {
            return Ok(None);
        };
        let horizon = OffsetDateTime::now_utc() + time::Duration::seconds(REFRESH_MARGIN_SECS);
        if !session.is_expired_at(horizon) {
            return Ok(Some(session.clone()));
        }

        let refresh_token = session.refresh_token.clone();
        match self.auth.refresh_session(&refresh_token).await {
            Ok(fresh) => {
                *current = Some(fresh.clone());
                drop(current);
                info!(user_id = %fresh.user.id, "session refreshed");
                self.emit(AuthEvent::TokenRefreshed, Some(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(e) if e.is_auth_rejection() => {
                *current = None;
                drop(current);
                info!(error = %e, "refresh rejected, session ended");
                self.emit(AuthEvent::SignedOut, None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The current user as confirmed by the provider (not just the cache).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be refreshed or the provider
    /// refuses the access token.
    pub async fn current_user(&self) -> Result<Option<User>, BackendError> {
        let Some(session) = self.current_session().await? else {
            return Ok(None);
        };
        self.auth.get_user(&session.access_token).await.map(Some)
    }

    /// # Errors
    ///
    /// Returns the provider error (wrong credentials, unreachable provider).
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        self.replace(AuthEvent::SignedIn, Some(session.clone())).await;
        Ok(session)
    }

    /// Sign up; when the provider issues a session right away it becomes current.
    ///
    /// # Errors
    ///
    /// Returns the provider error (duplicate account, weak password, ...).
    pub async fn sign_up(&self, email: &str, password: &str, metadata: serde_json::Value) -> Result<SignUp, BackendError> {
        let signup = self.auth.sign_up(email, password, metadata).await?;
        if let Some(session) = &signup.session {
            self.replace(AuthEvent::SignedIn, Some(session.clone())).await;
        }
        Ok(signup)
    }

    /// End the session locally and at the provider. Local state is cleared
    /// even when the provider call fails.
    ///
    /// # Errors
    ///
    /// Returns the provider error after local state has been cleared.
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        let previous = self.current.lock().await.take();
        self.emit(AuthEvent::SignedOut, None);
        match previous {
            Some(session) => self.auth.sign_out(&session).await,
            None => Ok(()),
        }
    }

    /// Acquire a change subscription. Released by `unsubscribe` or on drop.
    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription { receiver: self.changes.subscribe() }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    pub fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Whether a session is cached, without refreshing. A session busy in a
    /// refresh counts as present.
    #[must_use]
    pub fn holds_session(&self) -> bool {
        self.current
            .try_lock()
            .map(|current| current.is_some())
            .unwrap_or(true)
    }

    async fn replace(&self, event: AuthEvent, session: Option<Session>) {
        *self.current.lock().await = session.clone();
        self.emit(event, session);
    }

    fn emit(&self, event: AuthEvent, session: Option<Session>) {
        // No receivers is fine: nobody is watching this browser right now.
        let _ = self.changes.send(AuthChange { event, session });
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Scoped handle on an `AppSession`'s change stream.
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthChange>,
}

impl AuthSubscription {
    /// Wait for the next change. `None` once the session itself is gone.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Release the subscription explicitly.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Browser cookie value -> application session.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<AppSession>>>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a browser's session and mark it as seen.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<AppSession>> {
        let found = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        if let Some(app) = &found {
            app.touch();
        }
        found
    }

    /// Return the browser's session, registering a fresh one (under a new key
    /// when `key` is absent or unknown). The returned key is the one to store
    /// in the browser cookie.
    pub fn get_or_insert(&self, key: Option<&str>, auth: &Arc<dyn AuthProvider>) -> (String, Arc<AppSession>) {
        if let Some(key) = key {
            if let Some(app) = self.get(key) {
                return (key.to_owned(), app);
            }
        }
        let key = generate_token();
        let app = Arc::new(AppSession::new(auth.clone()));
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), app.clone());
        (key, app)
    }

    /// Move `app` under a freshly generated key, dropping `old`. Holders of
    /// the `Arc` (open event streams) stay attached. Returns the new key.
    pub fn rekey(&self, old: &str, app: &Arc<AppSession>) -> String {
        let key = generate_token();
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(old);
        map.insert(key.clone(), app.clone());
        key
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict unobserved sessions: signed-out ones idle for at least
    /// `idle_ttl`, signed-in ones idle for at least `signed_in_ttl`. Returns
    /// the number evicted.
    pub fn sweep(&self, idle_ttl: Duration, signed_in_ttl: Duration) -> usize {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_, app| {
            if app.subscriber_count() > 0 {
                return true;
            }
            let ttl = if app.holds_session() { signed_in_ttl } else { idle_ttl };
            app.idle_for() < ttl
        });
        before - map.len()
    }
}

/// Spawn the periodic registry sweep. Stops when `shutdown` is cancelled.
pub fn spawn_sweeper(
    registry: SessionRegistry,
    interval: Duration,
    idle_ttl: Duration,
    signed_in_ttl: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    info!(
        interval_secs = interval.as_secs(),
        idle_ttl_secs = idle_ttl.as_secs(),
        signed_in_ttl_secs = signed_in_ttl.as_secs(),
        "session sweeper configured"
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = registry.sweep(idle_ttl, signed_in_ttl);
                    if evicted > 0 {
                        info!(evicted, remaining = registry.len(), "evicted idle browser sessions");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
