//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the backend (auth provider + data store factory), the per-browser
//! session registry, the parsed config and the shutdown token every view
//! scope is derived from.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::backend::{Backend, DataStore, Session};
use crate::config::AppConfig;
use crate::services::view::ViewScope;
use crate::session::SessionRegistry;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub sessions: SessionRegistry,
    pub config: Arc<AppConfig>,
    /// Cancelled on shutdown; parent of every `ViewScope`.
    pub shutdown: CancellationToken,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, config: AppConfig) -> Self {
        Self {
            backend,
            sessions: SessionRegistry::new(),
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// A fresh scope for one mounted view.
    #[must_use]
    pub fn scope(&self) -> ViewScope {
        ViewScope::child_of(&self.shutdown)
    }

    /// Data store acting as `session`'s user (anonymous when `None`).
    #[must_use]
    pub fn store_for(&self, session: Option<&Session>) -> Arc<dyn DataStore> {
        self.backend.store(session)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
