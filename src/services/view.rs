//! Shared view plumbing: lifetime scope, inline error notice, navigation.

use std::future::Future;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Lifetime of one mounted view. Remote calls run through `run` so that a
/// view which has gone away (request dropped, stream closed, shutdown) never
/// applies a late response. Dropping the scope cancels it.
#[derive(Debug)]
pub struct ViewScope {
    token: CancellationToken,
}

impl ViewScope {
    /// A scope tied to nothing but its own lifetime.
    #[must_use]
    pub fn detached() -> Self {
        Self { token: CancellationToken::new() }
    }

    /// A scope that is also cancelled when `parent` is.
    #[must_use]
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self { token: parent.child_token() }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the scope to be cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Drive `fut` unless the scope is cancelled first; `None` means the
    /// result must be discarded.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::detached()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// What went wrong, for the HTTP layer's status code. Never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Validation,
    NotFound,
    Remote,
}

/// User-visible inline error. Serializes as the bare message (or `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorNotice {
    message: Option<String>,
    #[serde(skip)]
    kind: Option<Failure>,
}

impl ErrorNotice {
    pub fn set(&mut self, kind: Failure, message: impl Into<String>) {
        self.message = Some(message.into());
        self.kind = Some(kind);
    }

    pub fn clear(&mut self) {
        self.message = None;
        self.kind = None;
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> Option<Failure> {
        self.kind
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.message.is_some()
    }
}

/// Where the browser should go after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Stay,
    Navigate(&'static str),
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
