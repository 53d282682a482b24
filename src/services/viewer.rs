//! Single-post page with the publish control.

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use super::posts::{self, Post, PostStatus};
use super::view::{ErrorNotice, Failure, Next, ViewScope};
use crate::backend::{BackendError, DataStore, User};

pub const NOT_FOUND: &str = "Post not found or there was an error fetching it.";
pub const PUBLISH_FAILED: &str = "Failed to publish post.";

/// State of the publish button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishControl {
    Publish,
    Publishing,
    Published,
}

impl PublishControl {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Publish => "Publish",
            Self::Publishing => "Publishing...",
            Self::Published => "Published",
        }
    }

    #[must_use]
    pub fn disabled(self) -> bool {
        !matches!(self, Self::Publish)
    }
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub post: Option<Post>,
    pub loading: bool,
    pub publishing: bool,
    pub error: ErrorNotice,
    #[serde(skip)]
    scope: ViewScope,
}

impl PostView {
    #[must_use]
    pub fn mount(scope: ViewScope) -> Self {
        Self { post: None, loading: true, publishing: false, error: ErrorNotice::default(), scope }
    }

    pub async fn load(&mut self, store: &dyn DataStore, id: Uuid) {
        self.loading = true;
        self.error.clear();

        let Some(result) = self.scope.run(posts::get(store, id)).await else {
            return;
        };
        match result {
            Ok(post) => self.post = Some(post),
            Err(BackendError::NotFound) => {
                info!(post_id = %id, "post not found");
                self.post = None;
                self.error.set(Failure::NotFound, NOT_FOUND);
            }
            Err(e) => {
                error!(post_id = %id, error = %e, "failed to load post");
                self.post = None;
                self.error.set(Failure::Remote, NOT_FOUND);
            }
        }
        self.loading = false;
    }

    /// `None` when there is no post to act on.
    #[must_use]
    pub fn control(&self) -> Option<PublishControl> {
        let post = self.post.as_ref()?;
        Some(match (post.status, self.publishing) {
            (PostStatus::Published, _) => PublishControl::Published,
            (PostStatus::Draft, true) => PublishControl::Publishing,
            (PostStatus::Draft, false) => PublishControl::Publish,
        })
    }

    /// Publish the loaded draft. A published post (or no post) is a no-op.
    pub async fn publish(&mut self, store: &dyn DataStore, user: &User) -> Next {
        let Some(id) = self
            .post
            .as_ref()
            .filter(|p| p.status == PostStatus::Draft)
            .map(|p| p.id)
        else {
            return Next::Stay;
        };

        self.publishing = true;
        self.error.clear();
        let Some(result) = self.scope.run(posts::publish(store, id, user.id)).await else {
            return Next::Stay;
        };
        self.publishing = false;
        match result {
            Ok(_) => {
                if let Some(post) = self.post.as_mut() {
                    post.status = PostStatus::Published;
                }
                info!(user_id = %user.id, post_id = %id, "post published");
                Next::Navigate("/")
            }
            Err(e) => {
                error!(user_id = %user.id, post_id = %id, error = %e, "failed to publish post");
                self.error.set(Failure::Remote, PUBLISH_FAILED);
                Next::Stay
            }
        }
    }
}

#[cfg(test)]
#[path = "viewer_test.rs"]
mod tests;
