//! Dashboard: the signed-in user's own posts, with delete.

use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use super::posts::{self, Post};
use super::view::{ErrorNotice, Failure, ViewScope};
use crate::backend::{DataStore, User};

pub const NOT_SIGNED_IN: &str = "You must be logged in to view your dashboard.";
pub const LOAD_FAILED: &str = "Failed to load posts.";
pub const DELETE_FAILED: &str = "Failed to delete the post.";

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub posts: Vec<Post>,
    pub loading: bool,
    pub error: ErrorNotice,
    /// Post with a delete in flight.
    pub deleting: Option<Uuid>,
    #[serde(skip)]
    scope: ViewScope,
}

impl DashboardView {
    #[must_use]
    pub fn mount(scope: ViewScope) -> Self {
        Self { posts: Vec::new(), loading: true, error: ErrorNotice::default(), deleting: None, scope }
    }

    pub async fn load(&mut self, store: &dyn DataStore, user: Option<&User>) {
        self.loading = true;
        self.error.clear();

        let Some(user) = user else {
            self.error.set(Failure::Remote, NOT_SIGNED_IN);
            self.loading = false;
            return;
        };

        let Some(result) = self.scope.run(posts::list_by_owner(store, user.id)).await else {
            return;
        };
        match result {
            Ok(list) => self.posts = list,
            Err(e) => {
                error!(user_id = %user.id, error = %e, "failed to load dashboard posts");
                self.error.set(Failure::Remote, LOAD_FAILED);
            }
        }
        self.loading = false;
    }

    /// Delete one of the user's posts and drop it from the list without
    /// re-querying.
    pub async fn delete(&mut self, store: &dyn DataStore, user: &User, post_id: Uuid) {
        self.deleting = Some(post_id);
        self.error.clear();

        let Some(result) = self.scope.run(posts::delete(store, post_id, user.id)).await else {
            return;
        };
        match result {
            Ok(()) => {
                self.posts.retain(|p| p.id != post_id);
                info!(user_id = %user.id, %post_id, "post deleted");
            }
            Err(e) => {
                error!(user_id = %user.id, %post_id, error = %e, "failed to delete post");
                self.error.set(Failure::Remote, DELETE_FAILED);
            }
        }
        self.deleting = None;
    }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
