//! New-post editor: local validation, then one insert as the confirmed user.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::posts::{self, NewPost, PostStatus};
use super::view::{ErrorNotice, Failure, Next, ViewScope};
use crate::backend::DataStore;
use crate::session::AppSession;

pub const TITLE_MAX_WORDS: usize = 20;
pub const NOT_SIGNED_IN: &str = "You must be logged in to create a post.";
pub const CREATE_FAILED: &str = "Failed to create post.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Title and content cannot be empty.")]
    Empty,
    #[error("Title cannot exceed 20 words.")]
    TitleTooLong,
}

/// Check a draft before anything leaves the process.
///
/// # Errors
///
/// `DraftError` describing the first rule the draft breaks.
pub fn validate(title: &str, content: &str) -> Result<(), DraftError> {
    if title.trim().is_empty() || content.trim().is_empty() {
        return Err(DraftError::Empty);
    }
    if title.split_whitespace().count() > TITLE_MAX_WORDS {
        return Err(DraftError::TitleTooLong);
    }
    Ok(())
}

/// Form body for `POST /content/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_status")]
    pub status: PostStatus,
}

fn default_status() -> PostStatus {
    PostStatus::Draft
}

#[derive(Debug, Serialize)]
pub struct EditorView {
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub loading: bool,
    pub error: ErrorNotice,
    #[serde(skip)]
    scope: ViewScope,
}

impl EditorView {
    #[must_use]
    pub fn mount(scope: ViewScope) -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            status: PostStatus::Draft,
            loading: false,
            error: ErrorNotice::default(),
            scope,
        }
    }

    /// Validate and insert. The form fields are kept on failure so the page
    /// can be re-rendered as submitted.
    pub async fn submit(&mut self, app: &AppSession, store: &dyn DataStore, input: DraftInput) -> Next {
        self.title = input.title;
        self.content = input.content;
        self.status = input.status;
        self.error.clear();

        if let Err(e) = validate(&self.title, &self.content) {
            self.error.set(Failure::Validation, e.to_string());
            return Next::Stay;
        }

        self.loading = true;
        let Some(user) = self.scope.run(app.current_user()).await else {
            return Next::Stay;
        };
        let user = match user {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.error.set(Failure::Remote, NOT_SIGNED_IN);
                self.loading = false;
                return Next::Stay;
            }
            Err(e) => {
                error!(error = %e, "failed to confirm user before creating post");
                self.error.set(Failure::Remote, NOT_SIGNED_IN);
                self.loading = false;
                return Next::Stay;
            }
        };

        let draft = NewPost {
            user_id: user.id,
            title: self.title.clone(),
            content: self.content.clone(),
            status: self.status,
        };
        let Some(result) = self.scope.run(posts::create(store, &draft)).await else {
            return Next::Stay;
        };
        self.loading = false;
        match result {
            Ok(post) => {
                info!(user_id = %user.id, post_id = %post.id, status = post.status.as_str(), "post created");
                Next::Navigate("/")
            }
            Err(e) => {
                error!(user_id = %user.id, error = %e, "failed to create post");
                self.error.set(Failure::Remote, CREATE_FAILED);
                Next::Stay
            }
        }
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
