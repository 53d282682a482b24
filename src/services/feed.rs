//! Home feed: published posts joined with their authors' usernames.
//!
//! Two reads, joined in memory. A failing post query yields an empty feed; a
//! failing profile query only costs the author names.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::error;
use uuid::Uuid;

use super::posts::{POSTS, PostStatus};
use super::profiles;
use super::view::ViewScope;
use crate::backend::{BackendError, DataStore, Select, decode_row};

pub const ANONYMOUS: &str = "Anonymous";
pub const EXCERPT_CHARS: usize = 160;
pub const EMPTY_FEED: &str = "No posts found.";

/// The columns the feed reads; status is implied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    #[serde(flatten)]
    pub post: FeedPost,
    pub author: String,
    pub excerpt: String,
}

/// First `EXCERPT_CHARS` characters, with "..." when anything was cut.
#[must_use]
pub fn excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() { format!("{head}...") } else { head }
}

/// Attach author names; missing or blank usernames become `ANONYMOUS`.
#[must_use]
pub fn join_authors(posts: Vec<FeedPost>, names: &HashMap<Uuid, String>) -> Vec<FeedEntry> {
    posts
        .into_iter()
        .map(|post| {
            let author = names
                .get(&post.user_id)
                .filter(|name| !name.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| ANONYMOUS.to_owned());
            let excerpt = excerpt(&post.content);
            FeedEntry { post, author, excerpt }
        })
        .collect()
}

async fn published(store: &dyn DataStore) -> Result<Vec<FeedPost>, BackendError> {
    let query = Select::from(POSTS)
        .columns(&["id", "title", "content", "created_at", "user_id"])
        .eq("status", PostStatus::Published.as_str())
        .order_desc("created_at");
    store
        .select(&query)
        .await?
        .into_iter()
        .map(decode_row)
        .collect()
}

#[derive(Debug, Serialize)]
pub struct FeedView {
    pub posts: Vec<FeedEntry>,
    pub loading: bool,
    #[serde(skip)]
    scope: ViewScope,
}

impl FeedView {
    #[must_use]
    pub fn mount(scope: ViewScope) -> Self {
        Self { posts: Vec::new(), loading: true, scope }
    }

    pub async fn load(&mut self, store: &dyn DataStore) {
        self.loading = true;

        let Some(result) = self.scope.run(published(store)).await else {
            return;
        };
        let posts = match result {
            Ok(posts) => posts,
            Err(e) => {
                error!(error = %e, "failed to load published posts");
                self.posts.clear();
                self.loading = false;
                return;
            }
        };

        let owners: Vec<Uuid> = posts
            .iter()
            .map(|p| p.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut names = HashMap::new();
        if !owners.is_empty() {
            let Some(result) = self.scope.run(profiles::usernames(store, &owners)).await else {
                return;
            };
            match result {
                Ok(rows) => names.extend(rows.into_iter().filter_map(|(id, name)| name.map(|n| (id, n)))),
                Err(e) => error!(error = %e, "failed to load author profiles"),
            }
        }

        self.posts = join_authors(posts, &names);
        self.loading = false;
    }

    /// The empty-state message once loading has finished.
    #[must_use]
    pub fn empty_message(&self) -> Option<&'static str> {
        (!self.loading && self.posts.is_empty()).then_some(EMPTY_FEED)
    }
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
