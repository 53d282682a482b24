//! Post records and the queries every page runs against the `posts` collection.

use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::backend::{BackendError, DataStore, Filter, Select, decode_row, encode_row};

pub const POSTS: &str = "posts";

/// The only two states a post can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Insert payload; `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
}

/// All posts owned by `owner`, newest first.
///
/// # Errors
///
/// Store or decode failure.
pub async fn list_by_owner(store: &dyn DataStore, owner: Uuid) -> Result<Vec<Post>, BackendError> {
    let query = Select::from(POSTS)
        .eq("user_id", owner.to_string())
        .order_desc("created_at");
    store
        .select(&query)
        .await?
        .into_iter()
        .map(decode_row)
        .collect()
}

/// # Errors
///
/// `BackendError::NotFound` when no row has this id.
pub async fn get(store: &dyn DataStore, id: Uuid) -> Result<Post, BackendError> {
    let query = Select::from(POSTS).eq("id", id.to_string()).limit(1);
    let row = store
        .select(&query)
        .await?
        .into_iter()
        .next()
        .ok_or(BackendError::NotFound)?;
    decode_row(row)
}

/// # Errors
///
/// Store or decode failure.
pub async fn create(store: &dyn DataStore, post: &NewPost) -> Result<Post, BackendError> {
    let row = store.insert(POSTS, encode_row(post)?).await?;
    decode_row(row)
}

/// Mark the post published. Scoped to its owner: a post owned by someone
/// else (or gone) matches nothing and yields `NotFound`.
///
/// # Errors
///
/// Store failure, or `NotFound` when no row was updated.
pub async fn publish(store: &dyn DataStore, id: Uuid, owner: Uuid) -> Result<Post, BackendError> {
    let mut patch = crate::backend::Row::new();
    patch.insert("status".into(), json!(PostStatus::Published.as_str()));
    let filters = [Filter::eq("id", id.to_string()), Filter::eq("user_id", owner.to_string())];
    let row = store
        .update(POSTS, patch, &filters)
        .await?
        .into_iter()
        .next()
        .ok_or(BackendError::NotFound)?;
    decode_row(row)
}

/// Delete the post if `owner` owns it.
///
/// # Errors
///
/// Store failure.
pub async fn delete(store: &dyn DataStore, id: Uuid, owner: Uuid) -> Result<(), BackendError> {
    let filters = [Filter::eq("id", id.to_string()), Filter::eq("user_id", owner.to_string())];
    store.delete(POSTS, &filters).await
}

#[cfg(test)]
#[path = "posts_test.rs"]
mod tests;
