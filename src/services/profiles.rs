//! Profiles: the loosely typed per-user row and the profile page.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};
use uuid::Uuid;

use super::view::{ErrorNotice, Failure, ViewScope};
use crate::backend::{BackendError, DataStore, Row, Select, decode_row};
use crate::session::AppSession;

pub const PROFILES: &str = "profiles";

pub const PROFILE_MISSING: &str = "You are not logged in or profile not found.";

/// One row per user (`id` is the user id). Columns beyond the known ones are
/// kept in `extra` rather than dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Row,
}

/// # Errors
///
/// `BackendError::NotFound` when the user has no profile row.
pub async fn get(store: &dyn DataStore, id: Uuid) -> Result<Profile, BackendError> {
    let query = Select::from(PROFILES).eq("id", id.to_string()).limit(1);
    let row = store
        .select(&query)
        .await?
        .into_iter()
        .next()
        .ok_or(BackendError::NotFound)?;
    decode_row(row)
}

/// Usernames for a set of users. Users without a profile are simply absent.
///
/// # Errors
///
/// Store failure.
pub async fn usernames(store: &dyn DataStore, ids: &[Uuid]) -> Result<Vec<(Uuid, Option<String>)>, BackendError> {
    #[derive(Deserialize)]
    struct NameRow {
        id: Uuid,
        #[serde(default)]
        username: Option<String>,
    }

    let query = Select::from(PROFILES)
        .columns(&["id", "username"])
        .filter(crate::backend::Filter::is_in("id", ids.iter().map(ToString::to_string)));
    store
        .select(&query)
        .await?
        .into_iter()
        .map(|row| decode_row::<NameRow>(row).map(|r| (r.id, r.username)))
        .collect()
}

/// Insert or merge `{id, username}` on conflict `id`.
///
/// # Errors
///
/// Store failure.
pub async fn upsert_username(store: &dyn DataStore, id: Uuid, username: &str) -> Result<(), BackendError> {
    let mut row = Row::new();
    row.insert("id".into(), json!(id.to_string()));
    row.insert("username".into(), json!(username));
    store.upsert(PROFILES, row, "id").await.map(|_| ())
}

// =============================================================================
// PROFILE PAGE
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub profile: Option<Profile>,
    pub loading: bool,
    pub error: ErrorNotice,
    #[serde(skip)]
    scope: ViewScope,
}

impl ProfileView {
    #[must_use]
    pub fn mount(scope: ViewScope) -> Self {
        Self { profile: None, loading: true, error: ErrorNotice::default(), scope }
    }

    /// Fetch the confirmed user, then their profile row.
    pub async fn load(&mut self, app: &AppSession, store: &dyn DataStore) {
        self.loading = true;
        self.error.clear();

        let Some(user) = self.scope.run(app.current_user()).await else {
            return;
        };
        let user = match user {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("profile requested without a signed-in user");
                self.fail(Failure::NotFound);
                return;
            }
            Err(e) => {
                error!(error = %e, "failed to confirm user for profile");
                self.fail(Failure::Remote);
                return;
            }
        };

        let Some(result) = self.scope.run(get(store, user.id)).await else {
            return;
        };
        match result {
            Ok(profile) => self.profile = Some(profile),
            Err(BackendError::NotFound) => {
                warn!(user_id = %user.id, "no profile row for user");
                self.fail(Failure::NotFound);
            }
            Err(e) => {
                error!(user_id = %user.id, error = %e, "failed to load profile");
                self.fail(Failure::Remote);
            }
        }
        self.loading = false;
    }

    fn fail(&mut self, kind: Failure) {
        self.profile = None;
        self.error.set(kind, PROFILE_MISSING);
        self.loading = false;
    }
}

#[cfg(test)]
#[path = "profiles_test.rs"]
mod tests;
