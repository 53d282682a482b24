//! PostgREST client implementing `DataStore`.

use std::sync::Arc;

use super::{SupabaseConfig, send};
use crate::backend::DataStore;
use crate::backend::query::{Filter, Select, encode_filter, encode_select};
use crate::backend::types::{BackendError, Row};

const RETURN_REPRESENTATION: &str = "return=representation";

/// Data store bound to one bearer token (a user's access token or the anon key).
pub struct RestStore {
    http: reqwest::Client,
    config: Arc<SupabaseConfig>,
    access_token: Option<String>,
}

impl RestStore {
    pub(crate) fn new(http: reqwest::Client, config: Arc<SupabaseConfig>, access_token: Option<String>) -> Self {
        Self { http, config, access_token }
    }

    fn request(&self, method: reqwest::Method, collection: &str) -> reqwest::RequestBuilder {
        let bearer = self
            .access_token
            .as_deref()
            .unwrap_or(&self.config.anon_key);
        self.http
            .request(method, format!("{}/rest/v1/{collection}", self.config.url))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer)
    }
}

pub(crate) fn parse_rows(body: &str) -> Result<Vec<Row>, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

fn first_row(body: &str) -> Result<Row, BackendError> {
    parse_rows(body)?
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Decode("empty representation".into()))
}

#[async_trait::async_trait]
impl DataStore for RestStore {
    async fn select(&self, query: &Select) -> Result<Vec<Row>, BackendError> {
        let request = self
            .request(reqwest::Method::GET, &query.collection)
            .query(&encode_select(query));
        parse_rows(&send(request).await?)
    }

    async fn insert(&self, collection: &str, row: Row) -> Result<Row, BackendError> {
        let request = self
            .request(reqwest::Method::POST, collection)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row);
        first_row(&send(request).await?)
    }

    async fn update(&self, collection: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, BackendError> {
        let pairs: Vec<_> = filters.iter().map(encode_filter).collect();
        let request = self
            .request(reqwest::Method::PATCH, collection)
            .query(&pairs)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch);
        parse_rows(&send(request).await?)
    }

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<(), BackendError> {
        let pairs: Vec<_> = filters.iter().map(encode_filter).collect();
        let request = self
            .request(reqwest::Method::DELETE, collection)
            .query(&pairs)
            .header("Prefer", "return=minimal");
        send(request).await.map(|_| ())
    }

    async fn upsert(&self, collection: &str, row: Row, conflict_key: &str) -> Result<Row, BackendError> {
        let request = self
            .request(reqwest::Method::POST, collection)
            .query(&[("on_conflict", conflict_key)])
            .header("Prefer", format!("resolution=merge-duplicates,{RETURN_REPRESENTATION}"))
            .json(&row);
        first_row(&send(request).await?)
    }
}
