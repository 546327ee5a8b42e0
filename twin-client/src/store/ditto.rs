use std::{collections::BTreeMap, time::Duration};

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::IgnoredAny;
use serde_json::json;

use super::{FeatureStore, StoreError};
use crate::domain::{FeatureEntry, FeatureKey};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Feature store backed by the Eclipse Ditto HTTP API (`/api/2`).
///
/// All calls target a single thing and authenticate with the same basic-auth
/// pair. Features live under `{base}/things/{thing}/features/{key}`.
#[derive(Debug, Clone)]
pub struct DittoStore {
    client: Client,
    base_url: String,
    thing_id: String,
    policy_id: String,
    credentials: Credentials,
}

impl DittoStore {
    pub fn new(
        base_url: &str,
        thing_id: &str,
        policy_id: &str,
        credentials: Credentials,
        request_timeout: Option<Duration>,
    ) -> Result<Self, StoreError> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            thing_id: thing_id.to_string(),
            policy_id: policy_id.to_string(),
            credentials,
        })
    }

    pub fn thing_id(&self) -> &str {
        &self.thing_id
    }

    fn thing_url(&self) -> String {
        format!("{}/things/{}", self.base_url, self.thing_id)
    }

    fn feature_url(&self, key: &FeatureKey) -> String {
        format!("{}/features/{}", self.thing_url(), key)
    }

    fn properties_url(&self, key: &FeatureKey) -> String {
        format!("{}/properties", self.feature_url(key))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }
}

async fn ensure_success(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait::async_trait]
impl FeatureStore for DittoStore {
    async fn reset(&self) -> Result<(), StoreError> {
        let url = self.thing_url();

        // A missing thing is the normal state on first run.
        match self.request(Method::DELETE, &url).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(thing = %self.thing_id, "deleted thing");
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                tracing::warn!(thing = %self.thing_id, status, body = %body, "thing delete failed");
            }
            Err(e) => {
                tracing::warn!(thing = %self.thing_id, error = %e, "thing delete failed");
            }
        }

        let resp = self
            .request(Method::PUT, &url)
            .json(&json!({ "policyId": self.policy_id }))
            .send()
            .await?;
        ensure_success(resp).await?;
        tracing::info!(thing = %self.thing_id, policy = %self.policy_id, "created thing");
        Ok(())
    }

    async fn fetch(&self, key: &FeatureKey) -> Result<Option<FeatureEntry>, StoreError> {
        let resp = self
            .request(Method::GET, &self.properties_url(key))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = ensure_success(resp).await?.bytes().await?;
        let entry = serde_json::from_slice(&bytes)?;
        Ok(Some(entry))
    }

    async fn put(&self, key: &FeatureKey, entry: &FeatureEntry) -> Result<(), StoreError> {
        let resp = self
            .request(Method::PUT, &self.properties_url(key))
            .json(entry)
            .send()
            .await?;
        ensure_success(resp).await?;
        tracing::debug!(feature = %key, "updated feature properties");
        Ok(())
    }

    async fn create(&self, key: &FeatureKey) -> Result<(), StoreError> {
        let resp = self
            .request(Method::PUT, &self.feature_url(key))
            .json(&json!({ "properties": {} }))
            .send()
            .await?;
        ensure_success(resp).await?;
        tracing::info!(feature = %key, "created feature");
        Ok(())
    }

    async fn feature_ids(&self) -> Result<Vec<String>, StoreError> {
        let url = format!("{}/features", self.thing_url());
        let resp = self.request(Method::GET, &url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let bytes = ensure_success(resp).await?.bytes().await?;
        let features: BTreeMap<String, IgnoredAny> = serde_json::from_slice(&bytes)?;
        Ok(features.into_keys().collect())
    }
}
