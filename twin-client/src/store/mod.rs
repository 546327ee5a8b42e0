//! Per-date feature storage on a device twin.
//!
//! Every write replaces the whole properties object of a feature; callers that
//! want to extend an entry read it, modify it and put it back.

pub mod ditto;
pub mod memory;

pub use ditto::{Credentials, DittoStore};
pub use memory::InMemoryStore;

use crate::domain::{FeatureEntry, FeatureKey};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("feature payload does not match schema: {0}")]
    Schema(#[from] serde_json::Error),
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Schema(_) => None,
        }
    }
}

#[async_trait::async_trait]
pub trait FeatureStore: Send + Sync {
    /// Drops the device thing and recreates it empty.
    async fn reset(&self) -> Result<(), StoreError>;

    /// Reads a feature's properties; `None` when the feature does not exist.
    async fn fetch(&self, key: &FeatureKey) -> Result<Option<FeatureEntry>, StoreError>;

    /// Overwrites a feature's properties.
    async fn put(&self, key: &FeatureKey, entry: &FeatureEntry) -> Result<(), StoreError>;

    /// Creates the feature with empty properties.
    async fn create(&self, key: &FeatureKey) -> Result<(), StoreError>;

    /// Ids of all features on the thing, in no particular order.
    async fn feature_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Like [`fetch`](Self::fetch), but a missing feature reads as an empty entry.
    async fn get(&self, key: &FeatureKey) -> Result<FeatureEntry, StoreError> {
        Ok(self.fetch(key).await?.unwrap_or_default())
    }

    async fn ensure_exists(&self, key: &FeatureKey) -> Result<(), StoreError> {
        if !self.get(key).await?.is_empty() {
            return Ok(());
        }
        self.create(key).await
    }
}
