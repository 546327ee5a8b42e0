use twin_client::{
    store::Credentials, DittoStore, FeatureEntry, FeatureKey, FeatureStore, InMemoryStore, StoreError,
};

use crate::config::{AppConfig, StoreKind};

/// Feature store chosen by `sync.store`.
pub enum AnyStore {
    Ditto(DittoStore),
    Memory(InMemoryStore),
}

impl AnyStore {
    pub fn from_config(cfg: &AppConfig) -> Result<Self, StoreError> {
        match cfg.sync.store {
            StoreKind::Ditto => {
                let d = &cfg.ditto;
                let store = DittoStore::new(
                    &d.base_url,
                    &d.thing_id,
                    &d.policy_id,
                    Credentials {
                        username: d.username.clone(),
                        password: d.password.clone(),
                    },
                    d.request_timeout(),
                )?;
                tracing::info!(base_url = %d.base_url, thing = %d.thing_id, "using Ditto feature store");
                Ok(Self::Ditto(store))
            }
            StoreKind::Memory => {
                tracing::info!("using in-memory feature store");
                Ok(Self::Memory(InMemoryStore::new()))
            }
        }
    }
}

#[async_trait::async_trait]
impl FeatureStore for AnyStore {
    async fn reset(&self) -> Result<(), StoreError> {
        match self {
            Self::Ditto(s) => s.reset().await,
            Self::Memory(s) => s.reset().await,
        }
    }

    async fn fetch(&self, key: &FeatureKey) -> Result<Option<FeatureEntry>, StoreError> {
        match self {
            Self::Ditto(s) => s.fetch(key).await,
            Self::Memory(s) => s.fetch(key).await,
        }
    }

    async fn put(&self, key: &FeatureKey, entry: &FeatureEntry) -> Result<(), StoreError> {
        match self {
            Self::Ditto(s) => s.put(key, entry).await,
            Self::Memory(s) => s.put(key, entry).await,
        }
    }

    async fn create(&self, key: &FeatureKey) -> Result<(), StoreError> {
        match self {
            Self::Ditto(s) => s.create(key).await,
            Self::Memory(s) => s.create(key).await,
        }
    }

    async fn feature_ids(&self) -> Result<Vec<String>, StoreError> {
        match self {
            Self::Ditto(s) => s.feature_ids().await,
            Self::Memory(s) => s.feature_ids().await,
        }
    }
}
