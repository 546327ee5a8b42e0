use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::{FeatureStore, StoreError};
use crate::domain::{FeatureEntry, FeatureKey};

/// Process-local feature store with the same overwrite semantics as Ditto.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    features: Mutex<BTreeMap<String, FeatureEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Stores an entry under a raw feature id, bypassing key validation.
    pub fn insert_raw(&self, id: &str, entry: FeatureEntry) {
        self.lock().insert(id.to_string(), entry);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, FeatureEntry>> {
        self.features.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl FeatureStore for InMemoryStore {
    async fn reset(&self) -> Result<(), StoreError> {
        self.lock().clear();
        Ok(())
    }

    async fn fetch(&self, key: &FeatureKey) -> Result<Option<FeatureEntry>, StoreError> {
        Ok(self.lock().get(key.as_str()).cloned())
    }

    async fn put(&self, key: &FeatureKey, entry: &FeatureEntry) -> Result<(), StoreError> {
        self.lock().insert(key.as_str().to_string(), entry.clone());
        Ok(())
    }

    async fn create(&self, key: &FeatureKey) -> Result<(), StoreError> {
        self.lock().insert(key.as_str().to_string(), FeatureEntry::default());
        Ok(())
    }

    async fn feature_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock().keys().cloned().collect())
    }
}
