//! In-memory store — sample datasets, tests and ephemeral sessions.

use async_trait::async_trait;
use dossier_core::error::StoreError;
use dossier_core::record::Record;
use dossier_core::store::{RecordStore, Snapshot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A store that keeps every collection as a shared, immutable `Vec`.
///
/// A snapshot clones the `Arc`s under one read lock, so it stays valid and
/// unchanged for as long as the caller holds it.
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Arc<Vec<Record>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Builder-style seeding before the store is shared.
    pub fn with_collection(mut self, name: impl Into<String>, records: Vec<Record>) -> Self {
        self.collections
            .get_mut()
            .insert(name.into(), Arc::new(records));
        self
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn snapshot(&self, names: &[&str]) -> Result<Snapshot, StoreError> {
        let collections = self.collections.read().await;
        let mut snapshot = Snapshot::new();
        for name in names {
            let records = collections
                .get(*name)
                .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))?;
            snapshot.insert(*name, Arc::clone(records));
        }
        Ok(snapshot)
    }
}
