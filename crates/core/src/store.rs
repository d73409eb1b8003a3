//! RecordStore trait — the read contract the query engine relies on.
//!
//! The engine never owns data. Each call asks the store for one
//! [`Snapshot`] and evaluates everything against it, so a call sees a
//! self-consistent set of records even if the store changes underneath.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StoreError;
use crate::record::Record;

/// An immutable, point-in-time view of some collections.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    collections: HashMap<String, Arc<Vec<Record>>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: impl Into<String>, records: Arc<Vec<Record>>) {
        self.collections.insert(collection.into(), records);
    }

    /// Records of a collection in store order.
    pub fn collection(&self, name: &str) -> Result<&[Record], StoreError> {
        self.collections
            .get(name)
            .map(|records| records.as_slice())
            .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.collections.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// The core RecordStore trait.
///
/// Implementations: in-memory, JSONL directory, unavailable (for testing).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The store name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Take a consistent snapshot of the named collections.
    async fn snapshot(&self, collections: &[&str]) -> Result<Snapshot, StoreError>;

    /// Number of records in a collection.
    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let snapshot = self.snapshot(&[collection]).await?;
        Ok(snapshot.collection(collection)?.len())
    }
}
