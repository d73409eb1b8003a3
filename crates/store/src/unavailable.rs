//! Unavailable store — every read fails.
//!
//! Stands in for a backend that could not be reached so callers can
//! exercise their "store unavailable" path without a real outage.

use async_trait::async_trait;
use dossier_core::error::StoreError;
use dossier_core::store::{RecordStore, Snapshot};

pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl RecordStore for UnavailableStore {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn snapshot(&self, _collections: &[&str]) -> Result<Snapshot, StoreError> {
        Err(StoreError::Unavailable {
            store: self.name().to_string(),
            reason: self.reason.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_read_fails() {
        let store = UnavailableStore::new("connection refused");
        let err = store.count("cases").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Record store 'unavailable' is unavailable: connection refused"
        );
    }
}
