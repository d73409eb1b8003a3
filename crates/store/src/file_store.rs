//! File-based store — one JSON-lines file per collection.
//!
//! Layout: `<data_dir>/<collection>.jsonl`, each line one JSON object
//! validated against the collection's [`Schema`]. Files are read fresh on
//! every snapshot, so edits on disk show up on the next call.

use async_trait::async_trait;
use dossier_core::error::StoreError;
use dossier_core::record::{Record, Schema};
use dossier_core::store::{RecordStore, Snapshot};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A read-mostly store over a directory of JSONL files.
pub struct FileStore {
    dir: PathBuf,
    schemas: HashMap<String, Schema>,
}

impl FileStore {
    /// Create a store over `dir`, knowing how to read the given collections.
    pub fn new(dir: impl Into<PathBuf>, schemas: impl IntoIterator<Item = Schema>) -> Self {
        let schemas = schemas
            .into_iter()
            .map(|s| (s.collection.clone(), s))
            .collect();
        Self {
            dir: dir.into(),
            schemas,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.jsonl"))
    }

    fn unavailable(&self, reason: String) -> StoreError {
        StoreError::Unavailable {
            store: format!("file:{}", self.dir.display()),
            reason,
        }
    }

    /// Load and validate one collection file.
    async fn load(&self, schema: &Schema) -> Result<Vec<Record>, StoreError> {
        let path = self.path_for(&schema.collection);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| self.unavailable(format!("Failed to read {}: {e}", path.display())))?;

        let mut records = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let corrupt = |reason: String| StoreError::Corrupt {
                collection: schema.collection.clone(),
                line: index + 1,
                reason,
            };
            let raw: serde_json::Value =
                serde_json::from_str(line).map_err(|e| corrupt(e.to_string()))?;
            let record = schema.validate(&raw).map_err(|e| corrupt(e.to_string()))?;
            records.push(record);
        }

        debug!(path = %path.display(), count = records.len(), "Collection loaded");
        Ok(records)
    }

    /// Write a collection as JSONL, replacing the file.
    pub async fn write_collection(&self, collection: &str, records: &[Record]) -> Result<(), StoreError> {
        if !self.schemas.contains_key(collection) {
            return Err(StoreError::UnknownCollection(collection.to_string()));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.unavailable(format!("Failed to create data directory: {e}")))?;

        let mut content = String::new();
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|e| self.unavailable(format!("Failed to serialize record: {e}")))?;
            content.push_str(&line);
            content.push('\n');
        }

        let path = self.path_for(collection);
        tokio::fs::write(&path, &content)
            .await
            .map_err(|e| self.unavailable(format!("Failed to write {}: {e}", path.display())))?;

        debug!(path = %path.display(), count = records.len(), "Collection written");
        Ok(())
    }

    /// Collections with a schema but no file on disk.
    pub fn missing_collections(&self) -> Vec<&str> {
        let mut missing: Vec<&str> = self
            .schemas
            .keys()
            .filter(|name| !self.path_for(name).exists())
            .map(|name| name.as_str())
            .collect();
        missing.sort_unstable();
        missing
    }
}

#[async_trait]
impl RecordStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn snapshot(&self, names: &[&str]) -> Result<Snapshot, StoreError> {
        if !self.dir.is_dir() {
            warn!(dir = %self.dir.display(), "Data directory does not exist");
            return Err(self.unavailable("data directory does not exist".into()));
        }

        let mut snapshot = Snapshot::new();
        for name in names {
            let schema = self
                .schemas
                .get(*name)
                .ok_or_else(|| StoreError::UnknownCollection(name.to_string()))?;
            let records = self.load(schema).await?;
            snapshot.insert(*name, Arc::new(records));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::record::{FieldKind, FieldValue};
    use tempfile::TempDir;

    fn invoices() -> Schema {
        Schema::new("invoices")
            .required("customer_id", FieldKind::Text)
            .field("amount", FieldKind::Money)
            .field("due_date", FieldKind::Date)
            .field("status", FieldKind::Text)
            .status("status", &["paid", "void"])
    }

    #[tokio::test]
    async fn reads_jsonl_and_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("invoices.jsonl"),
            "{\"id\":\"INV-1\",\"customer_id\":\"C-1\",\"amount\":\"99.90\",\"due_date\":\"2024-05-01\"}\n\
             \n\
             {\"id\":\"INV-2\",\"customer_id\":\"C-2\",\"amount\":12.5,\"status\":\"paid\"}\n",
        )
        .unwrap();

        let store = FileStore::new(dir.path(), [invoices()]);
        let snapshot = store.snapshot(&["invoices"]).await.unwrap();
        let records = snapshot.collection("invoices").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), "INV-1");
        assert_eq!(records[1].text("amount").as_deref(), Some("12.5"));
    }

    #[tokio::test]
    async fn corrupt_line_reports_position() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("invoices.jsonl"),
            "{\"id\":\"INV-1\",\"customer_id\":\"C-1\"}\n{\"id\":\"INV-2\",\"due_date\":\"soon\",\"customer_id\":\"C-1\"}\n",
        )
        .unwrap();

        let store = FileStore::new(dir.path(), [invoices()]);
        let err = store.snapshot(&["invoices"]).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { line: 2, .. }));
    }

    #[tokio::test]
    async fn missing_directory_is_unavailable_not_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nope"), [invoices()]);
        let err = store.snapshot(&["invoices"]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path(), [invoices()]);
        assert_eq!(store.missing_collections(), vec!["invoices"]);
        let err = store.snapshot(&["invoices"]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn write_then_read_keeps_values_exact() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("data"), [invoices()]);
        let record = Record::new("INV-7")
            .with("customer_id", FieldValue::text("C-3"))
            .with("amount", FieldValue::Money("0.10".parse().unwrap()));

        store.write_collection("invoices", &[record.clone()]).await.unwrap();
        let snapshot = store.snapshot(&["invoices"]).await.unwrap();
        assert_eq!(snapshot.collection("invoices").unwrap(), &[record]);
        assert!(store.missing_collections().is_empty());
        assert!(store.dir().join("invoices.jsonl").is_file());
    }

    #[tokio::test]
    async fn unknown_collection_has_no_schema() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path(), [invoices()]);
        let err = store.write_collection("cases", &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownCollection(_)));
    }
}
