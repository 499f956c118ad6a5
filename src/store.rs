//! Durable record of files already written to the destination sheet.
//!
//! The store is the seam that makes the dedup gate survive restarts: any
//! keyed backend works as long as it offers membership-test and insert. The
//! default backend is a JSON file under the user config directory, written
//! atomically.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;

/// Membership test and insert over the set of processed file identifiers.
///
/// `mark_processed` must only be called after the destination append was
/// confirmed; the pipeline owns that ordering.
#[async_trait]
pub trait ProcessedStore: Send + Sync {
    async fn contains(&self, file_id: &str) -> Result<bool, StoreError>;
    async fn mark_processed(&self, file_id: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ProcessedStore + ?Sized> ProcessedStore for std::sync::Arc<T> {
    async fn contains(&self, file_id: &str) -> Result<bool, StoreError> {
        (**self).contains(file_id).await
    }

    async fn mark_processed(&self, file_id: &str) -> Result<(), StoreError> {
        (**self).mark_processed(file_id).await
    }
}

/// File-backed store.
///
/// The whole set is rewritten on every insert via temp file + fsync + rename,
/// so a crash mid-write leaves the previous set intact. Volume is low enough
/// that rewriting is a non-issue.
pub struct JsonFileStore {
    path: PathBuf,
    seen: Mutex<HashSet<String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading any previously persisted set.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let seen = if path.exists() {
            let file = File::open(&path)
                .map_err(|e| StoreError(format!("failed to open processed set: {}", e)))?;
            let reader = BufReader::new(file);
            let ids: Vec<String> = serde_json::from_reader(reader)
                .map_err(|e| StoreError(format!("failed to parse processed set: {}", e)))?;
            ids.into_iter().collect()
        } else {
            HashSet::new()
        };

        tracing::debug!(
            "processed set at {} holds {} file id(s)",
            path.display(),
            seen.len()
        );

        Ok(Self {
            path,
            seen: Mutex::new(seen),
        })
    }

    /// Default location: `~/.config/invoice-monitor/processed.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("invoice-monitor")
            .join("processed.json")
    }

    fn persist(&self, seen: &HashSet<String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError(format!("failed to create store directory: {}", e)))?;
        }

        // Sorted so the file is stable across rewrites.
        let mut ids: Vec<&String> = seen.iter().collect();
        ids.sort();

        let temp_path = self.path.with_extension("tmp");
        let file = File::create(&temp_path)
            .map_err(|e| StoreError(format!("failed to create temp file: {}", e)))?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, &ids)
            .map_err(|e| StoreError(format!("failed to serialize processed set: {}", e)))?;
        writer
            .flush()
            .map_err(|e| StoreError(format!("failed to flush processed set: {}", e)))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| StoreError(format!("failed to sync processed set: {}", e)))?;

        fs::rename(&temp_path, &self.path)
            .map_err(|e| StoreError(format!("failed to rename processed set: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ProcessedStore for JsonFileStore {
    async fn contains(&self, file_id: &str) -> Result<bool, StoreError> {
        Ok(self.lock().contains(file_id))
    }

    async fn mark_processed(&self, file_id: &str) -> Result<(), StoreError> {
        let mut seen = self.lock();
        if seen.insert(file_id.to_string()) {
            self.persist(&seen)?;
        }
        Ok(())
    }
}

/// In-memory store implementing the same contract, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    seen: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProcessedStore for MemoryStore {
    async fn contains(&self, file_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .seen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(file_id))
    }

    async fn mark_processed(&self, file_id: &str) -> Result<(), StoreError> {
        self.seen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(file_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mark_and_contains() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("processed.json")).unwrap();

        assert!(!store.contains("file-1").await.unwrap());
        store.mark_processed("file-1").await.unwrap();
        assert!(store.contains("file-1").await.unwrap());
        assert!(!store.contains("file-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.json");

        {
            let store = JsonFileStore::open(path.clone()).unwrap();
            store.mark_processed("file-1").await.unwrap();
            store.mark_processed("file-2").await.unwrap();
        }

        let reopened = JsonFileStore::open(path).unwrap();
        assert!(reopened.contains("file-1").await.unwrap());
        assert!(reopened.contains("file-2").await.unwrap());
        assert!(!reopened.contains("file-3").await.unwrap());
    }

    #[tokio::test]
    async fn test_marking_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.json");
        let store = JsonFileStore::open(path.clone()).unwrap();

        store.mark_processed("file-1").await.unwrap();
        store.mark_processed("file-1").await.unwrap();

        let reopened = JsonFileStore::open(path).unwrap();
        assert!(reopened.contains("file-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_set_is_a_store_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed.json");
        fs::write(&path, "not json").unwrap();

        assert!(JsonFileStore::open(path).is_err());
    }

    #[tokio::test]
    async fn test_memory_store_contract() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.mark_processed("a").await.unwrap();
        assert!(store.contains("a").await.unwrap());
        assert_eq!(store.len(), 1);
    }
}
