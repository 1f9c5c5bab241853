//! Persistent ticket counter.
//!
//! The counter is a single JSON document, `{ "count": n }`, holding the
//! number of the most recently issued ticket. All read-modify-write cycles
//! go through the store's mutex so concurrent opens never share a number.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct CounterFile {
    #[serde(default)]
    count: Option<i64>,
}

/// Counter store errors
#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode counter: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed ticket counter.
pub struct CounterStore {
    path: PathBuf,
    default: i64,
    lock: Mutex<()>,
}

impl CounterStore {
    /// Create a store backed by `path`, reporting `default` while nothing
    /// valid is persisted.
    pub fn new(path: impl Into<PathBuf>, default: i64) -> Self {
        Self {
            path: path.into(),
            default,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last stored value, or the default when the file is missing or malformed.
    pub async fn get_count(&self) -> i64 {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.default,
            Err(e) => {
                warn!("Failed to read ticket counter {:?}: {}", self.path, e);
                return self.default;
            }
        };

        match serde_json::from_str::<CounterFile>(&raw) {
            Ok(CounterFile { count: Some(count) }) => count,
            Ok(CounterFile { count: None }) => self.default,
            Err(e) => {
                warn!(
                    "Ticket counter {:?} is malformed ({}), using default {}",
                    self.path, e, self.default
                );
                self.default
            }
        }
    }

    /// Overwrite the persisted value.
    ///
    /// The document is written to a sibling temp file and renamed into place.
    pub async fn save_count(&self, count: i64) -> Result<(), CounterError> {
        let body = serde_json::to_string(&CounterFile { count: Some(count) })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|source| self.io_error(source))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        debug!(count, "Ticket counter saved");
        Ok(())
    }

    /// Allocate the next ticket number and persist it.
    pub async fn next_number(&self) -> Result<i64, CounterError> {
        let _guard = self.lock.lock().await;
        let next = self.get_count().await.saturating_add(1);
        self.save_count(next).await?;
        Ok(next)
    }

    /// Administrative override. No bounds are enforced.
    pub async fn set_count(&self, count: i64) -> Result<(), CounterError> {
        let _guard = self.lock.lock().await;
        self.save_count(count).await
    }

    /// Raise the stored value to at least `floor`.
    ///
    /// Returns whether anything was written.
    pub async fn raise_to(&self, floor: i64) -> Result<bool, CounterError> {
        let _guard = self.lock.lock().await;
        if self.get_count().await >= floor {
            return Ok(false);
        }
        self.save_count(floor).await?;
        Ok(true)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ticket_count.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> CounterError {
        CounterError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn store_in(dir: &tempfile::TempDir, default: i64) -> CounterStore {
        CounterStore::new(dir.path().join("ticket_count.json"), default)
    }

    #[tokio::test]
    async fn missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, 7);
        assert_eq!(store.get_count().await, 7);
    }

    #[tokio::test]
    async fn persisted_value_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, 0);
        store.save_count(41).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"count":41}"#);
        assert_eq!(store.get_count().await, 41);
    }

    #[tokio::test]
    async fn next_number_increments_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ticket_count.json"), r#"{"count": 12}"#).unwrap();
        let store = store_in(&dir, 0);

        assert_eq!(store.next_number().await.unwrap(), 13);
        assert_eq!(store.get_count().await, 13);

        // A fresh store over the same file sees the persisted value.
        let reopened = store_in(&dir, 0);
        assert_eq!(reopened.next_number().await.unwrap(), 14);
    }

    #[tokio::test]
    async fn malformed_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ticket_count.json"), "{not json").unwrap();
        let store = store_in(&dir, 5);

        assert_eq!(store.get_count().await, 5);
        assert_eq!(store.next_number().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn missing_count_key_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ticket_count.json"), r#"{"other": 3}"#).unwrap();
        let store = store_in(&dir, 2);
        assert_eq!(store.get_count().await, 2);
    }

    #[tokio::test]
    async fn set_count_overrides_without_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, 0);

        store.set_count(1221).await.unwrap();
        assert_eq!(store.next_number().await.unwrap(), 1222);

        store.set_count(-3).await.unwrap();
        assert_eq!(store.get_count().await, -3);
    }

    #[tokio::test]
    async fn raise_to_never_lowers() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir, 0);
        store.save_count(10).await.unwrap();

        assert!(!store.raise_to(7).await.unwrap());
        assert_eq!(store.get_count().await, 10);

        assert!(store.raise_to(15).await.unwrap());
        assert_eq!(store.get_count().await, 15);
        assert_eq!(store.next_number().await.unwrap(), 16);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = CounterStore::new(dir.path().join("state/nested/count.json"), 0);
        assert_eq!(store.next_number().await.unwrap(), 1);
        assert!(dir.path().join("state/nested/count.json").exists());
        assert!(!dir.path().join("state/nested/count.json.tmp").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir, 0));

        let mut handles = Vec::new();
        for _ in 0..25 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.next_number().await.unwrap() }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }

        assert_eq!(seen.len(), 25);
        assert_eq!(seen.iter().copied().max(), Some(25));
        assert_eq!(store.get_count().await, 25);
    }
}
