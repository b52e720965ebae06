mod session;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use crate::config::Config;
use crate::error::AppResult;

pub use session::{keys, Session};

/// Change notification, the server-side analogue of the browser `storage` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageEvent {
    pub key: String,
    /// `false` when the key was removed
    pub present: bool,
}

/// String key/value store with local-storage semantics. The whole map is
/// rewritten to `path` after every mutation; last write wins.
#[derive(Clone)]
pub struct LocalStore {
    items: Arc<RwLock<BTreeMap<String, String>>>,
    path: Option<PathBuf>,
    events: broadcast::Sender<StorageEvent>,
}

impl LocalStore {
    fn with_items(items: BTreeMap<String, String>, path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            items: Arc::new(RwLock::new(items)),
            path,
            events,
        }
    }

    pub fn in_memory() -> Self {
        Self::with_items(BTreeMap::new(), None)
    }

    /// Open a file-backed store. A missing file starts empty; so does an
    /// unreadable one, after logging why.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();

        let items: BTreeMap<String, String> = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Store file is corrupt, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = items.len(), "Opened store");
        Ok(Self::with_items(items, Some(path)))
    }

    pub async fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().await.get(key).cloned()
    }

    pub async fn set_item(&self, key: &str, value: String) -> AppResult<()> {
        let mut items = self.items.write().await;
        let mut next = items.clone();
        next.insert(key.to_string(), value);
        self.commit(&mut items, next).await?;
        self.notify(key, true);
        Ok(())
    }

    pub async fn remove_item(&self, key: &str) -> AppResult<()> {
        let mut items = self.items.write().await;
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.commit(&mut items, next).await?;
        self.notify(key, false);
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    /// Memory only changes once the file write went through
    async fn commit(
        &self,
        items: &mut BTreeMap<String, String>,
        next: BTreeMap<String, String>,
    ) -> AppResult<()> {
        self.persist(&next).await?;
        *items = next;
        Ok(())
    }

    async fn persist(&self, items: &BTreeMap<String, String>) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let raw = serde_json::to_string_pretty(items)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, raw).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    fn notify(&self, key: &str, present: bool) {
        // no subscribers is fine
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            present,
        });
    }
}

pub async fn connect(config: &Config) -> AppResult<LocalStore> {
    match &config.store_path {
        Some(path) => LocalStore::open(path).await,
        None => Ok(LocalStore::in_memory()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = LocalStore::open(&path).await.unwrap();
        store.set_item("a", "1".to_string()).await.unwrap();
        store.set_item("b", "2".to_string()).await.unwrap();
        store.remove_item("a").await.unwrap();

        let reopened = LocalStore::open(&path).await.unwrap();
        assert_eq!(reopened.get_item("a").await, None);
        assert_eq!(reopened.get_item("b").await.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = LocalStore::open(&path).await.unwrap();
        assert_eq!(store.get_item("ridelink:auth").await, None);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = LocalStore::open(&path).await.unwrap();
        store.set_item("kept", "1".to_string()).await.unwrap();
        let mut rx = store.subscribe();

        // the tmp file can no longer be created next to the store
        std::fs::remove_dir_all(dir.path()).unwrap();

        assert!(store.set_item("lost", "2".to_string()).await.is_err());
        assert!(store.remove_item("kept").await.is_err());

        assert_eq!(store.get_item("lost").await, None);
        assert_eq!(store.get_item("kept").await.as_deref(), Some("1"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mutations_are_broadcast() {
        let store = LocalStore::in_memory();
        let mut rx = store.subscribe();

        store.set_item("k", "v".to_string()).await.unwrap();
        store.remove_item("k").await.unwrap();
        // removing a missing key is silent
        store.remove_item("k").await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), StorageEvent { key: "k".to_string(), present: true });
        assert_eq!(rx.recv().await.unwrap(), StorageEvent { key: "k".to_string(), present: false });
        assert!(rx.try_recv().is_err());
    }
}
