//! Durable key/value entries for the client-local state: favorites, theme and the auth session.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

pub const FAVORITES_KEY: &str = "favorites";
pub const THEME_KEY: &str = "theme";
pub const AUTH_USER_KEY: &str = "auth_user";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Local storage is unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("Local storage entry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub type SharedLocalStore = Arc<dyn LocalStore>;

/// Reads an entry, treating anything unreadable as absent.
pub async fn restore<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Option<T> {
    let value = match store.get(key).await {
        Ok(value) => value?,
        Err(e) => {
            warn!("Ignoring unreadable local entry {key}: {e}");
            return None;
        }
    };
    serde_json::from_value(value)
        .inspect_err(|e| warn!("Ignoring malformed local entry {key}: {e}"))
        .ok()
}

/// Writes an entry. Storage failures are logged and otherwise ignored.
pub async fn persist<T: Serialize>(store: &dyn LocalStore, key: &str, value: &T) {
    let result = match serde_json::to_value(value) {
        Ok(value) => store.set(key, value).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        warn!("Could not persist local entry {key}: {e}");
    }
}

pub async fn forget(store: &dyn LocalStore, key: &str) {
    if let Err(e) = store.remove(key).await {
        warn!("Could not remove local entry {key}: {e}");
    }
}

//--------------------------- File ------------------------------

/// One `<key>.json` file per entry under the state directory.
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    directory: PathBuf,
}

impl FileLocalStore {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self { directory: directory.as_ref().to_path_buf() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }
}

#[async_trait]
impl LocalStore for FileLocalStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let bytes = serde_json::to_vec_pretty(&value)?;
        tokio::fs::write(self.path(key), bytes).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

//-------------------------- Memory -----------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryLocalStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LocalStore for MemoryLocalStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries().insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

//-------------------------- Tests -------------------------------
