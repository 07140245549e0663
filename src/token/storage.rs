//! Token Storage
//!
//! Persistence for the token record and the pending PKCE pair. The file
//! store replaces each file wholesale (temp file, fsync, rename) so a reader
//! never sees a half-written record. Two processes sharing the same paths
//! race with last-writer-wins semantics; there is no locking.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::StorageError;
use crate::types::{PkceChallenge, TokenRecord};

/// Token storage interface.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load_token(&self) -> Result<Option<TokenRecord>, StorageError>;

    /// Replace the stored token record.
    async fn save_token(&self, token: &TokenRecord) -> Result<(), StorageError>;

    async fn clear_token(&self) -> Result<(), StorageError>;

    async fn load_pkce(&self) -> Result<Option<PkceChallenge>, StorageError>;

    /// Replace any pending PKCE pair.
    async fn save_pkce(&self, pkce: &PkceChallenge) -> Result<(), StorageError>;

    async fn clear_pkce(&self) -> Result<(), StorageError>;
}

/// JSON files on local disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    token_path: PathBuf,
    pkce_path: PathBuf,
}

impl FileTokenStore {
    pub fn new(token_path: impl Into<PathBuf>, pkce_path: impl Into<PathBuf>) -> Self {
        Self {
            token_path: token_path.into(),
            pkce_path: pkce_path.into(),
        }
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    pub fn pkce_path(&self) -> &Path {
        &self.pkce_path
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::Corrupted {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

async fn write_json_atomic<T: Serialize + Sync>(path: &Path, value: &T) -> Result<(), StorageError> {
    let write_err = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let json = serde_json::to_vec_pretty(value).map_err(|e| StorageError::Corrupted {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .await
        .map_err(write_err)?;
    file.write_all(&json).await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, path).await.map_err(write_err)
}

async fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StorageError::Delete {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load_token(&self) -> Result<Option<TokenRecord>, StorageError> {
        read_json(&self.token_path).await
    }

    async fn save_token(&self, token: &TokenRecord) -> Result<(), StorageError> {
        write_json_atomic(&self.token_path, token).await?;
        tracing::debug!(path = %self.token_path.display(), "Token saved");
        Ok(())
    }

    async fn clear_token(&self) -> Result<(), StorageError> {
        remove_if_exists(&self.token_path).await
    }

    async fn load_pkce(&self) -> Result<Option<PkceChallenge>, StorageError> {
        read_json(&self.pkce_path).await
    }

    async fn save_pkce(&self, pkce: &PkceChallenge) -> Result<(), StorageError> {
        write_json_atomic(&self.pkce_path, pkce).await
    }

    async fn clear_pkce(&self) -> Result<(), StorageError> {
        remove_if_exists(&self.pkce_path).await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory token storage, with a count of writes for assertions.
#[derive(Default)]
pub struct InMemoryTokenStore {
    token: Mutex<Option<TokenRecord>>,
    pkce: Mutex<Option<PkceChallenge>>,
    token_writes: Mutex<u32>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: TokenRecord) -> Self {
        let store = Self::default();
        *lock(&store.token) = Some(token);
        store
    }

    pub fn token(&self) -> Option<TokenRecord> {
        lock(&self.token).clone()
    }

    pub fn pkce(&self) -> Option<PkceChallenge> {
        lock(&self.pkce).clone()
    }

    pub fn token_writes(&self) -> u32 {
        *lock(&self.token_writes)
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load_token(&self) -> Result<Option<TokenRecord>, StorageError> {
        Ok(self.token())
    }

    async fn save_token(&self, token: &TokenRecord) -> Result<(), StorageError> {
        *lock(&self.token) = Some(token.clone());
        *lock(&self.token_writes) += 1;
        Ok(())
    }

    async fn clear_token(&self) -> Result<(), StorageError> {
        *lock(&self.token) = None;
        Ok(())
    }

    async fn load_pkce(&self) -> Result<Option<PkceChallenge>, StorageError> {
        Ok(self.pkce())
    }

    async fn save_pkce(&self, pkce: &PkceChallenge) -> Result<(), StorageError> {
        *lock(&self.pkce) = Some(pkce.clone());
        Ok(())
    }

    async fn clear_pkce(&self) -> Result<(), StorageError> {
        *lock(&self.pkce) = None;
        Ok(())
    }
}
