//! Report storage on top of the object_store crate
//!
//! Reports are written create-if-absent so a finished file is never
//! replaced and a half-written one is never visible.

use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::{ObjectStore, PutMode, PutOptions, PutPayload, path::Path as StoragePath};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cannot prepare report directory {path}: {source}")]
    Directory {
        path: String,
        source: std::io::Error,
    },

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Result of a create-if-absent write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Created,
    AlreadyExists,
}

/// Report store wrapping object_store
#[derive(Clone)]
pub struct ReportStorage {
    store: Arc<dyn ObjectStore>,
    pub location: String,
}

impl ReportStorage {
    /// Wrap any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>, location: String) -> Self {
        Self { store, location }
    }

    /// Reports as plain files under `dir`, created if missing
    pub fn local(dir: &Path) -> Result<Self> {
        let directory_error = |source| StorageError::Directory {
            path: dir.display().to_string(),
            source,
        };
        std::fs::create_dir_all(dir).map_err(directory_error)?;
        let dir = dir.canonicalize().map_err(directory_error)?;

        let store = LocalFileSystem::new_with_prefix(&dir)?;
        Ok(Self {
            store: Arc::new(store),
            location: dir.display().to_string(),
        })
    }

    /// In-memory storage for tests
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            location: "memory".to_string(),
        }
    }

    /// Read an object, `None` when absent
    pub async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = StoragePath::from(key);

        let result = match self.store.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let bytes = result.bytes().await?;

        tracing::debug!(key, size = bytes.len(), "Loaded from storage");

        Ok(Some(bytes.to_vec()))
    }

    /// Write an object only if nothing exists at `key` yet
    pub async fn create(&self, key: &str, data: Vec<u8>) -> Result<PutOutcome> {
        let path = StoragePath::from(key);
        let size = data.len();

        let options = PutOptions::from(PutMode::Create);
        match self.store.put_opts(&path, PutPayload::from(data), options).await {
            Ok(_) => {
                tracing::info!(key, size, location = %self.location, "Stored report");
                Ok(PutOutcome::Created)
            }
            Err(object_store::Error::AlreadyExists { .. }) => {
                tracing::debug!(key, "Report already present, not overwritten");
                Ok(PutOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = StoragePath::from(key);

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
