//! services/studio/src/adapters/storage.rs
//!
//! This module contains the client-scoped persistence adapter: one JSON file
//! per key under a root directory, the desktop stand-in for browser local
//! storage. It implements the `KeyValueStore` port from the `core` crate.

use async_trait::async_trait;
use design_consultant_core::ports::{KeyValueStore, StorageResult};
use std::io::ErrorKind;
use std::path::PathBuf;

/// A key-value store that keeps each key in `{root}/{key}.json`.
#[derive(Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Creates a new `JsonFileStore` rooted at `root`. The directory itself is
    /// created lazily on the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn load(&self, key: &str) -> StorageResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }

    async fn clear(&self, key: &str) -> StorageResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
