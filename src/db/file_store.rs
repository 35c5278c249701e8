// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON-file backed key-value store.
//!
//! The whole store is one small JSON object. Every write rewrites the file
//! through a temporary sibling and a rename, so a crash never leaves a torn
//! document behind.

use super::KeyValueStore;
use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Key-value store persisted as a JSON document on disk.
pub struct FileStore {
    path: PathBuf,
    /// `None` until `open` succeeds.
    entries: Mutex<Option<BTreeMap<String, String>>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn open(&self) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().await;
        if entries.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Init(format!("{}: {}", parent.display(), e)))?;
        }

        let loaded = match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StorageError::Init(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        tracing::debug!(
            path = %self.path.display(),
            keys = loaded.len(),
            "Opened session store"
        );
        *entries = Some(loaded);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().await;
        let entries = entries.as_ref().ok_or(StorageError::NotOpen)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.entries.lock().await;
        let entries = guard.as_mut().ok_or(StorageError::NotOpen)?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.entries.lock().await;
        let entries = guard.as_mut().ok_or(StorageError::NotOpen)?;
        if entries.remove(key).is_some() {
            self.persist(entries).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self.entries.lock().await;
        let entries = guard.as_mut().ok_or(StorageError::NotOpen)?;
        entries.clear();
        self.persist(entries).await
    }
}
