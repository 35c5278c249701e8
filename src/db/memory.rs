// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory key-value store for tests and ephemeral sessions.

use super::KeyValueStore;
use crate::error::StorageError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Volatile store. Can be told to fail or stall on `open`.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    fail_open: AtomicBool,
    open_delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a single entry.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }

    /// Store whose `open` always fails.
    pub fn failing() -> Self {
        let store = Self::default();
        store.fail_open.store(true, Ordering::SeqCst);
        store
    }

    /// Delay `open` by the given duration.
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Synchronous peek, for assertions.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn open(&self) -> Result<(), StorageError> {
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(StorageError::Init("memory store configured to fail".to_string()));
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }
}
