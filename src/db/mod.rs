// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable key-value storage for session state.

pub mod file_store;
pub mod memory;

pub use file_store::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;
use async_trait::async_trait;

/// Async key-value store that survives process restarts.
///
/// `open` must be called (and succeed) before the other operations.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Open the underlying store. Calling it again is a no-op.
    async fn open(&self) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;
}
