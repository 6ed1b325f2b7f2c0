// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The key/value store contract consumed by the engine.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document already exists: {0}")]
    AlreadyExists(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt document at {key}: {message}")]
    Corrupt { key: String, message: String },
}

/// Opaque key/value persistence contract.
///
/// Every write is atomic per key: a crash observes either the old or the
/// new document, never a partial one. Implementations must be safe to
/// share across threads; the engine serializes per-case access in
/// process.
#[async_trait]
pub trait Store: Send + Sync {
    /// Durably create a new document. Fails with
    /// [`StoreError::AlreadyExists`] if the key is present.
    async fn save(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Idempotent upsert.
    async fn save_or_update(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Read a document, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Delete a document; returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// All keys starting with `prefix`, sorted.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Increment and return a named monotonic counter (first value is 1).
    async fn incr_counter(&self, name: &str) -> Result<u64, StoreError>;
}

/// Read and deserialize a document into the requested shape.
pub async fn read_doc<S, T>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    S: Store + ?Sized,
    T: DeserializeOwned,
{
    match store.get(key).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Corrupt { key: key.to_string(), message: e.to_string() }),
        None => Ok(None),
    }
}

/// Serialize and upsert a document.
pub async fn write_doc<S, T>(store: &S, key: &str, value: &T) -> Result<(), StoreError>
where
    S: Store + ?Sized,
    T: Serialize,
{
    store.save_or_update(key, serde_json::to_value(value)?).await
}
