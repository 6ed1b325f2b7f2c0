// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process store for tests and embedders with external durability.

use crate::store::{Store, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryInner {
    docs: BTreeMap<String, Value>,
    counters: HashMap<String, u64>,
}

/// Store keeping every document in memory. Cloning shares the data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.inner.lock().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().docs.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn save(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.docs.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        inner.docs.insert(key.to_string(), value);
        Ok(())
    }

    async fn save_or_update(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.inner.lock().docs.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.inner.lock().docs.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.inner.lock().docs.remove(key).is_some())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .inner
            .lock()
            .docs
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn incr_counter(&self, name: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock();
        let counter = inner.counters.entry(name.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
