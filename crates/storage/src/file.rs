// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-JSON-document-per-key store on the local filesystem.
//!
//! Writes are atomic: the document is written to a temp file, fsynced,
//! then renamed into place, so a crash observes either the old or the new
//! document. Each document carries its own key in an envelope; the file
//! path is only a sanitized rendering of it.

use crate::store::{Store, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

#[derive(Serialize, Deserialize)]
struct Envelope {
    key: String,
    value: Value,
}

/// File-backed store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    sep: char,
    /// Serializes check-then-write sequences (save, counters)
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Open (or create) a store rooted at `root`, splitting keys on `sep`
    /// to build the directory layout.
    pub fn open(root: impl Into<PathBuf>, sep: char) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join("docs"))?;
        fs::create_dir_all(root.join("counters"))?;
        Ok(Self { root, sep, write_lock: Arc::new(Mutex::new(())) })
    }

    fn doc_path(&self, key: &str) -> PathBuf {
        let mut path = self.root.join("docs");
        let segments: Vec<String> = key.split(self.sep).map(sanitize_segment).collect();
        let last = segments.len().saturating_sub(1);
        for (i, segment) in segments.into_iter().enumerate() {
            if i == last {
                path.push(format!("{segment}.json"));
            } else {
                path.push(segment);
            }
        }
        path
    }

    fn counter_path(&self, name: &str) -> PathBuf {
        self.root.join("counters").join(sanitize_segment(name))
    }

    fn read_envelope(&self, key: &str, path: &Path) -> Result<Option<Envelope>, StoreError> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let envelope: Envelope = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(key, path = %path.display(), error = %e, "corrupt document");
            StoreError::Corrupt { key: key.to_string(), message: e.to_string() }
        })?;
        Ok(Some(envelope))
    }

    fn write_envelope(&self, key: &str, value: Value, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let envelope = Envelope { key: key.to_string(), value };
        let bytes = serde_json::to_vec(&envelope)?;
        write_atomic(path, &bytes)?;
        Ok(())
    }
}

#[async_trait]
impl Store for FileStore {
    async fn save(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.doc_path(key);
        let _guard = self.write_lock.lock();
        if path.exists() {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        self.write_envelope(key, value, &path)
    }

    async fn save_or_update(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.doc_path(key);
        let _guard = self.write_lock.lock();
        self.write_envelope(key, value, &path)
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.doc_path(key);
        match self.read_envelope(key, &path)? {
            Some(envelope) if envelope.key == key => Ok(Some(envelope.value)),
            _ => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.doc_path(key);
        let _guard = self.write_lock.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        collect_keys(&self.root.join("docs"), prefix, &mut keys)?;
        keys.sort();
        Ok(keys)
    }

    async fn incr_counter(&self, name: &str) -> Result<u64, StoreError> {
        let path = self.counter_path(name);
        let _guard = self.write_lock.lock();
        let current = match fs::read_to_string(&path) {
            Ok(s) => s.trim().parse::<u64>().unwrap_or(0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        let next = current + 1;
        write_atomic(&path, next.to_string().as_bytes())?;
        Ok(next)
    }
}

/// Write bytes to `path` via temp file + fsync + rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Map a key segment to a filesystem-safe name.
fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' })
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "_".to_string()
    } else {
        cleaned
    }
}

fn collect_keys(dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<(), StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_keys(&path, prefix, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            let bytes = fs::read(&path)?;
            match serde_json::from_slice::<Envelope>(&bytes) {
                Ok(envelope) if envelope.key.starts_with(prefix) => out.push(envelope.key),
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping corrupt document");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
