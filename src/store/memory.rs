//! In-memory stores for embedding and tests

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{AssetLoader, LocalStore, ProgressStore};
use crate::error::{LevelError, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A map of path to bytes. Serves as both bundled assets and local storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_file(self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        lock(&self.files).insert(path.into(), bytes.into());
        self
    }

    pub fn insert(&self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        lock(&self.files).insert(path.into(), bytes.into());
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.files).remove(path)
    }

    /// All stored paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = lock(&self.files).keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl AssetLoader for MemoryStore {
    async fn load_bundled_text(&self, path: &str) -> Result<Vec<u8>> {
        lock(&self.files)
            .get(path)
            .cloned()
            .ok_or_else(|| LevelError::AssetNotFound(path.to_string()))
    }
}

impl LocalStore for MemoryStore {
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(lock(&self.files).get(path).cloned())
    }

    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<()> {
        lock(&self.files).insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Progress values kept only for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    values: Mutex<HashMap<String, i64>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn get(&self, key: &str) -> Option<i64> {
        lock(&self.values).get(key).copied()
    }

    fn set(&self, key: &str, value: i64) -> Result<()> {
        lock(&self.values).insert(key.to_string(), value);
        Ok(())
    }
}
