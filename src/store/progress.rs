//! Progress persisted as a JSON map inside a [`LocalStore`]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{LocalStore, ProgressStore};
use crate::error::{LevelError, Result};

/// Default file the progress map is written to
pub const PROGRESS_FILE: &str = "progress.json";

pub struct StoreProgress {
    store: Arc<dyn LocalStore>,
    path: String,
    values: Mutex<BTreeMap<String, i64>>,
}

impl StoreProgress {
    /// Load the progress map from `path`; a missing or unreadable file starts empty
    pub fn open(store: Arc<dyn LocalStore>, path: impl Into<String>) -> Self {
        let path = path.into();
        let values = match store.read_file(&path) {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable progress file {}: {}", path, e);
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read progress file {}: {}", path, e);
                BTreeMap::new()
            }
        };

        Self {
            store,
            path,
            values: Mutex::new(values),
        }
    }

    pub fn open_default(store: Arc<dyn LocalStore>) -> Self {
        Self::open(store, PROGRESS_FILE)
    }
}

impl ProgressStore for StoreProgress {
    fn get(&self, key: &str) -> Option<i64> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.get(key).copied()
    }

    fn set(&self, key: &str, value: i64) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        let mut next = values.clone();
        next.insert(key.to_string(), value);

        let bytes = serde_json::to_vec_pretty(&next).map_err(|e| LevelError::serialize("progress", e))?;
        self.store.write_file(&self.path, &bytes)?;
        *values = next;
        Ok(())
    }
}
