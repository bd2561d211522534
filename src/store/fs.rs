//! Filesystem-backed asset loader and local store

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;

use super::{AssetLoader, LocalStore};
use crate::error::{LevelError, Result};

/// Loads bundled assets from a directory on disk
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AssetLoader for FsAssetLoader {
    async fn load_bundled_text(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.root.join(path);
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(LevelError::AssetNotFound(path.to_string())),
            Err(e) => Err(LevelError::storage(full.display().to_string(), e)),
        }
    }
}

/// Stores files under a root directory.
///
/// Writes go through a temp file and a rename so a crash never leaves a
/// half-written catalog behind, and an exclusive lock file serializes writers
/// to the same path.
#[derive(Debug, Clone)]
pub struct FsLocalStore {
    root: PathBuf,
}

impl FsLocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl LocalStore for FsLocalStore {
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full = self.resolve(path);
        match std::fs::read(&full) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LevelError::storage(full.display().to_string(), e)),
        }
    }

    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        let err = |e: std::io::Error| LevelError::storage(full.display().to_string(), e);

        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(err)?;
        }

        let lock_path = with_suffix(&full, ".lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(err)?;
        lock_file.lock_exclusive().map_err(err)?;

        let temp_path = with_suffix(&full, ".tmp");
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(err)?;
        temp_file.write_all(bytes).map_err(err)?;
        temp_file.sync_all().map_err(err)?;

        std::fs::rename(&temp_path, &full).map_err(err)?;

        // lock released when lock_file drops
        Ok(())
    }
}

/// Append a suffix to the full file name (`a/b.json` -> `a/b.json.tmp`)
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
