//! Collaborators the coordinator talks to
//!
//! The core never touches the filesystem, network or cloud config directly.
//! Each concern sits behind a trait so the engine (or a test) can supply its
//! own implementation:
//!
//! - [`AssetLoader`]: bundled, read-only content shipped with the app
//! - [`LocalStore`]: writable storage for downloaded catalogs and stages
//! - [`Downloader`]: fetches a URL into the local store
//! - [`RemoteConfigProvider`]: cloud-config descriptors and rules
//! - [`ProgressStore`]: small integer key-value store for player progress

mod fs;
mod http;
mod memory;
mod progress;
mod remote;

pub use fs::{FsAssetLoader, FsLocalStore};
pub use http::HttpDownloader;
pub use memory::{MemoryProgressStore, MemoryStore};
pub use progress::StoreProgress;
pub use remote::{RemoteConfigDocument, StaticRemoteConfig};

use async_trait::async_trait;

use crate::error::Result;
use crate::{ContentType, RemoteDescriptor, SpecialLevelRule};

/// Read-only access to content bundled with the app
#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Load a bundled file. Fails with `AssetNotFound` when it is missing.
    async fn load_bundled_text(&self, path: &str) -> Result<Vec<u8>>;
}

/// Writable local storage keyed by relative path
pub trait LocalStore: Send + Sync {
    /// Read a file, `None` when it does not exist
    fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Write a file, replacing any previous content
    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<()>;

    fn exists(&self, path: &str) -> bool {
        matches!(self.read_file(path), Ok(Some(_)))
    }
}

/// Fetches remote content into local storage
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` and store it at `dest_path`.
    ///
    /// Timeouts are reported as `DownloadFailed` like any other error.
    async fn download(&self, url: &str, dest_path: &str) -> Result<()>;
}

/// Cloud-config source for catalog descriptors
pub trait RemoteConfigProvider: Send + Sync {
    /// False until the remote config has been fetched
    fn is_ready(&self) -> bool;

    fn get_descriptor(&self, content_type: ContentType) -> Option<RemoteDescriptor>;

    fn special_rule(&self) -> Option<SpecialLevelRule> {
        None
    }
}

/// Integer key-value store for player progress
pub trait ProgressStore: Send + Sync {
    fn get(&self, key: &str) -> Option<i64>;

    fn set(&self, key: &str, value: i64) -> Result<()>;
}
