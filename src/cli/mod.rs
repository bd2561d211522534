//! CLI command implementations

pub mod init;
pub mod level;
pub mod resolve;
pub mod sync;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use levelmap::config::Config;
use levelmap::store::{
    FsAssetLoader, FsLocalStore, HttpDownloader, RemoteConfigProvider, StoreProgress,
};
use levelmap::{ContentServices, ProgressionCoordinator};

/// Load config and boot a coordinator with every track registered.
///
/// Tracks that fail to boot are reported but do not fail the command.
pub async fn boot(
    config_path: Option<&Path>,
    remote: Arc<dyn RemoteConfigProvider>,
) -> Result<ProgressionCoordinator> {
    let config = Config::load_from(config_path)?;
    let save_root = config.save_root();
    tracing::debug!(
        "Bundle dir {}, save root {}",
        config.paths.bundle_dir.display(),
        save_root.display()
    );

    let store = Arc::new(FsLocalStore::new(save_root));
    let services = ContentServices {
        assets: Arc::new(FsAssetLoader::new(config.paths.bundle_dir.clone())),
        store: store.clone(),
        downloader: Arc::new(HttpDownloader::new(store.clone()).with_timeout(config.download_timeout())),
        remote,
        progress: Arc::new(StoreProgress::open_default(store)),
    };

    let mut coordinator = ProgressionCoordinator::from_config(services, &config);
    let report = coordinator.initialize().await;
    for (content_type, reason) in &report.failed {
        eprintln!("Warning: {} track unavailable: {}", content_type, reason);
    }

    Ok(coordinator)
}
