//! Blocking HTTP fetcher run on tokio's blocking pool

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{Downloader, LocalStore};
use crate::error::{LevelError, Result};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads over HTTP(S) with `ureq` and writes the body into a [`LocalStore`].
///
/// `file://` URLs are read straight from disk, which keeps offline setups and
/// local mirrors working without a server.
pub struct HttpDownloader {
    store: Arc<dyn LocalStore>,
    timeout: Duration,
}

impl HttpDownloader {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest_path: &str) -> Result<()> {
        let owned_url = url.to_string();
        let timeout = self.timeout;

        let body = tokio::task::spawn_blocking(move || fetch(&owned_url, timeout))
            .await
            .map_err(|e| LevelError::DownloadFailed(format!("download task failed: {}", e)))??;

        tracing::debug!("Downloaded {} bytes from {} to {}", body.len(), url, dest_path);
        self.store.write_file(dest_path, &body)
    }
}

fn fetch(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    if let Some(path) = url.strip_prefix("file://") {
        return std::fs::read(path)
            .map_err(|e| LevelError::DownloadFailed(format!("{}: {}", url, e)));
    }

    let agent = ureq::AgentBuilder::new().timeout(timeout).build();
    let response = agent
        .get(url)
        .set("User-Agent", "levelmap-sync")
        .call()
        .map_err(|e| LevelError::DownloadFailed(format!("{}: {}", url, e)))?;

    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|e| LevelError::DownloadFailed(format!("{}: {}", url, e)))?;
    Ok(body)
}
