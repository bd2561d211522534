//! Shared fixtures for coordinator and sync integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use levelmap::config::StorageLayout;
use levelmap::store::{
    Downloader, LocalStore, MemoryProgressStore, MemoryStore, RemoteConfigDocument, StaticRemoteConfig,
};
use levelmap::{
    ContentServices, ContentType, LevelError, ProgressionCoordinator, RemoteDescriptor, Result,
};

/// Catalog JSON; each stage downloads from `stages/{id}`
pub fn catalog_json(update_at: i64, stages: &[(&str, u32)]) -> Vec<u8> {
    let stages: Vec<_> = stages
        .iter()
        .map(|(id, count)| {
            serde_json::json!({
                "stage_id": id,
                "level_count": count,
                "url": format!("stages/{}", id),
            })
        })
        .collect();
    serde_json::to_vec(&serde_json::json!({ "update_at": update_at, "stages": stages }))
        .expect("Failed to encode catalog")
}

/// Stage JSON whose puzzle ids read `{origin}:{stage}#{level}`
pub fn stage_json(origin: &str, stage_id: &str, start: u32, count: u32) -> Vec<u8> {
    let levels: Vec<_> = (start..start + count)
        .map(|level| {
            serde_json::json!({
                "level_type": 0,
                "puzzle_id": format!("{}:{}#{}", origin, stage_id, level),
                "tubes": [[1, 2, 1], [2, 1, 2], [0, 0, 0]],
            })
        })
        .collect();
    serde_json::to_vec(&serde_json::json!({ "stage_id": stage_id, "levels": levels }))
        .expect("Failed to encode stage")
}

/// Serves canned bodies by URL, optionally holding every download until released
pub struct ScriptedDownloader {
    store: Arc<MemoryStore>,
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDownloader {
    pub fn serve(&self, url: &str, body: Vec<u8>) {
        self.bodies.lock().unwrap().insert(url.to_string(), body);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Let `n` held downloads proceed
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }
}

#[async_trait]
impl Downloader for ScriptedDownloader {
    async fn download(&self, url: &str, dest_path: &str) -> Result<()> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| LevelError::DownloadFailed(e.to_string()))?
                .forget();
        }

        let body = self.bodies.lock().unwrap().get(url).cloned();
        match body {
            Some(body) => self.store.write_file(dest_path, &body),
            None => Err(LevelError::DownloadFailed(format!("404 {}", url))),
        }
    }
}

/// Bundle, local store, progress, remote config and downloader for one test
pub struct Fixture {
    pub layout: StorageLayout,
    pub bundle: Arc<MemoryStore>,
    pub store: Arc<MemoryStore>,
    pub progress: Arc<MemoryProgressStore>,
    pub remote: Arc<StaticRemoteConfig>,
    pub downloader: Arc<ScriptedDownloader>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Downloads block until [`ScriptedDownloader::release`] is called
    pub fn gated() -> Self {
        Self::build(Some(Arc::new(Semaphore::new(0))))
    }

    fn build(gate: Option<Arc<Semaphore>>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            layout: StorageLayout::default(),
            bundle: Arc::new(MemoryStore::new()),
            downloader: Arc::new(ScriptedDownloader {
                store: store.clone(),
                bodies: Mutex::new(HashMap::new()),
                gate,
                calls: Mutex::new(Vec::new()),
            }),
            store,
            progress: Arc::new(MemoryProgressStore::new()),
            remote: Arc::new(StaticRemoteConfig::empty()),
        }
    }

    /// Bundle a catalog and all of its stages for a track
    pub fn bundle_track(&self, content_type: ContentType, update_at: i64, stages: &[(&str, u32)]) {
        self.bundle.insert(
            self.layout.bundled_catalog_path(content_type),
            catalog_json(update_at, stages),
        );
        let mut start = 1;
        for (id, count) in stages {
            self.bundle.insert(
                self.layout.bundled_stage_path(content_type, id),
                stage_json("bundled", id, start, *count),
            );
            start += count;
        }
    }

    /// Put a previously downloaded catalog in the local store, without stage files
    pub fn save_local_catalog(&self, content_type: ContentType, update_at: i64, stages: &[(&str, u32)]) {
        self.store.insert(
            self.layout.saved_catalog_path(content_type),
            catalog_json(update_at, stages),
        );
    }

    /// Announce a remote catalog and serve it plus its stages
    pub fn publish_remote(&self, content_type: ContentType, update_at: i64, stages: &[(&str, u32)]) {
        let url = format!("remote/{}mapdata", content_type.prefix());
        self.remote.publish(RemoteConfigDocument::default().with_descriptor(
            content_type,
            RemoteDescriptor {
                update_at,
                url: url.clone(),
                start_level: 1,
            },
        ));
        self.downloader.serve(&url, catalog_json(update_at, stages));
        self.serve_stages(stages);
    }

    pub fn serve_stages(&self, stages: &[(&str, u32)]) {
        let mut start = 1;
        for (id, count) in stages {
            self.downloader
                .serve(&format!("stages/{}", id), stage_json("remote", id, start, *count));
            start += count;
        }
    }

    pub fn services(&self) -> ContentServices {
        ContentServices {
            assets: self.bundle.clone(),
            store: self.store.clone(),
            downloader: self.downloader.clone(),
            remote: self.remote.clone(),
            progress: self.progress.clone(),
        }
    }

    /// Empty coordinator over this fixture
    pub fn coordinator(&self) -> ProgressionCoordinator {
        ProgressionCoordinator::new(self.services(), self.layout.clone())
    }
}
