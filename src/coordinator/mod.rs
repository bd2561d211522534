//! The single owner of every track's state
//!
//! [`ProgressionCoordinator`] holds the registered handlers, their
//! [`ContentTypeState`]s and the sync orchestrator. Gameplay code talks only to
//! the coordinator: every call resolves to an `Option`, with the cause logged,
//! so a resolution failure never crosses this boundary as an error.
//!
//! The work is split across submodules:
//! - `loader`: boot and stage loading (bundled, local, or download fallback)
//! - `refresh`: update checks and applying finished downloads

mod loader;
mod refresh;

pub use refresh::SyncOutcome;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{Config, StorageLayout};
use crate::error::{LevelError, Result};
use crate::handler::{DailyHandler, Handler, LoadReason, MainHandler, SpecialHandler};
use crate::store::{AssetLoader, Downloader, LocalStore, ProgressStore, RemoteConfigProvider};
use crate::sync::{ContentSyncOrchestrator, SyncPhase};
use crate::{CatalogSource, ContentType, ContentTypeState, LevelRecord, StageRange};

/// Collaborators shared by all tracks
#[derive(Clone)]
pub struct ContentServices {
    pub assets: Arc<dyn AssetLoader>,
    pub store: Arc<dyn LocalStore>,
    pub downloader: Arc<dyn Downloader>,
    pub remote: Arc<dyn RemoteConfigProvider>,
    pub progress: Arc<dyn ProgressStore>,
}

/// Result of [`ProgressionCoordinator::initialize`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub initialized: Vec<ContentType>,
    /// Types whose boot failed, with the cause
    pub failed: Vec<(ContentType, String)>,
}

impl InitReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

struct Entry {
    handler: Handler,
    state: ContentTypeState,
    inited: bool,
}

pub struct ProgressionCoordinator {
    services: ContentServices,
    layout: StorageLayout,
    entries: BTreeMap<ContentType, Entry>,
    sync: ContentSyncOrchestrator,
}

impl ProgressionCoordinator {
    /// Empty coordinator; handlers are added with [`register`](Self::register)
    pub fn new(services: ContentServices, layout: StorageLayout) -> Self {
        let sync = ContentSyncOrchestrator::new(Arc::clone(&services.downloader));
        Self {
            services,
            layout,
            entries: BTreeMap::new(),
            sync,
        }
    }

    /// Coordinator with all three tracks registered from config
    pub fn from_config(services: ContentServices, config: &Config) -> Self {
        let progress = Arc::clone(&services.progress);
        let mut coordinator = Self::new(services, config.layout());
        coordinator.register(MainHandler::new(config.main.lookahead));
        coordinator.register(SpecialHandler::new(config.special, progress));
        coordinator.register(DailyHandler::new());
        coordinator
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Add a handler. Returns false, leaving the existing one, if its type is
    /// already registered.
    pub fn register(&mut self, handler: impl Into<Handler>) -> bool {
        let handler = handler.into();
        let content_type = handler.as_dyn().content_type();

        if self.entries.contains_key(&content_type) {
            tracing::warn!("[{}] handler already registered, ignoring", content_type.tag());
            return false;
        }

        let current_level = self
            .services
            .progress
            .get(content_type.tag())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(1);

        self.entries.insert(
            content_type,
            Entry {
                handler,
                state: ContentTypeState::new(content_type, current_level),
                inited: false,
            },
        );
        self.sync.track(content_type);
        tracing::debug!("[{}] registered at level {}", content_type.tag(), current_level);
        true
    }

    /// Drop a handler and its state, aborting its downloads
    pub fn unregister(&mut self, content_type: ContentType) -> bool {
        self.sync.forget(content_type);
        let removed = self.entries.remove(&content_type).is_some();
        if removed {
            tracing::info!("[{}] unregistered", content_type.tag());
        }
        removed
    }

    pub fn is_registered(&self, content_type: ContentType) -> bool {
        self.entries.contains_key(&content_type)
    }

    pub fn registered(&self) -> Vec<ContentType> {
        self.entries.keys().copied().collect()
    }

    /// Read-only view of a track's state
    pub fn state(&self, content_type: ContentType) -> Option<&ContentTypeState> {
        self.entries.get(&content_type).map(|entry| &entry.state)
    }

    /// Resolve `level` and load the matching stage payload
    pub async fn compute_stage(
        &mut self,
        content_type: ContentType,
        level: u32,
        source: CatalogSource,
    ) -> Option<StageRange> {
        match self.load_stage(content_type, level, LoadReason::Advance, source).await {
            Ok(range) => Some(range),
            Err(e) => {
                tracing::warn!("[{}] failed to resolve level {}: {}", content_type.tag(), level, e);
                None
            }
        }
    }

    /// Serve one level. `None` means the level cannot be played.
    pub async fn get_level_data(&mut self, content_type: ContentType, level: u32) -> Option<LevelRecord> {
        let reroot = {
            let entry = self.entry(content_type)?;
            entry.handler.as_dyn().reroot_for(&entry.state, level)
        };
        if let Some(root) = reroot {
            if let Err(e) = self
                .load_stage(content_type, root, LoadReason::Reroot, CatalogSource::UseLocalOrDefault)
                .await
            {
                tracing::warn!("[{}] no data for level {}: {}", content_type.tag(), level, e);
                return None;
            }
        }

        let (record, prefetch) = {
            let entry = self.entry_mut(content_type)?;
            match entry.handler.as_dyn_mut().get_level_data(&entry.state, level) {
                Ok(record) => {
                    let prefetch = entry.handler.as_dyn().prefetch_for(&entry.state, level);
                    (record, prefetch)
                }
                Err(e) => {
                    tracing::warn!("[{}] no data for level {}: {}", content_type.tag(), level, e);
                    return None;
                }
            }
        };

        if let Some(next) = prefetch {
            if let Err(e) = self
                .load_stage(content_type, next, LoadReason::Prefetch, CatalogSource::UseLocalOrDefault)
                .await
            {
                tracing::warn!("[{}] prefetch of level {} failed: {}", content_type.tag(), next, e);
            }
        }

        Some(record)
    }

    pub fn get_current_stage_id(&self, content_type: ContentType) -> Option<String> {
        let entry = self.entry(content_type)?;
        match entry.handler.as_dyn().get_current_stage_id(&entry.state) {
            Ok(id) => Some(id.to_string()),
            Err(e) => {
                tracing::debug!("[{}] {}", content_type.tag(), e);
                None
            }
        }
    }

    /// True iff the track has no downloaded catalog or it is older than `remote_version`
    pub fn need_update(&self, content_type: ContentType, remote_version: i64) -> bool {
        self.entry(content_type)
            .map(|entry| entry.handler.as_dyn().need_update(&entry.state, remote_version))
            .unwrap_or(false)
    }

    pub fn current_level(&self, content_type: ContentType) -> Option<u32> {
        let entry = self.entry(content_type)?;
        Some(entry.handler.as_dyn().current_level(&entry.state))
    }

    pub fn sync_phase(&self, content_type: ContentType) -> Option<SyncPhase> {
        self.sync.phase(content_type).cloned()
    }

    /// Whether the player should be routed into a special level now
    pub fn is_enter_specified_level(&self) -> bool {
        match self.entries.get(&ContentType::Special) {
            Some(Entry {
                handler: Handler::Special(handler),
                inited: true,
                ..
            }) => handler.is_enter_specified_level(),
            _ => false,
        }
    }

    /// Whether a special level is due, without recording the grant
    pub fn special_level_due(&self) -> bool {
        match self.entries.get(&ContentType::Special) {
            Some(Entry {
                handler: Handler::Special(handler),
                inited: true,
                ..
            }) => handler.special_level_due(),
            _ => false,
        }
    }

    /// Persist new progress for a track, then resolve its stage
    pub async fn set_current_level(&mut self, content_type: ContentType, level: u32) -> Option<StageRange> {
        let level = level.max(1);
        if !self.entries.contains_key(&content_type) {
            tracing::warn!("[{}] {}", content_type.tag(), LevelError::HandlerNotFound(content_type));
            return None;
        }

        if let Err(e) = self.services.progress.set(content_type.tag(), i64::from(level)) {
            tracing::error!("[{}] failed to persist level {}: {}", content_type.tag(), level, e);
            return None;
        }

        let entry = self.entry_mut(content_type)?;
        entry.state.current_level = level;
        let target = entry.handler.as_dyn().current_level(&entry.state);

        self.compute_stage(content_type, target, CatalogSource::UseLocalOrDefault)
            .await
    }

    fn entry(&self, content_type: ContentType) -> Option<&Entry> {
        let entry = self.entries.get(&content_type);
        if entry.is_none() {
            tracing::warn!("[{}] {}", content_type.tag(), LevelError::HandlerNotFound(content_type));
        }
        entry
    }

    fn entry_mut(&mut self, content_type: ContentType) -> Option<&mut Entry> {
        let entry = self.entries.get_mut(&content_type);
        if entry.is_none() {
            tracing::warn!("[{}] {}", content_type.tag(), LevelError::HandlerNotFound(content_type));
        }
        entry
    }

    fn entry_or_err(&mut self, content_type: ContentType) -> Result<&mut Entry> {
        self.entries
            .get_mut(&content_type)
            .ok_or(LevelError::HandlerNotFound(content_type))
    }
}
