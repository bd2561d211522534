//! Update checks and applying finished downloads

use super::ProgressionCoordinator;
use crate::handler::{Handler, LoadReason};
use crate::sync::{DownloadKind, DownloadRequest, SyncEvent, SyncPhase};
use crate::{Catalog, CatalogSource, ContentType, StagePayload};

/// What applying one finished download did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub content_type: ContentType,
    pub kind: DownloadKind,
    /// Phase after the result was applied
    pub phase: SyncPhase,
}

impl ProgressionCoordinator {
    /// Start a catalog download for every initialized track whose remote
    /// descriptor is newer than both known catalogs.
    ///
    /// Returns the number of downloads started. Does nothing until the remote
    /// config is ready, and skips tracks with a download already in flight.
    pub fn check_update(&mut self) -> usize {
        let remote = &self.services.remote;
        if !remote.is_ready() {
            tracing::debug!("remote config not ready, skipping update check");
            return 0;
        }
        let rule = remote.special_rule();

        let mut started = 0;
        for (content_type, entry) in self.entries.iter_mut() {
            let content_type = *content_type;
            if let (Handler::Special(handler), Some(rule)) = (&mut entry.handler, rule) {
                handler.set_rule(rule);
            }
            if !entry.inited {
                tracing::debug!("[{}] not initialized, skipping update check", content_type.tag());
                continue;
            }
            if self.sync.is_busy(content_type) {
                tracing::debug!("[{}] sync in progress, skipping update check", content_type.tag());
                continue;
            }
            let Some(descriptor) = remote.get_descriptor(content_type) else {
                continue;
            };
            if !entry.state.sync_needed(descriptor.update_at) {
                tracing::debug!(
                    "[{}] up to date with remote version {}",
                    content_type.tag(),
                    descriptor.update_at
                );
                continue;
            }

            let request = DownloadRequest {
                url: self.layout.fixed_url(&descriptor.url),
                dest: self.layout.staged_catalog_path(content_type),
                level: entry.handler.as_dyn().current_level(&entry.state),
            };
            tracing::info!(
                "[{}] remote catalog {} is newer, syncing",
                content_type.tag(),
                descriptor.update_at
            );
            if self.sync.start(content_type, DownloadKind::Catalog, request) {
                started += 1;
            }
        }
        started
    }

    /// Apply every download that has already finished, without waiting
    pub async fn process_sync_events(&mut self) -> Vec<SyncOutcome> {
        let mut outcomes = Vec::new();
        while let Some(event) = self.sync.try_next() {
            if let Some(outcome) = self.apply_sync_event(event).await {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    /// Wait for the next download to finish and apply it.
    ///
    /// Returns `None` once nothing is left in flight.
    pub async fn await_sync_event(&mut self) -> Option<SyncOutcome> {
        loop {
            let event = self.sync.next().await?;
            if let Some(outcome) = self.apply_sync_event(event).await {
                return Some(outcome);
            }
        }
    }

    async fn apply_sync_event(&mut self, event: SyncEvent) -> Option<SyncOutcome> {
        let content_type = event.content_type;
        let Some(request) = self.sync.accept(&event) else {
            tracing::debug!(
                "[{}] discarding stale {:?} download",
                content_type.tag(),
                event.kind
            );
            return None;
        };

        match event.result {
            Ok(()) => match event.kind {
                DownloadKind::Catalog => self.finish_catalog(content_type, &request).await,
                DownloadKind::Stage => self.finish_stage(content_type, &request).await,
            },
            Err(e) => {
                tracing::warn!("[{}] {:?} download failed: {}", content_type.tag(), event.kind, e);
                self.sync.fail(content_type, e.to_string());
            }
        }

        Some(SyncOutcome {
            content_type,
            kind: event.kind,
            phase: self.sync.phase(content_type).cloned().unwrap_or(SyncPhase::Idle),
        })
    }

    async fn finish_catalog(&mut self, content_type: ContentType, request: &DownloadRequest) {
        let (bytes, catalog) = match self.read_downloaded(&request.dest, Catalog::from_json) {
            Ok(parsed) => parsed,
            Err(reason) => {
                tracing::warn!("[{}] rejecting downloaded catalog: {}", content_type.tag(), reason);
                self.sync.fail(content_type, reason);
                return;
            }
        };
        if catalog.is_empty() {
            tracing::warn!("[{}] rejecting downloaded catalog: no stages", content_type.tag());
            self.sync.fail(content_type, "downloaded catalog has no stages");
            return;
        }

        let update_at = catalog.update_at;
        let Some(entry) = self.entries.get_mut(&content_type) else {
            return;
        };
        let previous = entry.state.local_catalog.replace(catalog);
        let first = entry.handler.as_dyn().first_level(&entry.state);
        self.sync.set_phase(content_type, SyncPhase::CatalogReady);

        let loaded = self
            .load_stage(content_type, first, LoadReason::Refresh, CatalogSource::UseLocalOrDefault)
            .await;
        let resolved = loaded.is_ok();
        let saved = self.layout.saved_catalog_path(content_type);
        let persisted = loaded.and_then(|_| self.services.store.write_file(&saved, &bytes));

        match persisted {
            Ok(()) => {
                tracing::info!("[{}] switched to catalog {}", content_type.tag(), update_at);
                if !self.sync.is_in_flight(content_type, DownloadKind::Stage) {
                    self.sync.set_phase(content_type, SyncPhase::StageReady);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "[{}] catalog {} not applied, keeping previous: {}",
                    content_type.tag(),
                    update_at,
                    e
                );
                self.sync.cancel(content_type, DownloadKind::Stage);
                self.restore_catalog(content_type, previous, resolved).await;
                self.sync.fail(content_type, e.to_string());
            }
        }
    }

    /// Put back the catalog a failed swap replaced. When the new catalog had
    /// already been resolved against, the stage is resolved again.
    async fn restore_catalog(&mut self, content_type: ContentType, previous: Option<Catalog>, resolved: bool) {
        let Some(entry) = self.entries.get_mut(&content_type) else {
            return;
        };
        entry.state.local_catalog = previous;
        if !resolved {
            return;
        }
        let first = entry.handler.as_dyn().first_level(&entry.state);

        if let Err(e) = self
            .load_stage(content_type, first, LoadReason::Refresh, CatalogSource::UseLocalOrDefault)
            .await
        {
            tracing::warn!("[{}] failed to re-resolve previous catalog: {}", content_type.tag(), e);
        }
    }

    async fn finish_stage(&mut self, content_type: ContentType, request: &DownloadRequest) {
        if let Err(reason) = self.read_downloaded(&request.dest, StagePayload::from_json) {
            tracing::warn!("[{}] rejecting downloaded stage: {}", content_type.tag(), reason);
            self.sync.fail(content_type, reason);
            return;
        }

        // The player may have moved on while the file downloaded
        let Some(entry) = self.entries.get(&content_type) else {
            return;
        };
        let level = entry.handler.as_dyn().current_level(&entry.state);
        if level != request.level {
            tracing::debug!(
                "[{}] stage was requested for level {}, now at {}",
                content_type.tag(),
                request.level,
                level
            );
        }

        match self
            .load_stage(content_type, level, LoadReason::Refresh, CatalogSource::UseLocalOrDefault)
            .await
        {
            Ok(range) => {
                tracing::info!("[{}] stage {} refreshed from download", content_type.tag(), range.stage_id);
                if !self.sync.is_in_flight(content_type, DownloadKind::Stage) {
                    self.sync.set_phase(content_type, SyncPhase::StageReady);
                }
            }
            Err(e) => {
                tracing::warn!("[{}] downloaded stage unusable: {}", content_type.tag(), e);
                self.sync.fail(content_type, e.to_string());
            }
        }
    }

    /// Read back and parse a file a download wrote
    fn read_downloaded<T>(
        &self,
        path: &str,
        parse: impl Fn(&[u8]) -> crate::error::Result<T>,
    ) -> Result<(Vec<u8>, T), String> {
        let bytes = match self.services.store.read_file(path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Err(format!("{} was not written", path)),
            Err(e) => return Err(e.to_string()),
        };
        let parsed = parse(&bytes).map_err(|e| e.to_string())?;
        Ok((bytes, parsed))
    }
}
