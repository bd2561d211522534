//! Boot and stage loading

use super::{Entry, InitReport, ProgressionCoordinator};
use crate::config::StorageLayout;
use crate::error::{LevelError, Result};
use crate::handler::{Handler, LoadReason};
use crate::sync::{DownloadKind, DownloadRequest};
use crate::{ActiveCatalog, Catalog, CatalogSource, ContentType, StagePayload, StageRange};

/// Where the payload for a freshly resolved range comes from
enum PayloadPlan {
    /// Already loaded; only the handler hook runs
    Reuse,
    Bundled(String),
    /// Downloaded stage file, with its URL for a re-download if unreadable
    Local { path: String, url: String },
}

impl ProgressionCoordinator {
    /// Boot every registered track.
    ///
    /// Tracks are booted one at a time. A failing track is logged and
    /// reported; it never stops the others.
    pub async fn initialize(&mut self) -> InitReport {
        let mut report = InitReport::default();

        for content_type in self.registered() {
            match self.init_type(content_type).await {
                Ok(range) => {
                    tracing::info!(
                        "[{}] ready at stage {} ({}-{})",
                        content_type.tag(),
                        range.stage_id,
                        range.start,
                        range.end
                    );
                    if let Some(entry) = self.entries.get_mut(&content_type) {
                        entry.inited = true;
                    }
                    report.initialized.push(content_type);
                }
                Err(e) => {
                    tracing::error!("[{}] init failed: {}", content_type.tag(), e);
                    report.failed.push((content_type, e.to_string()));
                }
            }
        }

        report
    }

    async fn init_type(&mut self, content_type: ContentType) -> Result<StageRange> {
        let bundled_path = self.layout.bundled_catalog_path(content_type);
        let bytes = self.services.assets.load_bundled_text(&bundled_path).await?;
        let default_catalog = Catalog::from_json(&bytes)?;
        if default_catalog.is_empty() {
            return Err(LevelError::EmptyCatalog);
        }

        let local_catalog = self.read_local_catalog(content_type);
        let remote_rule = self.services.remote.special_rule();

        let entry = self.entry_or_err(content_type)?;
        tracing::debug!(
            "[{}] default catalog {} ({} stages), local catalog {}",
            content_type.tag(),
            default_catalog.update_at,
            default_catalog.stages.len(),
            local_catalog
                .as_ref()
                .map(|c| c.update_at.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        entry.state.default_catalog = Some(default_catalog);
        entry.state.local_catalog = local_catalog;
        if let (Handler::Special(handler), Some(rule)) = (&mut entry.handler, remote_rule) {
            handler.set_rule(rule);
        }

        let first = entry.handler.as_dyn().first_level(&entry.state);
        self.load_stage(content_type, first, LoadReason::Init, CatalogSource::UseLocalOrDefault)
            .await
    }

    /// Downloaded catalog from the local store, if present and readable
    pub(super) fn read_local_catalog(&self, content_type: ContentType) -> Option<Catalog> {
        let path = self.layout.saved_catalog_path(content_type);
        match self.services.store.read_file(&path) {
            Ok(Some(bytes)) => match Catalog::from_json(&bytes) {
                Ok(catalog) => Some(catalog),
                Err(e) => {
                    tracing::warn!("[{}] ignoring local catalog {}: {}", content_type.tag(), path, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("[{}] cannot read local catalog {}: {}", content_type.tag(), path, e);
                None
            }
        }
    }

    /// Resolve `level` and put the matching payload in place.
    ///
    /// On error the previously resolved range, active catalog and payload are
    /// left as they were.
    pub(super) async fn load_stage(
        &mut self,
        content_type: ContentType,
        level: u32,
        reason: LoadReason,
        source: CatalogSource,
    ) -> Result<StageRange> {
        let entry = self.entry_or_err(content_type)?;
        let snapshot = (entry.state.stage.clone(), entry.state.active);

        let result = self.try_load_stage(content_type, level, reason, source).await;
        if result.is_err() {
            if let Some(entry) = self.entries.get_mut(&content_type) {
                entry.state.stage = snapshot.0;
                entry.state.active = snapshot.1;
            }
        }
        result
    }

    async fn try_load_stage(
        &mut self,
        content_type: ContentType,
        level: u32,
        reason: LoadReason,
        source: CatalogSource,
    ) -> Result<StageRange> {
        let entry = self
            .entries
            .get_mut(&content_type)
            .ok_or(LevelError::HandlerNotFound(content_type))?;
        let previous_active = entry.state.active;
        let mut range = entry
            .handler
            .as_dyn_mut()
            .compute_stage(&mut entry.state, level, source)?;
        let plan = plan_payload(entry, &range, previous_active, reason, &self.layout);

        let payload = match plan {
            PayloadPlan::Reuse => None,
            PayloadPlan::Bundled(stage_id) => Some(self.load_bundled_stage(content_type, &stage_id).await?),
            PayloadPlan::Local { path, url } => match self.read_local_stage(content_type, &path) {
                Some(payload) => Some(payload),
                None => {
                    self.start_stage_download(content_type, level, &url, path);

                    let entry = self.entry_or_err(content_type)?;
                    range = entry.handler.as_dyn_mut().compute_stage(
                        &mut entry.state,
                        level,
                        CatalogSource::UseDefault,
                    )?;
                    let reusable = previous_active == ActiveCatalog::Default
                        && reason != LoadReason::Refresh
                        && entry
                            .state
                            .current_stage
                            .as_ref()
                            .is_some_and(|p| p.stage_id == range.stage_id);
                    if reusable {
                        None
                    } else {
                        Some(self.load_bundled_stage(content_type, &range.stage_id).await?)
                    }
                }
            },
        };

        let entry = self.entry_or_err(content_type)?;
        if let Some(payload) = payload {
            tracing::info!(
                "[{}] loaded stage {} for level {} ({}-{}, {} catalog)",
                content_type.tag(),
                payload.stage_id,
                level,
                range.start,
                range.end,
                entry.state.active
            );
            entry.state.current_stage = Some(payload);
        }
        entry
            .handler
            .as_dyn_mut()
            .on_stage_loaded(&entry.state, level, reason);
        Ok(range)
    }

    async fn load_bundled_stage(&self, content_type: ContentType, stage_id: &str) -> Result<StagePayload> {
        let path = self.layout.bundled_stage_path(content_type, stage_id);
        let bytes = self.services.assets.load_bundled_text(&path).await?;
        StagePayload::from_json(&bytes)
    }

    fn read_local_stage(&self, content_type: ContentType, path: &str) -> Option<StagePayload> {
        match self.services.store.read_file(path) {
            Ok(Some(bytes)) => match StagePayload::from_json(&bytes) {
                Ok(payload) => Some(payload),
                Err(e) => {
                    tracing::warn!("[{}] discarding unreadable stage {}: {}", content_type.tag(), path, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("[{}] cannot read stage {}: {}", content_type.tag(), path, e);
                None
            }
        }
    }

    fn start_stage_download(&mut self, content_type: ContentType, level: u32, url: &str, dest: String) {
        if url.is_empty() {
            tracing::warn!("[{}] stage {} has no download url", content_type.tag(), dest);
            return;
        }
        let request = DownloadRequest {
            url: self.layout.fixed_url(url),
            dest,
            level,
        };
        self.sync.start(content_type, DownloadKind::Stage, request);
    }
}

fn plan_payload(
    entry: &Entry,
    range: &StageRange,
    previous_active: ActiveCatalog,
    reason: LoadReason,
    layout: &StorageLayout,
) -> PayloadPlan {
    let state = &entry.state;
    let same_stage = state
        .current_stage
        .as_ref()
        .is_some_and(|payload| payload.stage_id == range.stage_id);
    if same_stage && state.active == previous_active && reason != LoadReason::Refresh {
        return PayloadPlan::Reuse;
    }

    match (state.active, &state.local_catalog) {
        (ActiveCatalog::Local, Some(local)) => PayloadPlan::Local {
            path: layout.saved_stage_path(local.update_at, &range.stage_id),
            url: state
                .active_stage()
                .map(|stage| stage.content_url.clone())
                .unwrap_or_default(),
        },
        _ => PayloadPlan::Bundled(range.stage_id.clone()),
    }
}
