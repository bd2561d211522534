//! Per-track mutable state

use super::{ActiveCatalog, Catalog, CatalogSource, ContentType, StageDescriptor, StagePayload};
use crate::error::{LevelError, Result};

/// A resolved stage: where a level sits in the active catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRange {
    /// Index into the catalog the range was resolved against
    pub index: usize,
    /// First level of the page (inclusive)
    pub start: u32,
    /// Last level of the page (inclusive)
    pub end: u32,
    pub stage_id: String,
}

impl StageRange {
    pub fn contains(&self, level: u32) -> bool {
        self.start <= level && level <= self.end
    }

    pub fn len(&self) -> u32 {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Mutable record of one track: catalogs, resolved range and loaded stage.
///
/// Created when a handler is registered and dropped when it is unregistered.
/// Owned by the coordinator; nothing else mutates it.
#[derive(Debug, Clone)]
pub struct ContentTypeState {
    pub content_type: ContentType,

    /// Bundled catalog, set once during init
    pub default_catalog: Option<Catalog>,

    /// Last downloaded catalog, replaced on each successful sync
    pub local_catalog: Option<Catalog>,

    /// Payload of the resolved stage, once loaded
    pub current_stage: Option<StagePayload>,

    /// Range resolved by the last successful `compute_stage`
    pub stage: Option<StageRange>,

    /// Catalog `stage.index` refers to
    pub active: ActiveCatalog,

    /// Persisted progress for this track
    pub current_level: u32,
}

impl ContentTypeState {
    pub fn new(content_type: ContentType, current_level: u32) -> Self {
        Self {
            content_type,
            default_catalog: None,
            local_catalog: None,
            current_stage: None,
            stage: None,
            active: ActiveCatalog::Default,
            current_level: current_level.max(1),
        }
    }

    /// True when the downloaded catalog should win over the bundled one
    pub fn local_supersedes(&self) -> bool {
        match (&self.local_catalog, &self.default_catalog) {
            (Some(local), Some(default)) => local.update_at >= default.update_at,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Pick the catalog a resolution call runs against
    pub fn select_catalog(&self, source: CatalogSource) -> Result<(ActiveCatalog, &Catalog)> {
        let default = self
            .default_catalog
            .as_ref()
            .ok_or(LevelError::CatalogNotLoaded)?;

        if source == CatalogSource::UseLocalOrDefault && self.local_supersedes() {
            if let Some(local) = &self.local_catalog {
                return Ok((ActiveCatalog::Local, local));
            }
        }
        Ok((ActiveCatalog::Default, default))
    }

    pub fn catalog(&self, which: ActiveCatalog) -> Option<&Catalog> {
        match which {
            ActiveCatalog::Default => self.default_catalog.as_ref(),
            ActiveCatalog::Local => self.local_catalog.as_ref(),
        }
    }

    /// Descriptor of the resolved stage in the active catalog
    pub fn active_stage(&self) -> Option<&StageDescriptor> {
        let range = self.stage.as_ref()?;
        self.catalog(self.active)?.stage(range.index)
    }

    pub fn stage_index(&self) -> Option<usize> {
        self.stage.as_ref().map(|r| r.index)
    }

    pub fn stage_start_level(&self) -> Option<u32> {
        self.stage.as_ref().map(|r| r.start)
    }

    pub fn stage_end_level(&self) -> Option<u32> {
        self.stage.as_ref().map(|r| r.end)
    }

    /// True iff there is no local catalog or it is older than `remote_version`
    pub fn need_update(&self, remote_version: i64) -> bool {
        match &self.local_catalog {
            Some(local) => local.update_at < remote_version,
            None => true,
        }
    }

    /// True when `remote_version` is newer than every catalog we know about
    pub fn sync_needed(&self, remote_version: i64) -> bool {
        let default_older = self
            .default_catalog
            .as_ref()
            .is_none_or(|d| d.update_at < remote_version);
        self.need_update(remote_version) && default_older
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(update_at: i64, ids: &[&str]) -> Catalog {
        Catalog::new(
            update_at,
            ids.iter().map(|id| StageDescriptor::new(*id, 10, "")).collect(),
        )
    }

    #[test]
    fn test_select_catalog_requires_default() {
        let state = ContentTypeState::new(ContentType::Main, 1);
        assert!(matches!(
            state.select_catalog(CatalogSource::UseDefault),
            Err(LevelError::CatalogNotLoaded)
        ));
    }

    #[test]
    fn test_newer_or_equal_local_supersedes() {
        let mut state = ContentTypeState::new(ContentType::Main, 1);
        state.default_catalog = Some(catalog(100, &["d"]));
        state.local_catalog = Some(catalog(100, &["l"]));

        let (which, cat) = state.select_catalog(CatalogSource::UseLocalOrDefault).unwrap();
        assert_eq!(which, ActiveCatalog::Local);
        assert_eq!(cat.stages[0].stage_id, "l");

        let (which, _) = state.select_catalog(CatalogSource::UseDefault).unwrap();
        assert_eq!(which, ActiveCatalog::Default);

        state.local_catalog = Some(catalog(99, &["l"]));
        let (which, _) = state.select_catalog(CatalogSource::UseLocalOrDefault).unwrap();
        assert_eq!(which, ActiveCatalog::Default);
    }

    #[test]
    fn test_need_update_compares_local_only() {
        let mut state = ContentTypeState::new(ContentType::Special, 1);
        state.default_catalog = Some(catalog(500, &["d"]));
        assert!(state.need_update(1));

        state.local_catalog = Some(catalog(200, &["l"]));
        assert!(state.need_update(201));
        assert!(!state.need_update(200));
    }

    #[test]
    fn test_sync_needed_requires_newer_than_both() {
        let mut state = ContentTypeState::new(ContentType::Main, 1);
        state.default_catalog = Some(catalog(500, &["d"]));
        assert!(!state.sync_needed(400));
        assert!(state.sync_needed(501));

        state.local_catalog = Some(catalog(600, &["l"]));
        assert!(!state.sync_needed(550));
        assert!(state.sync_needed(601));
    }
}
