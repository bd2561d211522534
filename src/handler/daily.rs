use super::ContentTypeHandler;
use crate::error::{LevelError, Result};
use crate::{CatalogSource, ContentType, ContentTypeState, StageRange};

/// Daily challenge: the catalog's first stage is the whole track
#[derive(Debug, Clone, Default)]
pub struct DailyHandler;

impl DailyHandler {
    pub fn new() -> Self {
        Self
    }
}

impl ContentTypeHandler for DailyHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Daily
    }

    fn compute_stage(
        &mut self,
        state: &mut ContentTypeState,
        _level: u32,
        source: CatalogSource,
    ) -> Result<StageRange> {
        let (active, catalog) = state.select_catalog(source)?;
        let stage = catalog.stage(0).ok_or(LevelError::EmptyCatalog)?;

        let range = StageRange {
            index: 0,
            start: 1,
            end: stage.level_count,
            stage_id: stage.stage_id.clone(),
        };
        state.active = active;
        state.stage = Some(range.clone());
        Ok(range)
    }
}
