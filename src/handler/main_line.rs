//! Main-line handler with a sliding lookahead cache

use std::collections::BTreeMap;

use super::{ContentTypeHandler, LoadReason};
use crate::error::{LevelError, Result};
use crate::{ContentType, ContentTypeState, LevelRecord};

/// Levels kept on either side of the current one
pub const DEFAULT_LOOKAHEAD: u32 = 5;

/// Serves main-line levels from a cache that can span two stages.
///
/// The cache is filled whenever a stage payload lands, trimmed below
/// `level - lookahead` as the player advances, and topped up with the next
/// stage once `level + lookahead` would run past the resolved stage.
#[derive(Debug, Clone)]
pub struct MainHandler {
    lookahead: u32,
    cache: BTreeMap<u32, LevelRecord>,
}

impl MainHandler {
    pub fn new(lookahead: u32) -> Self {
        Self {
            lookahead,
            cache: BTreeMap::new(),
        }
    }

    pub fn lookahead(&self) -> u32 {
        self.lookahead
    }

    pub fn is_cached(&self, level: u32) -> bool {
        self.cache.contains_key(&level)
    }

    /// Cached level numbers in ascending order
    pub fn cached_levels(&self) -> Vec<u32> {
        self.cache.keys().copied().collect()
    }

    fn window_floor(&self, level: u32) -> u32 {
        level.saturating_sub(self.lookahead).max(1)
    }
}

impl Default for MainHandler {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD)
    }
}

impl ContentTypeHandler for MainHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Main
    }

    /// Boot resolves the stage of `current - lookahead`, which may sit in the
    /// stage before the current one.
    fn first_level(&self, state: &ContentTypeState) -> u32 {
        self.window_floor(state.current_level)
    }

    fn on_stage_loaded(&mut self, state: &ContentTypeState, root: u32, reason: LoadReason) {
        let (Some(range), Some(payload)) = (&state.stage, &state.current_stage) else {
            return;
        };

        let floor = match reason {
            LoadReason::Reroot => self.window_floor(root),
            LoadReason::Prefetch => root,
            LoadReason::Init | LoadReason::Advance | LoadReason::Refresh => self.first_level(state),
        };

        let mut added = 0usize;
        for (offset, record) in payload.levels.iter().enumerate() {
            let level = range.start.saturating_add(offset as u32);
            if level > range.end {
                break;
            }
            if level < floor {
                continue;
            }
            self.cache.insert(level, record.clone());
            added += 1;
        }

        tracing::debug!(
            "[{}] cached {} levels of stage {} from level {} ({:?})",
            ContentType::Main.tag(),
            added,
            range.stage_id,
            floor,
            reason
        );
    }

    fn reroot_for(&self, _state: &ContentTypeState, level: u32) -> Option<u32> {
        if self.cache.contains_key(&level) {
            None
        } else {
            tracing::warn!(
                "[{}] cache miss for level {}, re-resolving",
                ContentType::Main.tag(),
                level
            );
            Some(level)
        }
    }

    fn get_level_data(&mut self, state: &ContentTypeState, level: u32) -> Result<LevelRecord> {
        let range = state.stage.as_ref().ok_or(LevelError::NoCurrentStage)?;

        let floor = self.window_floor(level);
        self.cache = self.cache.split_off(&floor);

        self.cache
            .get(&level)
            .cloned()
            .ok_or(LevelError::LevelOutOfRange {
                level,
                start: range.start,
                end: range.end,
            })
    }

    fn prefetch_for(&self, state: &ContentTypeState, level: u32) -> Option<u32> {
        let end = state.stage_end_level()?;
        if level.saturating_add(self.lookahead) > end {
            Some(end.saturating_add(1))
        } else {
            None
        }
    }
}
