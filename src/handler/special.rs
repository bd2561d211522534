//! Special-level handler
//!
//! Special levels are not played in sequence. Every `offset` main levels past
//! `start`, the player is offered the next special level; its index is derived
//! from main-line progress rather than stored.

use std::sync::Arc;

use super::{ContentTypeHandler, LoadReason};
use crate::store::{MemoryProgressStore, ProgressStore};
use crate::{ContentType, ContentTypeState, SpecialLevelRule};

/// Progress key of the highest special level already granted
pub const PASSED_SPECIAL_LEVEL_KEY: &str = "PassedSpecialLevel";

pub struct SpecialHandler {
    rule: SpecialLevelRule,
    progress: Arc<dyn ProgressStore>,
    level_count: usize,
}

impl SpecialHandler {
    pub fn new(rule: SpecialLevelRule, progress: Arc<dyn ProgressStore>) -> Self {
        Self {
            rule,
            progress,
            level_count: 0,
        }
    }

    /// Handler backed by a throwaway in-memory progress store
    pub fn in_memory(rule: SpecialLevelRule) -> Self {
        Self::new(rule, Arc::new(MemoryProgressStore::new()))
    }

    pub fn rule(&self) -> SpecialLevelRule {
        self.rule
    }

    pub fn set_rule(&mut self, rule: SpecialLevelRule) {
        self.rule = rule;
    }

    /// Levels in the loaded special stage
    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Main-line progress, read from the shared progress store
    pub fn main_level(&self) -> u32 {
        self.progress
            .get(ContentType::Main.tag())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(1)
    }

    /// Highest special level granted so far
    pub fn passed_level(&self) -> u32 {
        self.progress
            .get(PASSED_SPECIAL_LEVEL_KEY)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    }

    /// `(main - 1 - start) / offset + 1`
    pub fn derived_level(&self) -> u32 {
        if self.rule.offset == 0 {
            return 1;
        }
        let main = self.main_level();
        main.saturating_sub(1).saturating_sub(self.rule.start) / self.rule.offset + 1
    }

    /// Special index the player is due to enter, if any
    fn due_level(&self) -> Option<u32> {
        let rule = self.rule;
        if !rule.enable || rule.offset == 0 {
            return None;
        }

        let main = self.main_level();
        if main <= rule.start {
            return None;
        }

        let specified = self.derived_level();
        let hit = self.passed_level() < specified
            && (main - 1 - rule.start) % rule.offset == 0
            && specified as usize <= self.level_count;
        hit.then_some(specified)
    }

    /// Same check as [`is_enter_specified_level`](Self::is_enter_specified_level)
    /// without recording the grant
    pub fn special_level_due(&self) -> bool {
        self.due_level().is_some()
    }

    /// Whether the player should be sent into a special level now.
    ///
    /// Grants at most once per derived index: a successful check records the
    /// index as the new high-water mark.
    pub fn is_enter_specified_level(&self) -> bool {
        let Some(specified) = self.due_level() else {
            return false;
        };
        let main = self.main_level();

        if let Err(e) = self.progress.set(PASSED_SPECIAL_LEVEL_KEY, i64::from(specified)) {
            tracing::warn!(
                "[{}] failed to record granted level {}: {}",
                ContentType::Special.tag(),
                specified,
                e
            );
            return false;
        }
        tracing::info!(
            "[{}] granting special level {} at main level {}",
            ContentType::Special.tag(),
            specified,
            main
        );
        true
    }
}

impl ContentTypeHandler for SpecialHandler {
    fn content_type(&self) -> ContentType {
        ContentType::Special
    }

    fn current_level(&self, _state: &ContentTypeState) -> u32 {
        self.derived_level()
    }

    fn on_stage_loaded(&mut self, state: &ContentTypeState, _root: u32, _reason: LoadReason) {
        self.level_count = state
            .current_stage
            .as_ref()
            .map(|stage| stage.level_count())
            .unwrap_or(0);
    }
}
