//! Per-track handler behavior
//!
//! Every track shares the same state shape ([`ContentTypeState`]) but differs
//! in how it resolves stages and serves levels:
//!
//! - **Main**: sliding lookahead cache across stage boundaries
//! - **Special**: level index derived from main-line progress
//! - **Daily**: one fixed stage
//!
//! Shared behavior (catalog selection, range lookup, version checks) lives in
//! the default methods of [`ContentTypeHandler`]; variants override only what
//! differs. [`Handler`] is the closed set the coordinator stores.

mod daily;
mod main_line;
mod special;

pub use daily::DailyHandler;
pub use main_line::{DEFAULT_LOOKAHEAD, MainHandler};
pub use special::{PASSED_SPECIAL_LEVEL_KEY, SpecialHandler};

use crate::error::{LevelError, Result};
use crate::resolver;
use crate::{CatalogSource, ContentType, ContentTypeState, LevelRecord, StageRange};

/// Why a stage payload was (re)loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReason {
    /// First resolution during boot
    Init,
    /// Caller moved the track to a new level
    Advance,
    /// A read missed and the stage was re-resolved around the requested level
    Reroot,
    /// The next stage was loaded ahead of the player
    Prefetch,
    /// A sync finished and the payload was replaced
    Refresh,
}

/// Behavior of one progression track over its [`ContentTypeState`]
pub trait ContentTypeHandler: Send {
    fn content_type(&self) -> ContentType;

    /// Level resolved at boot and after a catalog refresh
    fn first_level(&self, state: &ContentTypeState) -> u32 {
        self.current_level(state)
    }

    /// Current progress on this track
    fn current_level(&self, state: &ContentTypeState) -> u32 {
        state.current_level
    }

    /// Resolve the stage serving `level` and record it on the state
    fn compute_stage(
        &mut self,
        state: &mut ContentTypeState,
        level: u32,
        source: CatalogSource,
    ) -> Result<StageRange> {
        let (active, catalog) = state.select_catalog(source)?;
        let range = resolver::compute_stage(catalog, level)?;
        state.active = active;
        state.stage = Some(range.clone());
        Ok(range)
    }

    /// Hook called once a payload for the resolved stage is in place
    fn on_stage_loaded(&mut self, _state: &ContentTypeState, _root: u32, _reason: LoadReason) {}

    /// Level to re-resolve at before `level` can be served, if any
    fn reroot_for(&self, _state: &ContentTypeState, _level: u32) -> Option<u32> {
        None
    }

    fn get_level_data(&mut self, state: &ContentTypeState, level: u32) -> Result<LevelRecord> {
        lookup_level(state, level)
    }

    /// Level whose stage should be loaded ahead after serving `level`
    fn prefetch_for(&self, _state: &ContentTypeState, _level: u32) -> Option<u32> {
        None
    }

    fn need_update(&self, state: &ContentTypeState, remote_version: i64) -> bool {
        state.need_update(remote_version)
    }

    fn get_current_stage_id<'a>(&self, state: &'a ContentTypeState) -> Result<&'a str> {
        state
            .current_stage
            .as_ref()
            .map(|stage| stage.stage_id.as_str())
            .ok_or(LevelError::NoCurrentStage)
    }
}

/// Read `level` out of the loaded payload using the resolved range
pub fn lookup_level(state: &ContentTypeState, level: u32) -> Result<LevelRecord> {
    let (Some(range), Some(payload)) = (&state.stage, &state.current_stage) else {
        return Err(LevelError::NoCurrentStage);
    };

    let out_of_range = LevelError::LevelOutOfRange {
        level,
        start: range.start,
        end: range.end,
    };
    if !range.contains(level) {
        return Err(out_of_range);
    }

    let index = (level - range.start) as usize;
    payload.get(index).cloned().ok_or(out_of_range)
}

/// The handler variants a coordinator can own
pub enum Handler {
    Main(MainHandler),
    Special(SpecialHandler),
    Daily(DailyHandler),
}

impl Handler {
    pub fn as_dyn(&self) -> &dyn ContentTypeHandler {
        match self {
            Handler::Main(h) => h,
            Handler::Special(h) => h,
            Handler::Daily(h) => h,
        }
    }

    pub fn as_dyn_mut(&mut self) -> &mut dyn ContentTypeHandler {
        match self {
            Handler::Main(h) => h,
            Handler::Special(h) => h,
            Handler::Daily(h) => h,
        }
    }
}

impl From<MainHandler> for Handler {
    fn from(handler: MainHandler) -> Self {
        Handler::Main(handler)
    }
}

impl From<SpecialHandler> for Handler {
    fn from(handler: SpecialHandler) -> Self {
        Handler::Special(handler)
    }
}

impl From<DailyHandler> for Handler {
    fn from(handler: DailyHandler) -> Self {
        Handler::Daily(handler)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_lookup_before_compute_is_no_current_stage() {
        let state = state(ContentType::Special, &[5]);
        assert!(matches!(lookup_level(&state, 1), Err(LevelError::NoCurrentStage)));
    }

    #[test]
    fn test_lookup_outside_range() {
        let mut handler = DailyHandler::new();
        let mut state = state(ContentType::Special, &[5, 5]);
        let mut special_like = SpecialHandler::in_memory(Default::default());
        special_like
            .compute_stage(&mut state, 7, CatalogSource::UseDefault)
            .unwrap();
        state.current_stage = Some(payload("st1", 6, 5));

        assert_eq!(lookup_level(&state, 7).unwrap().puzzle_id, "p7");
        assert!(matches!(
            lookup_level(&state, 3),
            Err(LevelError::LevelOutOfRange { level: 3, start: 6, end: 10 })
        ));
        assert!(handler.get_level_data(&state, 11).is_err());
    }

    #[test]
    fn test_default_stage_id_comes_from_payload() {
        let handler = DailyHandler::new();
        let mut state = state(ContentType::Daily, &[3]);
        assert!(handler.get_current_stage_id(&state).is_err());

        state.current_stage = Some(payload("daily-42", 1, 3));
        assert_eq!(handler.get_current_stage_id(&state).unwrap(), "daily-42");
    }
}
