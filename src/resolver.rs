//! Level to stage resolution
//!
//! Maps a global, 1-based level number onto a page of a [`Catalog`]. Levels
//! past the catalog's capacity wrap over pages the size of the *last* stage,
//! so content keeps repeating the final stage until a newer catalog arrives.

use crate::error::{LevelError, Result};
use crate::{Catalog, StageRange};

/// Resolve the stage that serves `level`.
///
/// Within capacity the first stage whose cumulative end reaches `level` wins
/// and its page is `[prior_total + 1, prior_total + level_count]`. Beyond
/// capacity the page is taken from a periodic grid of last-stage-sized pages
/// starting right after the catalog's total.
pub fn compute_stage(catalog: &Catalog, level: u32) -> Result<StageRange> {
    let last = catalog.stages.last().ok_or(LevelError::EmptyCatalog)?;
    let level = u64::from(level.max(1));

    let mut prior_total: u64 = 0;
    for (index, stage) in catalog.stages.iter().enumerate() {
        let count = u64::from(stage.level_count);
        let end = prior_total + count;
        if count > 0 && level <= end {
            return Ok(StageRange {
                index,
                start: clamp(prior_total + 1),
                end: clamp(end),
                stage_id: stage.stage_id.clone(),
            });
        }
        prior_total = end;
    }

    let page = u64::from(last.level_count);
    if page == 0 {
        return Err(LevelError::EmptyCatalog);
    }

    let start = prior_total + page * ((level - prior_total - 1) / page) + 1;
    Ok(StageRange {
        index: catalog.stages.len() - 1,
        start: clamp(start),
        end: clamp(start + page - 1),
        stage_id: last.stage_id.clone(),
    })
}

fn clamp(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
