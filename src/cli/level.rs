//! Level command implementation

use anyhow::{Result, bail};
use std::path::Path;
use std::sync::Arc;

use levelmap::ContentType;
use levelmap::store::StaticRemoteConfig;

/// Boot all tracks and print one level of `track`
pub async fn level_command(config_path: Option<&Path>, track: ContentType, level: Option<u32>) -> Result<()> {
    let mut coordinator = super::boot(config_path, Arc::new(StaticRemoteConfig::empty())).await?;

    let Some(level) = level.or_else(|| coordinator.current_level(track)) else {
        bail!("Track {} is not registered", track);
    };

    let Some(record) = coordinator.get_level_data(track, level).await else {
        bail!("No data for {} level {}", track, level);
    };

    let stage = coordinator
        .get_current_stage_id(track)
        .unwrap_or_else(|| "-".to_string());
    println!("{} level {} (stage {})", track, level, stage);
    println!("  puzzle: {}", record.puzzle_id);
    println!("  kind:   {:?}", record.kind());
    println!("  tubes:  {}", record.tube_count());

    if track == ContentType::Main && coordinator.special_level_due() {
        println!("  a special level is unlocked");
    }

    Ok(())
}
