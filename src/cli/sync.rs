//! Sync command implementation

use anyhow::{Result, bail};
use std::path::Path;
use std::sync::Arc;

use levelmap::store::StaticRemoteConfig;
use levelmap::sync::SyncPhase;

/// Boot, check the remote config for newer catalogs and wait for every download
pub async fn sync_command(config_path: Option<&Path>, remote_path: &Path) -> Result<()> {
    let remote = Arc::new(StaticRemoteConfig::from_file(remote_path)?);
    let mut coordinator = super::boot(config_path, remote).await?;

    let started = coordinator.check_update();
    if started == 0 {
        println!("All catalogs up to date.");
    }

    while let Some(outcome) = coordinator.await_sync_event().await {
        println!(
            "  {} {:?} download: {}",
            outcome.content_type, outcome.kind, outcome.phase
        );
    }

    let mut failed = 0;
    println!();
    for content_type in coordinator.registered() {
        let stage = coordinator
            .get_current_stage_id(content_type)
            .unwrap_or_else(|| "-".to_string());
        let phase = coordinator.sync_phase(content_type).unwrap_or(SyncPhase::Idle);
        if matches!(phase, SyncPhase::Failed(_)) {
            failed += 1;
        }
        let version = coordinator
            .state(content_type)
            .and_then(|state| state.local_catalog.as_ref())
            .and_then(|catalog| catalog.updated_at_utc())
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "bundled".to_string());
        println!("  {:<8} stage {:<16} {:<20} {}", content_type, stage, version, phase);
    }

    if failed > 0 {
        bail!("{} track(s) failed to sync", failed);
    }
    Ok(())
}
