//! Integration tests for booting tracks and serving levels

mod common;

use common::{Fixture, stage_json};
use levelmap::handler::{DailyHandler, MainHandler, SpecialHandler};
use levelmap::store::{LocalStore, ProgressStore};
use levelmap::sync::{DownloadKind, SyncPhase};
use levelmap::{ActiveCatalog, CatalogSource, ContentType, LevelKind, SpecialLevelRule};

#[tokio::test]
async fn test_failed_track_does_not_block_others() {
    let fixture = Fixture::new();
    fixture.bundle_track(ContentType::Main, 100, &[("st0", 10)]);

    let mut coordinator = fixture.coordinator();
    coordinator.register(MainHandler::default());
    coordinator.register(SpecialHandler::new(
        SpecialLevelRule::default(),
        fixture.progress.clone(),
    ));

    let report = coordinator.initialize().await;
    assert_eq!(report.initialized, vec![ContentType::Main]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, ContentType::Special);
    assert!(!report.is_complete());

    assert!(coordinator.get_level_data(ContentType::Special, 1).await.is_none());
    let record = coordinator.get_level_data(ContentType::Main, 1).await.unwrap();
    assert_eq!(record.puzzle_id, "bundled:st0#1");
    assert_eq!(record.kind(), LevelKind::Normal);
    assert_eq!(record.tube_count(), 6);
}

#[tokio::test]
async fn test_register_twice_keeps_first() {
    let fixture = Fixture::new();
    let mut coordinator = fixture.coordinator();

    assert!(coordinator.register(MainHandler::new(3)));
    assert!(!coordinator.register(MainHandler::new(7)));
    assert_eq!(coordinator.registered(), vec![ContentType::Main]);
}

#[tokio::test]
async fn test_unknown_track_is_absent() {
    let fixture = Fixture::new();
    let mut coordinator = fixture.coordinator();

    assert!(coordinator.get_level_data(ContentType::Daily, 1).await.is_none());
    assert!(coordinator.get_current_stage_id(ContentType::Daily).is_none());
    assert!(coordinator.current_level(ContentType::Daily).is_none());
    assert!(!coordinator.need_update(ContentType::Daily, 1));
    assert!(coordinator.set_current_level(ContentType::Daily, 2).await.is_none());
}

#[tokio::test]
async fn test_main_prefetches_next_stage() {
    let fixture = Fixture::new();
    fixture.bundle_track(ContentType::Main, 100, &[("st0", 10), ("st1", 10)]);
    fixture.progress.set("MainLevel", 8).unwrap();

    let mut coordinator = fixture.coordinator();
    coordinator.register(MainHandler::default());
    coordinator.initialize().await;
    assert_eq!(coordinator.current_level(ContentType::Main), Some(8));
    assert_eq!(coordinator.get_current_stage_id(ContentType::Main).as_deref(), Some("st0"));

    let record = coordinator.get_level_data(ContentType::Main, 8).await.unwrap();
    assert_eq!(record.puzzle_id, "bundled:st0#8");
    // 8 + 5 runs past level 10, so st1 is already loaded
    assert_eq!(coordinator.get_current_stage_id(ContentType::Main).as_deref(), Some("st1"));

    let record = coordinator.get_level_data(ContentType::Main, 9).await.unwrap();
    assert_eq!(record.puzzle_id, "bundled:st0#9");
    let record = coordinator.get_level_data(ContentType::Main, 12).await.unwrap();
    assert_eq!(record.puzzle_id, "bundled:st1#12");
}

#[tokio::test]
async fn test_main_rerolls_on_backward_jump() {
    let fixture = Fixture::new();
    fixture.bundle_track(ContentType::Main, 100, &[("st0", 10), ("st1", 10), ("st2", 10)]);
    fixture.progress.set("MainLevel", 25).unwrap();

    let mut coordinator = fixture.coordinator();
    coordinator.register(MainHandler::default());
    coordinator.initialize().await;

    let record = coordinator.get_level_data(ContentType::Main, 3).await.unwrap();
    assert_eq!(record.puzzle_id, "bundled:st0#3");
    assert_eq!(coordinator.get_current_stage_id(ContentType::Main).as_deref(), Some("st0"));
}

#[tokio::test]
async fn test_daily_serves_only_its_stage() {
    let fixture = Fixture::new();
    fixture.bundle_track(ContentType::Daily, 100, &[("today", 3), ("unused", 5)]);

    let mut coordinator = fixture.coordinator();
    coordinator.register(DailyHandler::new());
    coordinator.initialize().await;

    assert_eq!(coordinator.get_current_stage_id(ContentType::Daily).as_deref(), Some("today"));
    assert!(coordinator.get_level_data(ContentType::Daily, 2).await.is_some());
    assert!(coordinator.get_level_data(ContentType::Daily, 5).await.is_none());
}

#[tokio::test]
async fn test_compute_stage_wraps_beyond_capacity() {
    let fixture = Fixture::new();
    fixture.bundle_track(ContentType::Main, 100, &[("a", 10)]);

    let mut coordinator = fixture.coordinator();
    coordinator.register(MainHandler::default());
    coordinator.initialize().await;

    let range = coordinator
        .compute_stage(ContentType::Main, 15, CatalogSource::UseDefault)
        .await
        .unwrap();
    assert_eq!((range.index, range.start, range.end), (0, 11, 20));
    assert_eq!(range.stage_id, "a");

    let record = coordinator.get_level_data(ContentType::Main, 15).await.unwrap();
    assert_eq!(record.puzzle_id, "bundled:a#5");
}

#[tokio::test]
async fn test_need_update_compares_local_catalog() {
    let fixture = Fixture::new();
    fixture.bundle_track(ContentType::Main, 100, &[("st0", 10)]);
    fixture.bundle_track(ContentType::Daily, 100, &[("d0", 3)]);
    fixture.save_local_catalog(ContentType::Main, 200, &[("n0", 10)]);

    let mut coordinator = fixture.coordinator();
    coordinator.register(MainHandler::default());
    coordinator.register(DailyHandler::new());
    coordinator.initialize().await;

    assert!(!coordinator.need_update(ContentType::Main, 200));
    assert!(coordinator.need_update(ContentType::Main, 201));
    assert!(coordinator.need_update(ContentType::Daily, 1));
}

#[tokio::test]
async fn test_set_current_level_persists_and_resolves() {
    let fixture = Fixture::new();
    fixture.bundle_track(ContentType::Main, 100, &[("st0", 10), ("st1", 10)]);

    let mut coordinator = fixture.coordinator();
    coordinator.register(MainHandler::default());
    coordinator.initialize().await;

    let range = coordinator.set_current_level(ContentType::Main, 15).await.unwrap();
    assert_eq!((range.start, range.end), (11, 20));
    assert_eq!(fixture.progress.get("MainLevel"), Some(15));
    assert_eq!(coordinator.current_level(ContentType::Main), Some(15));
    assert_eq!(coordinator.get_current_stage_id(ContentType::Main).as_deref(), Some("st1"));
}

#[tokio::test]
async fn test_boot_uses_downloaded_stage_when_present() {
    let fixture = Fixture::new();
    fixture.bundle_track(ContentType::Main, 100, &[("st0", 10)]);
    fixture.save_local_catalog(ContentType::Main, 200, &[("n0", 10)]);
    fixture
        .store
        .insert(fixture.layout.saved_stage_path(200, "n0"), stage_json("remote", "n0", 1, 10));

    let mut coordinator = fixture.coordinator();
    coordinator.register(MainHandler::default());
    coordinator.initialize().await;

    let state = coordinator.state(ContentType::Main).unwrap();
    assert_eq!(state.active, ActiveCatalog::Local);
    let record = coordinator.get_level_data(ContentType::Main, 1).await.unwrap();
    assert_eq!(record.puzzle_id, "remote:n0#1");
    assert!(fixture.downloader.calls().is_empty());
}

#[tokio::test]
async fn test_boot_falls_back_while_stage_downloads() {
    let fixture = Fixture::new();
    fixture.bundle_track(ContentType::Main, 100, &[("st0", 10)]);
    fixture.save_local_catalog(ContentType::Main, 200, &[("n0", 10)]);
    fixture.serve_stages(&[("n0", 10)]);

    let mut coordinator = fixture.coordinator();
    coordinator.register(MainHandler::default());
    coordinator.initialize().await;

    assert_eq!(coordinator.get_current_stage_id(ContentType::Main).as_deref(), Some("st0"));
    assert_eq!(coordinator.sync_phase(ContentType::Main), Some(SyncPhase::StageDownloading));

    let outcome = coordinator.await_sync_event().await.unwrap();
    assert_eq!(outcome.kind, DownloadKind::Stage);
    assert_eq!(outcome.phase, SyncPhase::StageReady);
    assert_eq!(coordinator.get_current_stage_id(ContentType::Main).as_deref(), Some("n0"));

    let record = coordinator.get_level_data(ContentType::Main, 1).await.unwrap();
    assert_eq!(record.puzzle_id, "remote:n0#1");
    assert!(fixture.store.exists("cache/200/n0"));
}

#[tokio::test]
async fn test_stage_download_follows_player_who_moved_on() {
    let fixture = Fixture::gated();
    fixture.bundle_track(ContentType::Main, 100, &[("st0", 10), ("st1", 10)]);
    fixture.save_local_catalog(ContentType::Main, 200, &[("n0", 10), ("n1", 10)]);
    fixture.serve_stages(&[("n0", 10), ("n1", 10)]);

    let mut coordinator = fixture.coordinator();
    coordinator.register(MainHandler::default());
    coordinator.initialize().await;

    // n0 is still downloading when the player jumps into the second stage
    let range = coordinator.set_current_level(ContentType::Main, 15).await.unwrap();
    assert_eq!(range.stage_id, "st1");

    fixture.downloader.release(2);
    while coordinator.await_sync_event().await.is_some() {}

    assert_eq!(coordinator.current_level(ContentType::Main), Some(15));
    let range = coordinator.state(ContentType::Main).unwrap().stage.clone().unwrap();
    assert!(range.contains(15));
    assert_eq!(range.stage_id, "n1");
    assert_eq!(coordinator.get_current_stage_id(ContentType::Main).as_deref(), Some("n1"));
    assert_eq!(coordinator.sync_phase(ContentType::Main), Some(SyncPhase::StageReady));
    assert_eq!(
        fixture.downloader.calls(),
        vec!["stages/n0".to_string(), "stages/n1".to_string()]
    );

    let record = coordinator.get_level_data(ContentType::Main, 15).await.unwrap();
    assert_eq!(record.puzzle_id, "remote:n1#15");
}

#[tokio::test]
async fn test_special_unlocks_from_main_progress() {
    let fixture = Fixture::new();
    fixture.bundle_track(ContentType::Special, 100, &[("s0", 5)]);
    fixture.progress.set("MainLevel", 21).unwrap();

    let rule = SpecialLevelRule {
        enable: true,
        start: 10,
        offset: 10,
    };
    let mut coordinator = fixture.coordinator();
    coordinator.register(SpecialHandler::new(rule, fixture.progress.clone()));
    coordinator.initialize().await;

    assert_eq!(coordinator.current_level(ContentType::Special), Some(2));
    assert!(coordinator.special_level_due());
    assert_eq!(fixture.progress.get("PassedSpecialLevel"), None);
    assert!(coordinator.is_enter_specified_level());
    assert!(!coordinator.is_enter_specified_level());
    assert_eq!(fixture.progress.get("PassedSpecialLevel"), Some(2));

    let record = coordinator.get_level_data(ContentType::Special, 2).await.unwrap();
    assert_eq!(record.puzzle_id, "bundled:s0#2");
}
