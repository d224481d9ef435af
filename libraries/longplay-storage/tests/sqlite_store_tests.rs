//! Integration tests for the SQLite store
//!
//! Uses REAL SQLite files (not in-memory) so migrations, constraints and
//! indexes behave as they do on a device.

use longplay_core::{HistoryStore, SettingsStore, Track, TrackId};
use longplay_storage::SqliteStore;
use std::time::Duration;
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
struct TestDb {
    store: SqliteStore,
    _temp_dir: TempDir,
}

impl TestDb {
    async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let store = SqliteStore::open(&db_url)
            .await
            .expect("Failed to open store");

        Self {
            store,
            _temp_dir: temp_dir,
        }
    }
}

fn episode(id: &str) -> Track {
    Track::new(id, format!("Episode {id}"))
        .with_author("Long Talks")
        .with_thumbnail(format!("https://img.example/{id}.jpg"))
}

#[tokio::test]
async fn missing_resume_position_is_none() {
    let db = TestDb::new().await;
    let position = db
        .store
        .get_resume_position(&TrackId::new("never-played"))
        .await
        .unwrap();
    assert_eq!(position, None);
}

#[tokio::test]
async fn record_position_is_last_write_wins() {
    let db = TestDb::new().await;
    let id = TrackId::new("ep1");

    db.store.record_position(&id, 10.0).await.unwrap();
    db.store.record_position(&id, 95.5).await.unwrap();

    assert_eq!(db.store.get_resume_position(&id).await.unwrap(), Some(95.5));
}

#[tokio::test]
async fn history_round_trips_track_and_orders_newest_first() {
    let db = TestDb::new().await;

    db.store
        .record_history_entry(&episode("ep1"), 0.0, Some(3600.0))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    db.store
        .record_history_entry(&episode("ep2"), 30.0, None)
        .await
        .unwrap();

    let history = db.store.get_recent_history(10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].track.id.as_str(), "ep2");
    assert_eq!(history[0].last_position, 30.0);
    assert_eq!(history[1].track, episode("ep1"));
    assert_eq!(history[1].duration, Some(3600.0));

    let limited = db.store.get_recent_history(1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn checkpoint_updates_history_last_position() {
    let db = TestDb::new().await;
    let track = episode("ep1");

    db.store
        .record_history_entry(&track, 0.0, Some(1200.0))
        .await
        .unwrap();
    db.store.record_position(&track.id, 640.0).await.unwrap();

    let history = db.store.get_recent_history(5).await.unwrap();
    assert_eq!(history[0].last_position, 640.0);
    // Duration survives a re-record without one
    db.store.record_history_entry(&track, 640.0, None).await.unwrap();
    let history = db.store.get_recent_history(5).await.unwrap();
    assert_eq!(history[0].duration, Some(1200.0));
}

#[tokio::test]
async fn settings_round_trip_json_values() {
    let db = TestDb::new().await;

    assert!(db.store.get_value("settings.playback_rate").await.unwrap().is_none());

    db.store
        .set_value("settings.playback_rate", serde_json::json!(1.5))
        .await
        .unwrap();
    db.store
        .set_value("queue.tracks", serde_json::json!([{ "id": "a", "title": "A" }]))
        .await
        .unwrap();

    assert_eq!(
        db.store.get_value("settings.playback_rate").await.unwrap(),
        Some(serde_json::json!(1.5))
    );
    let queue = db.store.get_value("queue.tracks").await.unwrap().unwrap();
    assert_eq!(queue[0]["id"], "a");
}

#[tokio::test]
async fn data_survives_reopen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}", temp_dir.path().join("reopen.db").display());

    {
        let store = SqliteStore::open(&db_url).await.unwrap();
        store.record_position(&TrackId::new("ep9"), 77.0).await.unwrap();
        store.pool().close().await;
    }

    let store = SqliteStore::open(&db_url).await.unwrap();
    assert_eq!(
        store.get_resume_position(&TrackId::new("ep9")).await.unwrap(),
        Some(77.0)
    );
}

#[tokio::test]
async fn clear_all_empties_every_table() {
    let db = TestDb::new().await;
    let track = episode("ep1");

    db.store.record_history_entry(&track, 0.0, None).await.unwrap();
    db.store.record_position(&track.id, 12.0).await.unwrap();
    db.store.set_value("k", serde_json::json!(true)).await.unwrap();

    db.store.clear_all().await.unwrap();

    assert!(db.store.get_recent_history(10).await.unwrap().is_empty());
    assert!(db.store.get_resume_position(&track.id).await.unwrap().is_none());
    assert!(db.store.get_value("k").await.unwrap().is_none());
}
