//! Settings mirror: restore, fail-silent reads, empty-queue protection

mod common;

use common::{track, tracks, Harness};
use longplay_core::RepeatMode;
use longplay_session::persistence::{
    KEY_AUTO_PLAY_NEXT, KEY_LAST_TRACK, KEY_PLAYBACK_RATE, KEY_QUEUE_INDEX, KEY_QUEUE_TRACKS,
    KEY_REPEAT_MODE, KEY_VOLUME,
};
use longplay_session::{PersistenceBridge, SessionStatus};
use longplay_storage::MemoryStore;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn empty_queue_never_overwrites_saved_queue() {
    let store = MemoryStore::new();
    let bridge = PersistenceBridge::new(Arc::new(store.clone()));

    bridge.save_queue(&tracks(&["a", "b"]), 1).await;
    bridge.save_queue(&[], 0).await;

    let restored = bridge.restore().await;
    let (queue, index) = restored.queue.unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(index, 1);
}

#[tokio::test]
async fn malformed_fields_fall_back_individually() {
    let store = MemoryStore::new();
    store.insert_raw_setting(KEY_PLAYBACK_RATE, json!("fast"));
    store.insert_raw_setting(KEY_REPEAT_MODE, json!("sometimes"));
    store.insert_raw_setting(KEY_VOLUME, json!(400));
    store.insert_raw_setting(KEY_AUTO_PLAY_NEXT, json!(false));
    store.insert_raw_setting(KEY_QUEUE_TRACKS, json!([{ "title": "no id" }]));
    store.insert_raw_setting(KEY_LAST_TRACK, json!({ "id": "z", "title": "Z" }));

    let restored = PersistenceBridge::new(Arc::new(store)).restore().await;

    assert_eq!(restored.playback_rate, None);
    assert_eq!(restored.repeat_mode, None);
    assert_eq!(restored.volume, Some(100));
    assert_eq!(restored.auto_play_next, Some(false));
    assert_eq!(restored.queue, None);
    assert_eq!(restored.last_track.unwrap().id.as_str(), "z");
}

#[tokio::test]
async fn out_of_range_queue_index_resets_to_zero() {
    let store = MemoryStore::new();
    let bridge = PersistenceBridge::new(Arc::new(store.clone()));
    bridge.save_queue(&tracks(&["a", "b"]), 1).await;
    store.insert_raw_setting(KEY_QUEUE_INDEX, json!(9));

    let (_, index) = bridge.restore().await.queue.unwrap();
    assert_eq!(index, 0);
}

#[tokio::test]
async fn session_restores_mirrored_settings() {
    let store = MemoryStore::new();
    store.insert_raw_setting(KEY_PLAYBACK_RATE, json!(1.4));
    store.insert_raw_setting(KEY_REPEAT_MODE, json!("all"));
    store.insert_raw_setting(KEY_VOLUME, json!(35));
    store.insert_raw_setting(KEY_LAST_TRACK, json!({ "id": "z", "title": "Z" }));
    PersistenceBridge::new(Arc::new(store.clone()))
        .save_queue(&tracks(&["a", "b", "c"]), 2)
        .await;

    let mut h = Harness::with_store(store);
    h.session.restore().await;

    let state = h.session.state();
    assert_eq!(state.playback_rate, 1.5);
    assert_eq!(state.volume, 35);
    assert_eq!(state.status, SessionStatus::Idle);
    assert_eq!(h.current_id().as_deref(), Some("z"));
    assert_eq!(h.session.queue().repeat_mode(), RepeatMode::All);
    assert_eq!(h.session.queue().current_index(), 2);
    assert_eq!(h.session.snapshot().queue.tracks.len(), 3);
}

#[tokio::test]
async fn restored_track_does_not_displace_active_one() {
    let store = MemoryStore::new();
    store.insert_raw_setting(KEY_LAST_TRACK, json!({ "id": "z", "title": "Z" }));

    let mut h = Harness::with_store(store);
    h.play_track(track("a")).await;
    h.session.restore().await;

    assert_eq!(h.current_id().as_deref(), Some("a"));
    assert_eq!(h.session.state().status, SessionStatus::Playing);
}

#[tokio::test]
async fn restored_last_track_plays_from_resume_point() {
    let store = MemoryStore::new();
    store.insert_raw_setting(KEY_LAST_TRACK, json!({ "id": "z", "title": "Z" }));
    longplay_core::HistoryStore::record_position(&store, &"z".into(), 50.0)
        .await
        .unwrap();

    let mut h = Harness::with_store(store);
    h.session.restore().await;
    h.session.play().await;
    h.settle().await;

    assert_eq!(h.session.state().status, SessionStatus::Playing);
    assert_eq!(h.embed.last_request().unwrap().start_seconds, 50.0);
}

#[tokio::test]
async fn queue_changes_are_mirrored() {
    let mut h = Harness::new();
    h.session.set_queue(tracks(&["a", "b", "c"]), 0).await;
    h.settle().await;
    h.session.play_next().await;
    h.session.set_auto_play_next(false).await;
    h.session.cycle_repeat_mode().await;

    assert_eq!(h.store.setting(KEY_QUEUE_INDEX), Some(json!(1)));
    assert_eq!(h.store.setting(KEY_AUTO_PLAY_NEXT), Some(json!(false)));
    assert_eq!(h.store.setting(KEY_REPEAT_MODE), Some(json!("one")));
    assert_eq!(
        h.store.setting(KEY_QUEUE_TRACKS).unwrap().as_array().unwrap().len(),
        3
    );
}
