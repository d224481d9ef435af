//! The session running as an actor: command ordering, timers, shutdown

mod common;

use common::{track, tracks};
use longplay_core::{HistoryStore, TrackId};
use longplay_session::{
    MediaAction, Session, SessionConfig, SessionError, SessionStatus, SimulatedEmbed, Visibility,
};
use longplay_storage::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

fn spawn(store: &MemoryStore, embed: &SimulatedEmbed) -> longplay_session::SessionHandle {
    let shared = Arc::new(store.clone());
    let session = Session::new(
        SessionConfig::default(),
        Box::new(embed.clone()),
        shared.clone(),
        shared,
    );
    session.spawn().0
}

#[tokio::test(start_paused = true)]
async fn commands_apply_in_order() {
    let store = MemoryStore::new();
    let embed = SimulatedEmbed::new();
    let handle = spawn(&store, &embed);

    handle.set_queue(tracks(&["a", "b", "c"]), 0).unwrap();
    handle.play_next().unwrap();
    handle.play_next().unwrap();

    let snapshot = handle
        .wait_for(|s| s.state.status == SessionStatus::Playing)
        .await
        .unwrap();
    assert_eq!(snapshot.queue.current_index, 2);
    assert_eq!(snapshot.state.current_track.unwrap().id.as_str(), "c");
    assert!(!snapshot.queue.has_next);
}

#[tokio::test(start_paused = true)]
async fn checkpoints_while_playing() {
    let store = MemoryStore::new();
    let embed = SimulatedEmbed::new();
    let handle = spawn(&store, &embed);

    handle.load_track(track("a"), None).unwrap();
    handle
        .wait_for(|s| s.state.status == SessionStatus::Playing)
        .await
        .unwrap();

    embed.advance(25.0);
    tokio::time::sleep(Duration::from_millis(10_500)).await;

    assert_eq!(
        store.get_resume_position(&TrackId::new("a")).await.unwrap(),
        Some(25.0)
    );
    assert_eq!(handle.snapshot().state.current_time, 25.0);
}

#[tokio::test(start_paused = true)]
async fn hardware_keys_and_visibility() {
    let store = MemoryStore::new();
    let embed = SimulatedEmbed::new();
    let handle = spawn(&store, &embed);

    handle.load_track(track("a"), None).unwrap();
    handle.set_visibility(Visibility::Hidden).unwrap();
    handle
        .wait_for(|s| s.state.status == SessionStatus::Playing)
        .await
        .unwrap();
    handle.media_action(MediaAction::Pause).unwrap();

    let snapshot = handle
        .wait_for(|s| s.state.status == SessionStatus::Paused)
        .await
        .unwrap();
    assert!(snapshot.state.embed_ready);
    assert!(!embed.is_playing());
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_and_stops_the_actor() {
    let store = MemoryStore::new();
    let embed = SimulatedEmbed::new();
    let handle = spawn(&store, &embed);

    handle.load_track(track("a"), None).unwrap();
    handle
        .wait_for(|s| s.state.status == SessionStatus::Playing)
        .await
        .unwrap();
    handle.shutdown().await.unwrap();

    assert_eq!(handle.snapshot().state.current_track, None);
    assert_eq!(embed.destroyed_count(), 1);
    assert!(matches!(handle.play(), Err(SessionError::Closed)));
}
