//! Shared test harness for session tests

#![allow(dead_code)]

use longplay_core::Track;
use longplay_session::{PlatformBridge, Session, SessionConfig, SimulatedEmbed};
use longplay_storage::MemoryStore;
use std::sync::Arc;

pub fn track(id: &str) -> Track {
    Track::new(id, format!("Title {id}")).with_author("Some Channel")
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

/// A session wired to a simulated embed and an in-memory store
pub struct Harness {
    pub session: Session,
    pub embed: SimulatedEmbed,
    pub store: MemoryStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        Self::with_config(SessionConfig::default(), store)
    }

    pub fn with_config(config: SessionConfig, store: MemoryStore) -> Self {
        let embed = SimulatedEmbed::new();
        let shared = Arc::new(store.clone());
        let session = Session::new(config, Box::new(embed.clone()), shared.clone(), shared);
        Self {
            session,
            embed,
            store,
        }
    }

    /// Swap in a platform bridge with real capabilities
    pub fn with_platform(mut self, platform: PlatformBridge) -> Self {
        self.session = self.session.with_platform(platform);
        self
    }

    /// Apply every queued embed signal, including those emitted in response
    pub async fn settle(&mut self) {
        while self.session.process_pending_signals().await > 0 {}
    }

    /// Load a track and let the embed report ready and playing
    pub async fn play_track(&mut self, track: Track) {
        self.session.load_track(track, None).await;
        self.settle().await;
    }

    /// Advance the embed clock and sample the position
    pub async fn advance(&mut self, seconds: f64) {
        self.embed.advance(seconds);
        self.session
            .on_timer(longplay_session::TimerTick::Poll)
            .await;
        self.settle().await;
    }

    pub fn current_id(&self) -> Option<String> {
        self.session
            .state()
            .current_track
            .as_ref()
            .map(|t| t.id.as_str().to_string())
    }
}
