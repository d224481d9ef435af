/// Collaborator traits for Longplay
///
/// The playback session never talks to a database directly. It depends on
/// these two traits, implemented by `longplay-storage` (SQLite and in-memory).
use crate::error::Result;
use crate::types::{HistoryEntry, Track, TrackId};
use async_trait::async_trait;

/// Durable listening history and per-track resume positions
///
/// Key format and storage technology are implementation details.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Get the saved resume position (seconds) for a track
    ///
    /// Returns `Ok(None)` when the track has never been checkpointed.
    async fn get_resume_position(&self, track_id: &TrackId) -> Result<Option<f64>>;

    /// Get the most recently played tracks, newest first
    async fn get_recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Checkpoint the playback position of a track
    async fn record_position(&self, track_id: &TrackId, position: f64) -> Result<()>;

    /// Record that a track was loaded, with its starting position and known duration
    async fn record_history_entry(
        &self,
        track: &Track,
        position: f64,
        duration: Option<f64>,
    ) -> Result<()>;
}

/// Key/value settings storage
///
/// Values are JSON so each mirrored field can be written independently.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Get a single value
    ///
    /// Returns `Ok(None)` if the key has never been written.
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Set a single value (last write wins)
    async fn set_value(&self, key: &str, value: serde_json::Value) -> Result<()>;
}
