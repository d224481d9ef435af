//! Settings mirror
//!
//! Session preferences, the queue and the last-played track are mirrored to
//! a [`SettingsStore`] one key per field. Reads are best-effort per field and
//! writes are fire-and-absorb: storage trouble is logged and never reaches
//! the caller.

use longplay_core::{RepeatMode, SettingsStore, Track};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub const KEY_PLAYBACK_RATE: &str = "settings.playback_rate";
pub const KEY_REPEAT_MODE: &str = "settings.repeat_mode";
pub const KEY_AUTO_PLAY_NEXT: &str = "settings.auto_play_next";
pub const KEY_VOLUME: &str = "settings.volume";
pub const KEY_QUEUE_TRACKS: &str = "queue.tracks";
pub const KEY_QUEUE_INDEX: &str = "queue.current_index";
pub const KEY_LAST_TRACK: &str = "session.last_track";

/// Fields recovered at startup; `None` means absent or unreadable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredSession {
    pub playback_rate: Option<f64>,
    pub repeat_mode: Option<RepeatMode>,
    pub auto_play_next: Option<bool>,
    pub volume: Option<u8>,
    pub queue: Option<(Vec<Track>, usize)>,
    pub last_track: Option<Track>,
}

#[derive(Clone)]
pub struct PersistenceBridge {
    settings: Arc<dyn SettingsStore>,
}

impl PersistenceBridge {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Read every mirrored field independently
    pub async fn restore(&self) -> RestoredSession {
        let playback_rate = self
            .read::<f64>(KEY_PLAYBACK_RATE)
            .await
            .filter(|r| r.is_finite() && *r > 0.0);
        let repeat_mode = self
            .read::<String>(KEY_REPEAT_MODE)
            .await
            .and_then(|s| RepeatMode::from_str(&s));
        let auto_play_next = self.read::<bool>(KEY_AUTO_PLAY_NEXT).await;
        let volume = self
            .read::<u64>(KEY_VOLUME)
            .await
            .map(|v| v.min(100) as u8);

        let queue = match self.read::<Vec<Track>>(KEY_QUEUE_TRACKS).await {
            Some(tracks) if !tracks.is_empty() => {
                let index = self
                    .read::<usize>(KEY_QUEUE_INDEX)
                    .await
                    .filter(|i| *i < tracks.len())
                    .unwrap_or(0);
                Some((tracks, index))
            }
            _ => None,
        };
        let last_track = self.read::<Track>(KEY_LAST_TRACK).await;

        RestoredSession {
            playback_rate,
            repeat_mode,
            auto_play_next,
            volume,
            queue,
            last_track,
        }
    }

    pub async fn save_playback_rate(&self, rate: f64) {
        self.write(KEY_PLAYBACK_RATE, &rate).await;
    }

    pub async fn save_repeat_mode(&self, mode: RepeatMode) {
        self.write(KEY_REPEAT_MODE, mode.as_str()).await;
    }

    pub async fn save_auto_play_next(&self, enabled: bool) {
        self.write(KEY_AUTO_PLAY_NEXT, &enabled).await;
    }

    pub async fn save_volume(&self, volume: u8) {
        self.write(KEY_VOLUME, &volume).await;
    }

    /// Mirror the queue; an empty queue is never written
    pub async fn save_queue(&self, tracks: &[Track], index: usize) {
        if tracks.is_empty() {
            debug!("Queue is empty, keeping the previously saved queue");
            return;
        }
        self.write(KEY_QUEUE_TRACKS, tracks).await;
        self.write(KEY_QUEUE_INDEX, &index).await;
    }

    pub async fn save_queue_index(&self, index: usize) {
        self.write(KEY_QUEUE_INDEX, &index).await;
    }

    pub async fn save_last_track(&self, track: &Track) {
        self.write(KEY_LAST_TRACK, track).await;
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.settings.get_value(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!(key, error = %e, "Ignoring malformed setting");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read setting");
                None
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize setting");
                return;
            }
        };
        if let Err(e) = self.settings.set_value(key, value).await {
            warn!(key, error = %e, "Failed to persist setting");
        }
    }
}
