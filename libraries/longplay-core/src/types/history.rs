/// Listening history types
use super::track::Track;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of listening history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// The track that was played
    pub track: Track,

    /// Last known playback position (seconds)
    pub last_position: f64,

    /// Duration reported when the entry was recorded
    pub duration: Option<f64>,

    /// When the entry was last touched
    pub played_at: DateTime<Utc>,
}
