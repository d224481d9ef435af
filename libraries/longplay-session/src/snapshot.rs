//! Observable session snapshot
//!
//! Published through a `tokio::sync::watch` channel after every change, so
//! observers always see the latest complete picture without replaying events.

use crate::queue::QueueEngine;
use crate::state::SessionState;
use longplay_core::{RepeatMode, Track};
use serde::Serialize;
use std::sync::Arc;

/// Queue as seen by observers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    /// Shared with the session until the queue contents change
    pub tracks: Arc<Vec<Track>>,
    pub current_index: usize,
    pub repeat_mode: RepeatMode,
    pub shuffled: bool,
    pub auto_play_next: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

impl QueueSnapshot {
    pub(crate) fn capture(queue: &QueueEngine, tracks: Arc<Vec<Track>>) -> Self {
        Self {
            tracks,
            current_index: queue.current_index(),
            repeat_mode: queue.repeat_mode(),
            shuffled: queue.is_shuffled(),
            auto_play_next: queue.auto_play_next(),
            has_next: queue.has_next(),
            has_previous: queue.has_previous(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub queue: QueueSnapshot,
}
