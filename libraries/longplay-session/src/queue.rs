//! Queue and repeat policy
//!
//! Pure, synchronous bookkeeping. Navigation methods return a [`QueueStep`]
//! describing what the session should do; the engine itself never touches
//! the embed.

use crate::shuffle::shuffle_after_first;
use longplay_core::{RepeatMode, Track, TrackId};
use rand::Rng;

/// Decision returned by queue navigation
#[derive(Debug, Clone, PartialEq)]
pub enum QueueStep {
    /// Load this track; the index is already current
    Load { index: usize, track: Track },
    /// Seek the current track back to 0 and keep playing
    RestartCurrent,
    /// Nothing follows; playback stops
    Stop,
    /// Nothing to do
    Unchanged,
}

/// Ordered play queue with repeat, auto-advance and shuffle
#[derive(Debug, Clone)]
pub struct QueueEngine {
    tracks: Vec<Track>,
    current_index: usize,
    repeat_mode: RepeatMode,
    auto_play_next: bool,
    /// Order before shuffling; `Some` exactly while shuffled
    original_order: Option<Vec<Track>>,
    restart_threshold: f64,
}

impl QueueEngine {
    /// Create an empty queue
    ///
    /// `restart_threshold` is the position (seconds) past which "previous"
    /// restarts the current track instead of moving back.
    pub fn new(restart_threshold: f64) -> Self {
        Self {
            tracks: Vec::new(),
            current_index: 0,
            repeat_mode: RepeatMode::Off,
            auto_play_next: true,
            original_order: None,
            restart_threshold,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.current_index)
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    pub fn auto_play_next(&self) -> bool {
        self.auto_play_next
    }

    pub fn set_auto_play_next(&mut self, enabled: bool) {
        self.auto_play_next = enabled;
    }

    pub fn is_shuffled(&self) -> bool {
        self.original_order.is_some()
    }

    /// Order the queue had before shuffling
    pub fn original_order(&self) -> Option<&[Track]> {
        self.original_order.as_deref()
    }

    /// A following track exists (including a repeat-all wrap)
    pub fn has_next(&self) -> bool {
        if self.tracks.is_empty() {
            return false;
        }
        self.current_index + 1 < self.tracks.len() || self.repeat_mode == RepeatMode::All
    }

    pub fn has_previous(&self) -> bool {
        !self.tracks.is_empty() && self.current_index > 0
    }

    /// Replace the queue and start at `start_index`
    ///
    /// Clears shuffle. An out-of-range start selects index 0 without loading.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> QueueStep {
        self.tracks = tracks;
        self.original_order = None;
        if start_index < self.tracks.len() {
            self.load_at(start_index)
        } else {
            self.current_index = 0;
            QueueStep::Unchanged
        }
    }

    /// Reinstate a persisted queue without loading anything
    pub fn restore(&mut self, tracks: Vec<Track>, index: usize) {
        self.current_index = if index < tracks.len() { index } else { 0 };
        self.tracks = tracks;
        self.original_order = None;
    }

    /// Move to the next track; wraps only under repeat-all
    pub fn play_next(&mut self) -> QueueStep {
        if self.tracks.is_empty() {
            return QueueStep::Unchanged;
        }
        if self.current_index + 1 < self.tracks.len() {
            self.load_at(self.current_index + 1)
        } else if self.repeat_mode == RepeatMode::All {
            self.load_at(0)
        } else {
            QueueStep::Unchanged
        }
    }

    /// Restart past the threshold, otherwise move back one track
    pub fn play_previous(&mut self, position: f64) -> QueueStep {
        if position > self.restart_threshold {
            return QueueStep::RestartCurrent;
        }
        if self.has_previous() {
            self.load_at(self.current_index - 1)
        } else {
            QueueStep::Unchanged
        }
    }

    /// Jump to an index
    pub fn select_index(&mut self, index: usize) -> QueueStep {
        if index < self.tracks.len() {
            self.load_at(index)
        } else {
            QueueStep::Unchanged
        }
    }

    /// Point the index at a track loaded from outside the queue, if present
    pub fn select_track(&mut self, id: &TrackId) -> bool {
        match self.tracks.iter().position(|t| &t.id == id) {
            Some(index) => {
                self.current_index = index;
                true
            }
            None => false,
        }
    }

    /// Decide what follows a natural end of playback
    ///
    /// Repeat-one restarts, repeat-all wraps, otherwise the queue advances
    /// only when auto-play-next is on. A lone track (empty queue) under
    /// repeat-all loops like repeat-one.
    pub fn on_ended(&mut self) -> QueueStep {
        match self.repeat_mode {
            RepeatMode::One => QueueStep::RestartCurrent,
            RepeatMode::All => {
                if self.tracks.is_empty() {
                    QueueStep::RestartCurrent
                } else if self.current_index + 1 < self.tracks.len() {
                    self.load_at(self.current_index + 1)
                } else {
                    self.load_at(0)
                }
            }
            RepeatMode::Off => {
                if self.auto_play_next && self.current_index + 1 < self.tracks.len() {
                    self.load_at(self.current_index + 1)
                } else {
                    QueueStep::Stop
                }
            }
        }
    }

    /// Advance the repeat mode: none -> one -> all -> none
    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.repeat_mode = self.repeat_mode.cycle();
        self.repeat_mode
    }

    /// Toggle shuffle using the thread-local rng
    pub fn toggle_shuffle(&mut self) -> bool {
        self.toggle_shuffle_with(&mut rand::thread_rng())
    }

    /// Toggle shuffle; returns whether the queue is now shuffled
    ///
    /// Enabling moves the current track to the front and shuffles the rest.
    /// Disabling restores the original order and re-finds the current track
    /// in it by id.
    pub fn toggle_shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if let Some(original) = self.original_order.take() {
            let current_id = self.current().map(|t| t.id.clone());
            self.tracks = original;
            self.current_index = current_id
                .and_then(|id| self.tracks.iter().position(|t| t.id == id))
                .unwrap_or(0);
            return false;
        }

        self.original_order = Some(self.tracks.clone());
        if !self.tracks.is_empty() {
            let current = self.tracks.remove(self.current_index);
            self.tracks.insert(0, current);
            shuffle_after_first(&mut self.tracks, rng);
        }
        self.current_index = 0;
        true
    }

    fn load_at(&mut self, index: usize) -> QueueStep {
        self.current_index = index;
        QueueStep::Load {
            index,
            track: self.tracks[index].clone(),
        }
    }
}
