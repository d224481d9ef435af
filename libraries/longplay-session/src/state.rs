//! Session state machine
//!
//! [`reduce`] is a pure function from (state, transition) to the next state.
//! [`StateStore`] owns the live state and reports what each dispatch changed
//! so the session can react (timers, platform bridge, persistence).

use crate::embed::EmbedState;
use longplay_core::Track;
use serde::Serialize;

/// Status of the single playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Buffering,
    Error,
}

impl SessionStatus {
    /// Content is loaded and the embed is live
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Ready | Self::Playing | Self::Paused | Self::Buffering
        )
    }
}

/// Observable session state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_track: Option<Track>,
    pub status: SessionStatus,
    /// Seconds, within `[0, duration]` once the duration is known
    pub current_time: f64,
    /// Seconds, 0 while unknown
    pub duration: f64,
    pub playback_rate: f64,
    /// 0-100
    pub volume: u8,
    pub expanded: bool,
    pub embed_ready: bool,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn new(volume: u8) -> Self {
        Self {
            current_track: None,
            status: SessionStatus::Idle,
            current_time: 0.0,
            duration: 0.0,
            playback_rate: 1.0,
            volume: volume.min(100),
            expanded: false,
            embed_ready: false,
            last_error: None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Everything that can move the session state
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A new track load started
    LoadRequested { track: Track },
    /// The embed for the current load is ready
    EmbedReady { duration: f64 },
    /// Normalized player state from the embed
    Embed(EmbedState),
    /// The embed reported an error, or the load failed
    Failed { message: String },
    /// Position sample from polling
    Progress { current_time: f64, duration: f64 },
    /// Position set by a seek
    Seeked { position: f64 },
    RateChanged(f64),
    VolumeChanged(u8),
    ExpandedChanged(bool),
    /// Last-played track restored at startup; never displaces an active track
    Restored { track: Track },
    /// Session closed; volume and rate survive
    Reset,
}

/// Clamp a position into `[0, duration]` (upper bound only when known)
pub fn clamp_position(position: f64, duration: f64) -> f64 {
    if !position.is_finite() || position < 0.0 {
        return 0.0;
    }
    if duration > 0.0 {
        position.min(duration)
    } else {
        position
    }
}

/// Compute the next state
pub fn reduce(state: &SessionState, transition: &Transition) -> SessionState {
    let mut next = state.clone();
    match transition {
        Transition::LoadRequested { track } => {
            next.duration = track.duration_or_zero();
            next.current_track = Some(track.clone());
            next.status = SessionStatus::Loading;
            next.current_time = 0.0;
            next.embed_ready = false;
            next.last_error = None;
        }
        Transition::EmbedReady { duration } => {
            if state.status == SessionStatus::Loading {
                next.status = SessionStatus::Ready;
                next.embed_ready = true;
                if *duration > 0.0 {
                    next.duration = *duration;
                }
                next.current_time = clamp_position(next.current_time, next.duration);
            }
        }
        Transition::Embed(embed_state) => {
            if let Some(status) = embed_transition(state.status, *embed_state) {
                next.status = status;
                if *embed_state == EmbedState::Ended && next.duration > 0.0 {
                    next.current_time = next.duration;
                }
            }
        }
        Transition::Failed { message } => {
            if state.current_track.is_some() {
                next.status = SessionStatus::Error;
                next.embed_ready = false;
                next.last_error = Some(message.clone());
            }
        }
        Transition::Progress {
            current_time,
            duration,
        } => {
            if state.current_track.is_some() {
                if *duration > 0.0 {
                    next.duration = *duration;
                }
                next.current_time = clamp_position(*current_time, next.duration);
            }
        }
        Transition::Seeked { position } => {
            if state.current_track.is_some() {
                next.current_time = clamp_position(*position, next.duration);
            }
        }
        Transition::RateChanged(rate) => next.playback_rate = *rate,
        Transition::VolumeChanged(volume) => next.volume = (*volume).min(100),
        Transition::ExpandedChanged(expanded) => next.expanded = *expanded,
        Transition::Restored { track } => {
            if state.current_track.is_none() {
                next.duration = track.duration_or_zero();
                next.current_track = Some(track.clone());
                next.status = SessionStatus::Idle;
                next.current_time = 0.0;
            }
        }
        Transition::Reset => {
            next = SessionState {
                playback_rate: state.playback_rate,
                volume: state.volume,
                ..SessionState::new(state.volume)
            };
        }
    }
    next
}

/// Status reached from `from` when the embed reports `embed_state`
///
/// `None` means the signal is ignored: nothing is accepted while loading
/// (the embed must report ready first) or once idle/errored.
fn embed_transition(from: SessionStatus, embed_state: EmbedState) -> Option<SessionStatus> {
    use SessionStatus as S;

    if !from.is_active() {
        return None;
    }
    match embed_state {
        EmbedState::Playing => Some(S::Playing),
        EmbedState::Paused => Some(S::Paused),
        EmbedState::Buffering => Some(S::Buffering),
        EmbedState::Ended => Some(S::Idle),
        EmbedState::Cued => None,
    }
}

/// What a dispatch changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub previous: SessionStatus,
    pub current: SessionStatus,
    pub track_changed: bool,
    pub position_changed: bool,
}

impl StateChange {
    pub fn status_changed(&self) -> bool {
        self.previous != self.current
    }

    pub fn started_playing(&self) -> bool {
        self.previous != SessionStatus::Playing && self.current == SessionStatus::Playing
    }

    pub fn stopped_playing(&self) -> bool {
        self.previous == SessionStatus::Playing && self.current != SessionStatus::Playing
    }
}

/// Owner of the live session state
#[derive(Debug, Default)]
pub struct StateStore {
    state: SessionState,
}

impl StateStore {
    pub fn new(state: SessionState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn dispatch(&mut self, transition: &Transition) -> StateChange {
        let next = reduce(&self.state, transition);
        let change = StateChange {
            previous: self.state.status,
            current: next.status,
            track_changed: self.state.current_track.as_ref().map(|t| &t.id)
                != next.current_track.as_ref().map(|t| &t.id),
            position_changed: self.state.current_time != next.current_time
                || self.state.duration != next.duration
                || self.state.playback_rate != next.playback_rate,
        };
        self.state = next;
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track::new(id, format!("Track {id}"))
    }

    fn loaded(id: &str, duration: f64) -> SessionState {
        let mut s = reduce(
            &SessionState::default(),
            &Transition::LoadRequested { track: track(id) },
        );
        s = reduce(&s, &Transition::EmbedReady { duration });
        s
    }

    #[test]
    fn load_enters_loading_and_clears_error() {
        let mut state = SessionState::default();
        state.last_error = Some("old".to_string());
        let next = reduce(&state, &Transition::LoadRequested { track: track("a") });

        assert_eq!(next.status, SessionStatus::Loading);
        assert_eq!(next.last_error, None);
        assert!(!next.embed_ready);
    }

    #[test]
    fn states_are_ignored_until_ready() {
        let state = reduce(
            &SessionState::default(),
            &Transition::LoadRequested { track: track("a") },
        );
        let next = reduce(&state, &Transition::Embed(EmbedState::Playing));
        assert_eq!(next.status, SessionStatus::Loading);

        let next = reduce(&next, &Transition::EmbedReady { duration: 120.0 });
        assert_eq!(next.status, SessionStatus::Ready);
        assert_eq!(next.duration, 120.0);
        let next = reduce(&next, &Transition::Embed(EmbedState::Playing));
        assert_eq!(next.status, SessionStatus::Playing);
    }

    #[test]
    fn ended_goes_idle_and_keeps_track() {
        let state = reduce(&loaded("a", 60.0), &Transition::Embed(EmbedState::Playing));
        let next = reduce(&state, &Transition::Embed(EmbedState::Ended));

        assert_eq!(next.status, SessionStatus::Idle);
        assert_eq!(next.current_time, 60.0);
        assert!(next.current_track.is_some());
    }

    #[test]
    fn error_is_terminal_until_next_load() {
        let state = reduce(
            &loaded("a", 60.0),
            &Transition::Failed {
                message: "gone".to_string(),
            },
        );
        assert_eq!(state.status, SessionStatus::Error);
        assert_eq!(
            reduce(&state, &Transition::Embed(EmbedState::Playing)).status,
            SessionStatus::Error
        );
        assert_eq!(
            reduce(&state, &Transition::LoadRequested { track: track("b") }).status,
            SessionStatus::Loading
        );
    }

    #[test]
    fn positions_are_clamped() {
        let state = loaded("a", 100.0);
        assert_eq!(
            reduce(&state, &Transition::Seeked { position: 250.0 }).current_time,
            100.0
        );
        assert_eq!(
            reduce(&state, &Transition::Seeked { position: -5.0 }).current_time,
            0.0
        );
        assert_eq!(
            reduce(
                &state,
                &Transition::Seeked {
                    position: f64::NAN
                }
            )
            .current_time,
            0.0
        );
    }

    #[test]
    fn restored_track_never_displaces_active_one() {
        let state = loaded("a", 60.0);
        let next = reduce(&state, &Transition::Restored { track: track("b") });
        assert_eq!(next.current_track.unwrap().id.as_str(), "a");

        let next = reduce(
            &SessionState::default(),
            &Transition::Restored { track: track("b") },
        );
        assert_eq!(next.status, SessionStatus::Idle);
        assert_eq!(next.current_track.unwrap().id.as_str(), "b");
    }

    #[test]
    fn reset_keeps_volume_and_rate() {
        let mut state = reduce(&loaded("a", 60.0), &Transition::RateChanged(1.5));
        state = reduce(&state, &Transition::VolumeChanged(40));
        state = reduce(&state, &Transition::ExpandedChanged(true));
        let next = reduce(&state, &Transition::Reset);

        assert_eq!(next.current_track, None);
        assert_eq!(next.status, SessionStatus::Idle);
        assert_eq!(next.playback_rate, 1.5);
        assert_eq!(next.volume, 40);
        assert!(!next.expanded);
    }

    #[test]
    fn store_reports_playing_edges() {
        let mut store = StateStore::new(loaded("a", 60.0));
        let change = store.dispatch(&Transition::Embed(EmbedState::Playing));
        assert!(change.started_playing());

        let change = store.dispatch(&Transition::Embed(EmbedState::Paused));
        assert!(change.stopped_playing());
        assert!(!change.track_changed);
    }
}
