//! Platform integration
//!
//! Provides a unified interface for OS-level media integration:
//!
//! - **Media session**: lock-screen / hardware-key metadata, playback state
//!   and position
//! - **Wake lock**: keeps the screen awake while playing
//! - **Keep-alive**: keeps the process scheduled while hidden
//!
//! Every capability is optional. A failing or unsupported call is logged and
//! the bridge stops issuing calls for that capability; it never propagates.
//! Inbound actions (hardware keys, lock screen) reach the session as
//! [`MediaAction`]s through [`SessionHandle::media_action`](crate::SessionHandle::media_action).

use crate::state::SessionStatus;
use longplay_core::Track;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Action requested by the platform media session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaAction {
    Play,
    Pause,
    Toggle,
    Previous,
    Next,
    /// Seek back by the given offset, or the configured step
    SeekBackward(Option<f64>),
    /// Seek forward by the given offset, or the configured step
    SeekForward(Option<f64>),
    SeekTo(f64),
    Stop,
}

/// Action handlers registered with the media session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaActionKind {
    Play,
    Pause,
    PreviousTrack,
    NextTrack,
    SeekBackward,
    SeekForward,
    SeekTo,
    Stop,
}

pub const SUPPORTED_ACTIONS: [MediaActionKind; 8] = [
    MediaActionKind::Play,
    MediaActionKind::Pause,
    MediaActionKind::PreviousTrack,
    MediaActionKind::NextTrack,
    MediaActionKind::SeekBackward,
    MediaActionKind::SeekForward,
    MediaActionKind::SeekTo,
    MediaActionKind::Stop,
];

/// Track metadata for the media session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaMetadata {
    pub title: String,
    pub artist: String,
    pub artwork: Option<String>,
}

impl From<&Track> for MediaMetadata {
    fn from(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            artist: track.author.clone(),
            artwork: track.thumbnail.clone(),
        }
    }
}

/// Playback state as the platform understands it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaPlaybackState {
    #[default]
    None,
    Playing,
    Paused,
}

impl From<SessionStatus> for MediaPlaybackState {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Playing => Self::Playing,
            SessionStatus::Loading
            | SessionStatus::Ready
            | SessionStatus::Paused
            | SessionStatus::Buffering => Self::Paused,
            SessionStatus::Idle | SessionStatus::Error => Self::None,
        }
    }
}

/// Position published to the media session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionState {
    pub duration: f64,
    pub position: f64,
    pub playback_rate: f64,
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error("Platform request failed: {0}")]
    Failed(String),
}

pub type PlatformResult = std::result::Result<(), PlatformError>;

pub trait MediaSession: Send {
    fn set_metadata(&mut self, metadata: Option<&MediaMetadata>) -> PlatformResult;
    fn set_action_handlers(&mut self, actions: &[MediaActionKind]) -> PlatformResult;
    fn set_playback_state(&mut self, state: MediaPlaybackState) -> PlatformResult;
    fn set_position_state(&mut self, position: &PositionState) -> PlatformResult;
}

pub trait WakeLock: Send {
    fn acquire(&mut self) -> PlatformResult;
    fn release(&mut self) -> PlatformResult;
}

pub trait KeepAlive: Send {
    fn start(&mut self) -> PlatformResult;
    fn stop(&mut self) -> PlatformResult;
}

/// Stand-in for every capability on platforms that have none
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl MediaSession for Unsupported {
    fn set_metadata(&mut self, _: Option<&MediaMetadata>) -> PlatformResult {
        Err(PlatformError::Unsupported("media session"))
    }

    fn set_action_handlers(&mut self, _: &[MediaActionKind]) -> PlatformResult {
        Err(PlatformError::Unsupported("media session"))
    }

    fn set_playback_state(&mut self, _: MediaPlaybackState) -> PlatformResult {
        Err(PlatformError::Unsupported("media session"))
    }

    fn set_position_state(&mut self, _: &PositionState) -> PlatformResult {
        Err(PlatformError::Unsupported("media session"))
    }
}

impl WakeLock for Unsupported {
    fn acquire(&mut self) -> PlatformResult {
        Err(PlatformError::Unsupported("wake lock"))
    }

    fn release(&mut self) -> PlatformResult {
        Err(PlatformError::Unsupported("wake lock"))
    }
}

impl KeepAlive for Unsupported {
    fn start(&mut self) -> PlatformResult {
        Err(PlatformError::Unsupported("keep-alive"))
    }

    fn stop(&mut self) -> PlatformResult {
        Err(PlatformError::Unsupported("keep-alive"))
    }
}

/// Whether the app is in the foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

type VisibilityCallback = Box<dyn FnMut() + Send>;

/// A capability plus whether it is still worth calling
struct Capability<T: ?Sized> {
    inner: Box<T>,
    available: bool,
}

impl<T: ?Sized> Capability<T> {
    fn new(inner: Box<T>) -> Self {
        Self {
            inner,
            available: true,
        }
    }

    /// Run a call, disabling the capability on `Unsupported`
    fn call(&mut self, what: &str, f: impl FnOnce(&mut T) -> PlatformResult) -> bool {
        if !self.available {
            return false;
        }
        match f(&mut *self.inner) {
            Ok(()) => true,
            Err(PlatformError::Unsupported(name)) => {
                info!("{name} unavailable, disabling");
                self.available = false;
                false
            }
            Err(e) => {
                debug!(what, error = %e, "Platform call failed");
                false
            }
        }
    }
}

/// Best-effort coordinator for all platform capabilities
pub struct PlatformBridge {
    media: Capability<dyn MediaSession>,
    wake_lock: Capability<dyn WakeLock>,
    keep_alive: Capability<dyn KeepAlive>,
    wake_lock_held: bool,
    keep_alive_running: bool,
    playing: bool,
    visibility: Visibility,
    foreground_poll: Duration,
    background_poll: Duration,
    on_background: Vec<VisibilityCallback>,
    on_foreground: Vec<VisibilityCallback>,
}

impl PlatformBridge {
    pub fn new(
        media: Box<dyn MediaSession>,
        wake_lock: Box<dyn WakeLock>,
        keep_alive: Box<dyn KeepAlive>,
        foreground_poll: Duration,
        background_poll: Duration,
    ) -> Self {
        Self {
            media: Capability::new(media),
            wake_lock: Capability::new(wake_lock),
            keep_alive: Capability::new(keep_alive),
            wake_lock_held: false,
            keep_alive_running: false,
            playing: false,
            visibility: Visibility::Visible,
            foreground_poll,
            background_poll,
            on_background: Vec::new(),
            on_foreground: Vec::new(),
        }
    }

    /// Bridge with no platform capabilities at all
    pub fn unsupported(foreground_poll: Duration, background_poll: Duration) -> Self {
        Self::new(
            Box::new(Unsupported),
            Box::new(Unsupported),
            Box::new(Unsupported),
            foreground_poll,
            background_poll,
        )
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn wake_lock_held(&self) -> bool {
        self.wake_lock_held
    }

    pub fn keep_alive_running(&self) -> bool {
        self.keep_alive_running
    }

    /// Poll period for the current visibility
    pub fn poll_period(&self) -> Duration {
        match self.visibility {
            Visibility::Visible => self.foreground_poll,
            Visibility::Hidden => self.background_poll,
        }
    }

    /// Run `callback` every time the app goes to the background
    pub fn on_background(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_background.push(Box::new(callback));
    }

    /// Run `callback` every time the app returns to the foreground
    pub fn on_foreground(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_foreground.push(Box::new(callback));
    }

    /// Publish metadata and register action handlers for a new track
    pub fn track_changed(&mut self, track: Option<&Track>) {
        let metadata = track.map(MediaMetadata::from);
        self.media
            .call("metadata", |m| m.set_metadata(metadata.as_ref()));
        if track.is_some() {
            self.media
                .call("action handlers", |m| m.set_action_handlers(&SUPPORTED_ACTIONS));
        }
    }

    pub fn status_changed(&mut self, status: SessionStatus) {
        self.media
            .call("playback state", |m| m.set_playback_state(status.into()));
    }

    /// Publish the position; skipped while the duration is unknown
    pub fn position_changed(&mut self, position: f64, duration: f64, playback_rate: f64) {
        if !(duration.is_finite() && duration > 0.0) {
            return;
        }
        let state = PositionState {
            duration,
            position: position.max(0.0).min(duration),
            playback_rate,
        };
        self.media
            .call("position state", |m| m.set_position_state(&state));
    }

    /// Hold the wake lock and keep-alive exactly while playing
    pub fn playing_changed(&mut self, playing: bool) {
        self.playing = playing;
        if playing {
            self.acquire_wake_lock();
            if !self.keep_alive_running {
                self.keep_alive_running = self.keep_alive.call("keep-alive start", |k| k.start());
            }
        } else {
            if self.wake_lock_held {
                self.wake_lock.call("wake lock release", |w| w.release());
                self.wake_lock_held = false;
            }
            if self.keep_alive_running {
                self.keep_alive.call("keep-alive stop", |k| k.stop());
                self.keep_alive_running = false;
            }
        }
    }

    /// Record a visibility change and return the poll period to use
    ///
    /// Coming back to the foreground while playing re-acquires the wake
    /// lock, which platforms drop when hidden.
    pub fn set_visibility(&mut self, visibility: Visibility) -> Duration {
        if visibility != self.visibility {
            self.visibility = visibility;
            debug!(?visibility, "Visibility changed");
            match visibility {
                Visibility::Hidden => {
                    self.wake_lock_held = false;
                    for callback in &mut self.on_background {
                        callback();
                    }
                }
                Visibility::Visible => {
                    if self.playing {
                        self.acquire_wake_lock();
                    }
                    for callback in &mut self.on_foreground {
                        callback();
                    }
                }
            }
        }
        self.poll_period()
    }

    /// Clear the media session and release everything
    pub fn shutdown(&mut self) {
        self.playing_changed(false);
        self.media.call("metadata", |m| m.set_metadata(None));
        self.media
            .call("playback state", |m| m.set_playback_state(MediaPlaybackState::None));
    }

    fn acquire_wake_lock(&mut self) {
        if !self.wake_lock_held {
            self.wake_lock_held = self.wake_lock.call("wake lock acquire", |w| w.acquire());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Recorder {
        fn record(&self, call: String) -> PlatformResult {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(PlatformError::Failed("denied".to_string()))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl MediaSession for Recorder {
        fn set_metadata(&mut self, metadata: Option<&MediaMetadata>) -> PlatformResult {
            self.record(format!(
                "metadata:{}",
                metadata.map_or("none", |m| m.title.as_str())
            ))
        }

        fn set_action_handlers(&mut self, actions: &[MediaActionKind]) -> PlatformResult {
            self.record(format!("actions:{}", actions.len()))
        }

        fn set_playback_state(&mut self, state: MediaPlaybackState) -> PlatformResult {
            self.record(format!("state:{state:?}"))
        }

        fn set_position_state(&mut self, position: &PositionState) -> PlatformResult {
            self.record(format!("position:{}/{}", position.position, position.duration))
        }
    }

    impl WakeLock for Recorder {
        fn acquire(&mut self) -> PlatformResult {
            self.record("wake:acquire".to_string())
        }

        fn release(&mut self) -> PlatformResult {
            self.record("wake:release".to_string())
        }
    }

    impl KeepAlive for Recorder {
        fn start(&mut self) -> PlatformResult {
            self.record("keepalive:start".to_string())
        }

        fn stop(&mut self) -> PlatformResult {
            self.record("keepalive:stop".to_string())
        }
    }

    fn bridge(recorder: &Recorder) -> PlatformBridge {
        PlatformBridge::new(
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
            Box::new(recorder.clone()),
            Duration::from_millis(250),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn position_is_skipped_without_duration_and_clamped() {
        let recorder = Recorder::default();
        let mut bridge = bridge(&recorder);

        bridge.position_changed(5.0, 0.0, 1.0);
        bridge.position_changed(500.0, 120.0, 1.0);

        assert_eq!(recorder.calls(), vec!["position:120/120".to_string()]);
    }

    #[test]
    fn wake_lock_follows_playing() {
        let recorder = Recorder::default();
        let mut bridge = bridge(&recorder);

        bridge.playing_changed(true);
        bridge.playing_changed(true);
        assert!(bridge.wake_lock_held());
        bridge.playing_changed(false);

        assert_eq!(
            recorder.calls(),
            vec![
                "wake:acquire".to_string(),
                "keepalive:start".to_string(),
                "wake:release".to_string(),
                "keepalive:stop".to_string(),
            ]
        );
    }

    #[test]
    fn refused_wake_lock_is_not_held() {
        let recorder = Recorder {
            fail: true,
            ..Default::default()
        };
        let mut bridge = bridge(&recorder);
        bridge.playing_changed(true);
        assert!(!bridge.wake_lock_held());
        assert!(!bridge.keep_alive_running());
    }

    #[test]
    fn unsupported_capabilities_are_called_once() {
        let mut bridge =
            PlatformBridge::unsupported(Duration::from_millis(250), Duration::from_secs(1));
        bridge.playing_changed(true);
        bridge.status_changed(SessionStatus::Playing);
        bridge.status_changed(SessionStatus::Paused);
        assert!(!bridge.media.available);
        assert!(!bridge.wake_lock.available);
    }

    #[test]
    fn visibility_switches_poll_period_and_runs_callbacks() {
        let recorder = Recorder::default();
        let mut bridge = bridge(&recorder);
        let hidden = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hidden);
        bridge.on_background(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bridge.playing_changed(true);
        assert_eq!(bridge.set_visibility(Visibility::Hidden), Duration::from_secs(1));
        assert_eq!(bridge.set_visibility(Visibility::Hidden), Duration::from_secs(1));
        assert_eq!(hidden.load(Ordering::SeqCst), 1);
        assert!(!bridge.wake_lock_held());

        assert_eq!(
            bridge.set_visibility(Visibility::Visible),
            Duration::from_millis(250)
        );
        assert!(bridge.wake_lock_held());
    }
}
