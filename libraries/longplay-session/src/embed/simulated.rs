//! In-process embed backend
//!
//! Behaves like a remote video embed with a virtual clock: it reports ready
//! on creation, plays when asked, and reports "ended" once its clock passes
//! the content duration. Clones share state, so a test or a CLI can keep a
//! handle while the session owns the backend.

use super::{EmbedBackend, EmbedCommand, EmbedRequest, RawSignal, SignalSink};
use crate::error::{Result, SessionError};
use async_trait::async_trait;
use longplay_core::TrackId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

const DEFAULT_DURATION: f64 = 180.0;

const STATE_ENDED: i32 = 0;
const STATE_PLAYING: i32 = 1;
const STATE_PAUSED: i32 = 2;

#[derive(Debug)]
struct SimState {
    sink: Option<SignalSink>,
    request: Option<EmbedRequest>,
    created: usize,
    destroyed: usize,
    commands: Vec<EmbedCommand>,
    position: f64,
    duration: f64,
    playing: bool,
    rate: f64,
    volume: u8,
    auto_ready: bool,
    fail_next_create: bool,
    durations: HashMap<TrackId, f64>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            sink: None,
            request: None,
            created: 0,
            destroyed: 0,
            commands: Vec::new(),
            position: 0.0,
            duration: 0.0,
            playing: false,
            rate: 1.0,
            volume: 100,
            auto_ready: true,
            fail_next_create: false,
            durations: HashMap::new(),
        }
    }
}

impl SimState {
    fn duration_for(&self, track_id: &TrackId) -> f64 {
        self.durations
            .get(track_id)
            .copied()
            .unwrap_or(DEFAULT_DURATION)
    }

    fn emit(&self, signal: RawSignal) {
        if let Some(sink) = &self.sink {
            sink.emit(signal);
        }
    }

    fn start_playing(&mut self) {
        self.playing = true;
        self.emit(RawSignal::StateCode(STATE_PLAYING));
    }
}

/// Virtual-clock embed backend
#[derive(Debug, Clone, Default)]
pub struct SimulatedEmbed {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedEmbed {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Set the duration reported for a track (default: 180s)
    pub fn set_duration(&self, track_id: impl Into<TrackId>, seconds: f64) {
        self.lock().durations.insert(track_id.into(), seconds);
    }

    /// When false, instances wait for [`signal_ready`](Self::signal_ready)
    pub fn set_auto_ready(&self, auto_ready: bool) {
        self.lock().auto_ready = auto_ready;
    }

    /// Make the next `create` fail
    pub fn fail_next_create(&self) {
        self.lock().fail_next_create = true;
    }

    /// Report ready for the live instance (and start playing if autoplay)
    ///
    /// Does nothing once the instance has been destroyed.
    pub fn signal_ready(&self) {
        let mut state = self.lock();
        if state.sink.is_none() {
            return;
        }
        state.emit(RawSignal::Ready);
        if state.request.as_ref().is_some_and(|r| r.autoplay) {
            state.start_playing();
        }
    }

    /// Emit an arbitrary raw signal from the live instance
    pub fn emit(&self, signal: RawSignal) {
        self.lock().emit(signal);
    }

    /// Emit a player error code from the live instance
    pub fn fail_with(&self, code: i32) {
        let mut state = self.lock();
        state.playing = false;
        state.emit(RawSignal::ErrorCode(code));
    }

    /// Sink of the live instance
    pub fn sink(&self) -> Option<SignalSink> {
        self.lock().sink.clone()
    }

    /// Advance the virtual clock
    ///
    /// Emits "ended" when the position reaches the duration.
    pub fn advance(&self, seconds: f64) {
        let mut state = self.lock();
        if !state.playing || state.sink.is_none() {
            return;
        }
        let rate = state.rate;
        state.position += seconds * rate;
        if state.duration > 0.0 && state.position >= state.duration {
            state.position = state.duration;
            state.playing = false;
            state.emit(RawSignal::StateCode(STATE_ENDED));
        }
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn position(&self) -> f64 {
        self.lock().position
    }

    pub fn rate(&self) -> f64 {
        self.lock().rate
    }

    pub fn volume(&self) -> u8 {
        self.lock().volume
    }

    /// Request of the most recent `create`
    pub fn last_request(&self) -> Option<EmbedRequest> {
        self.lock().request.clone()
    }

    pub fn created_count(&self) -> usize {
        self.lock().created
    }

    pub fn destroyed_count(&self) -> usize {
        self.lock().destroyed
    }

    /// Commands received since creation of the first instance
    pub fn commands(&self) -> Vec<EmbedCommand> {
        self.lock().commands.clone()
    }
}

#[async_trait]
impl EmbedBackend for SimulatedEmbed {
    async fn create(&mut self, request: &EmbedRequest, sink: SignalSink) -> Result<()> {
        let mut state = self.lock();
        if std::mem::take(&mut state.fail_next_create) {
            return Err(SessionError::LoadFailure(format!(
                "could not mount embed into '{}'",
                request.container
            )));
        }

        state.created += 1;
        state.duration = state.duration_for(&request.track_id);
        state.position = request.start_seconds.max(0.0).min(state.duration);
        state.playing = false;
        state.request = Some(request.clone());
        state.sink = Some(sink);

        if state.auto_ready {
            state.emit(RawSignal::Ready);
            if request.autoplay {
                state.start_playing();
            }
        }
        Ok(())
    }

    fn command(&mut self, command: &EmbedCommand) {
        let mut state = self.lock();
        state.commands.push(command.clone());
        match command {
            EmbedCommand::Play => state.start_playing(),
            EmbedCommand::Pause => {
                state.playing = false;
                state.emit(RawSignal::StateCode(STATE_PAUSED));
            }
            EmbedCommand::SeekTo(t) => {
                let duration = state.duration;
                state.position = t.max(0.0).min(duration);
            }
            EmbedCommand::SetRate(rate) => state.rate = *rate,
            EmbedCommand::SetVolume(volume) => state.volume = *volume,
            EmbedCommand::LoadById {
                track_id,
                start_seconds,
            } => {
                state.duration = state.duration_for(track_id);
                state.position = start_seconds.max(0.0).min(state.duration);
                state.start_playing();
            }
        }
    }

    fn current_time(&self) -> f64 {
        self.lock().position
    }

    fn duration(&self) -> f64 {
        self.lock().duration
    }

    fn destroy(&mut self) {
        let mut state = self.lock();
        state.destroyed += 1;
        state.sink = None;
        state.playing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::TaggedSignal;
    use tokio::sync::mpsc;

    fn request(id: &str) -> EmbedRequest {
        EmbedRequest {
            container: "c".to_string(),
            track_id: TrackId::new(id),
            autoplay: true,
            start_seconds: 0.0,
        }
    }

    #[tokio::test]
    async fn clock_runs_to_ended() {
        let mut sim = SimulatedEmbed::new();
        sim.set_duration("a", 10.0);
        let (tx, mut rx) = mpsc::unbounded_channel::<TaggedSignal>();

        sim.create(&request("a"), SignalSink::new(1, tx)).await.unwrap();
        sim.advance(4.0);
        assert_eq!(sim.position(), 4.0);
        sim.advance(20.0);
        assert_eq!(sim.position(), 10.0);

        let signals: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|t| t.signal)
            .collect();
        assert_eq!(
            signals,
            vec![
                RawSignal::Ready,
                RawSignal::StateCode(STATE_PLAYING),
                RawSignal::StateCode(STATE_ENDED)
            ]
        );
    }

    #[tokio::test]
    async fn rate_scales_the_clock() {
        let mut sim = SimulatedEmbed::new();
        let (tx, _rx) = mpsc::unbounded_channel::<TaggedSignal>();
        sim.create(&request("a"), SignalSink::new(1, tx)).await.unwrap();

        sim.command(&EmbedCommand::SetRate(2.0));
        sim.advance(5.0);
        assert_eq!(sim.position(), 10.0);
    }
}
