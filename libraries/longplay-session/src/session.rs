//! Session facade
//!
//! [`Session`] owns every piece of the engine (state store, queue, embed
//! adapter, timers, persistence and platform bridges) and is the only thing
//! that mutates them. All inputs (caller commands, embed signals, timer
//! ticks and platform actions) are processed one at a time, either by
//! calling the methods here directly or by spawning the session as an actor
//! (see [`SessionHandle`](crate::SessionHandle)).

use crate::config::SessionConfig;
use crate::embed::{
    EmbedAdapter, EmbedBackend, EmbedCommand, EmbedEvent, EmbedState, LoadOptions, TaggedSignal,
};
use crate::handle::SessionCommand;
use crate::persistence::PersistenceBridge;
use crate::platform::{MediaAction, PlatformBridge, Visibility};
use crate::queue::{QueueEngine, QueueStep};
use crate::resume::{resolve_start, ResumePoint, ResumePolicy, ResumeSource};
use crate::snapshot::{QueueSnapshot, SessionSnapshot};
use crate::state::{clamp_position, SessionState, SessionStatus, StateChange, StateStore, Transition};
use crate::timers::{PlaybackTimers, TimerTick};
use longplay_core::{HistoryStore, RepeatMode, SettingsStore, Track, TrackId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// How a load picks its starting offset
#[derive(Debug, Clone, Copy)]
enum StartAt {
    /// Caller's offset if non-zero, otherwise the saved resume point
    Resume(Option<f64>),
    /// Exactly this offset, ignoring saved positions
    Exact(f64),
}

/// The single playback session
pub struct Session {
    config: SessionConfig,
    state: StateStore,
    queue: QueueEngine,
    queue_tracks: Arc<Vec<Track>>,
    embed: EmbedAdapter,
    signals: mpsc::UnboundedReceiver<TaggedSignal>,
    history: Arc<dyn HistoryStore>,
    persistence: PersistenceBridge,
    platform: PlatformBridge,
    timers: PlaybackTimers,
    snapshots: watch::Sender<SessionSnapshot>,
    /// Seek requested before the embed was ready, applied on ready
    pending_seek: Option<f64>,
    restored: bool,
}

impl Session {
    /// Create an idle session
    ///
    /// Platform integration defaults to none; see [`with_platform`](Self::with_platform).
    pub fn new(
        config: SessionConfig,
        embed: Box<dyn EmbedBackend>,
        history: Arc<dyn HistoryStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let (embed, signals) = EmbedAdapter::new(embed, config.container_id.clone());
        let state = StateStore::new(SessionState::new(config.default_volume));
        let queue = QueueEngine::new(config.previous_restart_threshold_secs);
        let queue_tracks = Arc::new(Vec::new());
        let (snapshots, _) = watch::channel(SessionSnapshot {
            state: state.state().clone(),
            queue: QueueSnapshot::capture(&queue, Arc::clone(&queue_tracks)),
        });

        Self {
            platform: PlatformBridge::unsupported(
                config.poll_interval(),
                config.background_poll_interval(),
            ),
            timers: PlaybackTimers::new(config.poll_interval(), config.checkpoint_interval()),
            persistence: PersistenceBridge::new(settings),
            config,
            state,
            queue,
            queue_tracks,
            embed,
            signals,
            history,
            snapshots,
            pending_seek: None,
            restored: false,
        }
    }

    /// Use a platform bridge with real capabilities
    pub fn with_platform(mut self, platform: PlatformBridge) -> Self {
        self.platform = platform;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        self.state.state()
    }

    pub fn queue(&self) -> &QueueEngine {
        &self.queue
    }

    pub fn platform_mut(&mut self) -> &mut PlatformBridge {
        &mut self.platform
    }

    /// Polling and checkpoint timers are running
    pub fn timers_running(&self) -> bool {
        self.timers.is_running()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.state().clone(),
            queue: QueueSnapshot::capture(&self.queue, Arc::clone(&self.queue_tracks)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Reinstate mirrored settings, the queue and the last-played track
    ///
    /// Runs once; later calls are no-ops.
    pub async fn restore(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;

        let restored = self.persistence.restore().await;
        if let Some(rate) = restored.playback_rate {
            self.dispatch(&Transition::RateChanged(self.config.snap_rate(rate)));
        }
        if let Some(volume) = restored.volume {
            self.dispatch(&Transition::VolumeChanged(volume));
        }
        if let Some(mode) = restored.repeat_mode {
            self.queue.set_repeat_mode(mode);
        }
        if let Some(enabled) = restored.auto_play_next {
            self.queue.set_auto_play_next(enabled);
        }
        if let Some((tracks, index)) = restored.queue {
            self.queue.restore(tracks, index);
            self.refresh_queue();
        }
        if let Some(track) = restored.last_track {
            self.dispatch(&Transition::Restored { track });
        }

        info!(
            queue_len = self.queue.len(),
            repeat = %self.queue.repeat_mode(),
            "Session restored"
        );
        self.publish();
    }

    // ===== Transport =====

    /// Load and play a track
    ///
    /// A non-zero `start` is honored verbatim; otherwise the saved resume
    /// point (if any) is used. Supersedes any load in flight.
    pub async fn load_track(&mut self, track: Track, start: Option<f64>) {
        self.load(track, StartAt::Resume(start)).await;
    }

    /// Resume playback, reloading the current track if the embed is gone
    pub async fn play(&mut self) {
        let state = self.state.state();
        match state.status {
            SessionStatus::Idle | SessionStatus::Error => {
                let track = state
                    .current_track
                    .clone()
                    .or_else(|| self.queue.current().cloned());
                if let Some(track) = track {
                    self.load(track, StartAt::Resume(None)).await;
                }
            }
            SessionStatus::Ready | SessionStatus::Paused | SessionStatus::Buffering => {
                self.embed.command(EmbedCommand::Play);
            }
            SessionStatus::Loading | SessionStatus::Playing => {}
        }
    }

    pub fn pause(&mut self) {
        if matches!(
            self.state.state().status,
            SessionStatus::Playing | SessionStatus::Buffering
        ) {
            self.embed.command(EmbedCommand::Pause);
        }
    }

    pub async fn toggle(&mut self) {
        if matches!(
            self.state.state().status,
            SessionStatus::Playing | SessionStatus::Buffering
        ) {
            self.pause();
        } else {
            self.play().await;
        }
    }

    /// Seek to an absolute position, clamped to `[0, duration]`
    ///
    /// While loading, the target is held and sent once the embed is ready.
    pub fn seek(&mut self, position: f64) {
        let state = self.state.state();
        if state.current_track.is_none() {
            return;
        }
        let target = clamp_position(position, state.duration);
        if state.status == SessionStatus::Loading {
            self.pending_seek = Some(target);
        } else if self.embed.is_ready() {
            self.embed.command(EmbedCommand::SeekTo(target));
        } else {
            return;
        }
        self.dispatch(&Transition::Seeked { position: target });
    }

    /// Seek relative to the current position, clamped to `[0, duration]`
    pub fn seek_by(&mut self, delta: f64) {
        let delta = if delta.is_finite() { delta } else { 0.0 };
        self.seek(self.state.state().current_time + delta);
    }

    /// Set the playback rate, snapped to the nearest allowed rate
    pub async fn set_rate(&mut self, rate: f64) {
        let rate = self.config.snap_rate(rate);
        self.embed.command(EmbedCommand::SetRate(rate));
        self.dispatch(&Transition::RateChanged(rate));
        self.persistence.save_playback_rate(rate).await;
    }

    /// Set the volume (clamped to 100)
    pub async fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        self.embed.command(EmbedCommand::SetVolume(volume));
        self.dispatch(&Transition::VolumeChanged(volume));
        self.persistence.save_volume(volume).await;
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        self.dispatch(&Transition::ExpandedChanged(expanded));
    }

    // ===== Queue =====

    /// Replace the queue and load the track at `start_index`, if present
    pub async fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        let step = self.queue.set_queue(tracks, start_index);
        self.refresh_queue();
        self.persist_queue().await;
        self.execute_step(step).await;
    }

    pub async fn play_next(&mut self) {
        let step = self.queue.play_next();
        self.execute_step(step).await;
    }

    /// Restart the current track past the threshold, otherwise go back one
    pub async fn play_previous(&mut self) {
        let step = self.queue.play_previous(self.state.state().current_time);
        self.execute_step(step).await;
    }

    pub async fn select_index(&mut self, index: usize) {
        let step = self.queue.select_index(index);
        self.execute_step(step).await;
    }

    /// Toggle shuffle; returns whether the queue is now shuffled
    pub async fn toggle_shuffle(&mut self) -> bool {
        let shuffled = self.queue.toggle_shuffle();
        self.after_shuffle(shuffled).await
    }

    /// Toggle shuffle with a deterministic order
    pub async fn toggle_shuffle_seeded(&mut self, seed: u64) -> bool {
        let shuffled = {
            let mut rng = StdRng::seed_from_u64(seed);
            self.queue.toggle_shuffle_with(&mut rng)
        };
        self.after_shuffle(shuffled).await
    }

    /// Advance none -> one -> all -> none
    pub async fn cycle_repeat_mode(&mut self) -> RepeatMode {
        let mode = self.queue.cycle_repeat_mode();
        self.persistence.save_repeat_mode(mode).await;
        self.publish();
        mode
    }

    pub async fn set_auto_play_next(&mut self, enabled: bool) {
        self.queue.set_auto_play_next(enabled);
        self.persistence.save_auto_play_next(enabled).await;
        self.publish();
    }

    // ===== Platform =====

    /// Apply an action from the platform media session
    pub async fn handle_media_action(&mut self, action: MediaAction) {
        debug!(?action, "Media action");
        let step = self.config.seek_step_secs;
        match action {
            MediaAction::Play => self.play().await,
            MediaAction::Pause => self.pause(),
            MediaAction::Toggle => self.toggle().await,
            MediaAction::Previous => self.play_previous().await,
            MediaAction::Next => self.play_next().await,
            MediaAction::SeekBackward(offset) => self.seek_by(-offset.unwrap_or(step)),
            MediaAction::SeekForward(offset) => self.seek_by(offset.unwrap_or(step)),
            MediaAction::SeekTo(position) => self.seek(position),
            MediaAction::Stop => self.close().await,
        }
    }

    /// Switch between fast and background polling
    pub fn set_visibility(&mut self, visibility: Visibility) {
        let period = self.platform.set_visibility(visibility);
        self.timers.set_poll_period(period);
    }

    // ===== Lifecycle =====

    /// Stop playback and tear everything down
    ///
    /// Volume and rate survive; a later `load_track` starts a fresh session.
    pub async fn close(&mut self) {
        self.checkpoint().await;
        self.pending_seek = None;
        self.embed.command(EmbedCommand::Pause);
        self.embed.destroy();
        self.timers.stop();
        self.dispatch(&Transition::Reset);
        self.platform.shutdown();
        info!("Session closed");
    }

    // ===== Event plumbing =====

    /// Process one signal from the embed
    pub async fn handle_signal(&mut self, signal: TaggedSignal) {
        let Some(event) = self.embed.normalize(signal) else {
            return;
        };
        debug!(?event, "Embed event");

        match event {
            EmbedEvent::Ready => {
                self.dispatch(&Transition::EmbedReady {
                    duration: self.embed.duration(),
                });
                let state = self.state.state();
                let (rate, volume) = (state.playback_rate, state.volume);
                self.embed.command(EmbedCommand::SetRate(rate));
                self.embed.command(EmbedCommand::SetVolume(volume));
                if let Some(position) = self.pending_seek.take() {
                    let position = clamp_position(position, self.embed.duration());
                    debug!(position, "Applying seek requested while loading");
                    self.embed.command(EmbedCommand::SeekTo(position));
                    self.dispatch(&Transition::Seeked { position });
                }
            }
            EmbedEvent::StateChanged(EmbedState::Ended) => self.handle_ended().await,
            EmbedEvent::StateChanged(embed_state) => {
                if self.state.state().status == SessionStatus::Playing {
                    self.sample_position();
                }
                let change = self.dispatch(&Transition::Embed(embed_state));
                if change.started_playing() {
                    self.sample_position();
                }
                if change.stopped_playing() {
                    self.checkpoint().await;
                }
            }
            EmbedEvent::Error(code) => {
                self.checkpoint().await;
                warn!(?code, "Embed reported an error");
                // the failed instance must not keep playing behind the error
                self.pending_seek = None;
                self.embed.command(EmbedCommand::Pause);
                self.embed.destroy();
                self.dispatch(&Transition::Failed {
                    message: code.message(),
                });
            }
        }
    }

    /// Handle every signal already queued; returns how many were read
    pub async fn process_pending_signals(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(signal) = self.signals.try_recv() {
            self.handle_signal(signal).await;
            handled += 1;
        }
        handled
    }

    pub async fn on_timer(&mut self, tick: TimerTick) {
        match tick {
            TimerTick::Poll => self.sample_position(),
            TimerTick::Checkpoint => self.checkpoint().await,
        }
    }

    /// Run until the command channel closes or a shutdown command arrives
    ///
    /// Restores persisted state first if that has not happened yet. Queued
    /// commands are drained before embed signals and timer ticks.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) {
        self.restore().await;
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown(ack)) => {
                        self.close().await;
                        let _ = ack.send(());
                        break;
                    }
                    Some(command) => self.execute(command).await,
                    None => {
                        self.close().await;
                        break;
                    }
                },
                Some(signal) = self.signals.recv() => self.handle_signal(signal).await,
                tick = self.timers.tick() => self.on_timer(tick).await,
            }
        }
        debug!("Session actor stopped");
    }

    async fn execute(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::LoadTrack { track, start } => self.load_track(track, start).await,
            SessionCommand::Play => self.play().await,
            SessionCommand::Pause => self.pause(),
            SessionCommand::Toggle => self.toggle().await,
            SessionCommand::Seek(position) => self.seek(position),
            SessionCommand::SeekBy(delta) => self.seek_by(delta),
            SessionCommand::SetRate(rate) => self.set_rate(rate).await,
            SessionCommand::SetVolume(volume) => self.set_volume(volume).await,
            SessionCommand::SetExpanded(expanded) => self.set_expanded(expanded),
            SessionCommand::SetQueue {
                tracks,
                start_index,
            } => self.set_queue(tracks, start_index).await,
            SessionCommand::PlayNext => self.play_next().await,
            SessionCommand::PlayPrevious => self.play_previous().await,
            SessionCommand::SelectIndex(index) => self.select_index(index).await,
            SessionCommand::ToggleShuffle => {
                self.toggle_shuffle().await;
            }
            SessionCommand::CycleRepeatMode => {
                self.cycle_repeat_mode().await;
            }
            SessionCommand::SetAutoPlayNext(enabled) => self.set_auto_play_next(enabled).await,
            SessionCommand::Media(action) => self.handle_media_action(action).await,
            SessionCommand::Visibility(visibility) => self.set_visibility(visibility),
            SessionCommand::Close => self.close().await,
            SessionCommand::Shutdown(ack) => {
                self.close().await;
                let _ = ack.send(());
            }
        }
    }

    // ===== Internals =====

    async fn load(&mut self, track: Track, start: StartAt) {
        self.checkpoint().await;

        let state = self.state.state();
        let already_active = self.embed.is_ready()
            && state.status.is_active()
            && state.current_track.as_ref().map(|t| &t.id) == Some(&track.id);

        if already_active {
            let point = self.resolve_start(&track, start).await;
            debug!(track_id = %track.id, position = point.position, "Track already loaded, seeking");
            self.embed.command(EmbedCommand::SeekTo(point.position));
            self.dispatch(&Transition::Seeked {
                position: point.position,
            });
            if self.state.state().status != SessionStatus::Playing {
                self.embed.command(EmbedCommand::Play);
            }
            return;
        }

        // invalidate the previous instance before anything async happens
        self.embed.destroy();
        self.pending_seek = None;
        self.dispatch(&Transition::LoadRequested {
            track: track.clone(),
        });

        let point = self.resolve_start(&track, start).await;
        if point.position > 0.0 {
            self.dispatch(&Transition::Seeked {
                position: point.position,
            });
        }
        info!(
            track_id = %track.id,
            title = %track.title,
            start = point.position,
            source = ?point.source,
            "Loading track"
        );

        let options = LoadOptions {
            autoplay: true,
            start_seconds: point.position,
        };
        match self.embed.load(track.id.clone(), options).await {
            Ok(_ticket) => {
                if let Err(e) = self
                    .history
                    .record_history_entry(&track, point.position, track.duration)
                    .await
                {
                    warn!(track_id = %track.id, error = %e, "Failed to record history entry");
                }
                self.persistence.save_last_track(&track).await;
                self.sync_queue_index(&track.id).await;
            }
            Err(e) => {
                // the failure is already queued as an embed error event
                warn!(track_id = %track.id, error = %e, "Track load failed");
            }
        }
    }

    async fn resolve_start(&mut self, track: &Track, start: StartAt) -> ResumePoint {
        match start {
            StartAt::Exact(position) => ResumePoint {
                position,
                source: ResumeSource::Explicit,
            },
            StartAt::Resume(explicit) => {
                let policy = ResumePolicy {
                    history_lookup_limit: self.config.history_lookup_limit,
                    restart_margin: self.config.resume_restart_margin_secs,
                };
                resolve_start(self.history.as_ref(), track, explicit, policy).await
            }
        }
    }

    async fn handle_ended(&mut self) {
        let state = self.state.state();
        if !state.status.is_active() {
            return;
        }
        let Some(track) = state.current_track.clone() else {
            return;
        };

        self.record_position(&track.id, 0.0).await;
        let step = self.queue.on_ended();
        info!(track_id = %track.id, ?step, "Track ended");

        if step == QueueStep::RestartCurrent {
            self.restart_current(true).await;
        } else {
            self.dispatch(&Transition::Embed(EmbedState::Ended));
            self.execute_step(step).await;
        }
    }

    async fn execute_step(&mut self, step: QueueStep) {
        match step {
            QueueStep::Load { index, track } => {
                debug!(index, track_id = %track.id, "Queue advancing");
                self.persistence.save_queue_index(index).await;
                self.load(track, StartAt::Resume(None)).await;
            }
            QueueStep::RestartCurrent => self.restart_current(false).await,
            QueueStep::Stop => info!("Nothing left to play"),
            QueueStep::Unchanged => {}
        }
        self.publish();
    }

    async fn restart_current(&mut self, resume_playback: bool) {
        let state = self.state.state();
        if self.embed.is_ready() && state.status.is_active() {
            self.embed.command(EmbedCommand::SeekTo(0.0));
            self.dispatch(&Transition::Seeked { position: 0.0 });
            if resume_playback {
                self.embed.command(EmbedCommand::Play);
            }
        } else if let Some(track) = state.current_track.clone() {
            self.load(track, StartAt::Exact(0.0)).await;
        }
    }

    async fn after_shuffle(&mut self, shuffled: bool) -> bool {
        info!(shuffled, "Shuffle toggled");
        self.refresh_queue();
        self.persist_queue().await;
        self.publish();
        shuffled
    }

    async fn sync_queue_index(&mut self, id: &TrackId) {
        if self.queue.current().is_some_and(|t| &t.id == id) {
            return;
        }
        if self.queue.select_track(id) {
            self.persistence
                .save_queue_index(self.queue.current_index())
                .await;
            self.publish();
        }
    }

    async fn persist_queue(&mut self) {
        self.persistence
            .save_queue(self.queue.tracks(), self.queue.current_index())
            .await;
    }

    /// Pull the live position from the embed while content is active
    fn sample_position(&mut self) {
        if !(self.embed.is_ready() && self.state.state().status.is_active()) {
            return;
        }
        self.dispatch(&Transition::Progress {
            current_time: self.embed.current_time(),
            duration: self.embed.duration(),
        });
    }

    /// Persist the resume point of the current track, if one is in progress
    async fn checkpoint(&mut self) {
        let state = self.state.state();
        if !matches!(
            state.status,
            SessionStatus::Playing | SessionStatus::Paused | SessionStatus::Buffering
        ) {
            return;
        }
        self.sample_position();

        let state = self.state.state();
        let Some(track) = state.current_track.as_ref() else {
            return;
        };
        let (id, position) = (track.id.clone(), state.current_time);
        self.record_position(&id, position).await;
    }

    async fn record_position(&mut self, id: &TrackId, position: f64) {
        debug!(track_id = %id, position, "Checkpoint");
        if let Err(e) = self.history.record_position(id, position).await {
            warn!(track_id = %id, error = %e, "Failed to save resume position");
        }
    }

    fn refresh_queue(&mut self) {
        self.queue_tracks = Arc::new(self.queue.tracks().to_vec());
    }

    /// Apply a transition and bring timers and platform in line with it
    fn dispatch(&mut self, transition: &Transition) -> StateChange {
        let change = self.state.dispatch(transition);

        if change.started_playing() {
            self.timers.start();
            self.platform.playing_changed(true);
        }
        if change.stopped_playing() {
            self.timers.stop();
            self.platform.playing_changed(false);
        }
        if change.track_changed {
            self.platform
                .track_changed(self.state.state().current_track.as_ref());
        }
        if change.status_changed() {
            debug!(from = ?change.previous, to = ?change.current, "Status changed");
            self.platform.status_changed(change.current);
        }
        if change.position_changed {
            let state = self.state.state();
            self.platform
                .position_changed(state.current_time, state.duration, state.playback_rate);
        }

        self.publish();
        change
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}
