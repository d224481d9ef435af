//! Embed adapter
//!
//! Wraps a third-party video embed behind [`EmbedBackend`] and turns its
//! callback-style signals into ordered, generation-checked [`EmbedEvent`]s.
//!
//! Every `load` and `destroy` bumps the adapter's generation. A backend
//! instance tags each signal with the generation it was created under, and
//! [`EmbedAdapter::normalize`] drops anything whose generation is not current.
//! Late callbacks from a replaced instance therefore never reach the session.

mod signal;
mod simulated;

pub use signal::{
    EmbedErrorCode, EmbedEvent, EmbedState, Generation, RawSignal, SignalSink, TaggedSignal,
};
pub use simulated::SimulatedEmbed;

use crate::error::{Result, SessionError};
use async_trait::async_trait;
use longplay_core::TrackId;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Parameters for creating a new embed instance
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedRequest {
    pub container: String,
    pub track_id: TrackId,
    pub autoplay: bool,
    pub start_seconds: f64,
}

/// Imperative commands accepted by a ready embed
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedCommand {
    Play,
    Pause,
    SeekTo(f64),
    SetRate(f64),
    SetVolume(u8),
    LoadById { track_id: TrackId, start_seconds: f64 },
}

/// A concrete embed implementation
///
/// `create` must arrange for the instance's signals to be emitted through
/// the given sink. Queries are only issued once the instance is ready.
#[async_trait]
pub trait EmbedBackend: Send {
    async fn create(&mut self, request: &EmbedRequest, sink: SignalSink) -> Result<()>;

    fn command(&mut self, command: &EmbedCommand);

    fn current_time(&self) -> f64;

    fn duration(&self) -> f64;

    /// Release the instance; must tolerate being called with nothing alive
    fn destroy(&mut self);
}

/// Options for [`EmbedAdapter::load`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    pub autoplay: bool,
    pub start_seconds: f64,
}

/// Resolves once the instance created by a `load` reports ready
#[derive(Debug)]
pub struct LoadTicket {
    generation: Generation,
    ready: oneshot::Receiver<()>,
}

impl LoadTicket {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Wait until the instance is ready
    ///
    /// Fails with [`SessionError::Superseded`] if another load or a destroy
    /// replaced the instance first.
    pub async fn ready(self) -> Result<()> {
        self.ready.await.map_err(|_| SessionError::Superseded)
    }
}

#[derive(Debug)]
struct Instance {
    ready: bool,
    last_state: Option<EmbedState>,
    pending_ready: Option<oneshot::Sender<()>>,
}

/// Owns the embed backend and the generation counter
pub struct EmbedAdapter {
    backend: Box<dyn EmbedBackend>,
    container: String,
    generation: Generation,
    instance: Option<Instance>,
    signal_tx: mpsc::UnboundedSender<TaggedSignal>,
}

impl EmbedAdapter {
    /// Create an adapter and the receiving end of its signal stream
    pub fn new(
        backend: Box<dyn EmbedBackend>,
        container: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<TaggedSignal>) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let adapter = Self {
            backend,
            container: container.into(),
            generation: 0,
            instance: None,
            signal_tx,
        };
        (adapter, signal_rx)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// An instance exists and has reported ready
    pub fn is_ready(&self) -> bool {
        self.instance.as_ref().is_some_and(|i| i.ready)
    }

    /// Tear down any prior instance and create a new one for `track_id`
    ///
    /// Creation failure is reported twice: as the `Err` return, and as an
    /// `Error(LoadFailed)` event on the signal stream for the new generation.
    pub async fn load(&mut self, track_id: TrackId, options: LoadOptions) -> Result<LoadTicket> {
        self.destroy();
        let generation = self.generation;

        let (ready_tx, ready_rx) = oneshot::channel();
        self.instance = Some(Instance {
            ready: false,
            last_state: None,
            pending_ready: Some(ready_tx),
        });

        let request = EmbedRequest {
            container: self.container.clone(),
            track_id,
            autoplay: options.autoplay,
            start_seconds: options.start_seconds.max(0.0),
        };
        info!(
            generation,
            track_id = %request.track_id,
            start = request.start_seconds,
            "Creating embed instance"
        );

        let sink = SignalSink::new(generation, self.signal_tx.clone());
        if let Err(e) = self.backend.create(&request, sink.clone()).await {
            warn!(generation, error = %e, "Embed creation failed");
            sink.emit(RawSignal::CreateFailed(e.to_string()));
            return Err(e);
        }

        Ok(LoadTicket {
            generation,
            ready: ready_rx,
        })
    }

    /// Release the current instance, invalidating all of its signals
    ///
    /// Idempotent.
    pub fn destroy(&mut self) {
        if self.instance.take().is_some() {
            debug!(generation = self.generation, "Destroying embed instance");
            self.backend.destroy();
        }
        self.generation += 1;
    }

    /// Issue a command; a no-op until the instance is ready
    pub fn command(&mut self, command: EmbedCommand) {
        let Some(instance) = self.instance.as_mut() else {
            debug!(?command, "No embed instance, command ignored");
            return;
        };
        if !instance.ready {
            debug!(?command, "Embed not ready, command ignored");
            return;
        }
        if matches!(command, EmbedCommand::LoadById { .. }) {
            // new content in the same instance reports its states afresh
            instance.last_state = None;
        }
        self.backend.command(&command);
    }

    /// Current playback position, 0 until ready
    pub fn current_time(&self) -> f64 {
        if self.is_ready() {
            sanitize(self.backend.current_time())
        } else {
            0.0
        }
    }

    /// Content duration, 0 until ready or while unknown
    pub fn duration(&self) -> f64 {
        if self.is_ready() {
            sanitize(self.backend.duration())
        } else {
            0.0
        }
    }

    /// Turn a tagged raw signal into a session event
    ///
    /// Returns `None` for stale generations, duplicate consecutive states,
    /// a repeated ready, states that arrive before ready, and codes with no
    /// session meaning.
    pub fn normalize(&mut self, tagged: TaggedSignal) -> Option<EmbedEvent> {
        if tagged.generation != self.generation {
            debug!(
                stale = tagged.generation,
                current = self.generation,
                signal = ?tagged.signal,
                "Discarding signal from replaced embed"
            );
            return None;
        }

        if let RawSignal::CreateFailed(_) = tagged.signal {
            self.instance = None;
            return Some(EmbedEvent::Error(EmbedErrorCode::LoadFailed));
        }

        let instance = self.instance.as_mut()?;
        match tagged.signal {
            RawSignal::Ready => {
                if instance.ready {
                    return None;
                }
                instance.ready = true;
                if let Some(tx) = instance.pending_ready.take() {
                    let _ = tx.send(());
                }
                Some(EmbedEvent::Ready)
            }
            RawSignal::StateCode(code) => {
                let state = EmbedState::from_code(code)?;
                if !instance.ready {
                    debug!(?state, "State before ready, ignored");
                    return None;
                }
                if instance.last_state == Some(state) {
                    return None;
                }
                instance.last_state = Some(state);
                Some(EmbedEvent::StateChanged(state))
            }
            RawSignal::ErrorCode(code) => {
                instance.last_state = None;
                Some(EmbedEvent::Error(EmbedErrorCode::from_code(code)))
            }
            RawSignal::CreateFailed(_) => None,
        }
    }
}

fn sanitize(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}
