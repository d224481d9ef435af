//! Actor handle
//!
//! [`Session::spawn`] moves the session onto its own task. The returned
//! [`SessionHandle`] is cheap to clone and is the only way in: commands are
//! queued on an unbounded channel and applied strictly in order, and state
//! comes back out through a `watch` channel of [`SessionSnapshot`]s.

use crate::error::{Result, SessionError};
use crate::platform::{MediaAction, Visibility};
use crate::session::Session;
use crate::snapshot::SessionSnapshot;
use longplay_core::Track;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Commands accepted by a running session
#[derive(Debug)]
pub enum SessionCommand {
    LoadTrack { track: Track, start: Option<f64> },
    Play,
    Pause,
    Toggle,
    Seek(f64),
    SeekBy(f64),
    SetRate(f64),
    SetVolume(u8),
    SetExpanded(bool),
    SetQueue { tracks: Vec<Track>, start_index: usize },
    PlayNext,
    PlayPrevious,
    SelectIndex(usize),
    ToggleShuffle,
    CycleRepeatMode,
    SetAutoPlayNext(bool),
    Media(MediaAction),
    Visibility(Visibility),
    Close,
    /// Close the session and stop the actor, acknowledging when done
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a spawned session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl Session {
    /// Spawn the session on the current tokio runtime
    pub fn spawn(self) -> (SessionHandle, JoinHandle<()>) {
        let (commands, rx) = mpsc::unbounded_channel();
        let handle = SessionHandle {
            commands,
            snapshots: self.subscribe(),
        };
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }
}

impl SessionHandle {
    pub fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| SessionError::Closed)
    }

    pub fn load_track(&self, track: Track, start: Option<f64>) -> Result<()> {
        self.send(SessionCommand::LoadTrack { track, start })
    }

    pub fn play(&self) -> Result<()> {
        self.send(SessionCommand::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(SessionCommand::Pause)
    }

    pub fn toggle(&self) -> Result<()> {
        self.send(SessionCommand::Toggle)
    }

    pub fn seek(&self, position: f64) -> Result<()> {
        self.send(SessionCommand::Seek(position))
    }

    pub fn seek_by(&self, delta: f64) -> Result<()> {
        self.send(SessionCommand::SeekBy(delta))
    }

    pub fn set_rate(&self, rate: f64) -> Result<()> {
        self.send(SessionCommand::SetRate(rate))
    }

    pub fn set_volume(&self, volume: u8) -> Result<()> {
        self.send(SessionCommand::SetVolume(volume))
    }

    pub fn set_expanded(&self, expanded: bool) -> Result<()> {
        self.send(SessionCommand::SetExpanded(expanded))
    }

    pub fn set_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.send(SessionCommand::SetQueue {
            tracks,
            start_index,
        })
    }

    pub fn play_next(&self) -> Result<()> {
        self.send(SessionCommand::PlayNext)
    }

    pub fn play_previous(&self) -> Result<()> {
        self.send(SessionCommand::PlayPrevious)
    }

    pub fn select_index(&self, index: usize) -> Result<()> {
        self.send(SessionCommand::SelectIndex(index))
    }

    pub fn toggle_shuffle(&self) -> Result<()> {
        self.send(SessionCommand::ToggleShuffle)
    }

    pub fn cycle_repeat_mode(&self) -> Result<()> {
        self.send(SessionCommand::CycleRepeatMode)
    }

    pub fn set_auto_play_next(&self, enabled: bool) -> Result<()> {
        self.send(SessionCommand::SetAutoPlayNext(enabled))
    }

    /// Forward an action from the platform media session
    pub fn media_action(&self, action: MediaAction) -> Result<()> {
        self.send(SessionCommand::Media(action))
    }

    pub fn set_visibility(&self, visibility: Visibility) -> Result<()> {
        self.send(SessionCommand::Visibility(visibility))
    }

    pub fn close(&self) -> Result<()> {
        self.send(SessionCommand::Close)
    }

    /// Close the session and wait for the actor to stop
    pub async fn shutdown(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(SessionCommand::Shutdown(ack))?;
        done.await.map_err(|_| SessionError::Closed)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(snapshot.clone())
    }
}
