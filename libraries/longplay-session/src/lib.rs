//! Longplay Session
//!
//! Single-session playback engine for long-form content hosted by a remote
//! video embed. The crate coordinates:
//!
//! - **Embed adapter**: normalizes embed callbacks into ordered,
//!   generation-checked events so late signals from a replaced instance
//!   never reach the session
//! - **State machine**: one authoritative [`SessionState`] driven by pure
//!   transitions
//! - **Queue engine**: next/previous, repeat none/one/all, auto-advance and
//!   shuffle with order restoration
//! - **Timers**: position polling and periodic resume checkpoints, running
//!   only while playing
//! - **Persistence**: resume positions, history and a settings mirror,
//!   all best-effort
//! - **Platform bridge**: media session, wake lock and keep-alive, all
//!   optional
//!
//! # Example
//!
//! ```rust,no_run
//! use longplay_core::Track;
//! use longplay_session::{Session, SessionConfig, SimulatedEmbed};
//! use longplay_storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> longplay_session::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let session = Session::new(
//!     SessionConfig::default(),
//!     Box::new(SimulatedEmbed::new()),
//!     store.clone(),
//!     store,
//! );
//! let (handle, _task) = session.spawn();
//!
//! handle.load_track(Track::new("dQw4w9WgXcQ", "Three Hour Ambient Mix"), None)?;
//! handle.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod embed;
pub mod error;
pub mod handle;
pub mod persistence;
pub mod platform;
pub mod queue;
pub mod resume;
pub mod session;
pub mod shuffle;
pub mod snapshot;
pub mod state;
pub mod timers;

pub use config::SessionConfig;
pub use embed::{
    EmbedAdapter, EmbedBackend, EmbedCommand, EmbedErrorCode, EmbedEvent, EmbedRequest,
    EmbedState, LoadOptions, LoadTicket, RawSignal, SignalSink, SimulatedEmbed, TaggedSignal,
};
pub use error::{Result, SessionError};
pub use handle::{SessionCommand, SessionHandle};
pub use persistence::{PersistenceBridge, RestoredSession};
pub use platform::{
    KeepAlive, MediaAction, MediaActionKind, MediaMetadata, MediaPlaybackState, MediaSession,
    PlatformBridge, PlatformError, PositionState, Visibility, WakeLock,
};
pub use queue::{QueueEngine, QueueStep};
pub use session::Session;
pub use snapshot::{QueueSnapshot, SessionSnapshot};
pub use state::{SessionState, SessionStatus, Transition};
pub use timers::TimerTick;
