//! Raw embed vocabulary and its normalized form

use crate::error::SessionError;
use tokio::sync::mpsc;
use tracing::trace;

/// Monotonically increasing id of an embed instance
pub type Generation = u64;

/// Signal as emitted by the embed, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawSignal {
    /// Embed finished initializing
    Ready,
    /// Numeric player state code
    StateCode(i32),
    /// Numeric error code
    ErrorCode(i32),
    /// Instance creation failed before any signal could be emitted
    CreateFailed(String),
}

/// A raw signal tagged with the generation of the instance that emitted it
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSignal {
    pub generation: Generation,
    pub signal: RawSignal,
}

/// Sender handed to a backend instance at creation
///
/// Every signal sent through it carries the generation the instance was
/// created with, so signals from a replaced instance can be recognized.
#[derive(Debug, Clone)]
pub struct SignalSink {
    generation: Generation,
    tx: mpsc::UnboundedSender<TaggedSignal>,
}

impl SignalSink {
    pub(crate) fn new(generation: Generation, tx: mpsc::UnboundedSender<TaggedSignal>) -> Self {
        Self { generation, tx }
    }

    /// Generation this sink tags signals with
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Emit a raw signal
    ///
    /// Sending after the session is gone is silently dropped.
    pub fn emit(&self, signal: RawSignal) {
        trace!(generation = self.generation, ?signal, "Embed signal");
        let _ = self.tx.send(TaggedSignal {
            generation: self.generation,
            signal,
        });
    }
}

/// Normalized player state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedState {
    Playing,
    Paused,
    Buffering,
    Ended,
    Cued,
}

impl EmbedState {
    /// Map a raw state code
    ///
    /// Returns `None` for "unstarted" (-1) and unknown codes, which carry no
    /// session-level meaning.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }
}

/// Normalized embed error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedErrorCode {
    /// Request contained an invalid parameter (2)
    InvalidParameter,
    /// Player could not play the content (5)
    PlayerFailure,
    /// Content not found or private (100)
    NotFound,
    /// Owner does not allow embedded playback (101, 150)
    EmbeddingDisallowed,
    /// Instance could not be created at all
    LoadFailed,
    /// Any other code
    Unknown(i32),
}

impl EmbedErrorCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            2 => Self::InvalidParameter,
            5 => Self::PlayerFailure,
            100 => Self::NotFound,
            101 | 150 => Self::EmbeddingDisallowed,
            other => Self::Unknown(other),
        }
    }

    /// Human-readable message stored as the session's `last_error`
    pub fn message(&self) -> String {
        match self {
            Self::InvalidParameter => "The requested video id is invalid".to_string(),
            Self::PlayerFailure => "The player could not play this video".to_string(),
            Self::NotFound => "This video was removed or is private".to_string(),
            Self::EmbeddingDisallowed => {
                "The owner of this video does not allow embedded playback".to_string()
            }
            Self::LoadFailed => "The player could not be loaded".to_string(),
            Self::Unknown(code) => format!("Playback failed (error {code})"),
        }
    }
}

impl From<EmbedErrorCode> for SessionError {
    fn from(code: EmbedErrorCode) -> Self {
        match code {
            EmbedErrorCode::LoadFailed => SessionError::LoadFailure(code.message()),
            other => SessionError::Playback(other.message()),
        }
    }
}

/// Normalized event delivered to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedEvent {
    Ready,
    StateChanged(EmbedState),
    Error(EmbedErrorCode),
}
