//! Error types for the playback session

use thiserror::Error;

/// Session errors
///
/// Embed and playback failures normally surface as session *state*
/// (`status = error`, `last_error`), not as `Err` values. These variants are
/// what crosses an API boundary when an operation cannot even be attempted.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Embed could not initialize or load the requested content
    #[error("Load failed: {0}")]
    LoadFailure(String),

    /// Embed reported an error during an active session
    #[error("Playback error: {0}")]
    Playback(String),

    /// A newer load (or a destroy) replaced the embed instance
    #[error("Load superseded by a newer request")]
    Superseded,

    /// The session actor is no longer running
    #[error("Session is closed")]
    Closed,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
