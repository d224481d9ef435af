/// Core error types for Longplay
use thiserror::Error;

/// Result type alias using `LongplayError`
pub type Result<T> = std::result::Result<T, LongplayError>;

/// Core error type for Longplay
#[derive(Error, Debug)]
pub enum LongplayError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl LongplayError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
