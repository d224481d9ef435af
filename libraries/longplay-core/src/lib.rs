//! Longplay Core
//!
//! Platform-agnostic types, collaborator traits and error handling shared by
//! every Longplay crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`, `HistoryEntry`, `RepeatMode`
//! - **Collaborator Traits**: `HistoryStore` (resume positions + listening history)
//!   and `SettingsStore` (key/value mirror of session preferences)
//! - **Error Handling**: Unified `LongplayError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use longplay_core::{RepeatMode, Track};
//!
//! let track = Track::new("dQw4w9WgXcQ", "Three Hour Ambient Mix")
//!     .with_author("Night Drive Radio")
//!     .with_duration(10_800.0);
//!
//! assert_eq!(track.id.as_str(), "dQw4w9WgXcQ");
//! assert_eq!(RepeatMode::Off.cycle(), RepeatMode::One);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{LongplayError, Result};
pub use traits::{HistoryStore, SettingsStore};
pub use types::{HistoryEntry, RepeatMode, Track, TrackId};
