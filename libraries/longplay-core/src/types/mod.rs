//! Domain types for Longplay

mod history;
mod repeat;
mod track;

pub use history::HistoryEntry;
pub use repeat::RepeatMode;
pub use track::{Track, TrackId};
