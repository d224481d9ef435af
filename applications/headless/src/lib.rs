//! Longplay Headless
//!
//! Terminal driver for the playback session. Reads one command per line,
//! forwards it to a spawned [`longplay_session::Session`] running against
//! the simulated embed, and prints the resulting snapshot.

pub mod commands;
pub mod config;
pub mod display;
pub mod error;
