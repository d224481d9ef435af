//! Session configuration
//!
//! Every tunable of the engine lives here so that none of the timing or
//! threshold constants are hidden in the code paths that use them.

use crate::error::{Result, SessionError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fast position polling while playing and visible (default: 250ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Position polling while the app is hidden (default: 1000ms)
    #[serde(default = "default_background_poll_interval_ms")]
    pub background_poll_interval_ms: u64,

    /// Resume checkpoint cadence while playing (default: 10s)
    #[serde(default = "default_checkpoint_interval_secs")]
    pub checkpoint_interval_secs: u64,

    /// "Previous" restarts the current track past this position (default: 3s)
    #[serde(default = "default_previous_restart_threshold_secs")]
    pub previous_restart_threshold_secs: f64,

    /// Hardware seek-backward / seek-forward step (default: 10s)
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,

    /// How many history rows the resume lookup scans (default: 50)
    #[serde(default = "default_history_lookup_limit")]
    pub history_lookup_limit: usize,

    /// Playback rates the embed accepts
    #[serde(default = "default_allowed_rates")]
    pub allowed_rates: Vec<f64>,

    /// Initial volume (0-100, default: 100)
    #[serde(default = "default_volume")]
    pub default_volume: u8,

    /// A saved resume point this close to the end restarts the track (default: 10s)
    #[serde(default = "default_resume_restart_margin_secs")]
    pub resume_restart_margin_secs: f64,

    /// Container element the embed is mounted into
    #[serde(default = "default_container_id")]
    pub container_id: String,
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 || self.background_poll_interval_ms == 0 {
            return Err(SessionError::Config(
                "poll intervals must be greater than zero".to_string(),
            ));
        }
        if self.checkpoint_interval_secs == 0 {
            return Err(SessionError::Config(
                "checkpoint interval must be greater than zero".to_string(),
            ));
        }
        if self.allowed_rates.is_empty()
            || self
                .allowed_rates
                .iter()
                .any(|r| !r.is_finite() || *r <= 0.0)
        {
            return Err(SessionError::Config(
                "allowed rates must be a non-empty list of positive numbers".to_string(),
            ));
        }
        let threshold = self.previous_restart_threshold_secs;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(SessionError::Config(
                "previous restart threshold must be non-negative".to_string(),
            ));
        }
        if self.default_volume > 100 {
            return Err(SessionError::Config(format!(
                "default volume {} is above 100",
                self.default_volume
            )));
        }
        Ok(())
    }

    /// Fast poll interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Background poll interval
    pub fn background_poll_interval(&self) -> Duration {
        Duration::from_millis(self.background_poll_interval_ms)
    }

    /// Checkpoint interval
    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(self.checkpoint_interval_secs)
    }

    /// Snap a requested rate to the nearest allowed rate
    pub fn snap_rate(&self, requested: f64) -> f64 {
        if !requested.is_finite() {
            return 1.0;
        }
        self.allowed_rates
            .iter()
            .copied()
            .min_by(|a, b| {
                (a - requested)
                    .abs()
                    .partial_cmp(&(b - requested).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(1.0)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            background_poll_interval_ms: default_background_poll_interval_ms(),
            checkpoint_interval_secs: default_checkpoint_interval_secs(),
            previous_restart_threshold_secs: default_previous_restart_threshold_secs(),
            seek_step_secs: default_seek_step_secs(),
            history_lookup_limit: default_history_lookup_limit(),
            allowed_rates: default_allowed_rates(),
            default_volume: default_volume(),
            resume_restart_margin_secs: default_resume_restart_margin_secs(),
            container_id: default_container_id(),
        }
    }
}

// Default values
fn default_poll_interval_ms() -> u64 {
    250
}

fn default_background_poll_interval_ms() -> u64 {
    1000
}

fn default_checkpoint_interval_secs() -> u64 {
    10
}

fn default_previous_restart_threshold_secs() -> f64 {
    3.0
}

fn default_seek_step_secs() -> f64 {
    10.0
}

fn default_history_lookup_limit() -> usize {
    50
}

fn default_allowed_rates() -> Vec<f64> {
    vec![0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0]
}

fn default_volume() -> u8 {
    100
}

fn default_resume_restart_margin_secs() -> f64 {
    10.0
}

fn default_container_id() -> String {
    "longplay-embed".to_string()
}
