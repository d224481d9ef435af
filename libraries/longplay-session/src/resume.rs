//! Starting-offset resolution for a track load

use longplay_core::{HistoryStore, Track};
use tracing::{debug, warn};

/// Where a starting offset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeSource {
    /// Caller asked for a specific offset
    Explicit,
    /// Per-track resume record
    Record,
    /// Last position in the listening history
    History,
    /// No usable position; start from the beginning
    Beginning,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResumePoint {
    pub position: f64,
    pub source: ResumeSource,
}

impl ResumePoint {
    fn beginning() -> Self {
        Self {
            position: 0.0,
            source: ResumeSource::Beginning,
        }
    }
}

/// Resolution knobs, taken from the session config
#[derive(Debug, Clone, Copy)]
pub struct ResumePolicy {
    pub history_lookup_limit: usize,
    /// Saved positions this close to the known end restart the track
    pub restart_margin: f64,
}

/// Resolve the offset a load should start at
///
/// Precedence: an explicit non-zero offset (verbatim), then the resume
/// record, then the most recent history entry for the track, then 0. Store
/// failures fall back to 0. Never fails.
pub async fn resolve_start(
    history: &dyn HistoryStore,
    track: &Track,
    explicit: Option<f64>,
    policy: ResumePolicy,
) -> ResumePoint {
    if let Some(position) = explicit.filter(|p| p.is_finite() && *p > 0.0) {
        return ResumePoint {
            position,
            source: ResumeSource::Explicit,
        };
    }

    let saved = match lookup(history, track, policy.history_lookup_limit).await {
        Some(point) => point,
        None => return ResumePoint::beginning(),
    };

    if let Some(duration) = track.duration {
        if saved.position >= duration - policy.restart_margin {
            debug!(
                track_id = %track.id,
                position = saved.position,
                duration,
                "Saved position is at the end, starting over"
            );
            return ResumePoint::beginning();
        }
    }
    saved
}

async fn lookup(history: &dyn HistoryStore, track: &Track, limit: usize) -> Option<ResumePoint> {
    match history.get_resume_position(&track.id).await {
        Ok(Some(position)) if position.is_finite() && position > 0.0 => {
            return Some(ResumePoint {
                position,
                source: ResumeSource::Record,
            });
        }
        Ok(_) => {}
        Err(e) => {
            warn!(track_id = %track.id, error = %e, "Resume position lookup failed");
            return None;
        }
    }

    match history.get_recent_history(limit).await {
        Ok(entries) => entries
            .into_iter()
            .find(|entry| entry.track.id == track.id)
            .map(|entry| entry.last_position)
            .filter(|p| p.is_finite() && *p > 0.0)
            .map(|position| ResumePoint {
                position,
                source: ResumeSource::History,
            }),
        Err(e) => {
            warn!(track_id = %track.id, error = %e, "History lookup failed");
            None
        }
    }
}
