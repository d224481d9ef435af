//! Snapshot rendering for the terminal

use longplay_session::{SessionSnapshot, SessionStatus};

/// One-line summary of a snapshot
pub fn summary(snapshot: &SessionSnapshot) -> String {
    let state = &snapshot.state;
    let queue = &snapshot.queue;

    let track = state
        .current_track
        .as_ref()
        .map_or_else(|| "-".to_string(), |t| t.title.clone());
    let position = format!(
        "{}/{}",
        clock(state.current_time),
        if state.duration > 0.0 {
            clock(state.duration)
        } else {
            "--:--".to_string()
        }
    );
    let queue_position = if queue.tracks.is_empty() {
        "queue empty".to_string()
    } else {
        format!("queue {}/{}", queue.current_index + 1, queue.tracks.len())
    };

    let mut line = format!(
        "[{}] {track} {position} x{} vol {} repeat {} shuffle {} {queue_position}",
        status_label(state.status),
        state.playback_rate,
        state.volume,
        queue.repeat_mode,
        if queue.shuffled { "on" } else { "off" },
    );
    if let Some(error) = &state.last_error {
        line.push_str(&format!(" error: {error}"));
    }
    line
}

fn status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Idle => "idle",
        SessionStatus::Loading => "loading",
        SessionStatus::Ready => "ready",
        SessionStatus::Playing => "playing",
        SessionStatus::Paused => "paused",
        SessionStatus::Buffering => "buffering",
        SessionStatus::Error => "error",
    }
}

/// Format seconds as `m:ss` or `h:mm:ss`
pub fn clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats() {
        assert_eq!(clock(0.0), "0:00");
        assert_eq!(clock(59.9), "0:59");
        assert_eq!(clock(3725.0), "1:02:05");
        assert_eq!(clock(f64::NAN), "0:00");
    }
}
