//! Polling and checkpoint timers
//!
//! Both timers run only while the session is playing. The session starts
//! them on entering `playing` and stops them on leaving it; `start` replaces
//! any running interval, so timers never stack.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Which timer fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Sample the embed position
    Poll,
    /// Persist the resume position
    Checkpoint,
}

#[derive(Debug)]
pub struct PlaybackTimers {
    poll: Option<Interval>,
    checkpoint: Option<Interval>,
    poll_period: Duration,
    checkpoint_period: Duration,
}

impl PlaybackTimers {
    pub fn new(poll_period: Duration, checkpoint_period: Duration) -> Self {
        Self {
            poll: None,
            checkpoint: None,
            poll_period,
            checkpoint_period,
        }
    }

    /// Start both timers (first ticks one period from now)
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.poll = Some(make_interval(self.poll_period));
        self.checkpoint = Some(make_interval(self.checkpoint_period));
    }

    pub fn stop(&mut self) {
        self.poll = None;
        self.checkpoint = None;
    }

    pub fn is_running(&self) -> bool {
        self.poll.is_some() || self.checkpoint.is_some()
    }

    pub fn poll_period(&self) -> Duration {
        self.poll_period
    }

    /// Change the poll cadence; a running poll timer is restarted with it
    pub fn set_poll_period(&mut self, period: Duration) {
        if period == self.poll_period {
            return;
        }
        self.poll_period = period;
        if self.poll.is_some() {
            self.poll = Some(make_interval(period));
        }
    }

    /// Wait for the next tick; pending forever while stopped
    ///
    /// Cancel safe.
    pub async fn tick(&mut self) -> TimerTick {
        match (self.poll.as_mut(), self.checkpoint.as_mut()) {
            (Some(poll), Some(checkpoint)) => {
                tokio::select! {
                    _ = poll.tick() => TimerTick::Poll,
                    _ = checkpoint.tick() => TimerTick::Checkpoint,
                }
            }
            (Some(poll), None) => {
                poll.tick().await;
                TimerTick::Poll
            }
            (None, Some(checkpoint)) => {
                checkpoint.tick().await;
                TimerTick::Checkpoint
            }
            (None, None) => std::future::pending().await,
        }
    }
}

fn make_interval(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
