//! Pause-aware elapsed time and cosine easing.
//!
//! A [`TimeBase`] measures wall-clock time from a start instant minus every interval spent
//! paused. A [`Timeline`] pairs a time base with a duration and turns it into normalized
//! progress.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

/// Cosine ease-in-out: `0.5 - 0.5*cos(πt)`, input clamped to `[0, 1]`.
pub fn ease_cosine(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    0.5 - 0.5 * (t * PI).cos()
}

#[derive(Clone, Copy, Debug)]
pub struct TimeBase {
    started_at: Instant,
    paused_total: Duration,
    paused_at: Option<Instant>,
}

impl TimeBase {
    pub fn start(now: Instant) -> Self {
        Self {
            started_at: now,
            paused_total: Duration::ZERO,
            paused_at: None,
        }
    }

    /// `now - started_at - paused_total`, frozen at the pause instant while paused.
    pub fn elapsed(&self, now: Instant) -> Duration {
        let reference = self.paused_at.unwrap_or(now);
        reference
            .saturating_duration_since(self.started_at)
            .saturating_sub(self.paused_total)
    }

    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Timeline {
    base: TimeBase,
    duration: Duration,
}

impl Timeline {
    pub fn start(now: Instant, duration: Duration) -> Self {
        Self {
            base: TimeBase::start(now),
            duration,
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.base.elapsed(now)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    /// Linear progress in `[0, 1]`. A zero duration is complete immediately.
    pub fn linear(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let t = self.elapsed(now).as_secs_f64() / self.duration.as_secs_f64();
        t.clamp(0.0, 1.0)
    }

    pub fn eased(&self, now: Instant) -> f64 {
        ease_cosine(self.linear(now))
    }

    pub fn is_complete(&self, now: Instant) -> bool {
        self.linear(now) >= 1.0
    }

    pub fn pause(&mut self, now: Instant) {
        self.base.pause(now);
    }

    pub fn resume(&mut self, now: Instant) {
        self.base.resume(now);
    }
}
