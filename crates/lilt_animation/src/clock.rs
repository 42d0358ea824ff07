//! Frame timing
//!
//! The scheduler never reads the wall clock. Hosts hand it a [`TickDelta`]
//! per frame, either built by hand or produced by a [`FrameClock`].

use std::time::{Duration, Instant};

/// Seconds elapsed since the previous tick
///
/// Tweens advance by `unscaled` unless created with scaled time, in which
/// case they advance by `scaled`. Negative or non-finite inputs become 0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickDelta {
    pub unscaled: f32,
    pub scaled: f32,
}

impl TickDelta {
    pub fn new(unscaled: f32, scaled: f32) -> Self {
        Self {
            unscaled: sanitize(unscaled),
            scaled: sanitize(scaled),
        }
    }

    /// Same delta on both clocks
    pub fn uniform(dt: f32) -> Self {
        Self::new(dt, dt)
    }
}

fn sanitize(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}

/// Wall-clock source of tick deltas with a time scale
///
/// The first [`advance`](Self::advance) only records the current instant
/// and returns `None`, so the host's first real frame never sees the time
/// spent on startup.
///
/// ```ignore
/// let mut clock = FrameClock::new();
/// loop {
///     scheduler.tick_clock(&mut clock);
///     render();
/// }
/// ```
#[derive(Clone, Debug)]
pub struct FrameClock {
    last_frame: Option<Instant>,
    time_scale: f32,
    max_delta: Option<f32>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last_frame: None,
            time_scale: 1.0,
            max_delta: None,
        }
    }

    /// Multiplier applied to produce the scaled delta
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = sanitize(scale);
    }

    /// Clamp each frame's unscaled delta, e.g. after the app was suspended
    pub fn with_max_delta(mut self, max: Duration) -> Self {
        self.max_delta = Some(max.as_secs_f32());
        self
    }

    /// Whether the clock has seen its first frame
    pub fn is_primed(&self) -> bool {
        self.last_frame.is_some()
    }

    /// Forget the previous frame; the next `advance` primes again
    pub fn reset(&mut self) {
        self.last_frame = None;
    }

    /// Measure the time since the previous call
    pub fn advance(&mut self) -> Option<TickDelta> {
        self.advance_at(Instant::now())
    }

    /// Produce a delta for a frame that took `dt` seconds
    pub fn advance_by(&mut self, dt: f32) -> TickDelta {
        let dt = match self.max_delta {
            Some(max) => sanitize(dt).min(max),
            None => sanitize(dt),
        };
        TickDelta::new(dt, dt * self.time_scale)
    }

    fn advance_at(&mut self, now: Instant) -> Option<TickDelta> {
        let previous = self.last_frame.replace(now)?;
        let dt = now.saturating_duration_since(previous).as_secs_f32();
        Some(self.advance_by(dt))
    }
}
