//! Frame pacing for incremental drawing.
//!
//! The engine is clocked externally: the embedding calls
//! [`Engine::frame`](crate::Engine::frame) as often as it likes (a vsync
//! callback, a busy loop, a timer) and [`TickGate`] decides which of those
//! calls become simulation ticks, holding the admitted rate at the
//! configured frames per second. Uses `std::time` only.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Instant;
//! use orrery::TickGate;
//!
//! let mut gate = TickGate::new(15.0);
//! loop {
//!     if gate.admit(Instant::now()) {
//!         // advance one step, render
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

/// Slowest admitted rate; requests below this are clamped.
const MIN_FPS: f64 = 0.1;
/// Fastest admitted rate; requests above this are clamped.
const MAX_FPS: f64 = 240.0;
/// Rate used when a non-finite value is requested.
const FALLBACK_FPS: f64 = 15.0;

/// Admits ticks at a fixed wall-clock rate.
///
/// When a tick is admitted, the remainder of the elapsed interval is
/// carried forward (the anchor moves to `now - elapsed % interval`), so a
/// caller that polls slightly off-beat still averages the configured rate
/// instead of drifting slower.
#[derive(Debug, Clone)]
pub struct TickGate {
    fps: f64,
    interval: Duration,
    last: Instant,
}

impl TickGate {
    /// A gate admitting `fps` ticks per second, anchored at the current
    /// instant: the first tick is admitted one interval from now.
    pub fn new(fps: f64) -> Self {
        Self::anchored(fps, Instant::now())
    }

    /// A gate anchored at an explicit instant. Ticks are admitted relative
    /// to `start`, which makes pacing fully deterministic under test.
    pub fn anchored(fps: f64, start: Instant) -> Self {
        let fps = clamp_fps(fps);
        Self {
            fps,
            interval: interval_for(fps),
            last: start,
        }
    }

    /// The configured interval between admitted ticks.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The effective rate in ticks per second, after clamping.
    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Change the admitted rate. Takes effect from the next poll; the
    /// current anchor is kept.
    pub fn set_fps(&mut self, fps: f64) {
        self.fps = clamp_fps(fps);
        self.interval = interval_for(self.fps);
    }

    /// Re-anchor the gate at `now`, discarding any accumulated remainder.
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    /// Poll the gate. Returns true when at least one interval has passed
    /// since the anchor, advancing the anchor with remainder carry.
    pub fn admit(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last);
        if elapsed > self.interval {
            let remainder = elapsed.as_nanos() % self.interval.as_nanos();
            self.last = now - Duration::from_nanos(remainder as u64);
            true
        } else {
            false
        }
    }
}

impl Default for TickGate {
    fn default() -> Self {
        Self::new(FALLBACK_FPS)
    }
}

fn clamp_fps(fps: f64) -> f64 {
    let fps = if fps.is_finite() { fps } else { FALLBACK_FPS };
    fps.clamp(MIN_FPS, MAX_FPS)
}

fn interval_for(fps: f64) -> Duration {
    Duration::from_secs_f64(1.0 / fps)
}
