//! Closed-loop period calculation.
//!
//! A figure closes (the pen returns to its starting point) after the least
//! common multiple of every body's revolution length, one revolution being
//! `360 / |speed|` steps rounded to the nearest integer. The result is
//! advisory: it tells a caller how many steps make a seamless loop, but the
//! draw sequence always runs the configured step budget regardless.

use std::fmt;

use crate::body::Body;

/// Greatest common divisor.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Least common multiple, with `lcm(0, _) == 0`.
///
/// Saturates instead of overflowing for pathological inputs.
pub fn lcm(a: u64, b: u64) -> u64 {
    if a == 0 || b == 0 {
        return 0;
    }
    (a / gcd(a, b)).saturating_mul(b)
}

/// The number of steps after which a figure repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedLoop {
    /// No bodies; there is nothing to repeat.
    Undefined,
    /// Every body is stationary; the figure never advances.
    Infinite,
    /// The figure closes after this many steps.
    Steps(u64),
}

impl ClosedLoop {
    /// The step count, when one exists.
    #[inline]
    pub fn steps(self) -> Option<u64> {
        match self {
            ClosedLoop::Steps(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for ClosedLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosedLoop::Undefined => write!(f, "-"),
            ClosedLoop::Infinite => write!(f, "infinite"),
            ClosedLoop::Steps(n) => write!(f, "{}", n),
        }
    }
}

/// Compute how many steps close the figure drawn by `bodies`.
///
/// Stationary bodies are ignored (they trace a point, which every loop
/// closes). Direction does not matter, so speed signs are dropped. Each
/// remaining speed contributes a rounded integer revolution length, clamped
/// to at least one step so extreme speeds cannot collapse the fold.
pub fn closed_loop(bodies: &[Body]) -> ClosedLoop {
    if bodies.is_empty() {
        return ClosedLoop::Undefined;
    }
    let mut periods = bodies
        .iter()
        .map(|b| b.speed)
        .filter(|s| *s != 0.0)
        .peekable();
    if periods.peek().is_none() {
        return ClosedLoop::Infinite;
    }
    let total = periods
        .map(|speed| ((360.0 / speed.abs()).round() as u64).max(1))
        .fold(1, lcm);
    ClosedLoop::Steps(total)
}
