//! Closed-form position solving.
//!
//! Every body's position at a step is a pure function of the step number
//! and the body list; no state is integrated between steps. Bodies are
//! resolved parent-first in repeated passes: a pass computes every body
//! whose parent is already known (bodies resolved earlier in the same pass
//! count), so a parent-before-child list resolves in a single pass and any
//! ordering resolves within the pass cap. Bodies left over after the cap
//! (cycles, dangling parent links) are reported as unresolved rather than
//! dropped silently.

use glam::DVec3;

use crate::body::{Body, Parent};

/// Solved positions for one step, one slot per body.
///
/// Unresolved bodies (cyclic or dangling parent chains) hold `None`; their
/// indices are reported so callers can surface malformed topology.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPositions {
    positions: Vec<Option<DVec3>>,
}

impl StepPositions {
    /// The position of the body at `index`, or `None` if the index is out
    /// of range or the body could not be resolved.
    #[inline]
    pub fn get(&self, index: usize) -> Option<DVec3> {
        self.positions.get(index).copied().flatten()
    }

    /// One slot per body, in body order.
    #[inline]
    pub fn as_slice(&self) -> &[Option<DVec3>] {
        &self.positions
    }

    /// Number of slots (equal to the body count of the solve).
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the solve covered no bodies at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// How many bodies resolved.
    pub fn resolved_count(&self) -> usize {
        self.positions.iter().filter(|p| p.is_some()).count()
    }

    /// Whether every body resolved.
    pub fn is_fully_resolved(&self) -> bool {
        self.positions.iter().all(|p| p.is_some())
    }

    /// Indices of the bodies that did not resolve.
    pub fn unresolved_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_none())
            .map(|(i, _)| i)
    }
}

/// Solve every body's absolute position at `step`.
///
/// The pass count is capped at twice the body count, which terminates
/// cyclic topologies while still letting any resolvable ordering finish.
pub fn positions_at_step(bodies: &[Body], step: u32) -> StepPositions {
    let mut positions: Vec<Option<DVec3>> = vec![None; bodies.len()];
    let mut resolved = 0usize;
    let mut passes = 0usize;

    while resolved < bodies.len() && passes < bodies.len() * 2 {
        for (i, body) in bodies.iter().enumerate() {
            if positions[i].is_some() {
                continue;
            }
            let parent_position = match body.parent {
                Parent::Root => Some(DVec3::ZERO),
                Parent::Body(p) => positions.get(p).copied().flatten(),
            };
            if let Some(origin) = parent_position {
                positions[i] = Some(origin + local_offset(body, step));
                resolved += 1;
            }
        }
        passes += 1;
    }

    StepPositions { positions }
}

/// A body's offset from its parent at `step`: a point on the local ellipse,
/// tilted by inclination (y into z), then rotated by azimuth around z.
fn local_offset(body: &Body, step: u32) -> DVec3 {
    let orbital = (step as f64 * body.speed).to_radians();
    let local_x = body.distance_x * orbital.cos();
    let local_y = body.distance_y * orbital.sin();

    let inclination = body.inclination.to_radians();
    let azimuth = body.azimuth.to_radians();

    let y1 = local_y * inclination.cos();
    let z1 = local_y * inclination.sin();
    let x = local_x * azimuth.cos() - y1 * azimuth.sin();
    let y = local_x * azimuth.sin() + y1 * azimuth.cos();

    DVec3::new(x, y, z1)
}
