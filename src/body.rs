//! The body graph: orbit parameters and parent links.
//!
//! A figure is a forest of [`Body`] nodes. Each body orbits either the
//! origin or another body, and the hierarchy is expressed through plain
//! indices into a [`BodySystem`]. Edits are index-stable except for
//! [`BodySystem::remove`], which re-indexes parent links the way callers
//! expect from a positional list.
//!
//! The graph is deliberately permissive: a parent index may transiently
//! point at a body that does not exist yet, and cycles are representable.
//! The position solver resolves what it can and reports the rest; see
//! [`crate::solver`].
//!
//! # Example
//!
//! ```ignore
//! use orrery::{Body, BodySystem, Parent};
//!
//! let mut system = BodySystem::single_default();
//! system.add(Body::new(75.0, 40.0, 2.0).with_parent(Parent::Body(0)));
//! assert_eq!(system.len(), 2);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::BodyError;
use crate::settings::Color;

/// What a body orbits.
///
/// Serialized as the integer convention used by parameter files: `-1` for
/// the origin, a zero-based index otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Parent {
    /// Orbits the origin.
    Root,
    /// Orbits the body at this index.
    Body(usize),
}

impl Parent {
    /// The parent index, or `None` for root bodies.
    #[inline]
    pub fn index(self) -> Option<usize> {
        match self {
            Parent::Root => None,
            Parent::Body(i) => Some(i),
        }
    }
}

impl From<i64> for Parent {
    fn from(raw: i64) -> Self {
        if raw < 0 {
            Parent::Root
        } else {
            Parent::Body(raw as usize)
        }
    }
}

impl From<Parent> for i64 {
    fn from(p: Parent) -> Self {
        match p {
            Parent::Root => -1,
            Parent::Body(i) => i as i64,
        }
    }
}

/// One orbiting body.
///
/// `distance_x`/`distance_y` are the semi-axes of the local ellipse,
/// `speed` is degrees per step (sign sets direction, zero parks the body),
/// and `inclination`/`azimuth` orient the orbital plane in degrees.
/// `radius` and `color` are presentation attributes the solver ignores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    pub distance_x: f64,
    pub distance_y: f64,
    pub speed: f64,
    pub inclination: f64,
    pub azimuth: f64,
    pub radius: f64,
    pub color: Color,
    pub parent: Parent,
}

impl Body {
    /// Create a body with the given ellipse and speed; everything else takes
    /// the defaults (flat plane, radius 5, white, orbiting the origin).
    pub fn new(distance_x: f64, distance_y: f64, speed: f64) -> Self {
        Self {
            distance_x,
            distance_y,
            speed,
            ..Self::default()
        }
    }

    /// Set the orbital plane tilt in degrees.
    pub fn with_inclination(mut self, degrees: f64) -> Self {
        self.inclination = degrees;
        self
    }

    /// Set the orbital plane rotation in degrees.
    pub fn with_azimuth(mut self, degrees: f64) -> Self {
        self.azimuth = degrees;
        self
    }

    /// Set the marker radius.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Set the trail and marker color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set what this body orbits.
    pub fn with_parent(mut self, parent: Parent) -> Self {
        self.parent = parent;
        self
    }

    /// A body with random parameters in the stock ranges: integer distances
    /// 50-249, a one-decimal speed in 0.1-5.1, integer inclination 0-89 and
    /// azimuth 0-359, radius 2-6.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            distance_x: rng.gen_range(50..250) as f64,
            distance_y: rng.gen_range(50..250) as f64,
            speed: ((rng.gen::<f64>() * 5.0 + 0.1) * 10.0).round() / 10.0,
            inclination: rng.gen_range(0..90) as f64,
            azimuth: rng.gen_range(0..360) as f64,
            radius: rng.gen_range(2..7) as f64,
            color: Color::random(rng),
            parent: Parent::Root,
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self {
            distance_x: 150.0,
            distance_y: 150.0,
            speed: 1.0,
            inclination: 0.0,
            azimuth: 0.0,
            radius: 5.0,
            color: Color::WHITE,
            parent: Parent::Root,
        }
    }
}

/// An index-addressed collection of bodies.
#[derive(Debug, Clone, Default)]
pub struct BodySystem {
    bodies: Vec<Body>,
}

impl BodySystem {
    /// An empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// The reset state: one default body orbiting the origin.
    pub fn single_default() -> Self {
        Self {
            bodies: vec![Body::default()],
        }
    }

    /// Build a system from an explicit body list.
    pub fn from_bodies(bodies: Vec<Body>) -> Self {
        Self { bodies }
    }

    /// A random figure: 2-4 random bodies where each body after the first
    /// orbits a uniformly chosen earlier body. Always a forest.
    pub fn random(rng: &mut impl Rng) -> Self {
        let count = rng.gen_range(2..=4);
        let mut bodies = Vec::with_capacity(count);
        for i in 0..count {
            let parent = if i == 0 {
                Parent::Root
            } else {
                Parent::Body(rng.gen_range(0..i))
            };
            bodies.push(Body::random(rng).with_parent(parent));
        }
        Self { bodies }
    }

    /// Append a body, returning its index.
    pub fn add(&mut self, body: Body) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    /// Append a body derived from the tail of the system: half the last
    /// body's distances (rounded), one degree-per-step faster, a random
    /// color, parented to the second-to-last body when one exists.
    ///
    /// On an empty system this is just the default body.
    pub fn add_chained(&mut self, rng: &mut impl Rng) -> usize {
        let len = self.bodies.len();
        let body = match self.bodies.last() {
            Some(last) => Body {
                distance_x: (last.distance_x / 2.0).round(),
                distance_y: (last.distance_y / 2.0).round(),
                speed: last.speed + 1.0,
                color: Color::random(rng),
                parent: if len > 1 {
                    Parent::Body(len - 2)
                } else {
                    Parent::Root
                },
                ..Body::default()
            },
            None => Body::default(),
        };
        self.add(body)
    }

    /// Remove the body at `index` and re-index the survivors: parent links
    /// above the removed index shift down by one, and bodies that orbited
    /// the removed body fall back to the origin.
    pub fn remove(&mut self, index: usize) -> Result<Body, BodyError> {
        if index >= self.bodies.len() {
            return Err(BodyError::OutOfRange {
                index,
                len: self.bodies.len(),
            });
        }
        let removed = self.bodies.remove(index);
        for body in &mut self.bodies {
            if let Parent::Body(p) = body.parent {
                if p == index {
                    body.parent = Parent::Root;
                } else if p > index {
                    body.parent = Parent::Body(p - 1);
                }
            }
        }
        Ok(removed)
    }

    /// Re-link the body at `index`. Rejects self-parenting; a parent index
    /// that does not exist (yet) is allowed and simply leaves the body
    /// unresolved until it does.
    pub fn set_parent(&mut self, index: usize, parent: Parent) -> Result<(), BodyError> {
        if index >= self.bodies.len() {
            return Err(BodyError::OutOfRange {
                index,
                len: self.bodies.len(),
            });
        }
        if parent == Parent::Body(index) {
            return Err(BodyError::SelfParent { index });
        }
        self.bodies[index].parent = parent;
        Ok(())
    }

    /// The body at `index`, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Body> {
        self.bodies.get(index)
    }

    /// Mutable access to the body at `index`, if any.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Body> {
        self.bodies.get_mut(index)
    }

    /// All bodies in index order.
    #[inline]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Iterate bodies in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    /// Number of bodies.
    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the system has no bodies.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}
