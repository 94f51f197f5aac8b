//! Figure-wide settings and presentation values.
//!
//! [`Settings`] collects everything that is not a per-body parameter: the
//! step budget, the draw style, animation pacing, and a handful of
//! presentation values (background color, camera hints) that the core never
//! interprets but persists and hands to render adapters.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ParseColorError;

/// An 8-bit RGB color, formatted as `#rrggbb`.
///
/// This is the wire format used everywhere a color crosses a boundary:
/// parameter files, body editing, and vertex color conversion.
///
/// # Example
///
/// ```ignore
/// let c: Color = "#ff8800".parse().unwrap();
/// assert_eq!(c.to_hex(), "#ff8800");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Create a color from raw channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` string (case-insensitive hex digits).
    pub fn from_hex(s: &str) -> Result<Self, ParseColorError> {
        let hex = s.strip_prefix('#').ok_or_else(|| ParseColorError::new(s))?;
        // Digits only. `from_str_radix` alone would also take a leading `+`.
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError::new(s));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseColorError::new(s))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Format as a lowercase `#rrggbb` string.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels as 0.0-1.0 floats, the form vertex color buffers store.
    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    /// A uniformly random color.
    pub fn random(rng: &mut impl Rng) -> Self {
        let [r, g, b] = rng.gen::<[u8; 3]>();
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

/// How a draw sequence turns solved positions into geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStyle {
    /// One trail line per body, extended point by point.
    Orbit,
    /// A complete graph between all bodies at every step.
    Connect,
}

impl Default for DrawStyle {
    fn default() -> Self {
        DrawStyle::Orbit
    }
}

/// Figure-wide configuration.
///
/// The first four fields drive the engine. The remaining fields are
/// presentation pass-through: they round-trip through parameter files and
/// are available to adapters, but nothing in the core reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Number of steps a draw sequence runs for.
    pub total_steps: u32,
    /// Geometry style used by the next draw sequence.
    pub style: DrawStyle,
    /// Whether incremental draws advance. When false, ticks are ignored and
    /// only batch draws produce geometry.
    pub animate: bool,
    /// Admitted ticks per second for incremental drawing.
    pub frames_per_second: f64,
    /// Scene clear color.
    pub background: Color,
    /// Camera field of view in degrees.
    pub field_of_view: f64,
    /// Stereo focal distance.
    pub focal_distance: f64,
    /// Stereo eye separation.
    pub eye_separation: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            total_steps: 1000,
            style: DrawStyle::Orbit,
            animate: true,
            frames_per_second: 15.0,
            background: Color::BLACK,
            field_of_view: 75.0,
            focal_distance: 500.0,
            eye_separation: 0.064,
        }
    }
}
