//! # Orrery - Hierarchical Orbit Figure Engine
//!
//! Animated 3D spirographs made easy.
//!
//! Orrery computes the figures traced by chains of orbiting bodies (each
//! body circles a parent, which may circle another) and streams the
//! resulting line geometry through a pluggable render pipeline, one step
//! per animation frame or all at once.
//!
//! ## Quick Start
//!
//! ```ignore
//! use orrery::prelude::*;
//!
//! fn main() {
//!     let mut engine = Engine::new(RasterPipeline::new(1280, 720))
//!         .with_total_steps(720)
//!         .with_animation(false);
//!
//!     engine.system_mut().add(
//!         Body::new(75.0, 75.0, 4.0)
//!             .with_inclination(30.0)
//!             .with_parent(Parent::Body(0)),
//!     );
//!
//!     engine.draw();
//!     engine.save_image().unwrap().save("figure.png").unwrap();
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Bodies
//!
//! A [`Body`] is an ellipse in motion: `distance_x`/`distance_y` are the
//! ellipse radii, `speed` is degrees advanced per step, and `inclination`
//! and `azimuth` tilt and turn the orbital plane. Bodies reference parents
//! by index in a [`BodySystem`]; a body's world position is its parent's
//! position plus its own orbital offset, so chains of parents compose into
//! epicyclic figures. [`Parent::Root`] anchors a body to the origin.
//!
//! ### Draw styles
//!
//! | Style | Geometry |
//! |-------|----------|
//! | [`DrawStyle::Orbit`] | one polyline trail per body |
//! | [`DrawStyle::Connect`] | a line between every pair of bodies, every step |
//!
//! ### Pipelines
//!
//! The engine produces geometry, not pixels. [`RenderPipeline`] is the
//! seam an adapter implements to own the actual drawing:
//!
//! | Adapter | Purpose |
//! |---------|---------|
//! | [`RasterPipeline`] | bundled CPU renderer, frames as [`image::RgbaImage`] |
//! | [`RecordingPipeline`] | records calls for tests and inspection |
//! | [`NullPipeline`] | discards everything |
//!
//! ### Sequencing
//!
//! [`Engine::draw`] starts a draw sequence over the configured step
//! budget. With animation on, [`Engine::frame`] consumes one step per
//! admitted frame at the configured rate; with animation off the whole
//! figure is computed synchronously. [`Engine::closed_loop`] tells you the
//! step count after which the figure repeats.
//!
//! ### Capture and persistence
//!
//! [`Engine::start_capture`] records presented frames into a
//! [`CaptureSink`] (the bundled [`FrameSequenceSink`] writes numbered
//! images) until the draw completes. [`FigureParams`] saves and restores
//! figures as JSON.

pub mod body;
pub mod buffer;
pub mod capture;
mod engine;
pub mod error;
pub mod period;
pub mod persist;
pub mod raster;
pub mod render;
mod sequencer;
mod solver;
pub mod settings;
pub mod time;

pub use body::{Body, BodySystem, Parent};
pub use buffer::{EdgeBuffer, LineVertex, TrailBuffer};
pub use bytemuck;
pub use capture::{CaptureConfig, CaptureCoordinator, CaptureSink, FrameFormat, FrameSequenceSink};
pub use engine::Engine;
pub use error::{
    BodyError, CaptureError, ParseColorError, PersistError, SinkError, SnapshotError,
};
pub use glam::{DVec3, Vec3};
pub use image;
pub use period::{closed_loop, ClosedLoop};
pub use persist::FigureParams;
pub use raster::RasterPipeline;
pub use render::{NullPipeline, PipelineCall, Primitive, RecordingPipeline, RenderPipeline};
pub use sequencer::{DrawState, Sequencer};
pub use settings::{Color, DrawStyle, Settings};
pub use solver::{positions_at_step, StepPositions};
pub use time::TickGate;

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use orrery::prelude::*;
/// ```
///
/// This imports:
/// - [`Engine`] - the engine facade
/// - [`Body`], [`BodySystem`], [`Parent`] - the figure being drawn
/// - [`Settings`], [`DrawStyle`], [`Color`] - draw parameters
/// - [`RenderPipeline`] and the bundled adapters
/// - [`CaptureSink`], [`FrameSequenceSink`] - frame capture
/// - [`FigureParams`] - JSON persistence
/// - [`DVec3`], [`Vec3`] - glam vector types
pub mod prelude {
    pub use crate::body::{Body, BodySystem, Parent};
    pub use crate::capture::{CaptureConfig, CaptureSink, FrameFormat, FrameSequenceSink};
    pub use crate::engine::Engine;
    pub use crate::period::{closed_loop, ClosedLoop};
    pub use crate::persist::FigureParams;
    pub use crate::raster::RasterPipeline;
    pub use crate::render::{NullPipeline, RecordingPipeline, RenderPipeline};
    pub use crate::sequencer::DrawState;
    pub use crate::settings::{Color, DrawStyle, Settings};
    pub use crate::{DVec3, Vec3};
}
