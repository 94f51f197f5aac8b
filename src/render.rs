//! The render pipeline seam.
//!
//! The engine never talks to a scene graph or a GPU directly. It routes
//! geometry through [`RenderPipeline`], a small imperative surface an
//! adapter implements: create primitives when a draw sequence starts, patch
//! points or vertex spans as steps complete, advance draw ranges, present,
//! and optionally hand back rendered frames for snapshots and capture.
//!
//! Two adapters ship with the crate: [`NullPipeline`] discards everything
//! (headless runs), and [`RecordingPipeline`] records every call for
//! inspection. A software rasterizer lives in [`crate::raster`].

use glam::Vec3;
use image::RgbaImage;

use crate::body::Body;
use crate::buffer::LineVertex;
use crate::settings::Color;

/// Which primitive a draw range applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// The trail line of the body at this index.
    Trail(usize),
    /// The shared edge batch.
    Edges,
}

/// Receives geometry from draw sequences.
///
/// Incremental draws call the granular methods step by step; batch draws
/// call [`upload_trail`](RenderPipeline::upload_trail) and
/// [`upload_edges`](RenderPipeline::upload_edges) once per primitive, which
/// by default decompose into the granular calls.
///
/// Draw range units follow the primitive: points for trails, vertices for
/// the edge batch.
pub trait RenderPipeline {
    /// Remove every primitive created since the last clear.
    fn clear_all(&mut self);

    /// Announce a trail for `body_index` with room for `capacity` points.
    /// `body` carries the presentation attributes (color, marker radius).
    fn create_trail(&mut self, body_index: usize, body: &Body, capacity: u32);

    /// Announce the edge batch with room for `capacity` vertices.
    fn create_edge_batch(&mut self, capacity: u32);

    /// Store the trail point for one step.
    fn update_trail_point(&mut self, body_index: usize, step: u32, point: Vec3);

    /// Store a span of edge vertices starting at `first_vertex`.
    fn write_edge_vertices(&mut self, first_vertex: u32, vertices: &[LineVertex]);

    /// Advance how much of a primitive is rendered.
    fn set_draw_range(&mut self, primitive: Primitive, count: u32);

    /// Adopt a new clear color. Adapters without one ignore it.
    fn set_background(&mut self, _background: Color) {}

    /// Replace a trail with a complete point table in one call.
    fn upload_trail(&mut self, body_index: usize, body: &Body, points: &[Vec3]) {
        self.create_trail(body_index, body, points.len() as u32);
        for (step, point) in points.iter().enumerate() {
            self.update_trail_point(body_index, step as u32, *point);
        }
        self.set_draw_range(Primitive::Trail(body_index), points.len() as u32);
    }

    /// Replace the edge batch with a complete vertex table in one call.
    fn upload_edges(&mut self, vertices: &[LineVertex]) {
        self.create_edge_batch(vertices.len() as u32);
        self.write_edge_vertices(0, vertices);
        self.set_draw_range(Primitive::Edges, vertices.len() as u32);
    }

    /// Render the current scene state.
    fn present_frame(&mut self);

    /// The most recently presented frame, if this adapter renders to
    /// readable memory. Headless adapters return `None`, which disables
    /// snapshots and skips capture frames.
    fn capture_frame(&mut self) -> Option<RgbaImage> {
        None
    }
}

/// A pipeline that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPipeline;

impl RenderPipeline for NullPipeline {
    fn clear_all(&mut self) {}
    fn create_trail(&mut self, _body_index: usize, _body: &Body, _capacity: u32) {}
    fn create_edge_batch(&mut self, _capacity: u32) {}
    fn update_trail_point(&mut self, _body_index: usize, _step: u32, _point: Vec3) {}
    fn write_edge_vertices(&mut self, _first_vertex: u32, _vertices: &[LineVertex]) {}
    fn set_draw_range(&mut self, _primitive: Primitive, _count: u32) {}
    fn present_frame(&mut self) {}
}

/// One recorded [`RenderPipeline`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineCall {
    ClearAll,
    CreateTrail { body_index: usize, capacity: u32 },
    CreateEdgeBatch { capacity: u32 },
    UpdateTrailPoint { body_index: usize, step: u32, point: Vec3 },
    WriteEdgeVertices { first_vertex: u32, count: u32 },
    SetDrawRange { primitive: Primitive, count: u32 },
    SetBackground { background: Color },
    UploadTrail { body_index: usize, points: u32 },
    UploadEdges { vertices: u32 },
    PresentFrame,
}

/// A pipeline that records every call it receives.
///
/// Useful for tests and for headless embeddings that want to observe what
/// a draw sequence produced without rendering it. Batch uploads are
/// recorded as single calls rather than decomposed.
#[derive(Debug, Default)]
pub struct RecordingPipeline {
    calls: Vec<PipelineCall>,
    frame_size: Option<(u32, u32)>,
}

impl RecordingPipeline {
    /// A recorder whose `capture_frame` returns `None`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder that also hands out blank frames of the given size, for
    /// exercising snapshot and capture paths.
    pub fn with_frames(width: u32, height: u32) -> Self {
        Self {
            calls: Vec::new(),
            frame_size: Some((width, height)),
        }
    }

    /// Every call recorded so far, in order.
    pub fn calls(&self) -> &[PipelineCall] {
        &self.calls
    }

    /// Drain the recorded calls, leaving the recorder empty.
    pub fn take_calls(&mut self) -> Vec<PipelineCall> {
        std::mem::take(&mut self.calls)
    }

    /// Count calls matching a predicate.
    pub fn count_matching(&self, f: impl Fn(&PipelineCall) -> bool) -> usize {
        self.calls.iter().filter(|c| f(c)).count()
    }

    /// The most recent draw range set for `primitive`.
    pub fn last_draw_range(&self, primitive: Primitive) -> Option<u32> {
        self.calls.iter().rev().find_map(|c| match c {
            PipelineCall::SetDrawRange { primitive: p, count } if *p == primitive => Some(*count),
            _ => None,
        })
    }

    /// How many frames were presented.
    pub fn presents(&self) -> usize {
        self.count_matching(|c| matches!(c, PipelineCall::PresentFrame))
    }
}

impl RenderPipeline for RecordingPipeline {
    fn clear_all(&mut self) {
        self.calls.push(PipelineCall::ClearAll);
    }

    fn create_trail(&mut self, body_index: usize, _body: &Body, capacity: u32) {
        self.calls.push(PipelineCall::CreateTrail {
            body_index,
            capacity,
        });
    }

    fn create_edge_batch(&mut self, capacity: u32) {
        self.calls.push(PipelineCall::CreateEdgeBatch { capacity });
    }

    fn update_trail_point(&mut self, body_index: usize, step: u32, point: Vec3) {
        self.calls.push(PipelineCall::UpdateTrailPoint {
            body_index,
            step,
            point,
        });
    }

    fn write_edge_vertices(&mut self, first_vertex: u32, vertices: &[LineVertex]) {
        self.calls.push(PipelineCall::WriteEdgeVertices {
            first_vertex,
            count: vertices.len() as u32,
        });
    }

    fn set_draw_range(&mut self, primitive: Primitive, count: u32) {
        self.calls.push(PipelineCall::SetDrawRange { primitive, count });
    }

    fn set_background(&mut self, background: Color) {
        self.calls.push(PipelineCall::SetBackground { background });
    }

    fn upload_trail(&mut self, body_index: usize, _body: &Body, points: &[Vec3]) {
        self.calls.push(PipelineCall::UploadTrail {
            body_index,
            points: points.len() as u32,
        });
    }

    fn upload_edges(&mut self, vertices: &[LineVertex]) {
        self.calls.push(PipelineCall::UploadEdges {
            vertices: vertices.len() as u32,
        });
    }

    fn present_frame(&mut self) {
        self.calls.push(PipelineCall::PresentFrame);
    }

    fn capture_frame(&mut self) -> Option<RgbaImage> {
        self.frame_size.map(|(w, h)| RgbaImage::new(w, h))
    }
}
