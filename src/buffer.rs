//! Preallocated geometry buffers.
//!
//! Draw sequences never reallocate mid-flight: every buffer is sized up
//! front from the captured step budget and filled in place, with a draw
//! range tracking how much of it is valid so far. Offsets into the edge
//! buffer go through typed accessors instead of hand-computed strides.
//!
//! Storage is single-precision ([`Vec3`] / [`LineVertex`]) even though the
//! solver works in f64; positions are narrowed at the write boundary.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// One vertex of a line segment batch: interleaved position and color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    /// Build a vertex from vector types.
    #[inline]
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }
}

/// Per-body trail storage: one point per step, plus the written prefix
/// length that doubles as the draw range.
#[derive(Debug, Clone)]
pub struct TrailBuffer {
    points: Vec<Vec3>,
    written: u32,
}

impl TrailBuffer {
    /// Allocate a zeroed trail for `capacity` steps.
    pub fn new(capacity: u32) -> Self {
        Self {
            points: vec![Vec3::ZERO; capacity as usize],
            written: 0,
        }
    }

    /// Total point slots.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.points.len() as u32
    }

    /// Store the point for `step`. Returns false (and stores nothing) when
    /// the step is outside the allocated range, which happens only if the
    /// figure is edited mid-draw.
    pub fn write(&mut self, step: u32, point: Vec3) -> bool {
        match self.points.get_mut(step as usize) {
            Some(slot) => {
                *slot = point;
                self.written = self.written.max(step + 1);
                true
            }
            None => false,
        }
    }

    /// Number of points in the draw range.
    #[inline]
    pub fn written(&self) -> u32 {
        self.written
    }

    /// The full backing store, including unwritten zero slots.
    #[inline]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// The written prefix.
    #[inline]
    pub fn written_points(&self) -> &[Vec3] {
        &self.points[..self.written as usize]
    }

    /// The backing store as raw floats (x, y, z per point).
    pub fn raw_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.points)
    }
}

/// Edge batch storage for the connect style.
///
/// Each step owns a fixed block of `segments_per_step` segment slots, two
/// vertices each. Within a step, resolved pairs are packed from the front
/// of the block; slots left over (pairs with an unresolved endpoint) stay
/// zeroed and render as degenerate points.
#[derive(Debug, Clone)]
pub struct EdgeBuffer {
    vertices: Vec<LineVertex>,
    steps: u32,
    segments_per_step: u32,
    written_steps: u32,
}

impl EdgeBuffer {
    /// Allocate a zeroed batch for `steps` steps of a `body_count`-body
    /// complete graph (`n * (n - 1) / 2` segments per step).
    pub fn new(steps: u32, body_count: u32) -> Self {
        let segments_per_step = body_count * body_count.saturating_sub(1) / 2;
        let capacity = steps as usize * segments_per_step as usize * 2;
        Self {
            vertices: vec![LineVertex::zeroed(); capacity],
            steps,
            segments_per_step,
            written_steps: 0,
        }
    }

    /// Step capacity.
    #[inline]
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Segment slots per step.
    #[inline]
    pub fn segments_per_step(&self) -> u32 {
        self.segments_per_step
    }

    /// Total vertex capacity.
    #[inline]
    pub fn capacity_vertices(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Steps with at least one written segment, counted from zero.
    #[inline]
    pub fn written_steps(&self) -> u32 {
        self.written_steps
    }

    /// The vertex index where segment `slot` of `step` begins, or `None`
    /// when either coordinate is outside the allocated grid.
    pub fn segment_offset(&self, step: u32, slot: u32) -> Option<usize> {
        if step >= self.steps || slot >= self.segments_per_step {
            return None;
        }
        Some((step as usize * self.segments_per_step as usize + slot as usize) * 2)
    }

    /// Write one segment into its slot. Both vertices take `color`.
    /// Returns false (and stores nothing) for out-of-range coordinates.
    pub fn write_segment(&mut self, step: u32, slot: u32, a: Vec3, b: Vec3, color: Vec3) -> bool {
        let Some(base) = self.segment_offset(step, slot) else {
            return false;
        };
        self.vertices[base] = LineVertex::new(a, color);
        self.vertices[base + 1] = LineVertex::new(b, color);
        self.written_steps = self.written_steps.max(step + 1);
        true
    }

    /// Every vertex slot belonging to `step`, written or not. Empty when
    /// the step is out of range or the figure has fewer than two bodies.
    pub fn step_vertices(&self, step: u32) -> &[LineVertex] {
        match self.segment_offset(step, 0) {
            Some(base) => &self.vertices[base..base + self.segments_per_step as usize * 2],
            None => &[],
        }
    }

    /// The draw range, in vertices, once `steps` steps have been written.
    /// Clamped to the allocation.
    pub fn vertices_through(&self, steps: u32) -> u32 {
        steps.min(self.steps) * self.segments_per_step * 2
    }

    /// The draw range covering everything written so far.
    #[inline]
    pub fn draw_vertices(&self) -> u32 {
        self.vertices_through(self.written_steps)
    }

    /// The full backing store.
    #[inline]
    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    /// The backing store as raw floats (position xyz then color rgb per
    /// vertex).
    pub fn raw_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }
}
