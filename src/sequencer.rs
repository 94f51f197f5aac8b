//! The step sequencer.
//!
//! A draw sequence walks the step counter from zero to a captured budget,
//! solving positions and routing geometry into the active pipeline. Two
//! pipelines exist: incremental (one step per admitted tick, superseding
//! whatever was in flight) and batch (every step solved synchronously and
//! uploaded whole). The style and step budget are captured when a sequence
//! starts; later settings edits apply from the next sequence.
//!
//! State machine: `Idle -> Drawing(style)` on start, `Drawing -> Idle` on
//! reaching the budget, `-> Cancelled` on cancel (buffers keep what was
//! written), and any state `-> Drawing` on a new start.

use glam::Vec3;
use log::{debug, warn};

use crate::body::BodySystem;
use crate::buffer::{EdgeBuffer, LineVertex, TrailBuffer};
use crate::render::{Primitive, RenderPipeline};
use crate::settings::DrawStyle;
use crate::solver::{positions_at_step, StepPositions};

/// Where a draw sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    /// No sequence in flight (also the completed state).
    Idle,
    /// An incremental sequence is consuming ticks.
    Drawing(DrawStyle),
    /// A sequence was cancelled; written geometry is kept on screen.
    Cancelled,
}

/// Drives draw sequences and owns their geometry buffers.
#[derive(Debug)]
pub struct Sequencer {
    state: DrawState,
    current_step: u32,
    total_steps: u32,
    progress: f32,
    trails: Vec<TrailBuffer>,
    edges: Option<EdgeBuffer>,
    warned_unresolved: bool,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            state: DrawState::Idle,
            current_step: 0,
            total_steps: 0,
            progress: 0.0,
            trails: Vec::new(),
            edges: None,
            warned_unresolved: false,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> DrawState {
        self.state
    }

    /// Whether an incremental sequence is consuming ticks.
    #[inline]
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawState::Drawing(_))
    }

    /// The next step an incremental sequence will draw.
    #[inline]
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// The step budget captured when the sequence started.
    #[inline]
    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Progress through the sequence, 0-100.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// The per-body trail buffers of the active orbit sequence.
    #[inline]
    pub fn trails(&self) -> &[TrailBuffer] {
        &self.trails
    }

    /// The edge buffer of the active connect sequence.
    #[inline]
    pub fn edges(&self) -> Option<&EdgeBuffer> {
        self.edges.as_ref()
    }

    /// Begin an incremental sequence, superseding anything in flight.
    ///
    /// Clears the pipeline, allocates buffers for the captured budget, and
    /// enters `Drawing`; geometry then arrives through [`tick`](Self::tick).
    pub fn start_incremental<P: RenderPipeline>(
        &mut self,
        system: &BodySystem,
        style: DrawStyle,
        total_steps: u32,
        pipeline: &mut P,
    ) {
        self.begin(system, style, total_steps, pipeline);
        self.state = DrawState::Drawing(style);
        debug!(
            "incremental {:?} draw started: {} bodies over {} steps",
            style,
            system.len(),
            total_steps
        );
    }

    /// Advance the active sequence by one step.
    ///
    /// Returns true when a step was consumed. Outside `Drawing` this is a
    /// no-op; reaching the budget transitions to `Idle` with progress 100.
    pub fn tick<P: RenderPipeline>(&mut self, system: &BodySystem, pipeline: &mut P) -> bool {
        let DrawState::Drawing(style) = self.state else {
            return false;
        };
        if self.current_step >= self.total_steps {
            // A zero-step budget completes on its first tick.
            self.state = DrawState::Idle;
            self.progress = 100.0;
            return false;
        }

        let positions = positions_at_step(system.bodies(), self.current_step);
        self.note_unresolved(&positions);
        match style {
            DrawStyle::Orbit => self.route_orbit_step(system, &positions, pipeline),
            DrawStyle::Connect => self.route_connect_step(system, &positions, pipeline),
        }

        self.current_step += 1;
        self.progress = self.current_step as f32 / self.total_steps as f32 * 100.0;
        if self.current_step >= self.total_steps {
            self.state = DrawState::Idle;
            debug!("draw complete after {} steps", self.current_step);
        }
        true
    }

    /// Run a whole sequence synchronously and upload each primitive in one
    /// call. Ends `Idle` at progress 100. Not preemptible mid-computation.
    ///
    /// Unlike the incremental path, batch geometry is compacted: steps an
    /// unresolved body would have contributed are simply absent instead of
    /// zero-filled.
    pub fn start_batch<P: RenderPipeline>(
        &mut self,
        system: &BodySystem,
        style: DrawStyle,
        total_steps: u32,
        pipeline: &mut P,
    ) {
        self.begin(system, style, total_steps, pipeline);
        let body_count = system.len();

        match style {
            DrawStyle::Orbit => {
                let mut tables: Vec<Vec<Vec3>> = vec![Vec::new(); body_count];
                for step in 0..total_steps {
                    let positions = positions_at_step(system.bodies(), step);
                    self.note_unresolved(&positions);
                    for (i, table) in tables.iter_mut().enumerate() {
                        if let Some(p) = positions.get(i) {
                            table.push(p.as_vec3());
                        }
                    }
                }
                for (i, body) in system.iter().enumerate() {
                    pipeline.upload_trail(i, body, &tables[i]);
                }
            }
            DrawStyle::Connect => {
                let mut vertices: Vec<LineVertex> = Vec::new();
                for step in 0..total_steps {
                    let positions = positions_at_step(system.bodies(), step);
                    self.note_unresolved(&positions);
                    for j in 0..body_count {
                        for k in (j + 1)..body_count {
                            let (Some(a), Some(b)) = (positions.get(j), positions.get(k)) else {
                                continue;
                            };
                            let color = body_color(system, j);
                            vertices.push(LineVertex::new(a.as_vec3(), color));
                            vertices.push(LineVertex::new(b.as_vec3(), color));
                        }
                    }
                }
                pipeline.upload_edges(&vertices);
            }
        }

        self.current_step = total_steps;
        self.progress = 100.0;
        self.state = DrawState::Idle;
        debug!(
            "batch {:?} draw rendered: {} bodies over {} steps",
            style, body_count, total_steps
        );
    }

    /// Halt the active sequence, keeping written geometry.
    pub fn cancel(&mut self) {
        if self.is_drawing() {
            debug!("draw cancelled at step {}", self.current_step);
        }
        self.state = DrawState::Cancelled;
    }

    /// Drop all sequence state and buffers, returning to a fresh `Idle`.
    /// The pipeline is not touched; callers clear it separately.
    pub fn reset(&mut self) {
        self.state = DrawState::Idle;
        self.current_step = 0;
        self.total_steps = 0;
        self.progress = 0.0;
        self.trails.clear();
        self.edges = None;
        self.warned_unresolved = false;
    }

    /// Shared sequence setup: reset counters, clear the pipeline, size the
    /// style's buffers from the captured budget.
    fn begin<P: RenderPipeline>(
        &mut self,
        system: &BodySystem,
        style: DrawStyle,
        total_steps: u32,
        pipeline: &mut P,
    ) {
        self.state = DrawState::Idle;
        self.current_step = 0;
        self.total_steps = total_steps;
        self.progress = 0.0;
        self.warned_unresolved = false;
        self.trails.clear();
        self.edges = None;
        pipeline.clear_all();

        match style {
            DrawStyle::Orbit => {
                for (i, body) in system.iter().enumerate() {
                    pipeline.create_trail(i, body, total_steps);
                    self.trails.push(TrailBuffer::new(total_steps));
                }
            }
            DrawStyle::Connect => {
                let buffer = EdgeBuffer::new(total_steps, system.len() as u32);
                pipeline.create_edge_batch(buffer.capacity_vertices());
                self.edges = Some(buffer);
            }
        }
    }

    fn route_orbit_step<P: RenderPipeline>(
        &mut self,
        system: &BodySystem,
        positions: &StepPositions,
        pipeline: &mut P,
    ) {
        let step = self.current_step;
        for i in 0..system.len() {
            let Some(position) = positions.get(i) else {
                continue;
            };
            let point = position.as_vec3();
            // Bodies added mid-draw have no trail; their points are dropped
            // until the next sequence.
            let Some(trail) = self.trails.get_mut(i) else {
                continue;
            };
            if trail.write(step, point) {
                pipeline.update_trail_point(i, step, point);
                pipeline.set_draw_range(Primitive::Trail(i), step + 1);
            }
        }
    }

    fn route_connect_step<P: RenderPipeline>(
        &mut self,
        system: &BodySystem,
        positions: &StepPositions,
        pipeline: &mut P,
    ) {
        let step = self.current_step;
        let Some(buffer) = self.edges.as_mut() else {
            return;
        };
        let n = system.len();
        let mut slot = 0u32;
        for j in 0..n {
            for k in (j + 1)..n {
                let (Some(a), Some(b)) = (positions.get(j), positions.get(k)) else {
                    continue;
                };
                let color = body_color(system, j);
                if buffer.write_segment(step, slot, a.as_vec3(), b.as_vec3(), color) {
                    slot += 1;
                }
            }
        }
        if let Some(base) = buffer.segment_offset(step, 0) {
            pipeline.write_edge_vertices(base as u32, buffer.step_vertices(step));
        }
        pipeline.set_draw_range(Primitive::Edges, buffer.vertices_through(step + 1));
    }

    fn note_unresolved(&mut self, positions: &StepPositions) {
        if self.warned_unresolved || positions.is_fully_resolved() {
            return;
        }
        let unresolved: Vec<usize> = positions.unresolved_indices().collect();
        warn!(
            "{} of {} bodies have unresolvable parent chains and will not be drawn: {:?}",
            unresolved.len(),
            positions.len(),
            unresolved
        );
        self.warned_unresolved = true;
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Segment vertices take the color of the pair's first body.
fn body_color(system: &BodySystem, index: usize) -> Vec3 {
    system
        .get(index)
        .map(|body| body.color.to_vec3())
        .unwrap_or(Vec3::ONE)
}
