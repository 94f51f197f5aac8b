//! The engine facade.
//!
//! [`Engine`] owns one figure end to end: the body system, the settings,
//! the sequencer with its buffers, the frame clock, the capture session,
//! and the render pipeline it all feeds. Embeddings construct it around a
//! pipeline adapter and drive it with [`frame`](Engine::frame) from their
//! event loop; everything else is edits and commands.
//!
//! # Example
//!
//! ```ignore
//! let mut engine = Engine::new(RasterPipeline::new(1280, 720));
//! engine.draw();
//! while engine.is_drawing() {
//!     engine.frame();
//! }
//! engine.save_image()?.save("figure.png")?;
//! ```

use std::time::Instant;

use image::RgbaImage;
use rand::Rng;

use crate::body::{BodySystem, Parent};
use crate::capture::{CaptureConfig, CaptureCoordinator, CaptureSink};
use crate::error::{BodyError, CaptureError, PersistError, SnapshotError};
use crate::period::{closed_loop, ClosedLoop};
use crate::persist::FigureParams;
use crate::render::RenderPipeline;
use crate::sequencer::{DrawState, Sequencer};
use crate::settings::{Color, DrawStyle, Settings};
use crate::time::TickGate;

/// Owns and coordinates a figure: bodies, settings, sequencing, timing,
/// capture, and the render pipeline.
pub struct Engine<P: RenderPipeline> {
    system: BodySystem,
    settings: Settings,
    sequencer: Sequencer,
    gate: TickGate,
    capture: CaptureCoordinator,
    pipeline: P,
}

impl<P: RenderPipeline> Engine<P> {
    /// An engine around `pipeline` with a single default body.
    pub fn new(pipeline: P) -> Self {
        let settings = Settings::default();
        let gate = TickGate::new(settings.frames_per_second);
        Self {
            system: BodySystem::single_default(),
            settings,
            sequencer: Sequencer::new(),
            gate,
            capture: CaptureCoordinator::new(),
            pipeline,
        }
    }

    /// Replace the body system.
    pub fn with_system(mut self, system: BodySystem) -> Self {
        self.system = system;
        self
    }

    /// Replace the step budget used by subsequent draws.
    pub fn with_total_steps(mut self, total_steps: u32) -> Self {
        self.settings.total_steps = total_steps;
        self
    }

    /// Replace the draw style used by subsequent draws.
    pub fn with_style(mut self, style: DrawStyle) -> Self {
        self.settings.style = style;
        self
    }

    /// Replace the animation frame rate.
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.set_fps(fps);
        self
    }

    /// Enable or disable step-by-step animation.
    pub fn with_animation(mut self, animate: bool) -> Self {
        self.settings.animate = animate;
        self
    }

    /// Replace the background color.
    pub fn with_background(mut self, background: Color) -> Self {
        self.set_background(background);
        self
    }

    #[inline]
    pub fn system(&self) -> &BodySystem {
        &self.system
    }

    /// Mutable access to the bodies. Edits show up when the next draw
    /// starts; call [`draw`](Self::draw) to apply them.
    #[inline]
    pub fn system_mut(&mut self) -> &mut BodySystem {
        &mut self.system
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    #[inline]
    pub fn pipeline_mut(&mut self) -> &mut P {
        &mut self.pipeline
    }

    #[inline]
    pub fn draw_state(&self) -> DrawState {
        self.sequencer.state()
    }

    /// Whether an incremental draw is consuming ticks.
    #[inline]
    pub fn is_drawing(&self) -> bool {
        self.sequencer.is_drawing()
    }

    /// Progress of the current draw, 0-100.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.sequencer.progress()
    }

    /// The next step the current draw will render.
    #[inline]
    pub fn current_step(&self) -> u32 {
        self.sequencer.current_step()
    }

    /// Whether a capture session is running.
    #[inline]
    pub fn is_capturing(&self) -> bool {
        self.capture.is_active()
    }

    /// Frames the active capture session has collected.
    #[inline]
    pub fn frames_captured(&self) -> u64 {
        self.capture.frames_captured()
    }

    /// Step count after which every body's trail closes, if any.
    pub fn closed_loop(&self) -> ClosedLoop {
        closed_loop(self.system.bodies())
    }

    /// Change the animation frame rate. Values are clamped to a sane range;
    /// the stored setting reflects the effective rate.
    pub fn set_fps(&mut self, fps: f64) {
        self.gate.set_fps(fps);
        self.settings.frames_per_second = self.gate.fps();
    }

    /// Change the step budget for subsequent draws. The draw in flight
    /// keeps the budget it started with.
    pub fn set_total_steps(&mut self, total_steps: u32) {
        self.settings.total_steps = total_steps;
    }

    /// Change the draw style for subsequent draws.
    pub fn set_style(&mut self, style: DrawStyle) {
        self.settings.style = style;
    }

    /// Pause or resume step consumption. The draw in flight stays loaded
    /// and resumes where it stopped.
    pub fn set_animate(&mut self, animate: bool) {
        self.settings.animate = animate;
    }

    /// Change the background color, effective immediately.
    pub fn set_background(&mut self, background: Color) {
        self.settings.background = background;
        self.pipeline.set_background(background);
    }

    /// Replace the capture config handed to future sessions.
    pub fn set_capture_config(&mut self, config: CaptureConfig) {
        self.capture.set_config(config);
    }

    /// Draw the current figure with the current settings.
    ///
    /// With animation on this starts an incremental sequence that
    /// [`frame`](Self::frame) advances; with animation off the whole figure
    /// is computed and presented before this returns. Either way the
    /// previous sequence is superseded.
    pub fn draw(&mut self) {
        if self.settings.animate {
            self.gate.reset(Instant::now());
            self.sequencer.start_incremental(
                &self.system,
                self.settings.style,
                self.settings.total_steps,
                &mut self.pipeline,
            );
        } else {
            self.sequencer.start_batch(
                &self.system,
                self.settings.style,
                self.settings.total_steps,
                &mut self.pipeline,
            );
            self.pipeline.present_frame();
        }
    }

    /// Halt the current draw, keeping what it rendered. A running capture
    /// session is finished as a side effect.
    pub fn stop(&mut self) {
        self.sequencer.cancel();
        if let Some(animate_before) = self.capture.finish() {
            self.settings.animate = animate_before;
        }
    }

    /// Clear the scene and return to a single default body. Settings are
    /// kept.
    pub fn reset(&mut self) {
        self.sequencer.reset();
        self.system = BodySystem::single_default();
        self.pipeline.clear_all();
        self.pipeline.present_frame();
    }

    /// Replace the figure with a random one and draw it step by step,
    /// regardless of the animation setting.
    pub fn randomize(&mut self, rng: &mut impl Rng) {
        self.system = BodySystem::random(rng);
        self.gate.reset(Instant::now());
        self.sequencer.start_incremental(
            &self.system,
            self.settings.style,
            self.settings.total_steps,
            &mut self.pipeline,
        );
    }

    /// Append a body chained to the figure's tail. Returns the new body's
    /// index. Like any edit, it takes effect at the next draw.
    pub fn add_body(&mut self, rng: &mut impl Rng) -> usize {
        self.system.add_chained(rng)
    }

    /// Remove the body at `index`. Takes effect at the next draw.
    pub fn remove_body(&mut self, index: usize) -> Result<(), BodyError> {
        self.system.remove(index)?;
        Ok(())
    }

    /// Re-link the body at `index` to `parent`. Takes effect at the next
    /// draw.
    pub fn set_parent(&mut self, index: usize, parent: Parent) -> Result<(), BodyError> {
        self.system.set_parent(index, parent)
    }

    /// Render the whole figure synchronously and return the frame.
    ///
    /// Refuses while a draw or capture is running. When animation is on,
    /// the interrupted incremental draw is restarted afterwards, so the
    /// on-screen animation picks up from scratch.
    pub fn save_image(&mut self) -> Result<RgbaImage, SnapshotError> {
        if self.sequencer.is_drawing() {
            return Err(SnapshotError::Busy("a draw"));
        }
        if self.capture.is_active() {
            return Err(SnapshotError::Busy("a capture session"));
        }

        self.sequencer.start_batch(
            &self.system,
            self.settings.style,
            self.settings.total_steps,
            &mut self.pipeline,
        );
        self.pipeline.present_frame();
        let frame = self
            .pipeline
            .capture_frame()
            .ok_or(SnapshotError::FrameUnavailable)?;

        if self.settings.animate {
            self.draw();
        }
        Ok(frame)
    }

    /// Start recording presented frames into `sink`.
    ///
    /// Animation is forced on for the session (captures record the figure
    /// forming) and restored when the session ends. If no draw is running,
    /// one is started so there is something to record.
    pub fn start_capture(&mut self, sink: Box<dyn CaptureSink>) -> Result<(), CaptureError> {
        let was_drawing = self.sequencer.is_drawing();
        let animate_before = self.settings.animate;
        self.capture.start(sink, animate_before)?;
        self.settings.animate = true;
        if !was_drawing {
            self.draw();
        }
        Ok(())
    }

    /// Finish the capture session, if one is running. Returns whether one
    /// was.
    pub fn stop_capture(&mut self) -> bool {
        match self.capture.finish() {
            Some(animate_before) => {
                self.settings.animate = animate_before;
                true
            }
            None => false,
        }
    }

    /// Snapshot the figure and settings for persistence.
    pub fn export_params(&self) -> FigureParams {
        FigureParams::capture(&self.system, &self.settings)
    }

    /// Apply saved params and redraw with them.
    pub fn import_params(&mut self, params: &FigureParams) {
        params.apply(&mut self.system, &mut self.settings);
        self.pipeline.set_background(self.settings.background);
        self.draw();
    }

    /// Export the figure as a JSON string.
    pub fn export_json(&self) -> Result<String, PersistError> {
        self.export_params().to_json()
    }

    /// Import a figure from a JSON string and redraw.
    pub fn import_json(&mut self, json: &str) -> Result<(), PersistError> {
        let params = FigureParams::from_json(json)?;
        self.import_params(&params);
        Ok(())
    }

    /// Advance the engine by one animation frame, using the current time.
    pub fn frame(&mut self) -> bool {
        self.frame_at(Instant::now())
    }

    /// Advance the engine by one animation frame at `now`.
    ///
    /// Returns false when the frame clock has not elapsed. An admitted
    /// frame consumes one draw step (when animating), finishes a capture
    /// session whose draw has completed, presents, and forwards the
    /// presented frame to the capture session while the draw is running.
    pub fn frame_at(&mut self, now: Instant) -> bool {
        if !self.gate.admit(now) {
            return false;
        }

        if self.settings.animate {
            self.sequencer.tick(&self.system, &mut self.pipeline);
        }

        // A capture outlives its draw by exactly one decision: once the
        // sequence has run its full budget, the session closes before the
        // completed figure is presented.
        if self.capture.is_active()
            && !self.sequencer.is_drawing()
            && self.sequencer.current_step() >= self.sequencer.total_steps()
        {
            if let Some(animate_before) = self.capture.finish() {
                self.settings.animate = animate_before;
            }
        }

        self.pipeline.present_frame();

        if self.capture.is_active() && self.sequencer.is_drawing() {
            match self.pipeline.capture_frame() {
                Some(frame) => self.capture.forward(&frame),
                None => self.capture.note_skipped(),
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    use crate::body::Body;
    use crate::error::SinkError;
    use crate::render::{NullPipeline, PipelineCall, RecordingPipeline};

    #[derive(Clone, Default)]
    struct CountingSink {
        frames: Rc<RefCell<u64>>,
        saved: Rc<RefCell<bool>>,
    }

    impl CaptureSink for CountingSink {
        fn start(&mut self, _config: &CaptureConfig) -> Result<(), SinkError> {
            Ok(())
        }

        fn capture(&mut self, _frame: &RgbaImage) -> Result<(), SinkError> {
            *self.frames.borrow_mut() += 1;
            Ok(())
        }

        fn stop(&mut self) {}

        fn save(&mut self) -> Result<(), SinkError> {
            *self.saved.borrow_mut() = true;
            Ok(())
        }
    }

    fn base_instant() -> Instant {
        Instant::now() + Duration::from_secs(1)
    }

    #[test]
    fn test_draw_uses_animation_mode() {
        let mut engine = Engine::new(RecordingPipeline::new());
        engine.draw();
        assert!(engine.is_drawing());
        assert_eq!(
            engine
                .pipeline()
                .count_matching(|c| matches!(c, PipelineCall::CreateTrail { .. })),
            1
        );

        let mut engine = Engine::new(RecordingPipeline::new())
            .with_animation(false)
            .with_total_steps(8);
        engine.draw();
        assert_eq!(engine.draw_state(), DrawState::Idle);
        assert_eq!(engine.progress(), 100.0);
        assert_eq!(
            engine
                .pipeline()
                .count_matching(|c| matches!(c, PipelineCall::UploadTrail { .. })),
            1
        );
        assert_eq!(engine.pipeline().presents(), 1);
    }

    #[test]
    fn test_frame_clock_gates_ticks() {
        let mut engine = Engine::new(RecordingPipeline::new()).with_total_steps(100);
        engine.draw();

        let t = base_instant();
        assert!(engine.frame_at(t));
        assert_eq!(engine.current_step(), 1);

        // Same instant again falls inside the interval.
        assert!(!engine.frame_at(t));
        assert_eq!(engine.current_step(), 1);

        // Default clock runs at 15 fps.
        assert!(engine.frame_at(t + Duration::from_millis(70)));
        assert_eq!(engine.current_step(), 2);
    }

    #[test]
    fn test_paused_animation_presents_without_ticking() {
        let mut engine = Engine::new(RecordingPipeline::new()).with_total_steps(100);
        engine.draw();
        engine.set_animate(false);

        assert!(engine.frame_at(base_instant()));
        assert_eq!(engine.current_step(), 0);
        assert!(engine.is_drawing());
        assert_eq!(engine.pipeline().presents(), 1);
    }

    #[test]
    fn test_save_image_busy_while_drawing() {
        let mut engine = Engine::new(RecordingPipeline::with_frames(8, 8));
        engine.draw();
        assert!(matches!(engine.save_image(), Err(SnapshotError::Busy(_))));
    }

    #[test]
    fn test_save_image_returns_frame_and_restarts_draw() {
        let mut engine = Engine::new(RecordingPipeline::with_frames(8, 8)).with_total_steps(5);
        let image = engine.save_image().unwrap();
        assert_eq!(image.dimensions(), (8, 8));
        // Animation is on, so the interrupted incremental draw restarts.
        assert!(engine.is_drawing());
        assert_eq!(engine.current_step(), 0);

        let mut engine = Engine::new(RecordingPipeline::with_frames(8, 8))
            .with_animation(false)
            .with_total_steps(5);
        engine.save_image().unwrap();
        assert!(!engine.is_drawing());
    }

    #[test]
    fn test_save_image_requires_readable_frames() {
        let mut engine = Engine::new(NullPipeline).with_animation(false);
        assert!(matches!(
            engine.save_image(),
            Err(SnapshotError::FrameUnavailable)
        ));
    }

    #[test]
    fn test_capture_runs_draw_and_finishes_itself() {
        let sink = CountingSink::default();
        let frames = sink.frames.clone();
        let saved = sink.saved.clone();

        let mut engine = Engine::new(RecordingPipeline::with_frames(4, 4))
            .with_animation(false)
            .with_total_steps(3)
            .with_fps(60.0);
        engine.start_capture(Box::new(sink)).unwrap();

        assert!(engine.is_capturing());
        assert!(engine.is_drawing());
        assert!(engine.settings().animate);

        let t = base_instant();
        for n in 1..=5u64 {
            engine.frame_at(t + Duration::from_millis(100 * n));
        }

        // The completing step closes the session before its present, so the
        // last frame is not forwarded.
        assert_eq!(*frames.borrow(), 2);
        assert!(*saved.borrow());
        assert!(!engine.is_capturing());
        assert!(!engine.settings().animate);
        assert_eq!(engine.draw_state(), DrawState::Idle);
    }

    #[test]
    fn test_second_capture_is_rejected() {
        let mut engine = Engine::new(RecordingPipeline::with_frames(4, 4));
        engine.start_capture(Box::new(CountingSink::default())).unwrap();
        let err = engine
            .start_capture(Box::new(CountingSink::default()))
            .unwrap_err();
        assert!(matches!(err, CaptureError::AlreadyActive));
    }

    #[test]
    fn test_stop_cancels_draw_and_finishes_capture() {
        let sink = CountingSink::default();
        let saved = sink.saved.clone();

        let mut engine = Engine::new(RecordingPipeline::with_frames(4, 4)).with_animation(false);
        engine.start_capture(Box::new(sink)).unwrap();
        engine.stop();

        assert_eq!(engine.draw_state(), DrawState::Cancelled);
        assert!(!engine.is_capturing());
        assert!(*saved.borrow());
        assert!(!engine.settings().animate);
    }

    #[test]
    fn test_randomize_always_animates() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut engine = Engine::new(NullPipeline).with_animation(false);
        engine.randomize(&mut rng);

        assert!(engine.is_drawing());
        assert!((2..=4).contains(&engine.system().len()));
    }

    #[test]
    fn test_body_edits_wait_for_the_next_draw() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut engine = Engine::new(RecordingPipeline::new());

        let index = engine.add_body(&mut rng);
        assert_eq!(index, 1);
        assert_eq!(engine.system().len(), 2);
        assert!(!engine.is_drawing());
        assert!(engine.pipeline().calls().is_empty());

        // The next draw picks up the edited system: one trail per body.
        engine.draw();
        assert_eq!(
            engine
                .pipeline()
                .count_matching(|c| matches!(c, PipelineCall::CreateTrail { .. })),
            2
        );

        // Edits leave the sequence in flight alone.
        engine.set_parent(1, Parent::Root).unwrap();
        engine.remove_body(0).unwrap();
        assert_eq!(engine.system().len(), 1);
        assert!(engine.is_drawing());
        assert!(matches!(
            engine.remove_body(9),
            Err(BodyError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_import_json_applies_and_redraws() {
        let json = r##"{
            "planets": [
                {"distanceX":150,"distanceY":150,"speed":1,"inclination":0,"azimuth":0,"radius":5,"color":"#ffffff","parent":-1},
                {"distanceX":75,"distanceY":75,"speed":2,"inclination":0,"azimuth":0,"radius":3,"color":"#00ff00","parent":0}
            ],
            "totalSteps": "120"
        }"##;
        let mut engine = Engine::new(RecordingPipeline::new());
        engine.import_json(json).unwrap();

        assert_eq!(engine.system().len(), 2);
        assert_eq!(engine.settings().total_steps, 120);
        assert!(engine.is_drawing());
    }

    #[test]
    fn test_set_fps_clamps_and_syncs_clock() {
        let mut engine = Engine::new(NullPipeline);
        engine.set_fps(30.0);
        assert!((engine.settings().frames_per_second - 30.0).abs() < 1e-6);

        engine.set_fps(0.0);
        assert!((engine.settings().frames_per_second - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_reset_restores_default_body_and_keeps_settings() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut engine = Engine::new(RecordingPipeline::new()).with_total_steps(777);
        engine.randomize(&mut rng);
        engine.reset();

        assert_eq!(engine.system().len(), 1);
        assert_eq!(engine.system().get(0), Some(&Body::default()));
        assert_eq!(engine.draw_state(), DrawState::Idle);
        assert_eq!(engine.progress(), 0.0);
        assert_eq!(engine.settings().total_steps, 777);
    }

    #[test]
    fn test_background_reaches_pipeline() {
        let color = Color::from_hex("#112233").unwrap();
        let engine = Engine::new(RecordingPipeline::new()).with_background(color);
        assert!(engine
            .pipeline()
            .calls()
            .contains(&PipelineCall::SetBackground { background: color }));
        assert_eq!(engine.settings().background, color);
    }

    #[test]
    fn test_closed_loop_of_default_body() {
        let engine = Engine::new(NullPipeline);
        assert_eq!(engine.closed_loop(), ClosedLoop::Steps(360));
    }
}
