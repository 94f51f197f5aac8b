//! Integration tests for the public figure-drawing API.
//!
//! These tests drive whole scenarios through `Engine` the way an embedding
//! would: solving, incremental and batch drawing, persistence, and frame
//! capture, each against the bundled pipeline adapters.

use std::time::{Duration, Instant};

use orrery::{
    closed_loop, positions_at_step, Body, BodySystem, ClosedLoop, Color, DrawState, DrawStyle,
    Engine, FrameSequenceSink, Parent, Primitive, RasterPipeline, RecordingPipeline,
};

fn two_body_system() -> BodySystem {
    BodySystem::from_bodies(vec![
        Body::new(150.0, 150.0, 1.0),
        Body::new(50.0, 50.0, 2.0)
            .with_color(Color::from_hex("#ff8800").unwrap())
            .with_parent(Parent::Body(0)),
    ])
}

fn base_instant() -> Instant {
    Instant::now() + Duration::from_secs(1)
}

// ============================================================================
// Position Solving
// ============================================================================

#[test]
fn test_chained_positions_compose() {
    let system = two_body_system();

    // At step 90 the parent (1 degree per step) has swept a quarter turn
    // and the child (2 degrees per step) a half turn.
    let positions = positions_at_step(system.bodies(), 90);
    let parent = positions.get(0).unwrap();
    let child = positions.get(1).unwrap();

    assert!((parent.x - 0.0).abs() < 1e-9);
    assert!((parent.y - 150.0).abs() < 1e-9);
    assert!((child.x - (parent.x - 50.0)).abs() < 1e-9);
    assert!((child.y - parent.y).abs() < 1e-9);
    assert_eq!(child.z, 0.0);
}

// ============================================================================
// Drawing Lifecycle
// ============================================================================

#[test]
fn test_incremental_draw_runs_to_completion() {
    let mut engine = Engine::new(RecordingPipeline::new())
        .with_system(two_body_system())
        .with_total_steps(4)
        .with_fps(240.0);
    engine.draw();
    assert_eq!(engine.draw_state(), DrawState::Drawing(DrawStyle::Orbit));

    let t = base_instant();
    for n in 1..=8u64 {
        engine.frame_at(t + Duration::from_millis(100 * n));
    }

    assert_eq!(engine.draw_state(), DrawState::Idle);
    assert_eq!(engine.progress(), 100.0);
    assert_eq!(engine.current_step(), 4);
    assert_eq!(engine.pipeline().last_draw_range(Primitive::Trail(0)), Some(4));
    assert_eq!(engine.pipeline().last_draw_range(Primitive::Trail(1)), Some(4));
}

#[test]
fn test_batch_and_incremental_render_identically() {
    // A fully resolved figure must produce the same frame whether it is
    // computed step by step or all at once.
    let incremental = {
        let mut engine = Engine::new(RasterPipeline::new(160, 120))
            .with_system(two_body_system())
            .with_total_steps(60)
            .with_fps(240.0);
        engine.draw();

        let t = base_instant();
        let mut tick = 0u64;
        while engine.is_drawing() {
            tick += 1;
            engine.frame_at(t + Duration::from_millis(50 * tick));
        }
        engine.pipeline().frame().clone()
    };

    let batch = {
        let mut engine = Engine::new(RasterPipeline::new(160, 120))
            .with_system(two_body_system())
            .with_total_steps(60)
            .with_animation(false);
        engine.draw();
        engine.pipeline().frame().clone()
    };

    assert_eq!(incremental.dimensions(), batch.dimensions());
    assert_eq!(incremental.as_raw(), batch.as_raw());
}

#[test]
fn test_connect_style_renders_pair_lines() {
    let mut engine = Engine::new(RasterPipeline::new(160, 120))
        .with_system(two_body_system())
        .with_style(DrawStyle::Connect)
        .with_total_steps(90)
        .with_animation(false);
    engine.draw();

    let background = image::Rgba([0u8, 0, 0, 255]);
    let lit = engine
        .pipeline()
        .frame()
        .pixels()
        .filter(|p| **p != background)
        .count();
    assert!(lit > 100, "expected pair lines, found {} lit pixels", lit);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_json_round_trip_through_engine() {
    let engine = Engine::new(RecordingPipeline::new())
        .with_system(two_body_system())
        .with_total_steps(540);
    let exported = engine.export_json().unwrap();

    let mut restored = Engine::new(RecordingPipeline::new());
    restored.import_json(&exported).unwrap();

    assert_eq!(restored.system().bodies(), engine.system().bodies());
    assert_eq!(restored.settings().total_steps, 540);
    assert_eq!(restored.export_json().unwrap(), exported);
}

// ============================================================================
// Capture
// ============================================================================

#[test]
fn test_capture_writes_frame_sequence() {
    let dir = std::env::temp_dir().join(format!("orrery-itest-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);

    let mut engine = Engine::new(RasterPipeline::new(32, 32))
        .with_system(two_body_system())
        .with_total_steps(5)
        .with_fps(240.0);
    engine
        .start_capture(Box::new(FrameSequenceSink::new(&dir)))
        .unwrap();

    let t = base_instant();
    let mut tick = 0u64;
    while engine.is_capturing() {
        tick += 1;
        engine.frame_at(t + Duration::from_millis(50 * tick));
    }

    // The completing step closes the session before its present, so a
    // five-step draw leaves four frames.
    for n in 0..4 {
        assert!(
            dir.join(format!("frame_{:05}.png", n)).is_file(),
            "missing frame {}",
            n
        );
    }
    assert!(!dir.join("frame_00004.png").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

// ============================================================================
// Periods
// ============================================================================

#[test]
fn test_mixed_speeds_close_together() {
    let system = BodySystem::from_bodies(vec![
        Body::new(150.0, 150.0, 1.0),
        Body::new(75.0, 75.0, 2.5).with_parent(Parent::Body(0)),
    ]);
    // 360 and 144 steps per revolution close jointly after their lcm.
    assert_eq!(closed_loop(system.bodies()), ClosedLoop::Steps(720));
}
