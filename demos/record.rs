//! # Capture Recording Example
//!
//! Draws a random figure step by step and records every presented frame
//! as a numbered PNG under `recording/`.
//!
//! ## What This Demonstrates
//!
//! - `randomize()` - a random figure, drawn incrementally
//! - `start_capture` + `FrameSequenceSink` - recording a forming figure
//! - Driving the frame clock manually with `frame_at`
//! - The capture session finishing itself when the draw completes
//!
//! ## Try This
//!
//! - Swap in `FrameFormat::Jpeg` for smaller frames
//! - Raise `with_total_steps` for a longer clip
//! - Assemble the frames: `ffmpeg -framerate 60 -i recording/orbit_%05d.png clip.mp4`
//!
//! Run with: `cargo run --example record`

use std::time::{Duration, Instant};

use orrery::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn main() {
    env_logger::init();

    let mut rng = SmallRng::seed_from_u64(0xf1f0);
    let mut engine = Engine::new(RasterPipeline::new(640, 360))
        .with_total_steps(240)
        .with_fps(60.0);
    engine.randomize(&mut rng);

    let sink = FrameSequenceSink::new("recording").with_prefix("orbit");
    engine
        .start_capture(Box::new(sink))
        .expect("no capture running yet");

    // Drive the clock with synthetic instants instead of sleeping through
    // four seconds of wall time.
    let start = Instant::now();
    let mut tick = 0u64;
    while engine.is_capturing() {
        tick += 1;
        engine.frame_at(start + Duration::from_millis(17 * tick));
    }

    println!(
        "figure finished at step {}, frames in ./recording",
        engine.current_step()
    );
}
