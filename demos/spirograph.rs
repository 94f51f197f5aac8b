//! # Spirograph Example
//!
//! Renders a three-body figure in both draw styles and writes the results
//! as PNG files.
//!
//! ## What This Demonstrates
//!
//! - Building a `BodySystem` with chained parents
//! - Batch drawing (`with_animation(false)`) - the whole figure at once
//! - `RasterPipeline` - the bundled software renderer
//! - `closed_loop()` - how many steps until the figure repeats
//! - Exporting the figure as JSON
//!
//! ## Try This
//!
//! - Give a body a fractional `speed` and watch the loop length explode
//! - Tilt the planes further with `with_inclination` / `with_azimuth`
//! - Feed the printed JSON back in through `FigureParams::from_json`
//!
//! Run with: `cargo run --example spirograph`

use orrery::prelude::*;

fn main() {
    env_logger::init();

    let system = BodySystem::from_bodies(vec![
        Body::new(150.0, 150.0, 1.0),
        Body::new(75.0, 75.0, 4.0)
            .with_inclination(25.0)
            .with_color(Color::from_hex("#66ccff").unwrap())
            .with_parent(Parent::Body(0)),
        Body::new(30.0, 30.0, 9.0)
            .with_azimuth(40.0)
            .with_radius(3.0)
            .with_color(Color::from_hex("#ffcc66").unwrap())
            .with_parent(Parent::Body(1)),
    ]);

    let mut engine = Engine::new(RasterPipeline::new(1280, 720))
        .with_system(system)
        .with_total_steps(720)
        .with_animation(false);

    println!("figure closes after {} steps", engine.closed_loop());

    // save_image renders the whole figure synchronously and hands the
    // frame back.
    let orbit = engine.save_image().expect("raster pipeline returns frames");
    orbit.save("spirograph_orbit.png").expect("write png");

    engine.set_style(DrawStyle::Connect);
    let connect = engine.save_image().expect("raster pipeline returns frames");
    connect.save("spirograph_connect.png").expect("write png");

    println!("wrote spirograph_orbit.png and spirograph_connect.png");
    println!("{}", engine.export_json().expect("serialize params"));
}
