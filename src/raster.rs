//! Software rendering.
//!
//! [`RasterPipeline`] is the bundled [`RenderPipeline`] adapter: a plain
//! CPU rasterizer that projects the figure through a pinhole camera on the
//! z axis and draws lines into an [`RgbaImage`]. It exists so snapshots,
//! captures, and headless runs work without a GPU; interactive embeddings
//! would implement the trait against their own graphics stack instead.
//!
//! # Example
//!
//! ```ignore
//! let mut pipeline = RasterPipeline::new(1280, 720)
//!     .with_background(Color::BLACK);
//! let mut engine = Engine::new(pipeline);
//! engine.draw();
//! engine.save_image()?.save("figure.png")?;
//! ```

use bytemuck::Zeroable;
use glam::Vec3;
use image::{Rgba, RgbaImage};

use crate::body::Body;
use crate::buffer::LineVertex;
use crate::render::{Primitive, RenderPipeline};
use crate::settings::Color;

/// Points closer to the camera than this are culled.
const NEAR_PLANE: f32 = 0.1;
/// Screen-space radius of the root marker at zero depth offset.
const ORIGIN_MARKER_RADIUS: f32 = 5.0;
/// Cap on projected marker radii, in pixels.
const MAX_MARKER_RADIUS: f32 = 64.0;

struct TrailGeometry {
    points: Vec<Vec3>,
    draw_count: u32,
    color: Vec3,
    radius: f32,
}

struct EdgeGeometry {
    vertices: Vec<LineVertex>,
    draw_count: u32,
}

/// CPU rasterizer rendering the figure into an RGBA frame.
///
/// The camera sits on the positive z axis looking at the origin: x grows
/// to the right, y up, and depth falls off with distance from the camera.
pub struct RasterPipeline {
    width: u32,
    height: u32,
    background: Color,
    field_of_view: f32,
    camera_distance: f32,
    show_markers: bool,
    trails: Vec<Option<TrailGeometry>>,
    edges: Option<EdgeGeometry>,
    frame: RgbaImage,
}

impl RasterPipeline {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Color::BLACK,
            field_of_view: 75.0,
            camera_distance: 500.0,
            show_markers: true,
            trails: Vec::new(),
            edges: None,
            frame: RgbaImage::new(width, height),
        }
    }

    /// Replace the clear color.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    /// Replace the vertical field of view, in degrees.
    pub fn with_field_of_view(mut self, degrees: f32) -> Self {
        self.field_of_view = degrees;
        self
    }

    /// Move the camera along the z axis.
    pub fn with_camera_distance(mut self, distance: f32) -> Self {
        self.camera_distance = distance;
        self
    }

    /// Toggle body and origin markers.
    pub fn with_markers(mut self, show: bool) -> Self {
        self.show_markers = show;
        self
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The most recently presented frame.
    #[inline]
    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    fn projector(&self) -> Projector {
        Projector::new(
            self.width,
            self.height,
            self.field_of_view,
            self.camera_distance,
        )
    }
}

impl RenderPipeline for RasterPipeline {
    fn clear_all(&mut self) {
        self.trails.clear();
        self.edges = None;
    }

    fn create_trail(&mut self, body_index: usize, body: &Body, capacity: u32) {
        if self.trails.len() <= body_index {
            self.trails.resize_with(body_index + 1, || None);
        }
        self.trails[body_index] = Some(TrailGeometry {
            points: vec![Vec3::ZERO; capacity as usize],
            draw_count: 0,
            color: body.color.to_vec3(),
            radius: body.radius as f32,
        });
    }

    fn create_edge_batch(&mut self, capacity: u32) {
        self.edges = Some(EdgeGeometry {
            vertices: vec![LineVertex::zeroed(); capacity as usize],
            draw_count: 0,
        });
    }

    fn update_trail_point(&mut self, body_index: usize, step: u32, point: Vec3) {
        if let Some(Some(trail)) = self.trails.get_mut(body_index) {
            if let Some(slot) = trail.points.get_mut(step as usize) {
                *slot = point;
            }
        }
    }

    fn write_edge_vertices(&mut self, first_vertex: u32, vertices: &[LineVertex]) {
        let Some(edges) = self.edges.as_mut() else {
            return;
        };
        let start = first_vertex as usize;
        if let Some(target) = edges.vertices.get_mut(start..start + vertices.len()) {
            target.copy_from_slice(vertices);
        }
    }

    fn set_draw_range(&mut self, primitive: Primitive, count: u32) {
        match primitive {
            Primitive::Trail(body_index) => {
                if let Some(Some(trail)) = self.trails.get_mut(body_index) {
                    trail.draw_count = count;
                }
            }
            Primitive::Edges => {
                if let Some(edges) = self.edges.as_mut() {
                    edges.draw_count = count;
                }
            }
        }
    }

    fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    fn present_frame(&mut self) {
        let projector = self.projector();
        let clear = Rgba([self.background.r, self.background.g, self.background.b, 255]);
        let frame = &mut self.frame;
        for pixel in frame.pixels_mut() {
            *pixel = clear;
        }

        if let Some(edges) = &self.edges {
            let count = (edges.draw_count as usize).min(edges.vertices.len());
            for pair in edges.vertices[..count].chunks_exact(2) {
                let a = projector.project(Vec3::from(pair[0].position));
                let b = projector.project(Vec3::from(pair[1].position));
                let (Some(a), Some(b)) = (a, b) else {
                    continue;
                };
                draw_line(frame, (a.0, a.1), (b.0, b.1), vec_to_rgba(Vec3::from(pair[0].color)));
            }
        }

        for trail in self.trails.iter().flatten() {
            let count = (trail.draw_count as usize).min(trail.points.len());
            let color = vec_to_rgba(trail.color);
            let mut previous = None;
            for &point in &trail.points[..count] {
                let Some((x, y, _)) = projector.project(point) else {
                    previous = None;
                    continue;
                };
                if let Some(from) = previous {
                    draw_line(frame, from, (x, y), color);
                }
                previous = Some((x, y));
            }
        }

        // Markers ride on trails only; an edge batch draws bare lines.
        if self.show_markers && self.edges.is_none() {
            if self.trails.iter().any(Option::is_some) {
                if let Some((x, y, depth)) = projector.project(Vec3::ZERO) {
                    let radius = marker_radius(projector.focal, ORIGIN_MARKER_RADIUS, depth);
                    fill_circle(frame, x, y, radius, Rgba([255, 255, 255, 255]));
                }
            }
            for trail in self.trails.iter().flatten() {
                let count = (trail.draw_count as usize).min(trail.points.len());
                let Some(&last) = trail.points[..count].last() else {
                    continue;
                };
                if let Some((x, y, depth)) = projector.project(last) {
                    let radius = marker_radius(projector.focal, trail.radius, depth);
                    fill_circle(frame, x, y, radius, vec_to_rgba(trail.color));
                }
            }
        }
    }

    fn capture_frame(&mut self) -> Option<RgbaImage> {
        Some(self.frame.clone())
    }
}

struct Projector {
    half_width: f32,
    half_height: f32,
    focal: f32,
    camera_distance: f32,
}

impl Projector {
    fn new(width: u32, height: u32, field_of_view: f32, camera_distance: f32) -> Self {
        let fov = field_of_view.to_radians();
        Self {
            half_width: width as f32 / 2.0,
            half_height: height as f32 / 2.0,
            focal: (height as f32 / 2.0) / (fov / 2.0).tan(),
            camera_distance,
        }
    }

    /// Project a world point to screen coordinates and depth, or `None`
    /// when it falls behind the near plane.
    fn project(&self, point: Vec3) -> Option<(f32, f32, f32)> {
        let depth = self.camera_distance - point.z;
        if depth <= NEAR_PLANE || !point.is_finite() {
            return None;
        }
        let x = self.half_width + self.focal * point.x / depth;
        let y = self.half_height - self.focal * point.y / depth;
        Some((x, y, depth))
    }
}

fn marker_radius(focal: f32, world_radius: f32, depth: f32) -> f32 {
    (focal * world_radius / depth).clamp(1.0, MAX_MARKER_RADIUS)
}

fn vec_to_rgba(color: Vec3) -> Rgba<u8> {
    Rgba([
        (color.x.clamp(0.0, 1.0) * 255.0).round() as u8,
        (color.y.clamp(0.0, 1.0) * 255.0).round() as u8,
        (color.z.clamp(0.0, 1.0) * 255.0).round() as u8,
        255,
    ])
}

/// Region codes for trivially rejecting segments that never cross the frame.
fn outcode(x: f32, y: f32, width: f32, height: f32) -> u8 {
    let mut code = 0;
    if x < 0.0 {
        code |= 1;
    } else if x >= width {
        code |= 2;
    }
    if y < 0.0 {
        code |= 4;
    } else if y >= height {
        code |= 8;
    }
    code
}

fn draw_line(frame: &mut RgbaImage, from: (f32, f32), to: (f32, f32), color: Rgba<u8>) {
    let width = frame.width() as f32;
    let height = frame.height() as f32;
    if outcode(from.0, from.1, width, height) & outcode(to.0, to.1, width, height) != 0 {
        return;
    }

    let mut x0 = from.0.round() as i64;
    let mut y0 = from.1.round() as i64;
    let x1 = to.0.round() as i64;
    let y1 = to.1.round() as i64;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel_checked(frame, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x0 += sx;
        }
        if doubled <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn fill_circle(frame: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
    let r = radius.clamp(1.0, MAX_MARKER_RADIUS);
    let x_min = (cx - r).floor() as i64;
    let x_max = (cx + r).ceil() as i64;
    let y_min = (cy - r).floor() as i64;
    let y_max = (cy + r).ceil() as i64;
    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= r * r {
                put_pixel_checked(frame, x, y, color);
            }
        }
    }
}

fn put_pixel_checked(frame: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < frame.width() && (y as u32) < frame.height() {
        frame.put_pixel(x as u32, y as u32, color);
    }
}
