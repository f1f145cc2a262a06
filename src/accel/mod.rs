//! Acceleration boundary: one drawing/hit-test surface with interchangeable
//! implementations.
//!
//! [`SoftwareAccelerator`] is always available. [`CachedAccelerator`] keeps an
//! offscreen layer of committed strokes plus a spatial grid for hit tests and is
//! swapped in by [`AccelerationBoundary`] once the startup [`probe`] succeeds.
//! Both produce the same pixels and the same hit-test answers.
//!
//! All coordinates crossing this boundary are device pixels.

mod boundary;
mod cached;
mod frame_rate;
mod probe;
mod scene;
mod software;

pub use boundary::AccelerationBoundary;
pub use cached::CachedAccelerator;
pub use frame_rate::FrameRate;
pub use probe::{AccelSettings, Capabilities, probe};
pub use scene::Scene;
pub use software::SoftwareAccelerator;

use crate::draw::{Point, Stroke, StrokeId, SymbolPreview};
use thiserror::Error;

/// Why the accelerated path is unavailable. None of these are fatal.
#[derive(Debug, Error)]
pub enum AccelError {
    #[error("Acceleration disabled in configuration")]
    Disabled,

    #[error("Surface {width}x{height} exceeds the {limit}px limit")]
    SurfaceTooLarge { width: i32, height: i32, limit: i32 },

    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: i32, height: i32 },

    #[error("Cairo error: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("Probe task failed: {0}")]
    Probe(String),
}

/// Rendering and geometry surface shared by every implementation.
pub trait Accelerator {
    fn name(&self) -> &'static str;

    /// Allocates drawing resources for a `width`×`height` device surface.
    fn create_surface(&mut self, width: i32, height: i32) -> Result<(), AccelError>;

    fn resize(&mut self, width: i32, height: i32);

    /// Replaces the committed strokes (device space, z-order).
    fn load_strokes(&mut self, strokes: Vec<Stroke>);

    fn set_transient_stroke(&mut self, stroke: Option<Stroke>);

    fn set_shape_preview(&mut self, preview: Option<Stroke>);

    fn set_symbol_preview(&mut self, preview: Option<SymbolPreview>);

    fn set_rubber_band(&mut self, band: Option<(Point, Point)>);

    fn set_selection(&mut self, ids: &[StrokeId]);

    /// Records a frame timestamp in milliseconds.
    fn record_frame(&mut self, time_ms: f64);

    fn fps(&self) -> f64;

    /// Draws page base, committed strokes and overlays. The background bitmap,
    /// if any, must already be on `ctx`.
    fn render(&mut self, ctx: &cairo::Context, has_background: bool);

    /// Topmost committed stroke within `radius` of `(x, y)`.
    fn hit_test(&self, x: f64, y: f64, radius: f64) -> Option<StrokeId>;

    fn simplify(&self, points: &[Point], tolerance: f64) -> Vec<Point>;

    /// Current scene, used to replay state into a replacement implementation.
    fn scene(&self) -> &Scene;
}

/// Pushes `scene` into `target` through the public surface.
pub(crate) fn replay_scene(target: &mut dyn Accelerator, scene: &Scene) {
    target.resize(scene.width, scene.height);
    target.load_strokes(scene.strokes.clone());
    target.set_selection(&scene.selection);
    target.set_transient_stroke(scene.transient.clone());
    target.set_shape_preview(scene.shape_preview.clone());
    target.set_symbol_preview(scene.symbol_preview.clone());
    target.set_rubber_band(scene.rubber_band);
}
