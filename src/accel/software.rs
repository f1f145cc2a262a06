use super::frame_rate::FrameRate;
use super::{AccelError, Accelerator, Scene};
use crate::draw::render::KindWarnings;
use crate::draw::{FontDescriptor, Point, Stroke, StrokeId, SymbolPreview, hit_test};
use crate::util;

/// Reference implementation: redraws everything every frame and hit-tests by
/// scanning strokes topmost-first.
#[derive(Debug, Default)]
pub struct SoftwareAccelerator {
    scene: Scene,
    font: FontDescriptor,
    frame_rate: FrameRate,
    warnings: KindWarnings,
}

impl SoftwareAccelerator {
    pub fn new(font: FontDescriptor) -> Self {
        Self {
            font,
            ..Self::default()
        }
    }
}

impl Accelerator for SoftwareAccelerator {
    fn name(&self) -> &'static str {
        "software"
    }

    fn create_surface(&mut self, width: i32, height: i32) -> Result<(), AccelError> {
        if width <= 0 || height <= 0 {
            return Err(AccelError::InvalidSize { width, height });
        }
        self.resize(width, height);
        Ok(())
    }

    fn resize(&mut self, width: i32, height: i32) {
        self.scene.width = width.max(0);
        self.scene.height = height.max(0);
    }

    fn load_strokes(&mut self, strokes: Vec<Stroke>) {
        self.scene.strokes = strokes;
    }

    fn set_transient_stroke(&mut self, stroke: Option<Stroke>) {
        self.scene.transient = stroke;
    }

    fn set_shape_preview(&mut self, preview: Option<Stroke>) {
        self.scene.shape_preview = preview;
    }

    fn set_symbol_preview(&mut self, preview: Option<SymbolPreview>) {
        self.scene.symbol_preview = preview;
    }

    fn set_rubber_band(&mut self, band: Option<(Point, Point)>) {
        self.scene.rubber_band = band;
    }

    fn set_selection(&mut self, ids: &[StrokeId]) {
        self.scene.selection = ids.to_vec();
    }

    fn record_frame(&mut self, time_ms: f64) {
        self.frame_rate.record(time_ms);
    }

    fn fps(&self) -> f64 {
        self.frame_rate.fps()
    }

    fn render(&mut self, ctx: &cairo::Context, has_background: bool) {
        self.scene.render_base(ctx, has_background);
        self.scene.render_committed(ctx, &self.font, &mut self.warnings);
        self.scene.render_overlays(ctx, &self.font);
    }

    fn hit_test(&self, x: f64, y: f64, radius: f64) -> Option<StrokeId> {
        hit_test(Point::new(x, y), radius, &self.scene.strokes).map(|s| s.id.clone())
    }

    fn simplify(&self, points: &[Point], tolerance: f64) -> Vec<Point> {
        util::simplify(points, tolerance)
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }
}
