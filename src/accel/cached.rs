use std::collections::HashMap;

use log::debug;

use super::frame_rate::FrameRate;
use super::probe::Capabilities;
use super::{AccelError, Accelerator, Scene};
use crate::draw::hit::stroke_contains;
use crate::draw::render::KindWarnings;
use crate::draw::{FontDescriptor, Point, Stroke, StrokeId, StrokeKind, SymbolPreview, bounds_of};
use crate::util::{self, Bounds};

/// Uniform bucket grid mapping cells to the indices of strokes that may touch them.
///
/// Cell indices are clamped to `0..=max_cell`, which covers the largest
/// surface plus one cell of margin. Clamping both inserts and queries keeps
/// every true candidate while bounding the work for far-off geometry.
#[derive(Debug, Default)]
struct SpatialGrid {
    cell: f64,
    max_cell: i64,
    buckets: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    fn build(strokes: &[Stroke], cell: f64, max_dimension: i32) -> Self {
        let cell = cell.max(1.0);
        let mut grid = Self {
            cell,
            max_cell: (f64::from(max_dimension.max(0)) / cell).ceil() as i64 + 1,
            buckets: HashMap::new(),
        };
        for (index, stroke) in strokes.iter().enumerate() {
            let Some(bounds) = bounds_of(stroke) else {
                continue;
            };
            // Freehand hits reach half the line width beyond the points.
            let reach = match stroke.kind {
                StrokeKind::Freehand { .. } => stroke.thickness / 2.0,
                _ => 0.0,
            };
            let area = bounds.expand(reach);
            for key in grid.cells(&area) {
                grid.buckets.entry(key).or_default().push(index);
            }
        }
        grid
    }

    fn cells(&self, area: &Bounds) -> impl Iterator<Item = (i64, i64)> + use<> {
        let finite = [area.min_x, area.min_y, area.max_x, area.max_y]
            .iter()
            .all(|v| v.is_finite());
        let index = |v: f64| ((v / self.cell).floor() as i64).clamp(0, self.max_cell);
        let (x0, x1, y0, y1) = if finite {
            (
                index(area.min_x),
                index(area.max_x),
                index(area.min_y),
                index(area.max_y),
            )
        } else {
            (1, 0, 1, 0)
        };
        (x0..=x1).flat_map(move |x| (y0..=y1).map(move |y| (x, y)))
    }

    /// Candidate stroke indices for a query area, topmost first.
    fn candidates(&self, area: &Bounds) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .cells(area)
            .filter_map(|key| self.buckets.get(&key))
            .flatten()
            .copied()
            .collect();
        found.sort_unstable_by(|a, b| b.cmp(a));
        found.dedup();
        found
    }
}

/// Accelerated implementation.
///
/// Committed strokes are rasterized once into an offscreen layer that is only
/// rebuilt when strokes or the surface size change; each frame blits the layer
/// and draws the cheap overlays on top. Hit tests consult a spatial grid before
/// running the exact per-stroke test.
pub struct CachedAccelerator {
    scene: Scene,
    font: FontDescriptor,
    capabilities: Capabilities,
    frame_rate: FrameRate,
    warnings: KindWarnings,
    layer: Option<cairo::ImageSurface>,
    layer_stale: bool,
    layer_builds: u64,
    grid: SpatialGrid,
}

impl CachedAccelerator {
    pub fn new(capabilities: Capabilities, font: FontDescriptor) -> Self {
        Self {
            scene: Scene::default(),
            font,
            capabilities,
            frame_rate: FrameRate::new(),
            warnings: KindWarnings::new(),
            layer: None,
            layer_stale: true,
            layer_builds: 0,
            grid: SpatialGrid::default(),
        }
    }

    /// How many times the stroke layer has been rasterized.
    pub fn layer_builds(&self) -> u64 {
        self.layer_builds
    }

    fn check_size(&self, width: i32, height: i32) -> Result<(), AccelError> {
        if width <= 0 || height <= 0 {
            return Err(AccelError::InvalidSize { width, height });
        }
        let limit = self.capabilities.max_surface_dimension;
        if width > limit || height > limit {
            return Err(AccelError::SurfaceTooLarge {
                width,
                height,
                limit,
            });
        }
        Ok(())
    }

    fn rebuild_layer(&mut self) {
        self.layer_stale = false;
        if self.scene.width <= 0 || self.scene.height <= 0 {
            self.layer = None;
            return;
        }

        let reuse = self
            .layer
            .as_ref()
            .is_some_and(|s| s.width() == self.scene.width && s.height() == self.scene.height);
        if !reuse {
            self.layer = cairo::ImageSurface::create(
                cairo::Format::ARgb32,
                self.scene.width,
                self.scene.height,
            )
            .ok();
        }
        let Some(layer) = &self.layer else {
            return;
        };
        let Ok(ctx) = cairo::Context::new(layer) else {
            return;
        };

        ctx.set_operator(cairo::Operator::Clear);
        let _ = ctx.paint();
        ctx.set_operator(cairo::Operator::Over);
        self.scene
            .render_committed(&ctx, &self.font, &mut self.warnings);
        drop(ctx);
        layer.flush();

        self.layer_builds += 1;
        debug!(
            "Rebuilt stroke layer ({} strokes, {}x{})",
            self.scene.strokes.len(),
            self.scene.width,
            self.scene.height
        );
    }
}

impl Accelerator for CachedAccelerator {
    fn name(&self) -> &'static str {
        "cached"
    }

    fn create_surface(&mut self, width: i32, height: i32) -> Result<(), AccelError> {
        self.check_size(width, height)?;
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, width, height)?;
        self.scene.width = width;
        self.scene.height = height;
        self.layer = Some(surface);
        self.layer_stale = true;
        Ok(())
    }

    fn resize(&mut self, width: i32, height: i32) {
        let (width, height) = (width.max(0), height.max(0));
        if (width, height) != (self.scene.width, self.scene.height) {
            self.scene.width = width;
            self.scene.height = height;
            self.layer_stale = true;
        }
    }

    fn load_strokes(&mut self, strokes: Vec<Stroke>) {
        self.grid = SpatialGrid::build(
            &strokes,
            self.capabilities.grid_cell_size,
            self.capabilities.max_surface_dimension,
        );
        self.scene.strokes = strokes;
        self.layer_stale = true;
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
        if self.layer_stale {
            self.rebuild_layer();
        }
        self.scene.render_base(ctx, has_background);
        match &self.layer {
            Some(layer) => {
                let _ = ctx.save();
                if ctx.set_source_surface(layer, 0.0, 0.0).is_ok() {
                    let _ = ctx.paint();
                }
                let _ = ctx.restore();
            }
            None => self
                .scene
                .render_committed(ctx, &self.font, &mut self.warnings),
        }
        self.scene.render_overlays(ctx, &self.font);
    }

    fn hit_test(&self, x: f64, y: f64, radius: f64) -> Option<StrokeId> {
        let point = Point::new(x, y);
        let query = Bounds::new(x, y, x, y).expand(radius.max(0.0));
        self.grid
            .candidates(&query)
            .into_iter()
            .filter_map(|index| self.scene.strokes.get(index))
            .find(|stroke| stroke_contains(stroke, point, radius))
            .map(|stroke| stroke.id.clone())
    }

    fn simplify(&self, points: &[Point], tolerance: f64) -> Vec<Point> {
        util::simplify(points, tolerance)
    }

    fn scene(&self) -> &Scene {
        &self.scene
    }
}
