//! Cairo-based rendering for strokes, page chrome and interaction previews.
//!
//! Every function draws in whatever space the context is set up for; callers
//! pass device-space strokes (see [`crate::util::ViewTransform::stroke_to_device`]).
//! Cairo errors are ignored per call so one bad stroke never aborts a frame.

use super::bounds::selection_box;
use super::color::{self, Color};
use super::font::FontDescriptor;
use super::stroke::{Point, ShapeType, Stroke, StrokeId, StrokeKind};
use crate::util::{self, Bounds};
use log::{debug, warn};
use std::collections::HashSet;
use std::f64::consts::PI;

/// Spacing of the blank-page grid in device pixels.
pub const GRID_SPACING: f64 = 20.0;

/// Side of the square handles drawn on selection corners.
const HANDLE_SIZE: f64 = 8.0;

/// A glyph being sized by a symbol-tool drag.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolPreview {
    pub start: Point,
    pub end: Point,
    pub glyph: String,
    pub color: String,
    pub opacity: f64,
}

impl SymbolPreview {
    /// Glyph size implied by the drag: at least 20, otherwise the larger extent.
    pub fn size(&self) -> f64 {
        20f64
            .max((self.end.x - self.start.x).abs())
            .max((self.end.y - self.start.y).abs())
    }

    /// Baseline anchor the committed glyph will use.
    pub fn anchor(&self) -> Point {
        Point::new(self.start.x, self.start.y + self.size() * 0.8)
    }
}

/// Remembers which strokes with an unknown kind have already been reported.
#[derive(Debug, Default)]
pub struct KindWarnings {
    reported: HashSet<StrokeId>,
}

impl KindWarnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs a warning the first time `stroke` is seen with an unrecognized kind.
    pub fn note(&mut self, stroke: &Stroke) {
        if let StrokeKind::Unrecognized(tag) = &stroke.kind {
            if self.reported.insert(stroke.id.clone()) {
                warn!("Skipping stroke {} with unknown kind '{}'", stroke.id, tag);
            }
        }
    }

    pub fn reported(&self) -> usize {
        self.reported.len()
    }
}

/// Parses a stroke color, falling back to black. Runs every frame, so the
/// fallback is only logged at debug level.
pub fn resolve_color(css: &str) -> Color {
    Color::parse_css(css).unwrap_or_else(|| {
        debug!("Unparseable color '{}', using black", css);
        color::BLACK
    })
}

// ============================================================================
// Page chrome
// ============================================================================

/// Paints the page base: white with a grid when no background bitmap is shown,
/// and always a 1px border.
pub fn render_page_base(
    ctx: &cairo::Context,
    width: f64,
    height: f64,
    has_background: bool,
    grid_spacing: f64,
) {
    let _ = ctx.save();
    if !has_background {
        color::WHITE.apply(ctx);
        ctx.rectangle(0.0, 0.0, width, height);
        let _ = ctx.fill();
        render_grid(ctx, width, height, grid_spacing);
    }

    color::PAGE_BORDER.apply(ctx);
    ctx.set_line_width(1.0);
    ctx.rectangle(0.0, 0.0, width, height);
    let _ = ctx.stroke();
    let _ = ctx.restore();
}

fn render_grid(ctx: &cairo::Context, width: f64, height: f64, spacing: f64) {
    if spacing < 1.0 {
        return;
    }
    color::GRID.apply(ctx);
    ctx.set_line_width(0.5);

    let mut x = 0.0;
    while x <= width {
        ctx.move_to(x, 0.0);
        ctx.line_to(x, height);
        x += spacing;
    }
    let mut y = 0.0;
    while y <= height {
        ctx.move_to(0.0, y);
        ctx.line_to(width, y);
        y += spacing;
    }
    let _ = ctx.stroke();
}

// ============================================================================
// Strokes
// ============================================================================

/// Renders strokes in order (first = bottom), reporting unknown kinds once.
pub fn render_strokes<'a, I>(
    ctx: &cairo::Context,
    strokes: I,
    font: &FontDescriptor,
    warnings: &mut KindWarnings,
) where
    I: IntoIterator<Item = &'a Stroke>,
{
    for stroke in strokes {
        if !render_stroke(ctx, stroke, font) {
            warnings.note(stroke);
        }
    }
}

/// Renders a single stroke. Returns false when its kind cannot be drawn.
pub fn render_stroke(ctx: &cairo::Context, stroke: &Stroke, font: &FontDescriptor) -> bool {
    let color = resolve_color(&stroke.color).with_alpha(stroke.alpha());
    match &stroke.kind {
        StrokeKind::Freehand { .. } => {
            render_freehand(ctx, &stroke.points, color, stroke.thickness);
        }
        StrokeKind::Shape { shape } => {
            if let [start, end, ..] = stroke.points.as_slice() {
                let fill = stroke
                    .fill_color
                    .as_deref()
                    .map(|css| resolve_color(css).with_alpha(stroke.alpha()));
                render_shape(ctx, *shape, *start, *end, color, stroke.thickness, fill);
            }
        }
        StrokeKind::Text { payload } => {
            if let Some(anchor) = stroke.points.first() {
                render_text(ctx, *anchor, payload, color, stroke.font_size(), font);
            }
        }
        StrokeKind::Unrecognized(_) => return false,
    }
    true
}

/// Freehand path smoothed with quadratic curves through segment midpoints.
///
/// Needs at least two points; a lone point draws nothing.
pub fn render_freehand(ctx: &cairo::Context, points: &[Point], color: Color, thickness: f64) {
    let [first, rest @ ..] = points else {
        return;
    };
    if rest.is_empty() {
        return;
    }

    let _ = ctx.save();
    color.apply(ctx);
    ctx.set_line_width(thickness);
    ctx.set_line_cap(cairo::LineCap::Round);
    ctx.set_line_join(cairo::LineJoin::Round);

    ctx.move_to(first.x, first.y);
    let mut current = (first.x, first.y);
    for pair in points.windows(2) {
        let (ctrl, next) = (pair[0], pair[1]);
        let mid = ((ctrl.x + next.x) / 2.0, (ctrl.y + next.y) / 2.0);
        quad_to(ctx, current, (ctrl.x, ctrl.y), mid);
        current = mid;
    }
    if let Some(last) = points.last() {
        ctx.line_to(last.x, last.y);
    }
    let _ = ctx.stroke();
    let _ = ctx.restore();
}

/// Cairo only has cubic curves; elevate the quadratic.
fn quad_to(ctx: &cairo::Context, from: (f64, f64), ctrl: (f64, f64), to: (f64, f64)) {
    let c1 = (
        from.0 + 2.0 / 3.0 * (ctrl.0 - from.0),
        from.1 + 2.0 / 3.0 * (ctrl.1 - from.1),
    );
    let c2 = (
        to.0 + 2.0 / 3.0 * (ctrl.0 - to.0),
        to.1 + 2.0 / 3.0 * (ctrl.1 - to.1),
    );
    ctx.curve_to(c1.0, c1.1, c2.0, c2.1, to.0, to.1);
}

/// Renders one of the corner-defined shapes, filling closed shapes when `fill` is set.
#[allow(clippy::too_many_arguments)]
pub fn render_shape(
    ctx: &cairo::Context,
    shape: ShapeType,
    start: Point,
    end: Point,
    color: Color,
    thickness: f64,
    fill: Option<Color>,
) {
    let b = Bounds::from_corners(start, end);
    let (w, h) = (b.width(), b.height());
    let c = b.center();

    let _ = ctx.save();
    ctx.set_line_width(thickness);
    ctx.set_line_cap(cairo::LineCap::Round);
    ctx.set_line_join(cairo::LineJoin::Round);
    ctx.new_path();

    match shape {
        ShapeType::Rectangle => ctx.rectangle(b.min_x, b.min_y, w, h),
        ShapeType::Circle => {
            if w > 0.0 && h > 0.0 {
                let _ = ctx.save();
                ctx.translate(c.x, c.y);
                ctx.scale(w / 2.0, h / 2.0);
                ctx.arc(0.0, 0.0, 1.0, 0.0, 2.0 * PI);
                let _ = ctx.restore();
            }
        }
        ShapeType::Triangle => {
            ctx.move_to(c.x, b.min_y);
            ctx.line_to(b.max_x, b.max_y);
            ctx.line_to(b.min_x, b.max_y);
            ctx.close_path();
        }
        ShapeType::Diamond => {
            ctx.move_to(c.x, b.min_y);
            ctx.line_to(b.max_x, c.y);
            ctx.line_to(c.x, b.max_y);
            ctx.line_to(b.min_x, c.y);
            ctx.close_path();
        }
        ShapeType::Star => {
            let outer = w.min(h) / 2.0;
            let inner = outer * 0.4;
            let step = PI / 5.0;
            let mut angle = -PI / 2.0;
            ctx.move_to(c.x + outer * angle.cos(), c.y + outer * angle.sin());
            for _ in 0..5 {
                angle += step;
                ctx.line_to(c.x + inner * angle.cos(), c.y + inner * angle.sin());
                angle += step;
                ctx.line_to(c.x + outer * angle.cos(), c.y + outer * angle.sin());
            }
            ctx.close_path();
        }
        ShapeType::Heart => {
            let notch = b.min_y + h * 0.15;
            let lobe = b.min_y + h * 0.3;
            let shoulder = b.min_y + h * 0.8;
            ctx.move_to(c.x, notch);
            ctx.curve_to(c.x, b.min_y, b.min_x, b.min_y, b.min_x, lobe);
            ctx.curve_to(b.min_x, shoulder, c.x, b.max_y, c.x, b.max_y);
            ctx.curve_to(c.x, b.max_y, b.max_x, shoulder, b.max_x, lobe);
            ctx.curve_to(b.max_x, b.min_y, c.x, b.min_y, c.x, notch);
        }
        ShapeType::Line | ShapeType::Arrow => {
            ctx.move_to(start.x, start.y);
            ctx.line_to(end.x, end.y);
        }
    }

    if let Some(fill) = fill.filter(|_| shape.is_fillable()) {
        fill.apply(ctx);
        let _ = ctx.fill_preserve();
    }
    color.apply(ctx);
    let _ = ctx.stroke();

    if shape == ShapeType::Arrow {
        let [left, right] = util::arrowhead(start, end, thickness);
        ctx.move_to(end.x, end.y);
        ctx.line_to(left.x, left.y);
        ctx.move_to(end.x, end.y);
        ctx.line_to(right.x, right.y);
        let _ = ctx.stroke();
    }
    let _ = ctx.restore();
}

/// Renders a text payload with its baseline at `anchor`.
pub fn render_text(
    ctx: &cairo::Context,
    anchor: Point,
    text: &str,
    color: Color,
    font_size: f64,
    font: &FontDescriptor,
) {
    if text.is_empty() {
        return;
    }
    let _ = ctx.save();
    ctx.set_antialias(cairo::Antialias::Best);

    let layout = pangocairo::functions::create_layout(ctx);
    let desc = pango::FontDescription::from_string(&font.to_pango_string(font_size));
    layout.set_font_description(Some(&desc));
    layout.set_text(text);

    // Pango positions from the top-left of the layout.
    let baseline = layout.baseline() as f64 / pango::SCALE as f64;
    ctx.move_to(anchor.x, anchor.y - baseline);
    color.apply(ctx);
    pangocairo::functions::show_layout(ctx, &layout);
    let _ = ctx.restore();
}

// ============================================================================
// Overlays
// ============================================================================

/// Draws the padded selection box and its four corner handles.
pub fn render_selection(ctx: &cairo::Context, stroke: &Stroke) {
    if let Some(padded) = selection_box(stroke) {
        render_selection_box(ctx, &padded);
    }
}

/// Selection chrome around an already padded box.
pub fn render_selection_box(ctx: &cairo::Context, padded: &Bounds) {
    let (x, y, w, h) = (padded.min_x, padded.min_y, padded.width(), padded.height());
    let _ = ctx.save();
    ctx.set_dash(&[], 0.0);

    color::SELECTION.with_alpha(0.08).apply(ctx);
    ctx.rectangle(x, y, w, h);
    let _ = ctx.fill();

    color::SELECTION.apply(ctx);
    ctx.set_line_width(1.5);
    ctx.rectangle(x, y, w, h);
    let _ = ctx.stroke();

    ctx.set_line_width(2.0);
    let half = HANDLE_SIZE / 2.0;
    for (cx, cy) in [(x, y), (x + w, y), (x, y + h), (x + w, y + h)] {
        ctx.rectangle(cx - half, cy - half, HANDLE_SIZE, HANDLE_SIZE);
        color::WHITE.apply(ctx);
        let _ = ctx.fill_preserve();
        color::SELECTION.apply(ctx);
        let _ = ctx.stroke();
    }
    let _ = ctx.restore();
}

/// Draws a symbol being sized, with a dashed guide box around it.
pub fn render_symbol_preview(ctx: &cairo::Context, preview: &SymbolPreview, font: &FontDescriptor) {
    let size = preview.size();
    let color = resolve_color(&preview.color).with_alpha((preview.opacity / 100.0).clamp(0.0, 1.0));
    render_text(ctx, preview.anchor(), &preview.glyph, color, size, font);

    let _ = ctx.save();
    color::SELECTION.apply(ctx);
    ctx.set_line_width(1.0);
    ctx.set_dash(&[4.0, 4.0], 0.0);
    ctx.rectangle(
        preview.start.x - 4.0,
        preview.start.y - 4.0,
        size + 8.0,
        size + 8.0,
    );
    let _ = ctx.stroke();
    let _ = ctx.restore();
}

/// Draws a rubber-band rectangle spanned by two corners.
pub fn render_rubber_band(ctx: &cairo::Context, start: Point, end: Point) {
    let area = Bounds::from_corners(start, end);
    let _ = ctx.save();
    color::SELECTION.with_alpha(0.08).apply(ctx);
    ctx.rectangle(area.min_x, area.min_y, area.width(), area.height());
    let _ = ctx.fill_preserve();
    color::SELECTION.apply(ctx);
    ctx.set_line_width(1.0);
    ctx.set_dash(&[4.0, 4.0], 0.0);
    let _ = ctx.stroke();
    let _ = ctx.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{StrokeDraft, StrokeId};

    fn surface(w: i32, h: i32) -> (cairo::ImageSurface, cairo::Context) {
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, w, h).unwrap();
        let ctx = cairo::Context::new(&surface).unwrap();
        (surface, ctx)
    }

    fn pixel(surface: &mut cairo::ImageSurface, x: usize, y: usize) -> [u8; 4] {
        surface.flush();
        let stride = surface.stride() as usize;
        let data = surface.data().unwrap();
        let i = y * stride + x * 4;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    #[test]
    fn page_base_without_background_is_white() {
        let (mut surf, ctx) = surface(50, 50);
        render_page_base(&ctx, 50.0, 50.0, false, GRID_SPACING);
        drop(ctx);
        // Away from grid lines and border.
        assert_eq!(pixel(&mut surf, 10, 10), [255, 255, 255, 255]);
    }

    #[test]
    fn page_base_with_background_leaves_interior_untouched() {
        let (mut surf, ctx) = surface(50, 50);
        render_page_base(&ctx, 50.0, 50.0, true, GRID_SPACING);
        drop(ctx);
        assert_eq!(pixel(&mut surf, 10, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn filled_rectangle_paints_interior() {
        let (mut surf, ctx) = surface(40, 40);
        render_shape(
            &ctx,
            ShapeType::Rectangle,
            Point::new(5.0, 5.0),
            Point::new(35.0, 35.0),
            color::BLACK,
            2.0,
            Some(Color::new(1.0, 0.0, 0.0, 1.0)),
        );
        drop(ctx);
        // ARGB32 is BGRA in memory on little-endian.
        let px = pixel(&mut surf, 20, 20);
        assert_eq!(px[3], 255);
        assert!(px[2] > 200 && px[1] < 30);
    }

    #[test]
    fn lone_freehand_point_draws_nothing() {
        let (mut surf, ctx) = surface(20, 20);
        render_freehand(&ctx, &[Point::new(10.0, 10.0)], color::BLACK, 6.0);
        drop(ctx);
        assert_eq!(pixel(&mut surf, 10, 10)[3], 0);
    }

    #[test]
    fn unknown_kinds_are_reported_once() {
        let (_surf, ctx) = surface(10, 10);
        let stroke = StrokeDraft::new(
            StrokeKind::Unrecognized("laser".into()),
            vec![Point::new(1.0, 1.0), Point::new(5.0, 5.0)],
            1,
        )
        .into_stroke(StrokeId::from("odd"), 0);
        let mut warnings = KindWarnings::new();
        let font = FontDescriptor::default();
        render_strokes(&ctx, [&stroke, &stroke], &font, &mut warnings);
        render_strokes(&ctx, [&stroke], &font, &mut warnings);
        assert_eq!(warnings.reported(), 1);
    }

    #[test]
    fn symbol_preview_geometry() {
        let preview = SymbolPreview {
            start: Point::new(10.0, 10.0),
            end: Point::new(15.0, 50.0),
            glyph: "★".into(),
            color: "#000000".into(),
            opacity: 100.0,
        };
        assert_eq!(preview.size(), 40.0);
        assert_eq!(preview.anchor(), Point::new(10.0, 42.0));
    }

    #[test]
    fn bad_colors_fall_back_to_black() {
        assert_eq!(resolve_color("not-a-color"), color::BLACK);
    }
}
