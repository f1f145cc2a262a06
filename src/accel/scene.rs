use crate::draw::render::{self, KindWarnings, SymbolPreview};
use crate::draw::{FontDescriptor, Point, Stroke, StrokeId};

/// Everything an accelerator draws, in device coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub width: i32,
    pub height: i32,
    pub strokes: Vec<Stroke>,
    pub selection: Vec<StrokeId>,
    pub transient: Option<Stroke>,
    pub shape_preview: Option<Stroke>,
    pub symbol_preview: Option<SymbolPreview>,
    pub rubber_band: Option<(Point, Point)>,
}

impl Scene {
    pub fn is_selected(&self, id: &StrokeId) -> bool {
        self.selection.contains(id)
    }

    /// Page base: white and grid unless a background is shown, border always.
    pub(crate) fn render_base(&self, ctx: &cairo::Context, has_background: bool) {
        render::render_page_base(
            ctx,
            self.width as f64,
            self.height as f64,
            has_background,
            render::GRID_SPACING,
        );
    }

    pub(crate) fn render_committed(
        &self,
        ctx: &cairo::Context,
        font: &FontDescriptor,
        warnings: &mut KindWarnings,
    ) {
        render::render_strokes(ctx, &self.strokes, font, warnings);
    }

    /// In-progress stroke, previews, rubber band, then selection chrome.
    pub(crate) fn render_overlays(&self, ctx: &cairo::Context, font: &FontDescriptor) {
        if let Some(stroke) = &self.transient {
            render::render_stroke(ctx, stroke, font);
        }
        if let Some(stroke) = &self.shape_preview {
            render::render_stroke(ctx, stroke, font);
        }
        if let Some(preview) = &self.symbol_preview {
            render::render_symbol_preview(ctx, preview, font);
        }
        if let Some((start, end)) = self.rubber_band {
            render::render_rubber_band(ctx, start, end);
        }
        for stroke in self.strokes.iter().filter(|s| self.is_selected(&s.id)) {
            render::render_selection(ctx, stroke);
        }
    }
}
