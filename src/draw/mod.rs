//! Stroke model, geometry and Cairo rendering.
//!
//! - [`Stroke`] and [`StrokeKind`]: the persisted annotation unit
//! - [`StrokeStore`]: authoritative strokes, selection, history and clipboard
//! - [`bounds`] / [`hit`]: selection geometry derived from stroke points
//! - [`render`]: Cairo drawing for strokes, page chrome and previews

pub mod background;
pub mod bounds;
pub mod color;
pub mod dirty;
pub mod font;
pub mod hit;
pub mod render;
pub mod store;
pub mod stroke;

pub use background::BackgroundLayer;
pub use bounds::{Corner, bounds_of, resize_corner, resize_stroke};
pub use color::Color;
pub use dirty::FrameScheduler;
pub use font::FontDescriptor;
pub use hit::{hit_test, rect_select};
pub use render::SymbolPreview;
pub use store::{StrokePatch, StrokeStore};
pub use stroke::{PenTool, Point, ShapeType, Stroke, StrokeDraft, StrokeId, StrokeKind};
