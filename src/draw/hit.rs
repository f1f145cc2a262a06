//! Pointer hit testing and rubber-band membership.

use super::bounds::bounds_of;
use super::stroke::{PenTool, Point, Stroke, StrokeKind};
use crate::util::{self, Bounds};

/// Returns the topmost stroke under `point`.
///
/// Strokes are scanned from last to first (insertion order is z-order), and the
/// first match wins regardless of how close a lower stroke might be.
pub fn hit_test<'a, I>(point: Point, radius: f64, strokes: I) -> Option<&'a Stroke>
where
    I: IntoIterator<Item = &'a Stroke>,
    I::IntoIter: DoubleEndedIterator,
{
    strokes
        .into_iter()
        .rev()
        .find(|stroke| stroke_contains(stroke, point, radius))
}

/// Whether `point` touches `stroke` within `radius`.
///
/// Freehand strokes are matched against their recorded points only, not the
/// segments between them. Eraser paths are never hit.
pub fn stroke_contains(stroke: &Stroke, point: Point, radius: f64) -> bool {
    match &stroke.kind {
        StrokeKind::Freehand {
            tool: PenTool::Pen | PenTool::Highlighter,
        } => {
            let reach = radius + stroke.thickness / 2.0;
            stroke
                .points
                .iter()
                .any(|p| util::distance(point, *p) <= reach)
        }
        StrokeKind::Freehand {
            tool: PenTool::Eraser,
        } => false,
        StrokeKind::Shape { .. } | StrokeKind::Text { .. } => {
            bounds_of(stroke).is_some_and(|b| b.expand(radius).contains(point))
        }
        StrokeKind::Unrecognized(_) => false,
    }
}

/// Collects every stroke touched by the rectangle spanned by `start` and `end`.
///
/// A stroke qualifies when any freehand point lies inside, when its bounds'
/// center lies inside, or when its bounds overlap the rectangle. Results keep
/// insertion order.
pub fn rect_select<'a, I>(start: Point, end: Point, strokes: I) -> Vec<&'a Stroke>
where
    I: IntoIterator<Item = &'a Stroke>,
{
    let area = Bounds::from_corners(start, end);
    strokes
        .into_iter()
        .filter(|stroke| touches_rect(stroke, &area))
        .collect()
}

fn touches_rect(stroke: &Stroke, area: &Bounds) -> bool {
    if stroke.kind.is_freehand() && stroke.points.iter().any(|p| area.contains(*p)) {
        return true;
    }
    bounds_of(stroke).is_some_and(|b| area.contains(b.center()) || area.overlaps(&b))
}
