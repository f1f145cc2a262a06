//! Bounding boxes, resize handles and resize mapping for strokes.
//!
//! Bounds are always derived from `points` and `kind`; nothing here is cached.

use super::stroke::{Point, Stroke, StrokeKind};
use crate::util::Bounds;

/// Padding between a stroke's bounds and its selection box.
pub const SELECTION_PADDING: f64 = 5.0;

/// Half the side of the square grab area centered on each selection corner.
pub const HANDLE_HALF_SIZE: f64 = 7.0;

/// Per-glyph width factor for literal text.
const TEXT_GLYPH_WIDTH: f64 = 0.6;

/// Per-glyph width factor for a lone non-ASCII symbol (stars, arrows, emoji).
const SYMBOL_GLYPH_WIDTH: f64 = 1.0;

/// Smallest width/height a resize may produce.
const MIN_RESIZE_EXTENT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn point_of(self, bounds: &Bounds) -> Point {
        match self {
            Corner::TopLeft => Point::new(bounds.min_x, bounds.min_y),
            Corner::TopRight => Point::new(bounds.max_x, bounds.min_y),
            Corner::BottomLeft => Point::new(bounds.min_x, bounds.max_y),
            Corner::BottomRight => Point::new(bounds.max_x, bounds.max_y),
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Corner::TopLeft => "tl",
            Corner::TopRight => "tr",
            Corner::BottomLeft => "bl",
            Corner::BottomRight => "br",
        }
    }
}

/// Returns true when the payload is a single non-ASCII glyph.
pub fn is_symbol(payload: &str) -> bool {
    let mut chars = payload.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if !c.is_ascii())
}

/// Estimated advance width of a text payload at `font_size`.
///
/// A heuristic rather than real layout; selection boxes and resize handles
/// are built from it.
pub fn text_width(payload: &str, font_size: f64) -> f64 {
    if is_symbol(payload) {
        font_size * SYMBOL_GLYPH_WIDTH
    } else {
        payload.chars().count() as f64 * font_size * TEXT_GLYPH_WIDTH
    }
}

/// Computes the document-space bounds of a stroke, or `None` when it has no geometry.
pub fn bounds_of(stroke: &Stroke) -> Option<Bounds> {
    match &stroke.kind {
        StrokeKind::Freehand { .. } => Bounds::enclosing(&stroke.points),
        StrokeKind::Shape { .. } => match stroke.points.as_slice() {
            [] => None,
            [only] => Some(Bounds::from_corners(*only, *only)),
            [a, b, ..] => Some(Bounds::from_corners(*a, *b)),
        },
        StrokeKind::Text { payload } => {
            let anchor = stroke.points.first()?;
            let font_size = stroke.font_size();
            Some(Bounds::new(
                anchor.x,
                anchor.y - font_size,
                anchor.x + text_width(payload, font_size),
                anchor.y,
            ))
        }
        StrokeKind::Unrecognized(_) => None,
    }
}

/// Box drawn around a selected stroke (its bounds plus padding).
pub fn selection_box(stroke: &Stroke) -> Option<Bounds> {
    bounds_of(stroke).map(|b| b.expand(SELECTION_PADDING))
}

/// Returns which selection corner handle, if any, lies under `point`.
///
/// Each handle is a 14×14 square centered on a corner of the padded bounds.
pub fn resize_corner(point: Point, stroke: &Stroke) -> Option<Corner> {
    let padded = selection_box(stroke)?;
    Corner::ALL.into_iter().find(|corner| {
        let c = corner.point_of(&padded);
        (point.x - c.x).abs() <= HANDLE_HALF_SIZE && (point.y - c.y).abs() <= HANDLE_HALF_SIZE
    })
}

/// Produces a resized copy of `original` whose `corner` has moved to `target`.
///
/// The opposite corner stays fixed. Points are mapped proportionally from the
/// old bounds into the new ones; text scales its width (and so its font size)
/// by the height ratio instead.
pub fn resize_stroke(original: &Stroke, corner: Corner, target: Point) -> Stroke {
    let mut resized = original.clone();
    let Some(old) = bounds_of(original) else {
        return resized;
    };

    let fixed = corner.opposite().point_of(&old);
    let mut new = Bounds::from_corners(fixed, target);
    if new.width() < MIN_RESIZE_EXTENT {
        new.max_x = new.min_x + MIN_RESIZE_EXTENT;
    }
    if new.height() < MIN_RESIZE_EXTENT {
        new.max_y = new.min_y + MIN_RESIZE_EXTENT;
    }

    if let StrokeKind::Text { .. } = original.kind {
        let ratio = if old.height() > 0.0 {
            new.height() / old.height()
        } else {
            1.0
        };
        resized.thickness = (original.thickness * ratio).max(0.1);
        let font_size = resized.font_size();
        if let Some(anchor) = resized.points.first_mut() {
            *anchor = Point::new(new.min_x, new.min_y + font_size);
        }
        return resized;
    }

    let scale = |value: f64, old_min: f64, old_extent: f64, new_min: f64, new_extent: f64| {
        if old_extent > 0.0 {
            new_min + (value - old_min) * new_extent / old_extent
        } else {
            new_min + (value - old_min)
        }
    };
    for p in &mut resized.points {
        *p = Point::new(
            scale(p.x, old.min_x, old.width(), new.min_x, new.width()),
            scale(p.y, old.min_y, old.height(), new.min_y, new.height()),
        );
    }
    resized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{ShapeType, StrokeDraft, StrokeId};

    fn stroke(kind: StrokeKind, points: &[(f64, f64)], thickness: f64) -> Stroke {
        let mut draft = StrokeDraft::new(
            kind,
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            1,
        );
        draft.thickness = thickness;
        draft.into_stroke(StrokeId::generate(), 0)
    }

    #[test]
    fn rectangle_bounds_are_the_corner_envelope() {
        let rect = stroke(
            StrokeKind::shape(ShapeType::Rectangle),
            &[(100.0, 50.0), (0.0, 0.0)],
            2.0,
        );
        assert_eq!(bounds_of(&rect), Some(Bounds::new(0.0, 0.0, 100.0, 50.0)));
    }

    #[test]
    fn top_right_handle_includes_padding() {
        let rect = stroke(
            StrokeKind::shape(ShapeType::Rectangle),
            &[(0.0, 0.0), (100.0, 50.0)],
            2.0,
        );
        assert_eq!(resize_corner(Point::new(102.0, -2.0), &rect), Some(Corner::TopRight));
        assert_eq!(resize_corner(Point::new(-5.0, 55.0), &rect), Some(Corner::BottomLeft));
        assert_eq!(resize_corner(Point::new(50.0, 25.0), &rect), None);
        assert_eq!(resize_corner(Point::new(113.0, -5.0), &rect), None);
    }

    #[test]
    fn text_bounds_follow_glyph_heuristic() {
        let text = stroke(StrokeKind::text("Hello"), &[(10.0, 40.0)], 2.0);
        // font = max(14, 8) = 14; width = 5 * 14 * 0.6 = 42
        let b = bounds_of(&text).unwrap();
        assert_eq!(b.min_x, 10.0);
        assert_eq!(b.min_y, 26.0);
        assert_eq!(b.max_y, 40.0);
        assert!((b.max_x - 52.0).abs() < 1e-9);

        let symbol = stroke(StrokeKind::text("★"), &[(0.0, 100.0)], 10.0);
        assert_eq!(bounds_of(&symbol), Some(Bounds::new(0.0, 60.0, 40.0, 100.0)));
    }

    #[test]
    fn degenerate_strokes_have_no_bounds() {
        assert!(bounds_of(&stroke(StrokeKind::pen(), &[], 2.0)).is_none());
        assert!(bounds_of(&stroke(StrokeKind::text("x"), &[], 2.0)).is_none());
        let odd = stroke(
            StrokeKind::Unrecognized("laser".into()),
            &[(1.0, 1.0)],
            2.0,
        );
        assert!(bounds_of(&odd).is_none());
    }

    #[test]
    fn resize_keeps_opposite_corner_fixed() {
        let rect = stroke(
            StrokeKind::shape(ShapeType::Rectangle),
            &[(0.0, 0.0), (100.0, 50.0)],
            2.0,
        );
        let resized = resize_stroke(&rect, Corner::BottomRight, Point::new(200.0, 100.0));
        assert_eq!(bounds_of(&resized), Some(Bounds::new(0.0, 0.0, 200.0, 100.0)));

        let from_tl = resize_stroke(&rect, Corner::TopLeft, Point::new(50.0, 25.0));
        assert_eq!(bounds_of(&from_tl), Some(Bounds::new(50.0, 25.0, 100.0, 50.0)));
    }

    #[test]
    fn resize_scales_freehand_points_proportionally() {
        let path = stroke(
            StrokeKind::pen(),
            &[(0.0, 0.0), (5.0, 10.0), (10.0, 0.0)],
            2.0,
        );
        let resized = resize_stroke(&path, Corner::BottomRight, Point::new(20.0, 5.0));
        assert_eq!(
            resized.points,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 5.0), Point::new(20.0, 0.0)]
        );
    }

    #[test]
    fn resize_text_scales_font_with_height() {
        let text = stroke(StrokeKind::text("Hi"), &[(0.0, 40.0)], 10.0);
        // bounds: y 0..40 (font 40)
        let resized = resize_stroke(&text, Corner::BottomRight, Point::new(100.0, 80.0));
        assert!((resized.thickness - 20.0).abs() < 1e-9);
        assert_eq!(resized.points[0], Point::new(0.0, 80.0));
    }
}
