//! Geometry helpers shared by hit testing, rendering, and the interaction controller.
//!
//! This module provides:
//! - [`Bounds`]: axis-aligned boxes in document or device space
//! - [`ViewTransform`]: document ↔ device conversion (zoom and pan)
//! - Polyline simplification (Douglas–Peucker)
//! - Arrowhead geometry

use crate::draw::{Point, Stroke};

// ============================================================================
// Bounding Boxes
// ============================================================================

/// Axis-aligned bounding box described by its extremes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Builds the normalized box spanned by two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
    }

    /// Envelope of a point set, or `None` when the set is empty.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(first.x, first.y, first.x, first.y);
        for p in rest {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Axis-aligned overlap test; touching edges count as overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Returns a copy grown by `amount` on every side.
    pub fn expand(&self, amount: f64) -> Self {
        Self::new(
            self.min_x - amount,
            self.min_y - amount,
            self.max_x + amount,
            self.max_y + amount,
        )
    }

    pub fn union(&self, other: &Bounds) -> Self {
        Self::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }
}

// ============================================================================
// View Transform
// ============================================================================

/// Zoom/pan mapping from document coordinates to device pixels.
///
/// `device = document * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ViewTransform {
    pub const MIN_SCALE: f64 = 0.1;
    pub const MAX_SCALE: f64 = 8.0;

    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn with_scale(scale: f64) -> Self {
        Self {
            scale: scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE),
            ..Self::identity()
        }
    }

    pub fn to_device(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.offset_x,
            p.y * self.scale + self.offset_y,
        )
    }

    pub fn to_document(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset_x) / self.scale,
            (p.y - self.offset_y) / self.scale,
        )
    }

    /// Converts a stroke into device space, scaling its line width with it.
    pub fn stroke_to_device(&self, stroke: &Stroke) -> Stroke {
        let mut device = stroke.clone();
        device.points = stroke.points.iter().map(|p| self.to_device(*p)).collect();
        device.thickness = stroke.thickness * self.scale;
        device
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }
}

// ============================================================================
// Polyline Simplification
// ============================================================================

pub fn distance(a: Point, b: Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Distance from `p` to the segment `start`–`end` (projection clamped to the segment).
pub fn segment_distance(p: Point, start: Point, end: Point) -> f64 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return distance(p, start);
    }

    let t = (((p.x - start.x) * dx + (p.y - start.y) * dy) / len_sq).clamp(0.0, 1.0);
    distance(p, Point::new(start.x + t * dx, start.y + t * dy))
}

/// Reduces a polyline with the Douglas–Peucker algorithm.
///
/// Endpoints are always kept and the output never grows. Polylines with fewer
/// than three points are returned unchanged.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    // Explicit stack instead of recursion so very long strokes cannot overflow.
    let mut spans = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = spans.pop() {
        if last <= first + 1 {
            continue;
        }

        let mut farthest = first;
        let mut max_dist = 0.0;
        for (offset, p) in points[first + 1..last].iter().enumerate() {
            let dist = segment_distance(*p, points[first], points[last]);
            if dist > max_dist {
                max_dist = dist;
                farthest = first + 1 + offset;
            }
        }

        if max_dist > tolerance {
            keep[farthest] = true;
            spans.push((first, farthest));
            spans.push((farthest, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, kept)| kept.then_some(*p))
        .collect()
}

// ============================================================================
// Arrowhead Geometry
// ============================================================================

/// Spread between the shaft and each barb of an arrowhead.
pub const ARROWHEAD_SPREAD: f64 = std::f64::consts::PI / 7.0;

/// Computes the two barb endpoints of an arrowhead sitting at `tip`.
///
/// The head points along the direction `tail → tip`; barb length grows with the
/// stroke width (`12 + thickness`).
pub fn arrowhead(tail: Point, tip: Point, thickness: f64) -> [Point; 2] {
    let angle = (tip.y - tail.y).atan2(tip.x - tail.x);
    let length = 12.0 + thickness;
    [
        Point::new(
            tip.x - length * (angle - ARROWHEAD_SPREAD).cos(),
            tip.y - length * (angle - ARROWHEAD_SPREAD).sin(),
        ),
        Point::new(
            tip.x - length * (angle + ARROWHEAD_SPREAD).cos(),
            tip.y - length * (angle + ARROWHEAD_SPREAD).sin(),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn simplify_keeps_endpoints_and_drops_collinear_points() {
        let line = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)]);
        let simplified = simplify(&line, 0.5);
        assert_eq!(simplified, pts(&[(0.0, 0.0), (4.0, 0.0)]));
    }

    #[test]
    fn simplify_retains_corners_above_tolerance() {
        let corner = pts(&[(0.0, 0.0), (5.0, 0.1), (10.0, 0.0), (10.0, 5.0), (10.0, 10.0)]);
        let simplified = simplify(&corner, 1.0);
        assert_eq!(simplified, pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]));
    }

    #[test]
    fn simplify_with_zero_tolerance_keeps_every_bend() {
        let zigzag = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0), (4.0, 0.0)]);
        assert_eq!(simplify(&zigzag, 0.0), zigzag);
    }

    #[test]
    fn simplify_leaves_short_polylines_untouched() {
        let two = pts(&[(3.0, 4.0), (9.0, 1.0)]);
        assert_eq!(simplify(&two, 100.0), two);
        assert!(simplify(&[], 1.0).is_empty());
    }

    #[test]
    fn simplify_preserves_endpoints_for_noisy_input() {
        let noisy: Vec<Point> = (0..200)
            .map(|i| Point::new(i as f64, ((i * 37) % 11) as f64 * 0.3))
            .collect();
        for tolerance in [0.0, 0.5, 2.0, 50.0] {
            let simplified = simplify(&noisy, tolerance);
            assert_eq!(simplified.first(), noisy.first());
            assert_eq!(simplified.last(), noisy.last());
            assert!(simplified.len() <= noisy.len());
        }
    }

    #[test]
    fn segment_distance_clamps_to_segment_ends() {
        let d = segment_distance(Point::new(-3.0, 4.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-9);
        let degenerate =
            segment_distance(Point::new(3.0, 4.0), Point::new(0.0, 0.0), Point::new(0.0, 0.0));
        assert!((degenerate - 5.0).abs() < 1e-9);
    }

    #[test]
    fn bounds_overlap_and_containment() {
        let a = Bounds::from_corners(Point::new(10.0, 10.0), Point::new(0.0, 0.0));
        assert_eq!(a, Bounds::new(0.0, 0.0, 10.0, 10.0));
        assert!(a.contains(Point::new(10.0, 0.0)));
        assert!(a.overlaps(&Bounds::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!a.overlaps(&Bounds::new(10.5, 0.0, 20.0, 5.0)));
        assert_eq!(a.expand(5.0), Bounds::new(-5.0, -5.0, 15.0, 15.0));
    }

    #[test]
    fn view_transform_round_trips_points() {
        let transform = ViewTransform {
            scale: 2.0,
            offset_x: 30.0,
            offset_y: -10.0,
        };
        let p = Point::new(12.5, 7.0);
        let device = transform.to_device(p);
        assert_eq!(device, Point::new(55.0, 4.0));
        assert_eq!(transform.to_document(device), p);
    }

    #[test]
    fn arrowhead_barbs_trail_the_tip() {
        let [left, right] = arrowhead(Point::new(0.0, 0.0), Point::new(100.0, 0.0), 3.0);
        assert!(left.x < 100.0 && right.x < 100.0);
        assert!((left.y + right.y).abs() < 1e-9);
        assert!((distance(left, Point::new(100.0, 0.0)) - 15.0).abs() < 1e-9);
    }
}
