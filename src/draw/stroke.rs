//! Stroke definitions for page annotations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A position in document (unscaled) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Opaque stroke identifier. Fresh ids are random and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeId(String);

impl StrokeId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StrokeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for StrokeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Freehand drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenTool {
    Pen,
    Highlighter,
    Eraser,
}

/// Geometric shape variants. Every shape is defined by two opposite corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Rectangle,
    Circle,
    Triangle,
    Line,
    Arrow,
    Star,
    Diamond,
    Heart,
}

impl ShapeType {
    pub const ALL: [ShapeType; 8] = [
        ShapeType::Rectangle,
        ShapeType::Circle,
        ShapeType::Triangle,
        ShapeType::Line,
        ShapeType::Arrow,
        ShapeType::Star,
        ShapeType::Diamond,
        ShapeType::Heart,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Circle => "circle",
            ShapeType::Triangle => "triangle",
            ShapeType::Line => "line",
            ShapeType::Arrow => "arrow",
            ShapeType::Star => "star",
            ShapeType::Diamond => "diamond",
            ShapeType::Heart => "heart",
        }
    }

    /// Whether the shape encloses an area that can take a fill color.
    pub fn is_fillable(self) -> bool {
        !matches!(self, ShapeType::Line | ShapeType::Arrow)
    }
}

impl FromStr for ShapeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeType::ALL
            .into_iter()
            .find(|shape| shape.as_str() == s)
            .ok_or(())
    }
}

/// What a stroke is, and therefore how its `points` are interpreted.
///
/// Persisted as a tagged string (`"pen"`, `"shape-star"`, `"text:Hello"`).
/// Tags this build does not understand are kept verbatim in
/// [`StrokeKind::Unrecognized`] so they survive a load/save cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeKind {
    /// Polyline through every point.
    Freehand { tool: PenTool },
    /// `points[0]` and `points[1]` are opposite corners of the bounding box.
    Shape { shape: ShapeType },
    /// `points[0]` is the baseline anchor.
    Text { payload: String },
    Unrecognized(String),
}

const SHAPE_PREFIX: &str = "shape-";
const TEXT_PREFIX: &str = "text:";

impl StrokeKind {
    pub fn pen() -> Self {
        StrokeKind::Freehand {
            tool: PenTool::Pen,
        }
    }

    pub fn shape(shape: ShapeType) -> Self {
        StrokeKind::Shape { shape }
    }

    pub fn text(payload: impl Into<String>) -> Self {
        StrokeKind::Text {
            payload: payload.into(),
        }
    }

    pub fn parse_tag(tag: &str) -> Self {
        match tag {
            "pen" => StrokeKind::Freehand {
                tool: PenTool::Pen,
            },
            "highlighter" => StrokeKind::Freehand {
                tool: PenTool::Highlighter,
            },
            "eraser" => StrokeKind::Freehand {
                tool: PenTool::Eraser,
            },
            _ => {
                if let Some(payload) = tag.strip_prefix(TEXT_PREFIX) {
                    StrokeKind::text(payload)
                } else if let Some(shape) = tag
                    .strip_prefix(SHAPE_PREFIX)
                    .and_then(|name| name.parse::<ShapeType>().ok())
                {
                    StrokeKind::Shape { shape }
                } else {
                    StrokeKind::Unrecognized(tag.to_string())
                }
            }
        }
    }

    pub fn to_tag(&self) -> String {
        match self {
            StrokeKind::Freehand { tool } => match tool {
                PenTool::Pen => "pen".to_string(),
                PenTool::Highlighter => "highlighter".to_string(),
                PenTool::Eraser => "eraser".to_string(),
            },
            StrokeKind::Shape { shape } => format!("{SHAPE_PREFIX}{}", shape.as_str()),
            StrokeKind::Text { payload } => format!("{TEXT_PREFIX}{payload}"),
            StrokeKind::Unrecognized(tag) => tag.clone(),
        }
    }

    pub fn is_freehand(&self) -> bool {
        matches!(self, StrokeKind::Freehand { .. })
    }
}

impl Serialize for StrokeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_tag())
    }
}

impl<'de> Deserialize<'de> for StrokeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(StrokeKind::parse_tag(&tag))
    }
}

/// One persisted annotation: a freehand path, a shape, or a text placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: StrokeId,
    pub points: Vec<Point>,
    /// CSS color string (`#rrggbb`, `#rgb`, `rgba(...)`).
    pub color: String,
    pub thickness: f64,
    /// Percent, 0–100.
    pub opacity: f64,
    /// 1-based page number that owns the stroke.
    pub page_id: u32,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(rename = "tool")]
    pub kind: StrokeKind,
}

impl Stroke {
    /// Text size derived from the stroke width; text strokes have no separate font field.
    pub fn font_size(&self) -> f64 {
        (self.thickness * 4.0).max(14.0)
    }

    pub fn alpha(&self) -> f64 {
        (self.opacity / 100.0).clamp(0.0, 1.0)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        for p in &mut self.points {
            *p = p.offset(dx, dy);
        }
    }
}

/// Everything needed to create a stroke; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDraft {
    pub kind: StrokeKind,
    pub points: Vec<Point>,
    pub color: String,
    pub thickness: f64,
    pub opacity: f64,
    pub page_id: u32,
    pub fill_color: Option<String>,
    pub background_color: Option<String>,
}

impl StrokeDraft {
    pub fn new(kind: StrokeKind, points: Vec<Point>, page_id: u32) -> Self {
        Self {
            kind,
            points,
            color: "#000000".to_string(),
            thickness: 2.0,
            opacity: 100.0,
            page_id,
            fill_color: None,
            background_color: None,
        }
    }

    pub fn with_style(mut self, color: impl Into<String>, thickness: f64, opacity: f64) -> Self {
        self.color = color.into();
        self.thickness = thickness;
        self.opacity = opacity;
        self
    }

    pub fn into_stroke(self, id: StrokeId, timestamp: i64) -> Stroke {
        Stroke {
            id,
            points: self.points,
            color: self.color,
            thickness: self.thickness,
            opacity: self.opacity,
            page_id: self.page_id,
            timestamp,
            fill_color: self.fill_color,
            background_color: self.background_color,
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_parse_into_closed_variants() {
        assert_eq!(StrokeKind::parse_tag("pen"), StrokeKind::pen());
        assert_eq!(
            StrokeKind::parse_tag("highlighter"),
            StrokeKind::Freehand {
                tool: PenTool::Highlighter
            }
        );
        assert_eq!(
            StrokeKind::parse_tag("shape-heart"),
            StrokeKind::shape(ShapeType::Heart)
        );
        assert_eq!(
            StrokeKind::parse_tag("text:a:b"),
            StrokeKind::text("a:b")
        );
        assert_eq!(
            StrokeKind::parse_tag("shape-hexagon"),
            StrokeKind::Unrecognized("shape-hexagon".to_string())
        );
    }

    #[test]
    fn stroke_json_uses_camel_case_and_tool_tag() {
        let mut stroke = StrokeDraft::new(
            StrokeKind::shape(ShapeType::Star),
            vec![Point::new(1.0, 2.0), Point::new(3.0, 4.5)],
            2,
        )
        .into_stroke(StrokeId::from("s-1"), 1_700_000_000_000);
        stroke.fill_color = Some("#ff0000".to_string());

        let json = serde_json::to_value(&stroke).unwrap();
        assert_eq!(json["tool"], "shape-star");
        assert_eq!(json["pageId"], 2);
        assert_eq!(json["fillColor"], "#ff0000");
        assert!(json.get("backgroundColor").is_none());

        let back: Stroke = serde_json::from_value(json).unwrap();
        assert_eq!(back, stroke);
    }

    #[test]
    fn unknown_kind_survives_round_trip() {
        let raw = r##"{"id":"x","points":[{"x":1.0,"y":1.0}],"color":"#000","thickness":2.0,
            "opacity":100.0,"pageId":1,"timestamp":5,"tool":"laser-pointer"}"##;
        let stroke: Stroke = serde_json::from_str(raw).unwrap();
        assert_eq!(
            stroke.kind,
            StrokeKind::Unrecognized("laser-pointer".to_string())
        );
        let again = serde_json::to_value(&stroke).unwrap();
        assert_eq!(again["tool"], "laser-pointer");
    }

    #[test]
    fn font_size_has_a_floor() {
        let mut stroke = StrokeDraft::new(StrokeKind::text("hi"), vec![Point::new(0.0, 0.0)], 1)
            .into_stroke(StrokeId::generate(), 0);
        stroke.thickness = 2.0;
        assert_eq!(stroke.font_size(), 14.0);
        stroke.thickness = 10.0;
        assert_eq!(stroke.font_size(), 40.0);
    }
}
