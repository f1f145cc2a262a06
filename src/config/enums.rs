//! Configuration enum types.

use crate::draw::Color;
use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tool that is active when a session starts.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StartTool {
    Select,
    Pen,
    Highlighter,
    Eraser,
    Text,
    Symbol,
    Fill,
    Pan,
}

/// Color specification - either a named/CSS color or RGB values.
///
/// # Examples
/// ```toml
/// # Named color
/// default_color = "red"
///
/// # CSS hex string
/// default_color = "#1d4ed8"
///
/// # Custom RGB color (0-255 per component)
/// default_color = [255, 128, 0]  # Orange
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(untagged)]
pub enum ColorSpec {
    /// Named color (red, green, blue, yellow, orange, pink, purple, white, black)
    /// or any CSS color string understood by the renderer
    Name(String),
    /// RGB color as [red, green, blue] where each component is 0-255
    Rgb([u8; 3]),
}

impl ColorSpec {
    /// Resolves the specification to a color.
    ///
    /// Unknown names fall back to red with a warning.
    pub fn to_color(&self) -> Color {
        match self {
            ColorSpec::Name(name) => named_color(name)
                .or_else(|| Color::parse_css(name))
                .unwrap_or_else(|| {
                    warn!("Unknown color '{}', using red", name);
                    Color::from_rgb8(0xef, 0x44, 0x44)
                }),
            ColorSpec::Rgb([r, g, b]) => Color::from_rgb8(*r, *g, *b),
        }
    }

    /// The `#rrggbb` string strokes carry.
    pub fn to_hex(&self) -> String {
        self.to_color().to_hex()
    }
}

fn named_color(name: &str) -> Option<Color> {
    let rgb = match name.trim().to_lowercase().as_str() {
        "red" => (0xef, 0x44, 0x44),
        "green" => (0x22, 0xc5, 0x5e),
        "blue" => (0x3b, 0x82, 0xf6),
        "yellow" => (0xea, 0xb3, 0x08),
        "orange" => (0xf9, 0x73, 0x16),
        "pink" => (0xec, 0x48, 0x99),
        "purple" => (0x8b, 0x5c, 0xf6),
        "white" => (0xff, 0xff, 0xff),
        "black" => (0x00, 0x00, 0x00),
        _ => return None,
    };
    Some(Color::from_rgb8(rgb.0, rgb.1, rgb.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_css_colors_resolve() {
        assert_eq!(ColorSpec::Name("Red".into()).to_hex(), "#ef4444");
        assert_eq!(ColorSpec::Name("#1d4ed8".into()).to_hex(), "#1d4ed8");
        assert_eq!(ColorSpec::Rgb([255, 128, 0]).to_hex(), "#ff8000");
    }

    #[test]
    fn unknown_color_falls_back_to_red() {
        assert_eq!(ColorSpec::Name("chartreuse-ish".into()).to_hex(), "#ef4444");
    }
}
