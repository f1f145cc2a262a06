//! RGBA color type, CSS color parsing, and the palette used for page chrome.

/// Represents an RGBA color with floating-point components.
///
/// All components are in the range 0.0 (minimum) to 1.0 (maximum).
///
/// # Examples
///
/// ```
/// use pagescriber::draw::Color;
/// let violet = Color::parse_css("#8b5cf6").unwrap();
/// assert!((violet.r - 139.0 / 255.0).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a color from 0-255 channel values.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0, 1.0)
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.
    pub fn parse_css(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Some(hex) = input.strip_prefix('#') {
            return parse_hex(hex);
        }

        let lower = input.to_ascii_lowercase();
        let body = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let channel = |s: &str| s.parse::<f64>().ok().map(|v| (v / 255.0).clamp(0.0, 1.0));
        match parts.as_slice() {
            [r, g, b] => Some(Self::new(channel(r)?, channel(g)?, channel(b)?, 1.0)),
            [r, g, b, a] => Some(Self::new(
                channel(r)?,
                channel(g)?,
                channel(b)?,
                a.parse::<f64>().ok()?.clamp(0.0, 1.0),
            )),
            _ => None,
        }
    }

    /// Lowercase `#rrggbb` form (alpha is dropped).
    pub fn to_hex(&self) -> String {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    /// Same color with its alpha multiplied by `factor`.
    pub fn with_alpha(self, factor: f64) -> Self {
        Self {
            a: self.a * factor.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn apply(&self, ctx: &cairo::Context) {
        ctx.set_source_rgba(self.r, self.g, self.b, self.a);
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::from_rgb8(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Color::from_rgb8(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::from_rgb8(byte(0)?, byte(2)?, byte(4)?).with_alpha(byte(6)? as f64 / 255.0)),
        _ => None,
    }
}

// ============================================================================
// Predefined Color Constants
// ============================================================================

pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// Selection chrome accent (#8b5cf6)
pub const SELECTION: Color = Color::new(139.0 / 255.0, 92.0 / 255.0, 246.0 / 255.0, 1.0);

/// Background grid lines (#e4e4e7)
pub const GRID: Color = Color::new(228.0 / 255.0, 228.0 / 255.0, 231.0 / 255.0, 1.0);

/// Page border (#d4d4d8)
pub const PAGE_BORDER: Color = Color::new(212.0 / 255.0, 212.0 / 255.0, 216.0 / 255.0, 1.0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Color::parse_css("#fff"), Some(WHITE));
        assert_eq!(Color::parse_css("#000000"), Some(BLACK));
        let translucent = Color::parse_css("#ff000080").unwrap();
        assert!((translucent.a - 128.0 / 255.0).abs() < 1e-9);
        assert!(Color::parse_css("#12345").is_none());
        assert!(Color::parse_css("#gggggg").is_none());
    }

    #[test]
    fn parses_functional_forms() {
        let c = Color::parse_css("rgba(139, 92, 246, 0.08)").unwrap();
        assert_eq!(c.to_hex(), "#8b5cf6");
        assert!((c.a - 0.08).abs() < 1e-9);
        assert_eq!(Color::parse_css("RGB(255,255,255)"), Some(WHITE));
        assert!(Color::parse_css("rgb(1,2)").is_none());
        assert!(Color::parse_css("tomato").is_none());
    }

    #[test]
    fn hex_output_round_trips() {
        let color = Color::parse_css("#3b82f6").unwrap();
        assert_eq!(color.to_hex(), "#3b82f6");
        assert_eq!(SELECTION.to_hex(), "#8b5cf6");
    }
}
