//! Font descriptor for text and symbol strokes.

/// Font family, weight and style used by every text stroke.
///
/// Text strokes persist only a payload and a thickness; family, weight and
/// style come from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    /// Font family name (e.g., "Sans", "Noto Sans")
    pub family: String,

    /// Font weight ("normal", "bold", "light" or numeric 100-900)
    pub weight: String,

    /// Font style ("normal", "italic", "oblique")
    pub style: String,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            family: "Sans".to_string(),
            weight: "normal".to_string(),
            style: "normal".to_string(),
        }
    }
}

impl FontDescriptor {
    pub fn new(family: String, weight: String, style: String) -> Self {
        Self {
            family,
            weight,
            style,
        }
    }

    /// Converts to a Pango description string sized in pixels, e.g. `"Sans Bold 24px"`.
    pub fn to_pango_string(&self, size: f64) -> String {
        let mut parts = vec![self.family.clone()];
        if !self.style.eq_ignore_ascii_case("normal") {
            parts.push(capitalize_first(&self.style));
        }
        if !self.weight.eq_ignore_ascii_case("normal") {
            parts.push(capitalize_first(&self.weight));
        }
        parts.push(format!("{}px", size.round().max(1.0) as i32));
        parts.join(" ")
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}
