//! Configuration type definitions.

use super::enums::{ColorSpec, StartTool};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Drawing-related settings.
///
/// Controls the appearance of new strokes when a session first opens.
/// Thickness can be changed at runtime using keybindings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DrawingConfig {
    /// Default pen color - a named color (red, green, blue, yellow, orange, pink, purple,
    /// white, black), a CSS string like `"#1d4ed8"`, or an RGB array like `[255, 0, 0]`
    #[serde(default = "default_color")]
    pub default_color: ColorSpec,

    /// Default pen thickness in document units (valid range: 1.0 - 50.0)
    #[serde(default = "default_thickness")]
    pub default_thickness: f64,

    /// Opacity of pen and shape strokes, 0-100
    #[serde(default = "default_opacity")]
    pub default_opacity: f64,

    /// Opacity of highlighter strokes, 0-100
    #[serde(default = "default_highlighter_opacity")]
    pub highlighter_opacity: f64,

    /// Color applied by the fill tool
    #[serde(default = "default_fill_color")]
    pub fill_color: ColorSpec,

    /// Font size for the text tool (valid range: 8.0 - 72.0)
    #[serde(default = "default_font_size")]
    pub default_font_size: f64,

    /// Glyph placed by the symbol tool
    #[serde(default = "default_symbol")]
    pub default_symbol: String,

    /// Font family name for text rendering (e.g., "Sans", "Monospace", "JetBrains Mono")
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Font weight (e.g., "normal", "bold", "light", 400, 700)
    #[serde(default = "default_font_weight")]
    pub font_weight: String,

    /// Font style (e.g., "normal", "italic", "oblique")
    #[serde(default = "default_font_style")]
    pub font_style: String,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            default_color: default_color(),
            default_thickness: default_thickness(),
            default_opacity: default_opacity(),
            highlighter_opacity: default_highlighter_opacity(),
            fill_color: default_fill_color(),
            default_font_size: default_font_size(),
            default_symbol: default_symbol(),
            font_family: default_font_family(),
            font_weight: default_font_weight(),
            font_style: default_font_style(),
        }
    }
}

/// Pointer interaction tuning.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InteractionConfig {
    /// Tool active at startup
    #[serde(default = "default_start_tool")]
    pub default_tool: StartTool,

    /// Pick radius around the pointer, in document units (valid range: 0.0 - 50.0)
    #[serde(default = "default_hit_radius")]
    pub hit_radius: f64,

    /// Douglas-Peucker tolerance for finished freehand strokes
    #[serde(default = "default_simplify_tolerance")]
    pub simplify_tolerance: f64,

    /// Maximum undo depth (0 = unbounded)
    #[serde(default)]
    pub history_limit: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            default_tool: default_start_tool(),
            hit_radius: default_hit_radius(),
            simplify_tolerance: default_simplify_tolerance(),
            history_limit: 0,
        }
    }
}

/// Performance tuning options.
///
/// Most users won't need to change these from their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PerformanceConfig {
    /// Redraw rate while idle-but-dirty (valid range: 1 - 240)
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,

    /// Minimum FPS change before the displayed readout updates
    #[serde(default = "default_fps_threshold")]
    pub fps_threshold: f64,

    /// Try the cached stroke layer at startup; false keeps software rendering
    #[serde(default = "default_enable_acceleration")]
    pub enable_acceleration: bool,

    /// Largest surface edge the cached path accepts (valid range: 256 - 16384)
    #[serde(default = "default_max_surface_dimension")]
    pub max_surface_dimension: i32,

    /// Hit-test grid cell edge in device pixels
    #[serde(default = "default_grid_cell_size")]
    pub grid_cell_size: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            fps_threshold: default_fps_threshold(),
            enable_acceleration: default_enable_acceleration(),
            max_surface_dimension: default_max_surface_dimension(),
            grid_cell_size: default_grid_cell_size(),
        }
    }
}

/// Page background loading.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PagesConfig {
    /// Pause between prefetch requests in milliseconds
    #[serde(default = "default_prefetch_delay_ms")]
    pub prefetch_delay_ms: u64,

    /// Width page bitmaps are rasterized to
    #[serde(default = "default_target_width")]
    pub target_width: u32,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            prefetch_delay_ms: default_prefetch_delay_ms(),
            target_width: default_target_width(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_color() -> ColorSpec {
    ColorSpec::Name("red".to_string())
}

fn default_thickness() -> f64 {
    2.0
}

fn default_opacity() -> f64 {
    100.0
}

fn default_highlighter_opacity() -> f64 {
    40.0
}

fn default_fill_color() -> ColorSpec {
    ColorSpec::Name("yellow".to_string())
}

fn default_font_size() -> f64 {
    16.0
}

fn default_symbol() -> String {
    "★".to_string()
}

fn default_font_family() -> String {
    "Sans".to_string()
}

fn default_font_weight() -> String {
    "normal".to_string()
}

fn default_font_style() -> String {
    "normal".to_string()
}

fn default_start_tool() -> StartTool {
    StartTool::Pen
}

fn default_hit_radius() -> f64 {
    5.0
}

fn default_simplify_tolerance() -> f64 {
    1.0
}

fn default_target_fps() -> u32 {
    60
}

fn default_fps_threshold() -> f64 {
    2.0
}

fn default_enable_acceleration() -> bool {
    true
}

fn default_max_surface_dimension() -> i32 {
    8192
}

fn default_grid_cell_size() -> f64 {
    64.0
}

fn default_prefetch_delay_ms() -> u64 {
    16
}

fn default_target_width() -> u32 {
    1600
}
