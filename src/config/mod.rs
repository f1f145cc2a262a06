//! Configuration file support for pagescriber.
//!
//! This module handles loading and validating user settings from the configuration file
//! located at `~/.config/pagescriber/config.toml`. Settings include drawing defaults,
//! pointer interaction tuning, render performance, page loading, and keybindings.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod keybindings;
pub mod types;

pub use enums::{ColorSpec, StartTool};
pub use keybindings::{Action, KeyBinding, KeybindingsConfig};
pub use types::{DrawingConfig, InteractionConfig, PagesConfig, PerformanceConfig};

use crate::accel::AccelSettings;
use crate::draw::FontDescriptor;
use crate::pages::PrefetchSettings;
use crate::render_loop::RenderSettings;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure containing all user settings.
///
/// All fields have sensible defaults and will use those if not specified in the config file.
///
/// # Example TOML
/// ```toml
/// [drawing]
/// default_color = "#1d4ed8"
/// default_thickness = 3.0
///
/// [interaction]
/// hit_radius = 6.0
/// history_limit = 200
///
/// [performance]
/// target_fps = 60
/// enable_acceleration = true
///
/// [pages]
/// prefetch_delay_ms = 16
///
/// [keybindings]
/// undo = ["Ctrl+Z"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// New-stroke defaults (color, thickness, opacity, font)
    #[serde(default)]
    pub drawing: DrawingConfig,

    /// Pointer interaction tuning
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Render loop and acceleration options
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Page background loading
    #[serde(default)]
    pub pages: PagesConfig,

    /// Keyboard shortcuts
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Invalid values are clamped to the nearest valid value and a warning is logged.
    ///
    /// Validated ranges:
    /// - `default_thickness`: 1.0 - 50.0
    /// - opacities: 0.0 - 100.0
    /// - `default_font_size`: 8.0 - 72.0
    /// - `hit_radius`: 0.0 - 50.0
    /// - `target_fps`: 1 - 240
    /// - `max_surface_dimension`: 256 - 16384
    pub fn validate_and_clamp(&mut self) {
        if !(1.0..=50.0).contains(&self.drawing.default_thickness) {
            warn!(
                "Invalid default_thickness {:.1}, clamping to 1.0-50.0 range",
                self.drawing.default_thickness
            );
            self.drawing.default_thickness = self.drawing.default_thickness.clamp(1.0, 50.0);
        }

        for (name, value) in [
            ("default_opacity", &mut self.drawing.default_opacity),
            ("highlighter_opacity", &mut self.drawing.highlighter_opacity),
        ] {
            if !(0.0..=100.0).contains(&*value) {
                warn!("Invalid {} {:.1}, clamping to 0-100 range", name, *value);
                *value = value.clamp(0.0, 100.0);
            }
        }

        if !(8.0..=72.0).contains(&self.drawing.default_font_size) {
            warn!(
                "Invalid default_font_size {:.1}, clamping to 8.0-72.0 range",
                self.drawing.default_font_size
            );
            self.drawing.default_font_size = self.drawing.default_font_size.clamp(8.0, 72.0);
        }

        if self.drawing.default_symbol.trim().is_empty() {
            warn!("Empty default_symbol, falling back to '★'");
            self.drawing.default_symbol = "★".to_string();
        }

        let valid_weight = matches!(
            self.drawing.font_weight.to_lowercase().as_str(),
            "normal" | "bold" | "light" | "ultralight" | "heavy" | "ultrabold"
        ) || self
            .drawing
            .font_weight
            .parse::<u32>()
            .is_ok_and(|w| (100..=900).contains(&w));

        if !valid_weight {
            warn!(
                "Invalid font_weight '{}', falling back to 'normal'",
                self.drawing.font_weight
            );
            self.drawing.font_weight = "normal".to_string();
        }

        if !matches!(
            self.drawing.font_style.to_lowercase().as_str(),
            "normal" | "italic" | "oblique"
        ) {
            warn!(
                "Invalid font_style '{}', falling back to 'normal'",
                self.drawing.font_style
            );
            self.drawing.font_style = "normal".to_string();
        }

        if !(0.0..=50.0).contains(&self.interaction.hit_radius) {
            warn!(
                "Invalid hit_radius {:.1}, clamping to 0.0-50.0 range",
                self.interaction.hit_radius
            );
            self.interaction.hit_radius = self.interaction.hit_radius.clamp(0.0, 50.0);
        }

        if !(0.0..=20.0).contains(&self.interaction.simplify_tolerance) {
            warn!(
                "Invalid simplify_tolerance {:.2}, clamping to 0.0-20.0 range",
                self.interaction.simplify_tolerance
            );
            self.interaction.simplify_tolerance =
                self.interaction.simplify_tolerance.clamp(0.0, 20.0);
        }

        if !(1..=240).contains(&self.performance.target_fps) {
            warn!(
                "Invalid target_fps {}, clamping to 1-240 range",
                self.performance.target_fps
            );
            self.performance.target_fps = self.performance.target_fps.clamp(1, 240);
        }

        if self.performance.fps_threshold < 0.0 {
            warn!(
                "Invalid fps_threshold {:.1}, using 0",
                self.performance.fps_threshold
            );
            self.performance.fps_threshold = 0.0;
        }

        if !(256..=16384).contains(&self.performance.max_surface_dimension) {
            warn!(
                "Invalid max_surface_dimension {}, clamping to 256-16384 range",
                self.performance.max_surface_dimension
            );
            self.performance.max_surface_dimension =
                self.performance.max_surface_dimension.clamp(256, 16384);
        }

        if !(8.0..=1024.0).contains(&self.performance.grid_cell_size) {
            warn!(
                "Invalid grid_cell_size {:.1}, clamping to 8-1024 range",
                self.performance.grid_cell_size
            );
            self.performance.grid_cell_size = self.performance.grid_cell_size.clamp(8.0, 1024.0);
        }

        if !(64..=8192).contains(&self.pages.target_width) {
            warn!(
                "Invalid target_width {}, clamping to 64-8192 range",
                self.pages.target_width
            );
            self.pages.target_width = self.pages.target_width.clamp(64, 8192);
        }

        if self.pages.prefetch_delay_ms > 1000 {
            warn!(
                "Invalid prefetch_delay_ms {}, clamping to 1000",
                self.pages.prefetch_delay_ms
            );
            self.pages.prefetch_delay_ms = 1000;
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("pagescriber");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Loads configuration from `path`, or returns defaults if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or contains invalid TOML.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Serializes the config to TOML at `config_path`, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, config_str)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Writes a default config file to the user's config directory.
    ///
    /// # Errors
    /// Returns an error if a config file already exists at the target path.
    pub fn create_default_file() -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            return Err(anyhow::anyhow!(
                "Config file already exists at {}",
                config_path.display()
            ));
        }

        Self::default().save_to(&config_path)?;
        Ok(config_path)
    }

    /// JSON schema describing the config file.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    pub fn font_descriptor(&self) -> FontDescriptor {
        FontDescriptor::new(
            self.drawing.font_family.clone(),
            self.drawing.font_weight.clone(),
            self.drawing.font_style.clone(),
        )
    }

    pub fn accel_settings(&self) -> AccelSettings {
        AccelSettings {
            enabled: self.performance.enable_acceleration,
            max_surface_dimension: self.performance.max_surface_dimension,
            grid_cell_size: self.performance.grid_cell_size,
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            target_fps: self.performance.target_fps,
            fps_threshold: self.performance.fps_threshold,
        }
    }

    pub fn prefetch_settings(&self) -> PrefetchSettings {
        PrefetchSettings {
            delay: Duration::from_millis(self.pages.prefetch_delay_ms),
            target_width: self.pages.target_width,
        }
    }
}
