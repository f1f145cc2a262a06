//! Pointer and key events delivered to the interaction controller.

use super::modifiers::Modifiers;
use crate::draw::Point;

/// Pressure assumed for devices that do not report one.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Generic key representation.
///
/// Hosts map their native key codes to these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Regular character key (a-z, 0-9, symbols)
    Char(char),
    Escape,
    Return,
    Backspace,
    Delete,
    Tab,
    Space,
    PageUp,
    PageDown,
    Shift,
    Ctrl,
    Alt,
    /// Unmapped or unrecognized key
    Unknown,
}

impl Key {
    /// Name used by keybinding strings, e.g. `"z"` or `"PageDown"`.
    pub fn binding_name(self) -> Option<String> {
        let name = match self {
            Key::Char(c) => return Some(c.to_string()),
            Key::Escape => "Escape",
            Key::Return => "Return",
            Key::Backspace => "Backspace",
            Key::Delete => "Delete",
            Key::Tab => "Tab",
            Key::Space => "Space",
            Key::PageUp => "PageUp",
            Key::PageDown => "PageDown",
            Key::Shift | Key::Ctrl | Key::Alt | Key::Unknown => return None,
        };
        Some(name.to_string())
    }
}

/// Mouse/pen button identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    /// Primary button (pen contact)
    #[default]
    Left,
    /// Secondary button; cancels the current gesture
    Right,
    Middle,
}

/// A pointer sample in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    /// Stylus pressure in 0..=1, when the device reports one.
    pub pressure: Option<f64>,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = Some(pressure);
        self
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn pressure(&self) -> f64 {
        self.pressure
            .map(|p| p.clamp(0.0, 1.0))
            .unwrap_or(DEFAULT_PRESSURE)
    }
}
