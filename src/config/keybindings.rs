//! Keybinding configuration types and parsing.
//!
//! Every command the interaction controller understands can be bound to one
//! or more key combinations in the `[keybindings]` section.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All possible actions that can be bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // Cancellation
    Cancel,

    // History
    Undo,
    Redo,

    // Clipboard and selection
    Copy,
    Cut,
    Paste,
    Duplicate,
    DeleteSelection,
    SelectAll,
    ClearSelection,

    // Navigation
    NextPage,
    PreviousPage,

    // Thickness controls
    IncreaseThickness,
    DecreaseThickness,

    // Tool hotkeys
    ToolSelect,
    ToolPen,
    ToolHighlighter,
    ToolEraser,
    ToolText,
    ToolSymbol,
    ToolFill,
    ToolPan,
    ToolRectangle,
    ToolCircle,
    ToolTriangle,
    ToolLine,
    ToolArrow,
    ToolStar,
    ToolDiamond,
    ToolHeart,
}

/// A single keybinding: a key name with optional modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyBinding {
    /// Parse a keybinding string like "Ctrl+Shift+Z" or "Escape".
    /// Modifiers can appear in any order and spaces around '+' are allowed.
    /// Key names compare case-insensitively, so "ctrl+z" equals "Ctrl+Z".
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty keybinding string".to_string());
        }

        let normalized = s.replace(" + ", "+").replace("+ ", "+").replace(" +", "+");

        let mut ctrl = false;
        let mut shift = false;
        let mut alt = false;
        let mut key_parts = Vec::new();

        for part in normalized.split('+') {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => ctrl = true,
                "shift" => shift = true,
                "alt" => alt = true,
                _ => key_parts.push(part),
            }
        }

        if key_parts.is_empty() {
            return Err(format!("No key specified in: {}", s));
        }

        // "Ctrl++" splits into empty parts; the key itself is '+'.
        let key = key_parts.join("+");
        let key = if key.chars().all(|c| c == '+') {
            "+".to_string()
        } else {
            key.to_lowercase()
        };

        Ok(Self {
            key,
            ctrl,
            shift,
            alt,
        })
    }

    /// Check if this keybinding matches the given key and modifiers.
    pub fn matches(&self, key: &str, ctrl: bool, shift: bool, alt: bool) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.ctrl == ctrl
            && self.shift == shift
            && self.alt == alt
    }
}

/// Configuration for all keybindings.
///
/// Each field holds every key combination that triggers the action.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub cancel: Vec<String>,
    pub undo: Vec<String>,
    pub redo: Vec<String>,
    pub copy: Vec<String>,
    pub cut: Vec<String>,
    pub paste: Vec<String>,
    pub duplicate: Vec<String>,
    pub delete_selection: Vec<String>,
    pub select_all: Vec<String>,
    pub clear_selection: Vec<String>,
    pub next_page: Vec<String>,
    pub previous_page: Vec<String>,
    pub increase_thickness: Vec<String>,
    pub decrease_thickness: Vec<String>,
    pub tool_select: Vec<String>,
    pub tool_pen: Vec<String>,
    pub tool_highlighter: Vec<String>,
    pub tool_eraser: Vec<String>,
    pub tool_text: Vec<String>,
    pub tool_symbol: Vec<String>,
    pub tool_fill: Vec<String>,
    pub tool_pan: Vec<String>,
    pub tool_rectangle: Vec<String>,
    pub tool_circle: Vec<String>,
    pub tool_triangle: Vec<String>,
    pub tool_line: Vec<String>,
    pub tool_arrow: Vec<String>,
    pub tool_star: Vec<String>,
    pub tool_diamond: Vec<String>,
    pub tool_heart: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            cancel: keys(&["Escape"]),
            undo: keys(&["Ctrl+Z"]),
            redo: keys(&["Ctrl+Shift+Z", "Ctrl+Y"]),
            copy: keys(&["Ctrl+C"]),
            cut: keys(&["Ctrl+X"]),
            paste: keys(&["Ctrl+V"]),
            duplicate: keys(&["Ctrl+D"]),
            delete_selection: keys(&["Delete", "Backspace"]),
            select_all: keys(&["Ctrl+A"]),
            clear_selection: keys(&["Ctrl+Shift+A"]),
            next_page: keys(&["PageDown"]),
            previous_page: keys(&["PageUp"]),
            increase_thickness: keys(&["+", "="]),
            decrease_thickness: keys(&["-", "_"]),
            tool_select: keys(&["V"]),
            tool_pen: keys(&["P"]),
            tool_highlighter: keys(&["H"]),
            tool_eraser: keys(&["E"]),
            tool_text: keys(&["T"]),
            tool_symbol: keys(&["Y"]),
            tool_fill: keys(&["F"]),
            tool_pan: keys(&["Space"]),
            tool_rectangle: keys(&["R"]),
            tool_circle: keys(&["C"]),
            tool_triangle: keys(&["Shift+T"]),
            tool_line: keys(&["L"]),
            tool_arrow: keys(&["A"]),
            tool_star: keys(&["S"]),
            tool_diamond: keys(&["D"]),
            tool_heart: keys(&["Shift+H"]),
        }
    }
}

impl KeybindingsConfig {
    fn entries(&self) -> [(&[String], Action); 30] {
        [
            (self.cancel.as_slice(), Action::Cancel),
            (self.undo.as_slice(), Action::Undo),
            (self.redo.as_slice(), Action::Redo),
            (self.copy.as_slice(), Action::Copy),
            (self.cut.as_slice(), Action::Cut),
            (self.paste.as_slice(), Action::Paste),
            (self.duplicate.as_slice(), Action::Duplicate),
            (self.delete_selection.as_slice(), Action::DeleteSelection),
            (self.select_all.as_slice(), Action::SelectAll),
            (self.clear_selection.as_slice(), Action::ClearSelection),
            (self.next_page.as_slice(), Action::NextPage),
            (self.previous_page.as_slice(), Action::PreviousPage),
            (self.increase_thickness.as_slice(), Action::IncreaseThickness),
            (self.decrease_thickness.as_slice(), Action::DecreaseThickness),
            (self.tool_select.as_slice(), Action::ToolSelect),
            (self.tool_pen.as_slice(), Action::ToolPen),
            (self.tool_highlighter.as_slice(), Action::ToolHighlighter),
            (self.tool_eraser.as_slice(), Action::ToolEraser),
            (self.tool_text.as_slice(), Action::ToolText),
            (self.tool_symbol.as_slice(), Action::ToolSymbol),
            (self.tool_fill.as_slice(), Action::ToolFill),
            (self.tool_pan.as_slice(), Action::ToolPan),
            (self.tool_rectangle.as_slice(), Action::ToolRectangle),
            (self.tool_circle.as_slice(), Action::ToolCircle),
            (self.tool_triangle.as_slice(), Action::ToolTriangle),
            (self.tool_line.as_slice(), Action::ToolLine),
            (self.tool_arrow.as_slice(), Action::ToolArrow),
            (self.tool_star.as_slice(), Action::ToolStar),
            (self.tool_diamond.as_slice(), Action::ToolDiamond),
            (self.tool_heart.as_slice(), Action::ToolHeart),
        ]
    }

    /// Build a lookup map from keybindings to actions.
    /// Returns an error if any keybinding string is invalid or if duplicates are detected.
    pub fn build_action_map(&self) -> Result<HashMap<KeyBinding, Action>, String> {
        let mut map = HashMap::new();

        for (bindings, action) in self.entries() {
            for binding_str in bindings {
                let binding = KeyBinding::parse(binding_str)?;
                if let Some(existing_action) = map.insert(binding, action) {
                    return Err(format!(
                        "Duplicate keybinding '{}' assigned to both {:?} and {:?}",
                        binding_str, existing_action, action
                    ));
                }
            }
        }

        Ok(map)
    }
}
