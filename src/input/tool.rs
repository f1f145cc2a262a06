//! Tool selection.

use crate::config::StartTool;
use crate::draw::{PenTool, ShapeType};

/// The active tool determines what a pointer drag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Pick, move, resize and rubber-band select
    Select,
    Pen,
    /// Wide, translucent freehand
    Highlighter,
    /// Deletes strokes along the swipe
    Eraser,
    /// Corner-to-corner drag
    Shape(ShapeType),
    /// Click to place a caret, then type
    Text,
    /// Drag to size a single glyph
    Symbol,
    /// Sets the fill of the shape under the pointer
    Fill,
    /// Drags the view
    Pan,
}

impl Tool {
    /// Freehand kind produced by this tool, if it draws paths.
    pub fn pen_tool(self) -> Option<PenTool> {
        match self {
            Tool::Pen => Some(PenTool::Pen),
            Tool::Highlighter => Some(PenTool::Highlighter),
            _ => None,
        }
    }
}

impl From<StartTool> for Tool {
    fn from(tool: StartTool) -> Self {
        match tool {
            StartTool::Select => Tool::Select,
            StartTool::Pen => Tool::Pen,
            StartTool::Highlighter => Tool::Highlighter,
            StartTool::Eraser => Tool::Eraser,
            StartTool::Text => Tool::Text,
            StartTool::Symbol => Tool::Symbol,
            StartTool::Fill => Tool::Fill,
            StartTool::Pan => Tool::Pan,
        }
    }
}
