//! Interaction state machine and controller state.

use crate::config::{Action, Config, KeyBinding};
use crate::draw::{Corner, PenTool, Point, ShapeType, Stroke, StrokeId, StrokeStore};
use crate::input::{modifiers::Modifiers, tool::Tool};
use crate::util::ViewTransform;
use std::collections::HashMap;

/// Current interaction mode.
///
/// Every pointer-down moves out of `Idle` into exactly one of the gesture
/// states; pointer-up or cancel returns to `Idle` (or stays in `TextInput`
/// until the text is committed).
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    /// Waiting for input
    #[default]
    Idle,
    /// Collecting freehand points
    Drawing {
        tool: PenTool,
        points: Vec<Point>,
        pressures: Vec<f64>,
    },
    /// Dragging out a shape from `start` to `current`
    ShapeDrag {
        shape: ShapeType,
        start: Point,
        current: Point,
    },
    /// Dragging to size a symbol glyph
    SymbolDrag { start: Point, current: Point },
    /// Typing text at a baseline anchor
    TextInput { anchor: Point, buffer: String },
    /// Dragging the selection; `last` is the previous pointer position
    Moving { last: Point },
    /// Dragging one corner of a selected stroke
    Resizing {
        id: StrokeId,
        corner: Corner,
        original: Stroke,
    },
    /// Sweeping a selection rectangle
    RubberBand {
        start: Point,
        current: Point,
        additive: bool,
    },
    /// Deleting strokes along the swipe
    Erasing { last: Point },
    /// Dragging the view; `last` is in device space
    Panning { last: Point },
}

impl InteractionState {
    /// True while a pointer gesture is in progress.
    pub fn is_gesture(&self) -> bool {
        !matches!(
            self,
            InteractionState::Idle | InteractionState::TextInput { .. }
        )
    }
}

/// Stroke defaults and tuning the controller needs from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSettings {
    pub color: String,
    pub thickness: f64,
    pub opacity: f64,
    pub highlighter_opacity: f64,
    pub fill_color: String,
    pub font_size: f64,
    pub symbol: String,
    pub hit_radius: f64,
    pub simplify_tolerance: f64,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl InputSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            color: config.drawing.default_color.to_hex(),
            thickness: config.drawing.default_thickness,
            opacity: config.drawing.default_opacity,
            highlighter_opacity: config.drawing.highlighter_opacity,
            fill_color: config.drawing.fill_color.to_hex(),
            font_size: config.drawing.default_font_size,
            symbol: config.drawing.default_symbol.clone(),
            hit_radius: config.interaction.hit_radius,
            simplify_tolerance: config.interaction.simplify_tolerance,
        }
    }
}

/// Page change requested by a keybinding, for the host to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Next,
    Previous,
}

/// The interaction controller.
///
/// Turns pointer and key events into [`StrokeStore`] operations. The store is
/// passed into every handler; the controller itself only keeps the
/// in-progress gesture, the active tool and page, and the view transform.
pub struct InputState {
    pub settings: InputSettings,
    pub modifiers: Modifiers,
    pub state: InteractionState,
    pub transform: ViewTransform,
    /// Whether the display needs to be redrawn
    pub needs_redraw: bool,
    pub(super) tool: Tool,
    pub(super) page: u32,
    action_map: HashMap<KeyBinding, Action>,
    pending_page: Option<PageRequest>,
}

impl InputState {
    pub fn new(
        settings: InputSettings,
        tool: Tool,
        action_map: HashMap<KeyBinding, Action>,
    ) -> Self {
        Self {
            settings,
            modifiers: Modifiers::new(),
            state: InteractionState::Idle,
            transform: ViewTransform::identity(),
            needs_redraw: true,
            tool,
            page: 1,
            action_map,
            pending_page: None,
        }
    }

    /// Builds the controller from a loaded config.
    ///
    /// # Errors
    /// Returns the keybinding error when the action map cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let action_map = config.keybindings.build_action_map()?;
        Ok(Self::new(
            InputSettings::from_config(config),
            config.interaction.default_tool.into(),
            action_map,
        ))
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switches tools, abandoning any gesture in progress.
    pub fn set_tool(&mut self, store: &mut StrokeStore, tool: Tool) {
        if self.tool == tool {
            return;
        }
        self.abandon(store);
        if matches!(self.state, InteractionState::TextInput { .. }) {
            self.state = InteractionState::Idle;
        }
        self.tool = tool;
        self.needs_redraw = true;
        log::debug!("Tool changed to {:?}", tool);
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Sets the page new strokes land on. Any gesture is abandoned first and
    /// the selection is dropped, since it belongs to the page being left.
    pub fn set_page(&mut self, store: &mut StrokeStore, page: u32) {
        if self.page == page {
            return;
        }
        self.abandon(store);
        self.state = InteractionState::Idle;
        store.clear_selection();
        self.page = page.max(1);
        self.needs_redraw = true;
    }

    /// Takes and clears a pending page request raised by a keybinding.
    pub fn take_page_request(&mut self) -> Option<PageRequest> {
        self.pending_page.take()
    }

    pub(super) fn request_page(&mut self, request: PageRequest) {
        self.pending_page = Some(request);
    }

    /// True while a drag is in progress; the render loop redraws every tick.
    pub fn is_active(&self) -> bool {
        self.state.is_gesture()
    }

    /// Look up an action for the given key name and current modifiers.
    pub(super) fn find_action(&self, key: &str) -> Option<Action> {
        self.action_map
            .iter()
            .find(|(binding, _)| {
                binding.matches(
                    key,
                    self.modifiers.ctrl,
                    self.modifiers.shift,
                    self.modifiers.alt,
                )
            })
            .map(|(_, action)| *action)
    }

    /// Adjusts the stroke thickness, clamped to 1.0-50.0.
    pub fn adjust_thickness(&mut self, delta: f64) {
        self.settings.thickness = (self.settings.thickness + delta).clamp(1.0, 50.0);
        self.needs_redraw = true;
        log::debug!("Thickness adjusted to {:.1}", self.settings.thickness);
    }

    /// Ends the current pointer gesture without committing it.
    ///
    /// Moves, resizes and erasures already applied stay in the store as one
    /// undoable entry; previews are dropped. Text input is kept.
    pub(super) fn abandon(&mut self, store: &mut StrokeStore) {
        match std::mem::take(&mut self.state) {
            InteractionState::Moving { .. }
            | InteractionState::Resizing { .. }
            | InteractionState::Erasing { .. } => {
                store.end_gesture();
                self.needs_redraw = true;
            }
            InteractionState::TextInput { anchor, buffer } => {
                self.state = InteractionState::TextInput { anchor, buffer };
            }
            InteractionState::Idle => {}
            _ => self.needs_redraw = true,
        }
    }
}
