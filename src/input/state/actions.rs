use crate::config::Action;
use crate::draw::store::PASTE_OFFSET;
use crate::draw::{ShapeType, StrokeStore};
use crate::input::{events::Key, tool::Tool};

use super::{InputState, InteractionState, PageRequest};

/// Thickness step for the increase/decrease actions.
const THICKNESS_STEP: f64 = 1.0;

impl InputState {
    /// Processes a key press event.
    ///
    /// Modifier keys update [`Modifiers`](crate::input::Modifiers). While
    /// typing text, plain keys edit the buffer and only modified keys reach
    /// the keybindings; otherwise every key is looked up in the action map.
    pub fn on_key_press(&mut self, store: &mut StrokeStore, key: Key) {
        match key {
            Key::Shift => {
                self.modifiers.shift = true;
                return;
            }
            Key::Ctrl => {
                self.modifiers.ctrl = true;
                return;
            }
            Key::Alt => {
                self.modifiers.alt = true;
                return;
            }
            _ => {}
        }

        if matches!(self.state, InteractionState::TextInput { .. })
            && !(self.modifiers.ctrl || self.modifiers.alt)
        {
            self.edit_text(store, key);
            return;
        }

        let Some(name) = key.binding_name() else {
            return;
        };
        if let Some(action) = self.find_action(&name) {
            self.handle_action(store, action);
        }
    }

    /// Processes a key release event (modifier tracking only).
    pub fn on_key_release(&mut self, key: Key) {
        match key {
            Key::Shift => self.modifiers.shift = false,
            Key::Ctrl => self.modifiers.ctrl = false,
            Key::Alt => self.modifiers.alt = false,
            _ => {}
        }
    }

    fn edit_text(&mut self, store: &mut StrokeStore, key: Key) {
        let InteractionState::TextInput { anchor, buffer } = &mut self.state else {
            return;
        };
        match key {
            Key::Char(c) => buffer.push(c),
            Key::Space => buffer.push(' '),
            Key::Backspace => {
                buffer.pop();
            }
            Key::Return => {
                let (anchor, text) = (*anchor, std::mem::take(buffer));
                self.state = InteractionState::Idle;
                if !text.is_empty() {
                    store.add_stroke(self.text_draft(anchor, &text));
                }
            }
            Key::Escape => self.state = InteractionState::Idle,
            _ => return,
        }
        self.needs_redraw = true;
    }

    /// Handle an action triggered by a keybinding.
    pub fn handle_action(&mut self, store: &mut StrokeStore, action: Action) {
        match action {
            Action::Cancel => {
                if matches!(self.state, InteractionState::Idle) {
                    store.clear_selection();
                } else {
                    self.abandon(store);
                    self.state = InteractionState::Idle;
                }
            }
            Action::Undo => {
                self.abandon(store);
                store.undo();
            }
            Action::Redo => {
                self.abandon(store);
                store.redo();
            }
            Action::Copy => {
                store.copy_selected();
            }
            Action::Cut => {
                self.abandon(store);
                store.cut_selected();
            }
            Action::Paste => {
                self.abandon(store);
                store.paste(self.page(), PASTE_OFFSET);
            }
            Action::Duplicate => {
                self.abandon(store);
                store.duplicate_selected(self.page());
            }
            Action::DeleteSelection => {
                self.abandon(store);
                store.delete_selected();
            }
            Action::SelectAll => store.select_all(self.page()),
            Action::ClearSelection => store.clear_selection(),
            Action::NextPage => self.request_page(PageRequest::Next),
            Action::PreviousPage => self.request_page(PageRequest::Previous),
            Action::IncreaseThickness => self.adjust_thickness(THICKNESS_STEP),
            Action::DecreaseThickness => self.adjust_thickness(-THICKNESS_STEP),
            Action::ToolSelect => self.set_tool(store, Tool::Select),
            Action::ToolPen => self.set_tool(store, Tool::Pen),
            Action::ToolHighlighter => self.set_tool(store, Tool::Highlighter),
            Action::ToolEraser => self.set_tool(store, Tool::Eraser),
            Action::ToolText => self.set_tool(store, Tool::Text),
            Action::ToolSymbol => self.set_tool(store, Tool::Symbol),
            Action::ToolFill => self.set_tool(store, Tool::Fill),
            Action::ToolPan => self.set_tool(store, Tool::Pan),
            Action::ToolRectangle => self.set_tool(store, Tool::Shape(ShapeType::Rectangle)),
            Action::ToolCircle => self.set_tool(store, Tool::Shape(ShapeType::Circle)),
            Action::ToolTriangle => self.set_tool(store, Tool::Shape(ShapeType::Triangle)),
            Action::ToolLine => self.set_tool(store, Tool::Shape(ShapeType::Line)),
            Action::ToolArrow => self.set_tool(store, Tool::Shape(ShapeType::Arrow)),
            Action::ToolStar => self.set_tool(store, Tool::Shape(ShapeType::Star)),
            Action::ToolDiamond => self.set_tool(store, Tool::Shape(ShapeType::Diamond)),
            Action::ToolHeart => self.set_tool(store, Tool::Shape(ShapeType::Heart)),
        }
        self.needs_redraw = true;
    }
}
