//! Input handling and tool state machine.
//!
//! This module translates host pointer and keyboard events into stroke store
//! operations. It keeps the active tool, stroke defaults, and the state
//! machine for in-progress gestures (drawing, dragging, typing, panning).

pub mod events;
pub mod modifiers;
pub mod state;
pub mod tool;

pub use events::{Key, MouseButton, PointerEvent};
pub use modifiers::Modifiers;
pub use state::{InputSettings, InputState, InteractionState, PageRequest};
pub use tool::Tool;
