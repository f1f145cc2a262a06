mod actions;
mod core;
mod mouse;
mod render;

pub use core::{InputSettings, InputState, InteractionState, PageRequest};
