//! Keyboard modifier state tracking.

/// Keyboard modifier state.
///
/// Tracks which modifier keys are held. Pointer events carry a copy so
/// shift-click works without a separate key stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Creates a new Modifiers instance with all keys released.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt
    }
}
