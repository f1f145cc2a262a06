//! Snapshot-based undo/redo history.

use crate::draw::Stroke;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Closed,
    Open { recorded: bool },
}

/// Undo and redo stacks of full stroke-list snapshots.
///
/// Each undo entry is the stroke list as it was *before* a mutation. While a
/// gesture is open only its first mutation records a snapshot, so a whole drag
/// or eraser swipe undoes in one step.
#[derive(Debug, Clone)]
pub(crate) struct History {
    undo: VecDeque<Vec<Stroke>>,
    redo: Vec<Vec<Stroke>>,
    /// Maximum undo depth; 0 keeps everything.
    limit: usize,
    gesture: Gesture,
}

impl History {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
            gesture: Gesture::Closed,
        }
    }

    /// Records the pre-mutation state and clears redo.
    pub(crate) fn record(&mut self, before: &[Stroke]) {
        match self.gesture {
            Gesture::Open { recorded: true } => return,
            Gesture::Open { recorded: false } => {
                self.gesture = Gesture::Open { recorded: true };
            }
            Gesture::Closed => {}
        }

        self.undo.push_back(before.to_vec());
        self.redo.clear();
        if self.limit > 0 {
            while self.undo.len() > self.limit {
                self.undo.pop_front();
            }
        }
    }

    pub(crate) fn begin_gesture(&mut self) {
        self.gesture = Gesture::Open { recorded: false };
    }

    pub(crate) fn end_gesture(&mut self) {
        self.gesture = Gesture::Closed;
    }

    pub(crate) fn gesture_open(&self) -> bool {
        matches!(self.gesture, Gesture::Open { .. })
    }

    /// Swaps `current` with the newest undo entry; returns false when there is none.
    pub(crate) fn undo(&mut self, current: &mut Vec<Stroke>) -> bool {
        self.end_gesture();
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        self.redo.push(std::mem::replace(current, previous));
        true
    }

    pub(crate) fn redo(&mut self, current: &mut Vec<Stroke>) -> bool {
        self.end_gesture();
        let Some(next) = self.redo.pop() else {
            return false;
        };
        self.undo.push_back(std::mem::replace(current, next));
        true
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub(crate) fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub(crate) fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub(crate) fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.gesture = Gesture::Closed;
    }
}
