//! Authoritative stroke state: strokes, selection, history and clipboard.

mod history;
#[cfg(test)]
mod tests;

use super::stroke::{Point, Stroke, StrokeDraft, StrokeId, StrokeKind};
use chrono::Utc;
use history::History;
use log::debug;

/// Offset applied to pasted and duplicated strokes.
pub const PASTE_OFFSET: (f64, f64) = (20.0, 20.0);

/// Partial update merged into an existing stroke by [`StrokeStore::update_stroke`].
///
/// `fill_color` and `background_color` are doubly optional so a patch can
/// clear them (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrokePatch {
    pub points: Option<Vec<Point>>,
    pub color: Option<String>,
    pub thickness: Option<f64>,
    pub opacity: Option<f64>,
    pub fill_color: Option<Option<String>>,
    pub background_color: Option<Option<String>>,
    pub kind: Option<StrokeKind>,
}

impl StrokePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(self, stroke: &mut Stroke) {
        if let Some(points) = self.points {
            stroke.points = points;
        }
        if let Some(color) = self.color {
            stroke.color = color;
        }
        if let Some(thickness) = self.thickness {
            stroke.thickness = thickness;
        }
        if let Some(opacity) = self.opacity {
            stroke.opacity = opacity;
        }
        if let Some(fill) = self.fill_color {
            stroke.fill_color = fill;
        }
        if let Some(background) = self.background_color {
            stroke.background_color = background;
        }
        if let Some(kind) = self.kind {
            stroke.kind = kind;
        }
    }
}

/// The single owner of every [`Stroke`].
///
/// All operations are synchronous and immediately consistent. Operations that
/// name a stroke id that no longer exists are silent no-ops and never touch
/// history, so racing input cannot corrupt the undo stack.
#[derive(Debug, Clone)]
pub struct StrokeStore {
    /// Insertion order is z-order (last = topmost).
    strokes: Vec<Stroke>,
    /// Ordered set; the first entry is the primary selection.
    selected: Vec<StrokeId>,
    clipboard: Vec<Stroke>,
    history: History,
    revision: u64,
}

impl Default for StrokeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StrokeStore {
    pub fn new() -> Self {
        Self::with_history_limit(0)
    }

    /// Creates a store whose undo depth is capped at `limit` (0 = unbounded).
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            strokes: Vec::new(),
            selected: Vec::new(),
            clipboard: Vec::new(),
            history: History::new(limit),
            revision: 0,
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn stroke(&self, id: &StrokeId) -> Option<&Stroke> {
        self.strokes.iter().find(|s| &s.id == id)
    }

    /// Strokes owned by `page_id`, in insertion (z) order.
    pub fn page_strokes(&self, page_id: u32) -> impl DoubleEndedIterator<Item = &Stroke> + Clone {
        self.strokes.iter().filter(move |s| s.page_id == page_id)
    }

    pub fn selected_ids(&self) -> &[StrokeId] {
        &self.selected
    }

    pub fn primary_selection(&self) -> Option<&StrokeId> {
        self.selected.first()
    }

    pub fn is_selected(&self, id: &StrokeId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_strokes(&self) -> impl Iterator<Item = &Stroke> {
        self.selected.iter().filter_map(|id| self.stroke(id))
    }

    pub fn clipboard_len(&self) -> usize {
        self.clipboard.len()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Monotonic counter bumped on every stroke or selection change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn position(&self, id: &StrokeId) -> Option<usize> {
        self.strokes.iter().position(|s| &s.id == id)
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ------------------------------------------------------------------
    // Mutations (each records history)
    // ------------------------------------------------------------------

    /// Appends a new stroke built from `draft` and returns its id.
    pub fn add_stroke(&mut self, draft: StrokeDraft) -> StrokeId {
        self.history.record(&self.strokes);
        let id = StrokeId::generate();
        self.strokes.push(draft.into_stroke(id.clone(), Self::now_millis()));
        self.touch();
        debug!("Added stroke {id} ({} total)", self.strokes.len());
        id
    }

    /// Merges `patch` into the stroke with `id`.
    ///
    /// Returns false (recording nothing) when the id is unknown or the patch is empty.
    pub fn update_stroke(&mut self, id: &StrokeId, patch: StrokePatch) -> bool {
        if patch.is_empty() {
            return false;
        }
        let Some(index) = self.position(id) else {
            debug!("Ignoring update for missing stroke {id}");
            return false;
        };
        self.history.record(&self.strokes);
        patch.apply(&mut self.strokes[index]);
        self.touch();
        true
    }

    /// Moves every listed stroke by `(dx, dy)` as a single history entry.
    pub fn translate_strokes(&mut self, ids: &[StrokeId], dx: f64, dy: f64) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        let indices: Vec<usize> = ids.iter().filter_map(|id| self.position(id)).collect();
        if indices.is_empty() {
            return false;
        }
        self.history.record(&self.strokes);
        for index in indices {
            self.strokes[index].translate(dx, dy);
        }
        self.touch();
        true
    }

    pub fn delete_stroke(&mut self, id: &StrokeId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.history.record(&self.strokes);
        self.strokes.remove(index);
        self.selected.retain(|sel| sel != id);
        self.touch();
        true
    }

    /// Removes every selected stroke; returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let doomed: Vec<StrokeId> = self
            .selected
            .iter()
            .filter(|id| self.position(id).is_some())
            .cloned()
            .collect();
        if doomed.is_empty() {
            if !self.selected.is_empty() {
                self.selected.clear();
                self.touch();
            }
            return 0;
        }

        self.history.record(&self.strokes);
        self.strokes.retain(|s| !doomed.contains(&s.id));
        self.selected.clear();
        self.touch();
        doomed.len()
    }

    /// Replaces the whole document (project load). Selection and history are reset.
    pub fn replace_all(&mut self, strokes: Vec<Stroke>) {
        self.strokes = strokes;
        self.selected.clear();
        self.history.clear();
        self.touch();
    }

    // ------------------------------------------------------------------
    // Gestures
    // ------------------------------------------------------------------

    /// Opens a gesture: until [`end_gesture`](Self::end_gesture), only the
    /// first mutation records an undo entry.
    pub fn begin_gesture(&mut self) {
        self.history.begin_gesture();
    }

    pub fn end_gesture(&mut self) {
        self.history.end_gesture();
    }

    pub fn gesture_open(&self) -> bool {
        self.history.gesture_open()
    }

    // ------------------------------------------------------------------
    // Selection (never undoable)
    // ------------------------------------------------------------------

    /// Selects exactly one stroke, or clears the selection with `None`.
    pub fn select_stroke(&mut self, id: Option<&StrokeId>) {
        match id {
            Some(id) if self.position(id).is_some() => {
                self.selected = vec![id.clone()];
                self.touch();
            }
            Some(_) => {}
            None => self.clear_selection(),
        }
    }

    /// Replaces the selection with the given ids, skipping unknown and duplicate ids.
    pub fn select_strokes<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = StrokeId>,
    {
        let mut next: Vec<StrokeId> = Vec::new();
        for id in ids {
            if self.position(&id).is_some() && !next.contains(&id) {
                next.push(id);
            }
        }
        if next != self.selected {
            self.selected = next;
            self.touch();
        }
    }

    pub fn add_to_selection(&mut self, id: &StrokeId) {
        if self.position(id).is_some() && !self.selected.contains(id) {
            self.selected.push(id.clone());
            self.touch();
        }
    }

    pub fn remove_from_selection(&mut self, id: &StrokeId) {
        let before = self.selected.len();
        self.selected.retain(|sel| sel != id);
        if self.selected.len() != before {
            self.touch();
        }
    }

    pub fn clear_selection(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.touch();
        }
    }

    pub fn select_all(&mut self, page_id: u32) {
        let ids: Vec<StrokeId> = self.page_strokes(page_id).map(|s| s.id.clone()).collect();
        self.select_strokes(ids);
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.strokes);
        if undone {
            self.prune_selection();
            self.touch();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.strokes);
        if redone {
            self.prune_selection();
            self.touch();
        }
        redone
    }

    fn prune_selection(&mut self) {
        let strokes = &self.strokes;
        self.selected.retain(|id| strokes.iter().any(|s| &s.id == id));
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    /// Copies the selected strokes (in z-order) to the clipboard.
    pub fn copy_selected(&mut self) -> usize {
        let copied: Vec<Stroke> = self
            .strokes
            .iter()
            .filter(|s| self.selected.contains(&s.id))
            .cloned()
            .collect();
        if copied.is_empty() {
            return 0;
        }
        self.clipboard = copied;
        self.clipboard.len()
    }

    pub fn cut_selected(&mut self) -> usize {
        if self.copy_selected() == 0 {
            return 0;
        }
        self.delete_selected()
    }

    /// Inserts offset copies of the clipboard onto `page_id` and selects them.
    pub fn paste(&mut self, page_id: u32, offset: (f64, f64)) -> Vec<StrokeId> {
        let sources = self.clipboard.clone();
        self.insert_copies(sources, page_id, offset)
    }

    /// Duplicates the selection onto `page_id` with the standard offset.
    pub fn duplicate_selected(&mut self, page_id: u32) -> Vec<StrokeId> {
        let sources: Vec<Stroke> = self
            .strokes
            .iter()
            .filter(|s| self.selected.contains(&s.id))
            .cloned()
            .collect();
        self.insert_copies(sources, page_id, PASTE_OFFSET)
    }

    fn insert_copies(
        &mut self,
        sources: Vec<Stroke>,
        page_id: u32,
        (dx, dy): (f64, f64),
    ) -> Vec<StrokeId> {
        if sources.is_empty() {
            return Vec::new();
        }

        self.history.record(&self.strokes);
        let timestamp = Self::now_millis();
        let mut created = Vec::with_capacity(sources.len());
        for mut copy in sources {
            copy.id = StrokeId::generate();
            copy.timestamp = timestamp;
            copy.page_id = page_id;
            copy.translate(dx, dy);
            created.push(copy.id.clone());
            self.strokes.push(copy);
        }
        self.selected = created.clone();
        self.touch();
        debug!("Inserted {} copied stroke(s) on page {page_id}", created.len());
        created
    }
}
