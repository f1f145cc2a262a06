use crate::draw::{StrokeDraft, StrokeId};
use crate::render_loop::Overlays;

use super::{InputState, InteractionState};

/// Id carried by preview strokes; never stored.
const PREVIEW_ID: &str = "preview";
/// Caret appended to the text being typed.
const CARET: char = '_';

impl InputState {
    /// Uncommitted visuals for the current gesture, in document coordinates.
    pub fn overlays(&self) -> Overlays {
        let preview = |draft: StrokeDraft| draft.into_stroke(StrokeId::from(PREVIEW_ID), 0);

        match &self.state {
            InteractionState::Drawing {
                tool,
                points,
                pressures,
            } => Overlays {
                transient: self
                    .freehand_draft(*tool, points, pressures, false)
                    .map(preview),
                ..Default::default()
            },
            InteractionState::ShapeDrag {
                shape,
                start,
                current,
            } => Overlays {
                shape_preview: self.shape_draft(*shape, *start, *current).map(preview),
                ..Default::default()
            },
            InteractionState::SymbolDrag { start, current } => Overlays {
                symbol_preview: Some(self.symbol_preview(*start, *current)),
                ..Default::default()
            },
            InteractionState::TextInput { anchor, buffer } => {
                let mut shown = buffer.clone();
                shown.push(CARET);
                Overlays {
                    transient: Some(preview(self.text_draft(*anchor, &shown))),
                    ..Default::default()
                }
            }
            InteractionState::RubberBand { start, current, .. } => Overlays {
                rubber_band: Some((*start, *current)),
                ..Default::default()
            },
            InteractionState::Idle
            | InteractionState::Moving { .. }
            | InteractionState::Resizing { .. }
            | InteractionState::Erasing { .. }
            | InteractionState::Panning { .. } => Overlays::default(),
        }
    }
}
