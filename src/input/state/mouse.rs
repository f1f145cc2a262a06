use crate::draw::hit::{hit_test, rect_select, stroke_contains};
use crate::draw::{
    PenTool, Point, ShapeType, StrokeDraft, StrokeId, StrokeKind, StrokePatch, StrokeStore,
    SymbolPreview, resize_corner, resize_stroke,
};
use crate::input::{MouseButton, PointerEvent, tool::Tool};
use crate::util;

use super::{InputState, InteractionState};

/// Freehand strokes longer than this are simplified on commit.
const SIMPLIFY_MIN_POINTS: usize = 10;
/// Shape drags smaller than this in both directions are treated as clicks.
const MIN_SHAPE_EXTENT: f64 = 2.0;
/// Highlighter width relative to the pen.
const HIGHLIGHTER_WIDTH_FACTOR: f64 = 3.0;

impl InputState {
    /// Processes a pointer press.
    ///
    /// The secondary button cancels the current gesture; the primary button
    /// starts one according to the active tool.
    pub fn on_pointer_down(&mut self, store: &mut StrokeStore, event: &PointerEvent) {
        match event.button {
            MouseButton::Right => {
                self.on_pointer_cancel(store);
                return;
            }
            MouseButton::Middle => return,
            MouseButton::Left => {}
        }

        let point = event.point();

        if let InteractionState::TextInput { anchor, .. } = &mut self.state {
            // Clicking again while typing moves the caret.
            *anchor = point;
            self.needs_redraw = true;
            return;
        }
        if self.state.is_gesture() {
            return;
        }

        self.state = match self.tool {
            Tool::Select => self.begin_select(store, event),
            Tool::Pen | Tool::Highlighter => InteractionState::Drawing {
                tool: self.tool.pen_tool().unwrap_or(PenTool::Pen),
                points: vec![point],
                pressures: vec![event.pressure()],
            },
            Tool::Eraser => {
                store.begin_gesture();
                self.erase_at(store, point);
                InteractionState::Erasing { last: point }
            }
            Tool::Shape(shape) => InteractionState::ShapeDrag {
                shape,
                start: point,
                current: point,
            },
            Tool::Symbol => InteractionState::SymbolDrag {
                start: point,
                current: point,
            },
            Tool::Text => InteractionState::TextInput {
                anchor: point,
                buffer: String::new(),
            },
            Tool::Fill => {
                self.fill_at(store, point);
                InteractionState::Idle
            }
            Tool::Pan => InteractionState::Panning {
                last: self.transform.to_device(point),
            },
        };
        self.needs_redraw = true;
    }

    fn begin_select(&mut self, store: &mut StrokeStore, event: &PointerEvent) -> InteractionState {
        let point = event.point();

        let primary = store
            .primary_selection()
            .and_then(|id| store.stroke(id))
            .filter(|stroke| stroke.page_id == self.page);
        if let Some(primary) = primary {
            if let Some(corner) = resize_corner(point, primary) {
                let original = primary.clone();
                store.begin_gesture();
                return InteractionState::Resizing {
                    id: original.id.clone(),
                    corner,
                    original,
                };
            }
        }

        let hit = hit_test(point, self.settings.hit_radius, store.page_strokes(self.page))
            .map(|stroke| stroke.id.clone());

        match hit {
            Some(id) if event.modifiers.shift => {
                if store.is_selected(&id) {
                    store.remove_from_selection(&id);
                } else {
                    store.add_to_selection(&id);
                }
                InteractionState::Idle
            }
            Some(id) => {
                if !store.is_selected(&id) {
                    store.select_stroke(Some(&id));
                }
                store.begin_gesture();
                InteractionState::Moving { last: point }
            }
            None => {
                if !event.modifiers.shift {
                    store.clear_selection();
                }
                InteractionState::RubberBand {
                    start: point,
                    current: point,
                    additive: event.modifiers.shift,
                }
            }
        }
    }

    /// Processes pointer motion while a button is held.
    pub fn on_pointer_move(&mut self, store: &mut StrokeStore, event: &PointerEvent) {
        let point = event.point();
        match &mut self.state {
            InteractionState::Idle | InteractionState::TextInput { .. } => return,
            InteractionState::Drawing {
                points, pressures, ..
            } => {
                points.push(point);
                pressures.push(event.pressure());
            }
            InteractionState::ShapeDrag { current, .. }
            | InteractionState::SymbolDrag { current, .. }
            | InteractionState::RubberBand { current, .. } => *current = point,
            InteractionState::Moving { last } => {
                let (dx, dy) = (point.x - last.x, point.y - last.y);
                *last = point;
                let ids = store.selected_ids().to_vec();
                store.translate_strokes(&ids, dx, dy);
            }
            InteractionState::Resizing {
                id,
                corner,
                original,
            } => {
                let resized = resize_stroke(original, *corner, point);
                store.update_stroke(
                    id,
                    StrokePatch {
                        points: Some(resized.points),
                        thickness: Some(resized.thickness),
                        ..Default::default()
                    },
                );
            }
            InteractionState::Erasing { last } => {
                let from = *last;
                *last = point;
                self.erase_along(store, from, point);
            }
            InteractionState::Panning { last } => {
                let device = self.transform.to_device(point);
                let (dx, dy) = (device.x - last.x, device.y - last.y);
                *last = device;
                self.transform.pan_by(dx, dy);
            }
        }
        self.needs_redraw = true;
    }

    /// Processes pointer release, committing the gesture.
    pub fn on_pointer_up(&mut self, store: &mut StrokeStore, event: &PointerEvent) {
        if event.button != MouseButton::Left {
            return;
        }
        let point = event.point();

        let state = std::mem::take(&mut self.state);
        match state {
            InteractionState::Idle => return,
            InteractionState::TextInput { anchor, buffer } => {
                self.state = InteractionState::TextInput { anchor, buffer };
                return;
            }
            InteractionState::Drawing {
                tool,
                points,
                pressures,
            } => {
                if let Some(draft) = self.freehand_draft(tool, &points, &pressures, true) {
                    store.add_stroke(draft);
                }
            }
            InteractionState::ShapeDrag { shape, start, .. } => {
                if let Some(draft) = self.shape_draft(shape, start, point) {
                    store.add_stroke(draft);
                }
            }
            InteractionState::SymbolDrag { start, .. } => {
                store.add_stroke(self.symbol_draft(start, point));
            }
            InteractionState::RubberBand {
                start, additive, ..
            } => {
                let ids: Vec<StrokeId> = rect_select(start, point, store.page_strokes(self.page))
                    .into_iter()
                    .map(|stroke| stroke.id.clone())
                    .collect();
                if additive {
                    for id in &ids {
                        store.add_to_selection(id);
                    }
                } else {
                    store.select_strokes(ids);
                }
            }
            InteractionState::Moving { .. }
            | InteractionState::Resizing { .. }
            | InteractionState::Erasing { .. } => store.end_gesture(),
            InteractionState::Panning { .. } => {}
        }
        self.needs_redraw = true;
    }

    /// Abandons the current gesture without committing it.
    pub fn on_pointer_cancel(&mut self, store: &mut StrokeStore) {
        self.abandon(store);
    }

    /// Draft for a freehand gesture, or `None` when too short to draw.
    pub(super) fn freehand_draft(
        &self,
        tool: PenTool,
        points: &[Point],
        pressures: &[f64],
        finished: bool,
    ) -> Option<StrokeDraft> {
        if points.len() < 2 {
            return None;
        }
        let points = if finished && points.len() > SIMPLIFY_MIN_POINTS {
            util::simplify(points, self.settings.simplify_tolerance)
        } else {
            points.to_vec()
        };

        let (thickness, opacity) = match tool {
            PenTool::Highlighter => (
                self.settings.thickness * HIGHLIGHTER_WIDTH_FACTOR,
                self.settings.highlighter_opacity,
            ),
            _ => {
                let mean = if pressures.is_empty() {
                    crate::input::events::DEFAULT_PRESSURE
                } else {
                    pressures.iter().sum::<f64>() / pressures.len() as f64
                };
                (self.settings.thickness * 2.0 * mean, self.settings.opacity)
            }
        };

        Some(
            StrokeDraft::new(StrokeKind::Freehand { tool }, points, self.page).with_style(
                self.settings.color.clone(),
                thickness,
                opacity,
            ),
        )
    }

    /// Draft for a shape drag, or `None` for a click-sized drag.
    pub(super) fn shape_draft(&self, shape: ShapeType, start: Point, end: Point) -> Option<StrokeDraft> {
        if (end.x - start.x).abs() < MIN_SHAPE_EXTENT && (end.y - start.y).abs() < MIN_SHAPE_EXTENT {
            return None;
        }
        Some(
            StrokeDraft::new(StrokeKind::shape(shape), vec![start, end], self.page).with_style(
                self.settings.color.clone(),
                self.settings.thickness,
                self.settings.opacity,
            ),
        )
    }

    pub(super) fn symbol_preview(&self, start: Point, end: Point) -> SymbolPreview {
        SymbolPreview {
            start,
            end,
            glyph: self.settings.symbol.clone(),
            color: self.settings.color.clone(),
            opacity: self.settings.opacity,
        }
    }

    fn symbol_draft(&self, start: Point, end: Point) -> StrokeDraft {
        let preview = self.symbol_preview(start, end);
        StrokeDraft::new(
            StrokeKind::text(preview.glyph.clone()),
            vec![preview.anchor()],
            self.page,
        )
        .with_style(
            preview.color.clone(),
            preview.size() / 4.0,
            self.settings.opacity,
        )
    }

    pub(super) fn text_draft(&self, anchor: Point, text: &str) -> StrokeDraft {
        StrokeDraft::new(StrokeKind::text(text), vec![anchor], self.page).with_style(
            self.settings.color.clone(),
            self.settings.font_size / 4.0,
            self.settings.opacity,
        )
    }

    fn erase_at(&mut self, store: &mut StrokeStore, point: Point) {
        loop {
            let Some(id) = hit_test(point, self.settings.hit_radius, store.page_strokes(self.page))
                .map(|stroke| stroke.id.clone())
            else {
                break;
            };
            store.delete_stroke(&id);
        }
    }

    /// Erases at evenly spaced samples between two pointer positions so fast
    /// swipes do not skip thin strokes.
    fn erase_along(&mut self, store: &mut StrokeStore, from: Point, to: Point) {
        let step = self.settings.hit_radius.max(1.0);
        let samples = (util::distance(from, to) / step).ceil().max(1.0) as usize;
        for i in 1..=samples {
            let t = i as f64 / samples as f64;
            let p = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
            self.erase_at(store, p);
        }
    }

    fn fill_at(&mut self, store: &mut StrokeStore, point: Point) {
        let target = store
            .page_strokes(self.page)
            .rev()
            .filter(|stroke| matches!(stroke.kind, StrokeKind::Shape { .. }))
            .find(|stroke| stroke_contains(stroke, point, self.settings.hit_radius))
            .map(|stroke| stroke.id.clone());

        if let Some(id) = target {
            store.update_stroke(
                &id,
                StrokePatch {
                    fill_color: Some(Some(self.settings.fill_color.clone())),
                    ..Default::default()
                },
            );
        }
    }
}
