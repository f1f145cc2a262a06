use super::*;
use crate::draw::{PenTool, ShapeType};

fn pen_at(points: &[(f64, f64)], page: u32) -> StrokeDraft {
    StrokeDraft::new(
        StrokeKind::pen(),
        points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        page,
    )
}

fn rect(page: u32) -> StrokeDraft {
    StrokeDraft::new(
        StrokeKind::shape(ShapeType::Rectangle),
        vec![Point::new(0.0, 0.0), Point::new(100.0, 50.0)],
        page,
    )
}

#[test]
fn add_assigns_unique_ids_and_keeps_insertion_order() {
    let mut store = StrokeStore::new();
    let a = store.add_stroke(pen_at(&[(0.0, 0.0)], 1));
    let b = store.add_stroke(rect(1));
    assert_ne!(a, b);
    let ids: Vec<_> = store.strokes().iter().map(|s| s.id.clone()).collect();
    assert_eq!(ids, vec![a, b]);
    assert!(store.strokes().iter().all(|s| s.timestamp > 0));
}

#[test]
fn undo_redo_inverse_law() {
    let mut store = StrokeStore::new();
    let empty = store.strokes().to_vec();

    let a = store.add_stroke(pen_at(&[(1.0, 1.0), (2.0, 2.0)], 1));
    let after_add = store.strokes().to_vec();
    store.update_stroke(
        &a,
        StrokePatch {
            color: Some("#ef4444".into()),
            ..Default::default()
        },
    );
    let after_update = store.strokes().to_vec();
    let b = store.add_stroke(rect(2));
    store.delete_stroke(&a);
    let final_state = store.strokes().to_vec();

    for _ in 0..4 {
        assert!(store.undo());
    }
    assert_eq!(store.strokes(), empty.as_slice());
    assert!(!store.can_undo());
    assert!(!store.undo());

    assert!(store.redo());
    assert_eq!(store.strokes(), after_add.as_slice());
    assert!(store.redo());
    assert_eq!(store.strokes(), after_update.as_slice());
    assert!(store.redo());
    assert!(store.redo());
    assert_eq!(store.strokes(), final_state.as_slice());
    assert!(store.stroke(&b).is_some());
    assert!(!store.can_redo());
    assert!(!store.redo());
}

#[test]
fn new_edit_clears_redo() {
    let mut store = StrokeStore::new();
    store.add_stroke(pen_at(&[(0.0, 0.0)], 1));
    store.add_stroke(pen_at(&[(5.0, 5.0)], 1));
    store.undo();
    assert!(store.can_redo());

    store.add_stroke(rect(1));
    assert!(!store.can_redo());
    assert_eq!(store.redo_depth(), 0);
}

#[test]
fn update_on_missing_id_leaves_history_untouched() {
    let mut store = StrokeStore::new();
    let id = store.add_stroke(rect(1));
    store.delete_stroke(&id);
    let depth = store.undo_depth();

    let changed = store.update_stroke(
        &id,
        StrokePatch {
            thickness: Some(9.0),
            ..Default::default()
        },
    );
    assert!(!changed);
    assert_eq!(store.undo_depth(), depth);
}

#[test]
fn empty_patch_is_a_no_op() {
    let mut store = StrokeStore::new();
    let id = store.add_stroke(rect(1));
    let depth = store.undo_depth();
    assert!(!store.update_stroke(&id, StrokePatch::default()));
    assert_eq!(store.undo_depth(), depth);
}

#[test]
fn patch_can_set_and_clear_fill() {
    let mut store = StrokeStore::new();
    let id = store.add_stroke(rect(1));
    store.update_stroke(
        &id,
        StrokePatch {
            fill_color: Some(Some("#22c55e".into())),
            ..Default::default()
        },
    );
    assert_eq!(store.stroke(&id).unwrap().fill_color.as_deref(), Some("#22c55e"));

    store.update_stroke(
        &id,
        StrokePatch {
            fill_color: Some(None),
            ..Default::default()
        },
    );
    assert!(store.stroke(&id).unwrap().fill_color.is_none());
}

#[test]
fn deleting_an_already_erased_selection_adds_no_history() {
    let mut store = StrokeStore::new();
    let id = store.add_stroke(pen_at(&[(10.0, 10.0)], 1));
    store.select_stroke(Some(&id));

    // Another path (eraser) removes the stroke first.
    assert!(store.delete_stroke(&id));
    let depth = store.undo_depth();

    assert!(!store.delete_stroke(&id));
    assert_eq!(store.delete_selected(), 0);
    assert_eq!(store.undo_depth(), depth);
    assert!(store.selected_ids().is_empty());
}

#[test]
fn delete_selected_is_one_undo_step() {
    let mut store = StrokeStore::new();
    let a = store.add_stroke(rect(1));
    let b = store.add_stroke(pen_at(&[(1.0, 1.0)], 1));
    let c = store.add_stroke(pen_at(&[(2.0, 2.0)], 1));
    store.select_strokes([a.clone(), c.clone()]);

    assert_eq!(store.delete_selected(), 2);
    assert_eq!(store.strokes().len(), 1);
    assert!(store.stroke(&b).is_some());

    store.undo();
    assert_eq!(store.strokes().len(), 3);
}

#[test]
fn paste_offsets_copy_with_fresh_id() {
    let mut store = StrokeStore::new();
    let original = store.add_stroke(pen_at(&[(10.0, 10.0)], 3));
    store.select_stroke(Some(&original));
    assert_eq!(store.copy_selected(), 1);

    let pasted = store.paste(3, (20.0, 20.0));
    assert_eq!(pasted.len(), 1);
    let copy = store.stroke(&pasted[0]).unwrap();
    assert_ne!(copy.id, original);
    assert_eq!(copy.page_id, 3);
    assert_eq!(copy.points, vec![Point::new(30.0, 30.0)]);
    assert_eq!(store.selected_ids(), pasted.as_slice());

    // The source is untouched.
    assert_eq!(store.stroke(&original).unwrap().points, vec![Point::new(10.0, 10.0)]);
}

#[test]
fn paste_targets_requested_page_and_empty_clipboard_does_nothing() {
    let mut store = StrokeStore::new();
    assert!(store.paste(1, PASTE_OFFSET).is_empty());
    assert!(!store.can_undo());

    let id = store.add_stroke(rect(1));
    store.select_stroke(Some(&id));
    store.copy_selected();
    let pasted = store.paste(4, PASTE_OFFSET);
    assert_eq!(store.stroke(&pasted[0]).unwrap().page_id, 4);
    assert_eq!(store.page_strokes(4).count(), 1);
}

#[test]
fn cut_removes_and_fills_clipboard() {
    let mut store = StrokeStore::new();
    let id = store.add_stroke(rect(1));
    store.select_stroke(Some(&id));

    assert_eq!(store.cut_selected(), 1);
    assert!(store.strokes().is_empty());
    assert_eq!(store.clipboard_len(), 1);

    let pasted = store.paste(1, (0.0, 0.0));
    assert_ne!(pasted[0], id);
}

#[test]
fn duplicate_selects_the_copies() {
    let mut store = StrokeStore::new();
    let a = store.add_stroke(rect(1));
    let b = store.add_stroke(pen_at(&[(5.0, 5.0), (6.0, 6.0)], 1));
    store.select_strokes([a.clone(), b.clone()]);

    let copies = store.duplicate_selected(1);
    assert_eq!(copies.len(), 2);
    assert_eq!(store.selected_ids(), copies.as_slice());
    assert!(!store.is_selected(&a));
    let moved = store.stroke(&copies[1]).unwrap();
    assert_eq!(moved.points[0], Point::new(25.0, 25.0));
    assert_eq!(store.clipboard_len(), 0);
}

#[test]
fn selection_transitions() {
    let mut store = StrokeStore::new();
    let a = store.add_stroke(rect(1));
    let b = store.add_stroke(rect(1));
    let missing = StrokeId::from("nope");

    store.select_stroke(Some(&a));
    store.add_to_selection(&b);
    store.add_to_selection(&b);
    store.add_to_selection(&missing);
    assert_eq!(store.selected_ids(), &[a.clone(), b.clone()]);
    assert_eq!(store.primary_selection(), Some(&a));

    store.remove_from_selection(&a);
    assert_eq!(store.selected_ids(), &[b.clone()]);

    store.select_stroke(None);
    assert!(store.selected_ids().is_empty());

    store.select_strokes([b.clone(), missing, b.clone()]);
    assert_eq!(store.selected_ids(), &[b]);
}

#[test]
fn selection_changes_are_not_undoable_but_bump_revision() {
    let mut store = StrokeStore::new();
    let a = store.add_stroke(rect(1));
    let depth = store.undo_depth();
    let revision = store.revision();

    store.select_stroke(Some(&a));
    assert_eq!(store.undo_depth(), depth);
    assert!(store.revision() > revision);

    let revision = store.revision();
    store.clear_selection();
    store.clear_selection();
    assert_eq!(store.revision(), revision + 1);
}

#[test]
fn undo_prunes_selection_of_vanished_strokes() {
    let mut store = StrokeStore::new();
    let id = store.add_stroke(rect(1));
    store.select_stroke(Some(&id));
    store.undo();
    assert!(store.strokes().is_empty());
    assert!(store.selected_ids().is_empty());
}

#[test]
fn select_all_is_scoped_to_page() {
    let mut store = StrokeStore::new();
    let a = store.add_stroke(rect(1));
    store.add_stroke(rect(2));
    let c = store.add_stroke(pen_at(&[(0.0, 0.0)], 1));
    store.select_all(1);
    assert_eq!(store.selected_ids(), &[a, c]);
}

#[test]
fn page_strokes_preserve_insertion_order() {
    let mut store = StrokeStore::new();
    let a = store.add_stroke(rect(2));
    store.add_stroke(rect(1));
    let c = store.add_stroke(StrokeDraft::new(
        StrokeKind::Freehand {
            tool: PenTool::Highlighter,
        },
        vec![Point::new(0.0, 0.0)],
        2,
    ));
    let ids: Vec<_> = store.page_strokes(2).map(|s| s.id.clone()).collect();
    assert_eq!(ids, vec![a, c]);
}

#[test]
fn gesture_coalesces_into_one_undo_entry() {
    let mut store = StrokeStore::new();
    let id = store.add_stroke(rect(1));
    let depth = store.undo_depth();

    store.begin_gesture();
    for _ in 0..5 {
        store.translate_strokes(std::slice::from_ref(&id), 2.0, 1.0);
    }
    store.end_gesture();
    assert_eq!(store.undo_depth(), depth + 1);
    assert_eq!(store.stroke(&id).unwrap().points[0], Point::new(10.0, 5.0));

    store.undo();
    assert_eq!(store.stroke(&id).unwrap().points[0], Point::new(0.0, 0.0));
}

#[test]
fn empty_gesture_records_nothing() {
    let mut store = StrokeStore::new();
    store.add_stroke(rect(1));
    let depth = store.undo_depth();
    store.begin_gesture();
    store.translate_strokes(&[StrokeId::from("gone")], 5.0, 5.0);
    store.end_gesture();
    assert_eq!(store.undo_depth(), depth);
}

#[test]
fn undo_closes_an_open_gesture() {
    let mut store = StrokeStore::new();
    let id = store.add_stroke(rect(1));
    store.begin_gesture();
    store.translate_strokes(std::slice::from_ref(&id), 1.0, 0.0);
    assert!(store.undo());
    assert!(!store.gesture_open());

    store.translate_strokes(std::slice::from_ref(&id), 1.0, 0.0);
    store.translate_strokes(std::slice::from_ref(&id), 1.0, 0.0);
    assert_eq!(store.undo_depth(), 3);
}

#[test]
fn history_cap_drops_oldest_entries() {
    let mut store = StrokeStore::with_history_limit(3);
    for i in 0..6 {
        store.add_stroke(pen_at(&[(i as f64, 0.0)], 1));
    }
    assert_eq!(store.undo_depth(), 3);
    while store.undo() {}
    assert_eq!(store.strokes().len(), 3);
}

#[test]
fn replace_all_resets_selection_and_history() {
    let mut store = StrokeStore::new();
    let id = store.add_stroke(rect(1));
    store.select_stroke(Some(&id));

    let loaded = vec![
        pen_at(&[(1.0, 1.0)], 1).into_stroke(StrokeId::from("loaded"), 42),
    ];
    store.replace_all(loaded.clone());
    assert_eq!(store.strokes(), loaded.as_slice());
    assert!(store.selected_ids().is_empty());
    assert!(!store.can_undo());
    assert!(!store.can_redo());
}
