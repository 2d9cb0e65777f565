#![allow(clippy::float_cmp)]

use super::*;
use crate::coords::SetOptions;

#[derive(Debug, Clone, PartialEq)]
enum Op {
    Add(usize, LatLon, String),
    Move(usize, LatLon),
    Remove(usize),
}

#[derive(Default)]
struct RecordingLayer {
    ops: Vec<Op>,
}

impl TerrainMarkerLayer for RecordingLayer {
    type Handle = usize;

    fn add_marker(&mut self, index: usize, at: LatLon, style: &MarkerStyle) -> usize {
        self.ops.push(Op::Add(index, at, style.color.clone()));
        index
    }

    fn move_marker(&mut self, handle: &usize, at: LatLon) {
        self.ops.push(Op::Move(*handle, at));
    }

    fn remove_marker(&mut self, handle: usize) {
        self.ops.push(Op::Remove(handle));
    }
}

fn manager() -> MapMarkerManager<RecordingLayer> {
    MapMarkerManager::new(RecordingLayer::default())
}

// =============================================================
// Map clicks
// =============================================================

#[test]
fn click_fills_current_free_slot() {
    let store = CoordinateStore::new(3);
    let mm = manager();
    let at = LatLon::new(60.39, 5.32);
    assert_eq!(mm.on_map_click(&store, at), Some(Edit::SetLatLon { index: 0, point: at, skip_advance: false }));
}

#[test]
fn click_ignored_when_current_slot_occupied() {
    let mut store = CoordinateStore::new(3);
    store.set_lat_lon_at(1, 60.0, 5.0, SetOptions::default());
    store.select_lat_lon_index(1);
    assert_eq!(manager().on_map_click(&store, LatLon::new(1.0, 1.0)), None);
}

#[test]
fn click_ignored_when_all_slots_full() {
    let mut store = CoordinateStore::new(1);
    store.set_lat_lon_at(0, 60.0, 5.0, SetOptions::default());
    assert_eq!(manager().on_map_click(&store, LatLon::new(1.0, 1.0)), None);
}

#[test]
fn three_clicks_fill_the_store() {
    let mut store = CoordinateStore::new(3);
    let mut mm = manager();
    for i in 0..3 {
        let Some(edit) = mm.on_map_click(&store, LatLon::new(60.0 + f64::from(i), 5.0)) else {
            panic!("expected an edit for click {i}");
        };
        store.apply(edit);
        mm.sync(&store.snapshot());
    }
    assert!(!store.has_available_lat_lon_slot());
    assert_eq!(mm.marker_count(), 3);
}

// =============================================================
// Drag / context menu
// =============================================================

#[test]
fn drag_end_rewrites_own_slot_without_advance() {
    let mut mm = manager();
    let at = LatLon::new(61.0, 6.0);
    assert_eq!(mm.on_marker_drag_end(2, at), Edit::SetLatLon { index: 2, point: at, skip_advance: true });
}

#[test]
fn context_menu_removes_marker_and_clears_slot() {
    let mut store = CoordinateStore::new(3);
    let mut mm = manager();
    store.set_lat_lon_at(0, 60.0, 5.0, SetOptions::default());
    store.set_lat_lon_at(1, 61.0, 5.0, SetOptions::default());
    mm.sync(&store.snapshot());

    let edit = mm.on_marker_context_menu(0);
    assert_eq!(edit, Edit::ClearLatLon(0));
    assert!(!mm.has_marker(0));
    assert_eq!(mm.layer().ops.last(), Some(&Op::Remove(0)));

    store.apply(edit);
    mm.sync(&store.snapshot());
    // Next click refills the cleared slot directly.
    assert_eq!(
        mm.on_map_click(&store, LatLon::new(62.0, 5.0)).map(|e| matches!(e, Edit::SetLatLon { index: 0, .. })),
        Some(true)
    );
}

// =============================================================
// Reconcile
// =============================================================

#[test]
fn sync_adds_moves_and_removes() {
    let mut store = CoordinateStore::new(2);
    let mut mm = manager();
    store.set_lat_lon_at(0, 60.0, 5.0, SetOptions::default());
    mm.sync(&store.snapshot());
    store.set_lat_lon_at(0, 60.5, 5.5, SetOptions::skip_advance());
    mm.sync(&store.snapshot());
    store.clear_lat_lon_at(0);
    mm.sync(&store.snapshot());

    assert_eq!(
        mm.layer().ops,
        vec![
            Op::Add(0, LatLon::new(60.0, 5.0), "#d63d3d".to_owned()),
            Op::Move(0, LatLon::new(60.5, 5.5)),
            Op::Remove(0),
        ]
    );
    assert_eq!(mm.marker_count(), 0);
}

#[test]
fn markers_use_per_index_colors() {
    let mut store = CoordinateStore::new(3);
    let mut mm = manager();
    store.set_lat_lon_at(2, 60.0, 5.0, SetOptions::default());
    mm.sync(&store.snapshot());
    assert_eq!(mm.layer().ops, vec![Op::Add(2, LatLon::new(60.0, 5.0), "#1f78d1".to_owned())]);
}

#[test]
fn destroy_removes_everything() {
    let mut store = CoordinateStore::new(2);
    let mut mm = manager();
    store.set_lat_lon_at(0, 60.0, 5.0, SetOptions::default());
    store.set_lat_lon_at(1, 61.0, 5.0, SetOptions::default());
    mm.sync(&store.snapshot());
    mm.destroy();
    assert_eq!(mm.marker_count(), 0);
    assert_eq!(mm.layer().ops.iter().filter(|op| matches!(op, Op::Remove(_))).count(), 2);
}

// =============================================================
// Touch grab
// =============================================================

#[test]
fn touch_grab_shift_puts_finger_above_marker() {
    // Touched 10px below the marker top; the finger should sit 0.3 heights above it.
    assert_eq!(touch_grab_shift(10.0, 50.0), 25.0);
    assert_eq!(touch_grab_shift(0.0, 0.0), 15.6);
}

#[test]
fn drag_start_shift_only_for_coarse_pointers() {
    let mut mm = manager();
    mm.capture_touch_offset(1, PointerKind::Mouse, 110.0, 100.0, 52.0);
    assert_eq!(mm.drag_start_shift(1), None);

    mm.capture_touch_offset(1, PointerKind::Touch, 110.0, 100.0, 50.0);
    assert_eq!(mm.drag_start_shift(1), Some(25.0));
    assert_eq!(mm.drag_start_shift(0), None);

    let _edit = mm.on_marker_drag_end(1, LatLon::new(1.0, 1.0));
    assert_eq!(mm.drag_start_shift(1), None);
}
