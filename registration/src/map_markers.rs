//! Terrain-side markers: projects store state onto the map widget and turns
//! map interaction into store edits.
//!
//! The manager owns a [`TerrainMarkerLayer`] (Leaflet in the browser, a
//! recorder in tests) and one handle per placed index. Handlers return an
//! [`Edit`] for the host to apply; the resulting store change comes back
//! through [`MapMarkerManager::sync`].

#[cfg(test)]
#[path = "map_markers_test.rs"]
mod map_markers_test;

use std::collections::BTreeMap;

use crate::consts::{GRAB_Y_RATIO_TOUCH, MARKER_ICON_SIZE};
use crate::coords::{CoordinateSnapshot, CoordinateStore, Edit};
use crate::geometry::LatLon;
use crate::input::PointerKind;
use crate::palette::{MarkerStyle, marker_style};

/// Map widget operations needed to show terrain markers.
pub trait TerrainMarkerLayer {
    type Handle;

    /// Create a draggable marker for `index`.
    fn add_marker(&mut self, index: usize, at: LatLon, style: &MarkerStyle) -> Self::Handle;
    fn move_marker(&mut self, handle: &Self::Handle, at: LatLon);
    fn remove_marker(&mut self, handle: Self::Handle);
}

/// How far to shift a touch drag's start point so the marker tip sits below
/// the finger instead of under it.
#[must_use]
pub fn touch_grab_shift(touch_offset_y: f64, marker_height: f64) -> f64 {
    let height = if marker_height > 0.0 { marker_height } else { MARKER_ICON_SIZE.1 };
    touch_offset_y - height * GRAB_Y_RATIO_TOUCH
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TouchGrab {
    index: usize,
    offset_y: f64,
    marker_height: f64,
}

/// Keeps one map marker per occupied terrain slot.
pub struct MapMarkerManager<L: TerrainMarkerLayer> {
    layer: L,
    markers: BTreeMap<usize, L::Handle>,
    touch_grab: Option<TouchGrab>,
}

impl<L: TerrainMarkerLayer> MapMarkerManager<L> {
    #[must_use]
    pub fn new(layer: L) -> Self {
        Self { layer, markers: BTreeMap::new(), touch_grab: None }
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut L {
        &mut self.layer
    }

    #[must_use]
    pub fn has_marker(&self, index: usize) -> bool {
        self.markers.contains_key(&index)
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    // --- Map interaction ---

    /// A click on the map fills the current terrain slot if it is free.
    #[must_use]
    pub fn on_map_click(&self, store: &CoordinateStore, at: LatLon) -> Option<Edit> {
        let index = store.current_lat_lon_index()?;
        if store.is_lat_lon_set(index) {
            return None;
        }
        Some(Edit::SetLatLon { index, point: at, skip_advance: false })
    }

    /// Dropping a dragged marker rewrites its own slot without advancing.
    #[must_use]
    pub fn on_marker_drag_end(&mut self, index: usize, at: LatLon) -> Edit {
        self.touch_grab = None;
        Edit::SetLatLon { index, point: at, skip_advance: true }
    }

    /// Right-click or long-press removes the marker and clears its slot.
    pub fn on_marker_context_menu(&mut self, index: usize) -> Edit {
        self.remove(index);
        Edit::ClearLatLon(index)
    }

    // --- Touch drag grab ---

    /// Record where a touch or pen contact landed on marker `index`.
    pub fn capture_touch_offset(&mut self, index: usize, kind: PointerKind, client_y: f64, marker_top: f64, marker_height: f64) {
        if !kind.is_coarse() {
            return;
        }
        self.touch_grab = Some(TouchGrab { index, offset_y: client_y - marker_top, marker_height });
    }

    /// Shift for the drag that is starting on `index`, if a touch offset was
    /// captured for it.
    #[must_use]
    pub fn drag_start_shift(&self, index: usize) -> Option<f64> {
        let grab = self.touch_grab.filter(|g| g.index == index)?;
        Some(touch_grab_shift(grab.offset_y, grab.marker_height))
    }

    // --- Reconcile ---

    /// Bring markers in line with the store: add missing, move existing,
    /// remove cleared.
    pub fn sync(&mut self, snapshot: &CoordinateSnapshot) {
        for (index, point) in snapshot.lat_lon.iter().enumerate() {
            match (*point, self.markers.get(&index)) {
                (Some(at), Some(handle)) => self.layer.move_marker(handle, at),
                (Some(at), None) => {
                    let handle = self.layer.add_marker(index, at, &marker_style(index));
                    self.markers.insert(index, handle);
                }
                (None, Some(_)) => self.remove(index),
                (None, None) => {}
            }
        }
        let stale: Vec<usize> = self.markers.range(snapshot.lat_lon.len()..).map(|(i, _)| *i).collect();
        for index in stale {
            self.remove(index);
        }
    }

    fn remove(&mut self, index: usize) {
        if let Some(handle) = self.markers.remove(&index) {
            self.layer.remove_marker(handle);
        }
        if self.touch_grab.is_some_and(|g| g.index == index) {
            self.touch_grab = None;
        }
    }

    /// Remove every marker.
    pub fn destroy(&mut self) {
        let indices: Vec<usize> = self.markers.keys().copied().collect();
        for index in indices {
            self.remove(index);
        }
        log::debug!("map markers destroyed");
    }
}
