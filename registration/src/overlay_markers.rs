//! Image-side markers over the pannable overlay.
//!
//! Mirrors [`crate::map_markers`] for natural-pixel points. Every placement
//! and every drag goes through the [`PanZoomController`], so clicks, drags,
//! and marker positions use the same coordinate math at any zoom.
//!
//! While dragging, the stored pixel is the marker's tip rather than the
//! pointer. On press the manager records a grab offset from the pointer to the
//! tip; each move resolves `pointer + offset`. Touch and pen contacts are
//! treated as holding the marker above its top edge so the finger never covers
//! the target pixel.

#[cfg(test)]
#[path = "overlay_markers_test.rs"]
mod overlay_markers_test;

use std::collections::BTreeMap;

use crate::consts::{GRAB_Y_RATIO_MOUSE, GRAB_Y_RATIO_TOUCH};
use crate::coords::{CoordinateSnapshot, CoordinateStore, Edit};
use crate::geometry::{ImagePoint, Point, Rect};
use crate::input::{PointerId, PointerInput};
use crate::pan_zoom::PanZoomController;
use crate::palette::{MarkerStyle, marker_style};

/// Where to draw an overlay marker's tip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPlacement {
    /// Fraction of the image width, in `[0, 1]`. Used for `left: %` inside
    /// the transformed canvas.
    pub x_percent: f64,
    /// Fraction of the image height, in `[0, 1]`.
    pub y_percent: f64,
    /// Tip position in viewport space under the current transform.
    pub viewport: Point,
}

/// DOM operations needed to show overlay markers.
pub trait OverlayMarkerLayer {
    type Handle;

    fn create_marker(&mut self, index: usize, style: &MarkerStyle) -> Self::Handle;
    /// Position and reveal a marker.
    fn place_marker(&mut self, handle: &Self::Handle, placement: &MarkerPlacement);
    /// Keep the marker but make it invisible.
    fn hide_marker(&mut self, handle: &Self::Handle);
    fn remove_marker(&mut self, handle: Self::Handle);
}

struct OverlayMarker<H> {
    handle: H,
    natural: ImagePoint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    index: usize,
    pointer: PointerId,
    grab_offset: Point,
}

/// Offset from the pointer to the marker tip at the start of a drag.
#[must_use]
pub fn grab_offset(input: &PointerInput, marker_rect: Rect) -> Point {
    let ratio = if input.kind.is_coarse() { GRAB_Y_RATIO_TOUCH } else { GRAB_Y_RATIO_MOUSE };
    let tip = marker_rect.bottom_center();
    let held_y = marker_rect.top + marker_rect.height * ratio;
    Point::new(tip.x - input.client.x, tip.y - held_y)
}

/// Keeps one overlay marker per occupied image slot.
pub struct OverlayMarkerManager<L: OverlayMarkerLayer> {
    layer: L,
    markers: BTreeMap<usize, OverlayMarker<L::Handle>>,
    drag: Option<DragState>,
    mobile_layout: bool,
}

impl<L: OverlayMarkerLayer> OverlayMarkerManager<L> {
    #[must_use]
    pub fn new(layer: L) -> Self {
        Self { layer, markers: BTreeMap::new(), drag: None, mobile_layout: false }
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut L {
        &mut self.layer
    }

    /// On the mobile layout there is no secondary action, so context-menu
    /// clearing is off.
    pub fn set_mobile_layout(&mut self, mobile: bool) {
        self.mobile_layout = mobile;
    }

    #[must_use]
    pub fn has_marker(&self, index: usize) -> bool {
        self.markers.contains_key(&index)
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Index of the marker being dragged.
    #[must_use]
    pub fn dragging(&self) -> Option<usize> {
        self.drag.map(|d| d.index)
    }

    // --- Clicks ---

    /// A click on the image fills the current image slot. The click-skip flag
    /// is only consumed once every other precondition holds.
    pub fn handle_image_click(&self, store: &CoordinateStore, pan_zoom: &mut PanZoomController, client: Point) -> Option<Edit> {
        let index = store.current_xy_index()?;
        if !pan_zoom.is_image_loaded() || store.is_image_coordinate_set(index) {
            return None;
        }
        if pan_zoom.should_ignore_click() {
            log::debug!("click after pan ignored");
            return None;
        }
        let coords = pan_zoom.to_image_coordinates(client)?;
        Some(Edit::SetImage { index, point: ImagePoint::new(coords.image_x, coords.image_y), skip_advance: false })
    }

    /// Right-click clears the slot, except on the mobile layout.
    pub fn on_marker_context_menu(&mut self, index: usize) -> Option<Edit> {
        if self.mobile_layout {
            return None;
        }
        self.remove(index);
        Some(Edit::ClearImage(index))
    }

    // --- Drag ---

    /// Start dragging marker `index`. Returns `true` when the host should set
    /// pointer capture on the marker element.
    pub fn on_marker_pointer_down(&mut self, index: usize, input: &PointerInput, marker_rect: Rect, pan_zoom: &PanZoomController) -> bool {
        if !pan_zoom.is_image_loaded() || !self.has_marker(index) || !input.starts_gesture() {
            return false;
        }
        self.drag = Some(DragState { index, pointer: input.id, grab_offset: grab_offset(input, marker_rect) });
        true
    }

    /// Move the dragged marker. Only the capturing pointer is honoured.
    pub fn on_marker_pointer_move(&mut self, input: &PointerInput, pan_zoom: &PanZoomController) -> Option<Edit> {
        let drag = self.drag.filter(|d| d.pointer == input.id)?;
        let target = input.client.offset(drag.grab_offset.x, drag.grab_offset.y);
        let coords = pan_zoom.to_image_coordinates(target)?;
        let natural = ImagePoint::new(coords.image_x, coords.image_y);
        let marker = self.markers.get_mut(&drag.index)?;
        marker.natural = natural;
        let placement = MarkerPlacement {
            x_percent: coords.x_percent,
            y_percent: coords.y_percent,
            viewport: pan_zoom.percent_to_viewport(coords.x_percent, coords.y_percent),
        };
        self.layer.place_marker(&marker.handle, &placement);
        Some(Edit::SetImage { index: drag.index, point: natural, skip_advance: true })
    }

    /// End the drag. Returns `true` when the host should release capture.
    pub fn on_marker_pointer_up(&mut self, input: &PointerInput) -> bool {
        if self.drag.is_some_and(|d| d.pointer == input.id) {
            self.drag = None;
            return true;
        }
        false
    }

    // --- Reconcile ---

    fn placement(pan_zoom: &PanZoomController, natural: ImagePoint) -> Option<MarkerPlacement> {
        let (x, y) = pan_zoom.natural_to_percent(natural.x, natural.y)?;
        let (x_percent, y_percent) = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
        Some(MarkerPlacement { x_percent, y_percent, viewport: pan_zoom.percent_to_viewport(x_percent, y_percent) })
    }

    fn show(layer: &mut L, marker: &OverlayMarker<L::Handle>, pan_zoom: &PanZoomController) {
        match Self::placement(pan_zoom, marker.natural) {
            Some(placement) => layer.place_marker(&marker.handle, &placement),
            None => layer.hide_marker(&marker.handle),
        }
    }

    /// Bring markers in line with the store. Markers that cannot be placed
    /// yet are hidden, not removed.
    pub fn sync(&mut self, snapshot: &CoordinateSnapshot, pan_zoom: &PanZoomController) {
        for (index, point) in snapshot.xy.iter().enumerate() {
            match point {
                Some(natural) => {
                    let layer = &mut self.layer;
                    let marker = self.markers.entry(index).or_insert_with(|| OverlayMarker {
                        handle: layer.create_marker(index, &marker_style(index)),
                        natural: *natural,
                    });
                    marker.natural = *natural;
                    Self::show(layer, marker, pan_zoom);
                }
                None => self.remove(index),
            }
        }
        let stale: Vec<usize> = self.markers.range(snapshot.xy.len()..).map(|(i, _)| *i).collect();
        for index in stale {
            self.remove(index);
        }
    }

    /// Reposition every marker after a resize or transform change.
    pub fn refresh_positions(&mut self, pan_zoom: &PanZoomController) {
        for marker in self.markers.values() {
            Self::show(&mut self.layer, marker, pan_zoom);
        }
    }

    fn remove(&mut self, index: usize) {
        if self.drag.is_some_and(|d| d.index == index) {
            self.drag = None;
        }
        if let Some(marker) = self.markers.remove(&index) {
            self.layer.remove_marker(marker.handle);
        }
    }

    /// Remove every marker.
    pub fn destroy(&mut self) {
        self.drag = None;
        while let Some((_, marker)) = self.markers.pop_first() {
            self.layer.remove_marker(marker.handle);
        }
        log::debug!("overlay markers destroyed");
    }
}
