//! Pan/zoom transform for the overlay image viewport.
//!
//! SYSTEM CONTEXT
//! ==============
//! The overlay image sits inside a transformed wrapper ("canvas") inside a
//! fixed-size viewport. Browser scroll/zoom is disabled there; this controller
//! owns scale and translation instead and is the single source of truth for
//! mapping a client point to an image pixel and back.
//!
//! SPACES
//! ======
//! - client: CSS pixels relative to the page, as reported by pointer events
//! - viewport: client minus the viewport's top-left corner
//! - content: viewport with the transform removed, `(v - t) / s`; the image's
//!   displayed box at scale 1 spans `[0, base.width] x [0, base.height]`
//! - natural: image pixels, `percent * natural size`
//!
//! GESTURES
//! ========
//! One pointer pans after travelling more than [`DRAG_THRESHOLD_PX`]. Two
//! pointers pinch: the midpoint delta pans and the distance ratio scales about
//! the midpoint. The wheel scales exponentially about the cursor. Every pan,
//! pinch, or wheel gesture arms a one-shot flag so the click the browser fires
//! afterwards does not place a point.

#[cfg(test)]
#[path = "pan_zoom_test.rs"]
mod pan_zoom_test;

use crate::consts::{DRAG_THRESHOLD_PX, MAX_ZOOM, MIN_ZOOM, WHEEL_SENSITIVITY};
use crate::geometry::{Point, Rect, Size};
use crate::input::{PointerId, PointerInput};

/// Result of resolving a client point against the overlay image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageCoordinates {
    /// Horizontal position as a fraction of the image width, in `[0, 1]`.
    pub x_percent: f64,
    /// Vertical position as a fraction of the image height, in `[0, 1]`.
    pub y_percent: f64,
    /// Natural-pixel x.
    pub image_x: f64,
    /// Natural-pixel y.
    pub image_y: f64,
}

/// Layout inputs measured by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewGeometry {
    /// Client rect of the viewport element.
    pub viewport: Rect,
    /// Displayed size of the image at scale 1.
    pub image_base: Size,
    /// Natural pixel size, known once the image has loaded.
    pub natural: Option<Size>,
}

/// Transform to apply to the canvas element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate: Point,
}

impl ViewTransform {
    /// CSS `transform` value for the canvas element.
    #[must_use]
    pub fn css_matrix(&self) -> String {
        format!(
            "matrix({s}, 0, 0, {s}, {tx}, {ty})",
            s = self.scale,
            tx = self.translate.x,
            ty = self.translate.y
        )
    }

    /// Inverse scale that keeps markers a constant on-screen size.
    #[must_use]
    pub fn marker_scale(&self) -> f64 {
        1.0 / self.scale
    }
}

#[derive(Debug, Clone, Copy)]
struct SinglePointer {
    id: PointerId,
    start: Point,
    last: Point,
}

#[derive(Debug, Clone, Copy)]
struct PinchSnapshot {
    distance: f64,
    scale: f64,
    last_midpoint: Point,
}

/// Scale/translate state plus active gesture tracking.
#[derive(Debug, Clone)]
pub struct PanZoomController {
    scale: f64,
    translate: Point,
    geometry: ViewGeometry,
    /// Active pointers in press order.
    pointers: Vec<(PointerId, Point)>,
    single: Option<SinglePointer>,
    pinch: Option<PinchSnapshot>,
    skip_next_click: bool,
}

impl Default for PanZoomController {
    fn default() -> Self {
        Self::new()
    }
}

impl PanZoomController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scale: MIN_ZOOM,
            translate: Point::default(),
            geometry: ViewGeometry::default(),
            pointers: Vec::new(),
            single: None,
            pinch: None,
            skip_next_click: false,
        }
    }

    // --- Accessors ---

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn translate(&self) -> Point {
        self.translate
    }

    #[must_use]
    pub fn geometry(&self) -> ViewGeometry {
        self.geometry
    }

    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        ViewTransform { scale: self.scale, translate: self.translate }
    }

    /// Whether the image has a known natural size.
    #[must_use]
    pub fn is_image_loaded(&self) -> bool {
        self.geometry.natural.is_some_and(Size::is_positive)
    }

    // --- Layout ---

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.geometry.viewport = viewport;
        self.clamp_translation();
    }

    pub fn set_image_base(&mut self, base: Size) {
        self.geometry.image_base = base;
        self.clamp_translation();
    }

    pub fn set_natural_size(&mut self, natural: Option<Size>) {
        self.geometry.natural = natural;
        self.clamp_translation();
    }

    pub fn set_geometry(&mut self, geometry: ViewGeometry) {
        self.geometry = geometry;
        self.clamp_translation();
    }

    /// Back to scale 1 at the origin. Called whenever a new image loads.
    pub fn reset(&mut self) {
        self.scale = MIN_ZOOM;
        self.translate = Point::default();
        self.skip_next_click = false;
        self.clamp_translation();
    }

    // --- Transform ---

    /// Translate by a viewport delta, then clamp.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.translate = self.translate.offset(dx, dy);
        self.clamp_translation();
    }

    /// Scale about `anchor` (viewport space; defaults to the viewport centre)
    /// so the content under the anchor stays put.
    pub fn set_scale(&mut self, next: f64, anchor: Option<Point>) {
        let target = next.clamp(MIN_ZOOM, MAX_ZOOM);
        if (target - self.scale).abs() < f64::EPSILON {
            return;
        }
        let anchor = anchor.unwrap_or_else(|| {
            let viewport = self.geometry.viewport;
            Point::new(viewport.width / 2.0, viewport.height / 2.0)
        });
        let ratio = target / self.scale;
        self.translate = Point::new(
            anchor.x - ratio * (anchor.x - self.translate.x),
            anchor.y - ratio * (anchor.y - self.translate.y),
        );
        self.scale = target;
        self.clamp_translation();
    }

    /// Keep the content covering the viewport edge it can reach:
    /// `min(0, viewport - content) <= t <= 0` per axis.
    fn clamp_translation(&mut self) {
        let base = self.geometry.image_base;
        let viewport = self.geometry.viewport.size();
        if !base.is_positive() || !viewport.is_positive() {
            return;
        }
        let min_x = (viewport.width - base.width * self.scale).min(0.0);
        let min_y = (viewport.height - base.height * self.scale).min(0.0);
        self.translate = Point::new(self.translate.x.clamp(min_x, 0.0), self.translate.y.clamp(min_y, 0.0));
    }

    fn to_viewport(&self, client: Point) -> Point {
        let origin = self.geometry.viewport.origin();
        Point::new(client.x - origin.x, client.y - origin.y)
    }

    // --- Coordinate resolution ---

    /// Map a client point to image percent and natural pixels. `None` until the
    /// image has loaded or while its displayed box is empty.
    #[must_use]
    pub fn to_image_coordinates(&self, client: Point) -> Option<ImageCoordinates> {
        let natural = self.geometry.natural.filter(|n| n.is_positive())?;
        let base = self.geometry.image_base;
        if !base.is_positive() {
            return None;
        }
        let pointer = self.to_viewport(client);
        let content_x = (pointer.x - self.translate.x) / self.scale;
        let content_y = (pointer.y - self.translate.y) / self.scale;
        let x_percent = (content_x / base.width).clamp(0.0, 1.0);
        let y_percent = (content_y / base.height).clamp(0.0, 1.0);
        Some(ImageCoordinates {
            x_percent,
            y_percent,
            image_x: x_percent * natural.width,
            image_y: y_percent * natural.height,
        })
    }

    /// Percent of the natural image size for a natural pixel.
    #[must_use]
    pub fn natural_to_percent(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let natural = self.geometry.natural.filter(|n| n.is_positive())?;
        Some((x / natural.width, y / natural.height))
    }

    /// Viewport position of an image percent under the current transform.
    #[must_use]
    pub fn percent_to_viewport(&self, x_percent: f64, y_percent: f64) -> Point {
        let content = self.content_box();
        Point::new(content.left + x_percent * content.width, content.top + y_percent * content.height)
    }

    /// Client position of an image percent under the current transform.
    #[must_use]
    pub fn percent_to_client(&self, x_percent: f64, y_percent: f64) -> Point {
        let origin = self.geometry.viewport.origin();
        let viewport = self.percent_to_viewport(x_percent, y_percent);
        Point::new(viewport.x + origin.x, viewport.y + origin.y)
    }

    /// Displayed image box in viewport space.
    #[must_use]
    pub fn content_box(&self) -> Rect {
        let base = self.geometry.image_base;
        Rect::new(self.translate.x, self.translate.y, base.width * self.scale, base.height * self.scale)
    }

    // --- Gestures ---

    pub fn on_pointer_down(&mut self, input: &PointerInput) {
        if !input.starts_gesture() {
            return;
        }
        match self.pointers.iter_mut().find(|(id, _)| *id == input.id) {
            Some((_, at)) => *at = input.client,
            None => self.pointers.push((input.id, input.client)),
        }
        match self.pointers.as_slice() {
            [_] => {
                self.single = Some(SinglePointer { id: input.id, start: input.client, last: input.client });
            }
            [(_, a), (_, b)] => {
                self.pinch = Some(PinchSnapshot { distance: a.distance_to(*b), scale: self.scale, last_midpoint: a.midpoint(*b) });
            }
            _ => {}
        }
    }

    /// Track a move. Returns `true` when the host should call
    /// `preventDefault` because the move was consumed as a pan or pinch.
    pub fn on_pointer_move(&mut self, input: &PointerInput) -> bool {
        let Some(slot) = self.pointers.iter_mut().find(|(id, _)| *id == input.id) else {
            return false;
        };
        slot.1 = input.client;

        if let [(_, a), (_, b), ..] = self.pointers.as_slice() {
            let (a, b) = (*a, *b);
            let midpoint = a.midpoint(b);
            if let Some(pinch) = self.pinch {
                self.pan_by(midpoint.x - pinch.last_midpoint.x, midpoint.y - pinch.last_midpoint.y);
                if pinch.distance > 0.0 {
                    let next = pinch.scale * (a.distance_to(b) / pinch.distance);
                    let anchor = self.to_viewport(midpoint);
                    self.set_scale(next, Some(anchor));
                }
                self.pinch = Some(PinchSnapshot { last_midpoint: midpoint, ..pinch });
            }
            self.skip_next_click = true;
            return true;
        }

        let Some(single) = self.single.filter(|s| s.id == input.id) else {
            return false;
        };
        let dx = input.client.x - single.last.x;
        let dy = input.client.y - single.last.y;
        if !self.skip_next_click && input.client.distance_to(single.start) > DRAG_THRESHOLD_PX {
            self.skip_next_click = true;
        }
        let panning = self.skip_next_click;
        if panning {
            self.pan_by(dx, dy);
        }
        self.single = Some(SinglePointer { last: input.client, ..single });
        panning
    }

    /// Release a pointer (`pointerup` or `pointercancel`).
    pub fn on_pointer_up(&mut self, input: &PointerInput) {
        self.pointers.retain(|(id, _)| *id != input.id);
        if self.single.is_some_and(|s| s.id == input.id) {
            self.single = None;
        }
        if self.pointers.len() < 2 {
            self.pinch = None;
            // Resume a single-pointer pan from where the finger is now.
            if let (Some(single), [(id, at)]) = (self.single, self.pointers.as_slice())
                && single.id == *id
            {
                self.single = Some(SinglePointer { last: *at, ..single });
            }
        }
    }

    /// Zoom about the cursor. Returns `true` when the wheel was consumed.
    pub fn on_wheel(&mut self, client: Point, delta_y: f64) -> bool {
        if !self.is_image_loaded() || delta_y == 0.0 {
            return false;
        }
        let anchor = self.to_viewport(client);
        let factor = (-delta_y * WHEEL_SENSITIVITY).exp();
        self.set_scale(self.scale * factor, Some(anchor));
        self.skip_next_click = true;
        true
    }

    /// Consume the one-shot click suppression flag.
    pub fn should_ignore_click(&mut self) -> bool {
        std::mem::take(&mut self.skip_next_click)
    }

    /// Number of pointers currently down on the viewport.
    #[must_use]
    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }
}
