//! DOM measurement and event conversion.

use registration::geometry::{Point, Rect, Size};
use registration::input::{Button, PointerInput, PointerKind};
use wasm_bindgen::JsCast;

use crate::util::layout::{MARKER_INDEX_ATTR, MOBILE_MEDIA_QUERY, parse_marker_index};

pub fn pointer_input(ev: &web_sys::PointerEvent) -> PointerInput {
    PointerInput::new(
        ev.pointer_id(),
        PointerKind::from_dom(&ev.pointer_type()),
        Button::from_dom(ev.button()),
        client_point(ev),
    )
}

pub fn client_point(ev: &web_sys::MouseEvent) -> Point {
    Point::new(f64::from(ev.client_x()), f64::from(ev.client_y()))
}

pub fn element_rect(element: &web_sys::Element) -> Rect {
    let rect = element.get_bounding_client_rect();
    Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

/// Layout size, unaffected by CSS transforms.
pub fn layout_size(element: &web_sys::HtmlElement) -> Size {
    Size::new(f64::from(element.offset_width()), f64::from(element.offset_height()))
}

/// Intrinsic pixel size, `None` until the image has decoded.
pub fn natural_size(image: &web_sys::HtmlImageElement) -> Option<Size> {
    let size = Size::new(f64::from(image.natural_width()), f64::from(image.natural_height()));
    size.is_positive().then_some(size)
}

pub fn is_mobile_layout() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    match window.match_media(MOBILE_MEDIA_QUERY) {
        Ok(Some(query)) => query.matches(),
        Ok(None) => false,
        Err(err) => {
            log::warn!("matchMedia failed: {err:?}");
            false
        }
    }
}

/// `(hostname, search)` of the current page.
pub fn location_parts() -> (String, String) {
    let Some(location) = web_sys::window().map(|w| w.location()) else {
        return (String::new(), String::new());
    };
    let hostname = location.hostname().unwrap_or_default();
    let search = location.search().unwrap_or_default();
    (hostname, search)
}

/// The overlay marker element an event started on, with its slot index.
pub fn marker_from_event(ev: &web_sys::Event) -> Option<(usize, web_sys::Element)> {
    let target = ev.target()?.dyn_into::<web_sys::Element>().ok()?;
    let marker = target.closest(&format!("[{MARKER_INDEX_ATTR}]")).ok()??;
    let index = parse_marker_index(marker.get_attribute(MARKER_INDEX_ATTR).as_deref())?;
    Some((index, marker))
}

pub fn set_style(element: &web_sys::HtmlElement, property: &str, value: &str) {
    if let Err(err) = element.style().set_property(property, value) {
        log::warn!("failed to set {property}: {err:?}");
    }
}
