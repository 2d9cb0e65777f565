//! Overlay marker elements inside the transformed canvas.
//!
//! Markers are absolutely positioned children of the marker layer, placed by
//! percent of the image box so the canvas transform moves them with the
//! image. Pointer events are delegated from the viewport; elements only carry
//! their slot index.

use registration::overlay_markers::{MarkerPlacement, OverlayMarkerLayer};
use registration::palette::{MarkerStyle, marker_svg_markup};
use wasm_bindgen::JsCast;

use crate::util::dom::set_style;
use crate::util::layout::{MARKER_INDEX_ATTR, percent_css};

pub struct DomOverlayMarkers {
    layer: web_sys::HtmlElement,
}

impl DomOverlayMarkers {
    pub fn new(layer: web_sys::HtmlElement) -> Self {
        Self { layer }
    }

    fn build(&self, index: usize, style: &MarkerStyle) -> Option<web_sys::HtmlElement> {
        let document = self.layer.owner_document()?;
        let element = document.create_element("div").ok()?.dyn_into::<web_sys::HtmlElement>().ok()?;
        element.set_class_name("registration-marker registration-marker--anchored");
        element.set_attribute(MARKER_INDEX_ATTR, &index.to_string()).ok()?;
        element.set_title(&style.label);
        element.set_inner_html(&marker_svg_markup(style));
        set_style(&element, "opacity", "0");
        self.layer.append_child(&element).ok()?;
        Some(element)
    }
}

impl OverlayMarkerLayer for DomOverlayMarkers {
    /// `None` when the element could not be created; the marker then stays
    /// invisible but the slot keeps working.
    type Handle = Option<web_sys::HtmlElement>;

    fn create_marker(&mut self, index: usize, style: &MarkerStyle) -> Self::Handle {
        let element = self.build(index, style);
        if element.is_none() {
            log::error!("failed to create overlay marker {index}");
        }
        element
    }

    fn place_marker(&mut self, handle: &Self::Handle, placement: &MarkerPlacement) {
        let Some(element) = handle else {
            return;
        };
        set_style(element, "left", &percent_css(placement.x_percent));
        set_style(element, "top", &percent_css(placement.y_percent));
        set_style(element, "opacity", "1");
    }

    fn hide_marker(&mut self, handle: &Self::Handle) {
        if let Some(element) = handle {
            set_style(element, "opacity", "0");
        }
    }

    fn remove_marker(&mut self, handle: Self::Handle) {
        if let Some(element) = handle {
            element.remove();
        }
    }
}
