//! Layout constants and CSS formatting for the registration page.

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;

use registration::pan_zoom::ViewTransform;

/// Matches the narrow-screen (tabbed) layout.
pub const MOBILE_MEDIA_QUERY: &str = "(max-width: 768px)";
/// Quiet period before a window resize is acted on.
pub const RESIZE_DEBOUNCE_MS: u32 = 150;
/// Delay before Leaflet re-measures a map that was just unhidden.
pub const TAB_REVEAL_DELAY_MS: u32 = 100;
/// CSS custom property holding the inverse canvas scale.
pub const MARKER_SCALE_VAR: &str = "--overlay-marker-scale";
/// Attribute carrying an overlay marker's slot index.
pub const MARKER_INDEX_ATTR: &str = "data-marker-index";

/// `left`/`top` value for a fraction of the image box.
pub fn percent_css(fraction: f64) -> String {
    format!("{:.4}%", fraction * 100.0)
}

/// Value for [`MARKER_SCALE_VAR`].
pub fn marker_scale_css(transform: &ViewTransform) -> String {
    format!("{}", transform.marker_scale())
}

/// Parse a [`MARKER_INDEX_ATTR`] value.
pub fn parse_marker_index(raw: Option<&str>) -> Option<usize> {
    raw?.trim().parse().ok()
}
