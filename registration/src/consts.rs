//! Shared numeric constants for the registration crate.

// ── Registration ────────────────────────────────────────────────

/// Number of terrain/image control-point pairs collected per registration.
pub const COORDINATE_PAIRS: usize = 3;

/// Upper bound accepted for a configured pair count.
pub const MAX_COORDINATE_PAIRS: usize = 16;

/// Decimal places kept for latitude/longitude in registration payloads.
pub const LAT_LON_DECIMALS: i32 = 6;

// ── Overlay pan/zoom ────────────────────────────────────────────

/// Smallest overlay zoom factor (image fits the viewport).
pub const MIN_ZOOM: f64 = 1.0;

/// Largest overlay zoom factor.
pub const MAX_ZOOM: f64 = 8.0;

/// Exponential wheel response: `scale *= exp(-delta_y * WHEEL_SENSITIVITY)`.
pub const WHEEL_SENSITIVITY: f64 = 0.0025;

/// Pointer travel in CSS pixels before a press is classified as a pan.
pub const DRAG_THRESHOLD_PX: f64 = 4.0;

// ── Markers ─────────────────────────────────────────────────────

/// Marker icon size in CSS pixels (width, height).
pub const MARKER_ICON_SIZE: (f64, f64) = (36.0, 52.0);

/// Marker icon anchor in CSS pixels; the tip sits at the bottom centre.
pub const MARKER_ICON_ANCHOR: (f64, f64) = (18.0, 52.0);

/// Where a touch/pen drag holds the marker, as a fraction of its height from
/// the top. Negative values put the finger above the marker.
pub const GRAB_Y_RATIO_TOUCH: f64 = -0.3;

/// Body-centre reference for mouse drags, as a fraction of marker height.
pub const GRAB_Y_RATIO_MOUSE: f64 = 0.35;

// ── Preview ─────────────────────────────────────────────────────

/// Opacity of the registration preview overlay on the terrain map.
pub const PREVIEW_OPACITY: f64 = 0.35;
