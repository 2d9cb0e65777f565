//! Per-index marker styles and the palette/coordinate panel view models.
//!
//! Terrain and image markers with the same index share a colour and number so
//! the user can match pairs at a glance.

#[cfg(test)]
#[path = "palette_test.rs"]
mod palette_test;

use crate::coords::{CoordinateSnapshot, Edit, Space};

const BASE_PALETTE: [(&str, &str, &str); 6] = [
    ("red", "Red marker", "#d63d3d"),
    ("yellow", "Yellow marker", "#f6c343"),
    ("blue", "Blue marker", "#1f78d1"),
    ("green", "Green marker", "#2e7d32"),
    ("purple", "Purple marker", "#8e24aa"),
    ("orange", "Orange marker", "#f57c00"),
];

const MARKER_VIEWBOX: &str = "0 0 36 54";
const MARKER_PATH: &str = "M18 1C8.611 1 1 8.611 1 18c0 12.809 15.138 33.32 16.357 34.94a1.3 1.3 0 0 0 2.286 0C20.862 51.32 36 30.809 36 18 36 8.611 29.389 1 18 1Z";
const TIP_COLOR: &str = "#ff1493";

/// Visual identity of one marker index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerStyle {
    pub key: String,
    pub label: String,
    pub color: String,
    pub short_label: String,
    pub order: usize,
}

/// Style for marker `index`. The first six use the fixed palette; later ones
/// step the hue by 55 degrees.
#[must_use]
pub fn marker_style(index: usize) -> MarkerStyle {
    let (key, label, color) = match BASE_PALETTE.get(index) {
        Some((key, label, color)) => ((*key).to_owned(), (*label).to_owned(), (*color).to_owned()),
        None => {
            #[allow(clippy::cast_precision_loss)]
            let hue = ((index * 55) % 360) as f64;
            (format!("marker-{}", index + 1), format!("Marker {}", index + 1), hsl_to_hex(hue, 70.0, 48.0))
        }
    };
    MarkerStyle { key, label, color, short_label: (index + 1).to_string(), order: index }
}

/// Styles for `count` markers.
#[must_use]
pub fn marker_palette(count: usize) -> Vec<MarkerStyle> {
    (0..count).map(marker_style).collect()
}

/// Convert HSL (degrees, percent, percent) to `#rrggbb`.
#[must_use]
pub fn hsl_to_hex(h: f64, s: f64, l: f64) -> String {
    fn channel(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn byte(v: f64) -> u8 {
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    }

    let s = s / 100.0;
    let l = l / 100.0;
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let h = h / 360.0;
    let r = byte(channel(p, q, h + 1.0 / 3.0));
    let g = byte(channel(p, q, h));
    let b = byte(channel(p, q, h - 1.0 / 3.0));
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Pin SVG for a marker: coloured body, index label, and a tip glyph on the
/// exact target pixel.
#[must_use]
pub fn marker_svg_markup(style: &MarkerStyle) -> String {
    format!(
        concat!(
            r#"<svg class="registration-marker__svg" viewBox="{viewbox}" width="36" height="52" role="presentation" aria-hidden="true">"#,
            r##"<path d="{path}" fill="{color}" stroke="#ffffff" stroke-width="3" stroke-linejoin="round"></path>"##,
            r#"<circle cx="18" cy="54" r="1.5" fill="{tip}"></circle>"#,
            r#"<text class="registration-marker__svg-label" x="18" y="21" text-anchor="middle" dominant-baseline="middle">{label}</text>"#,
            "</svg>"
        ),
        viewbox = MARKER_VIEWBOX,
        path = MARKER_PATH,
        color = style.color,
        tip = TIP_COLOR,
        label = style.short_label,
    )
}

// ── Palette panel ───────────────────────────────────────────────

/// One palette button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteEntry {
    pub index: usize,
    pub placed: bool,
    /// Free and currently selected for the next click.
    pub active: bool,
    pub title: String,
}

fn space_view(snapshot: &CoordinateSnapshot, space: Space) -> (&[bool], Option<usize>) {
    match space {
        Space::Terrain => (&snapshot.lat_lon_occupied, snapshot.current_lat_lon_index),
        Space::Image => (&snapshot.xy_occupied, snapshot.current_xy_index),
    }
}

/// Palette buttons for one space.
#[must_use]
pub fn palette_entries(snapshot: &CoordinateSnapshot, space: Space) -> Vec<PaletteEntry> {
    let (occupied, current) = space_view(snapshot, space);
    occupied
        .iter()
        .enumerate()
        .map(|(index, &placed)| PaletteEntry {
            index,
            placed,
            active: !placed && current == Some(index),
            title: if placed {
                format!("Marker {} already placed. Click to remove.", index + 1)
            } else {
                format!("Select marker {}", index + 1)
            },
        })
        .collect()
}

/// Clicking a placed marker clears it; clicking a free one selects it.
#[must_use]
pub fn palette_click(snapshot: &CoordinateSnapshot, space: Space, index: usize) -> Edit {
    let (occupied, _) = space_view(snapshot, space);
    let placed = occupied.get(index).copied().unwrap_or(false);
    match (space, placed) {
        (Space::Terrain, true) => Edit::ClearLatLon(index),
        (Space::Terrain, false) => Edit::SelectLatLon(index),
        (Space::Image, true) => Edit::ClearImage(index),
        (Space::Image, false) => Edit::SelectImage(index),
    }
}

// ── Coordinate panel ────────────────────────────────────────────

/// One line of the coordinate readout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinateLine {
    pub text: String,
    /// The line for the slot the next click fills.
    pub bold: bool,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Readout lines for both spaces, terrain first.
#[must_use]
pub fn coordinate_panel_lines(snapshot: &CoordinateSnapshot) -> (Vec<CoordinateLine>, Vec<CoordinateLine>) {
    let terrain = snapshot
        .lat_lon
        .iter()
        .enumerate()
        .map(|(i, point)| CoordinateLine {
            text: match point {
                Some(p) => format!("Point {} - Lat: {}, Lon: {}", i + 1, round_to(p.lat, 5), round_to(p.lon, 5)),
                None => format!("Point {} - Not set", i + 1),
            },
            bold: snapshot.current_lat_lon_index == Some(i),
        })
        .collect();
    let image = snapshot
        .xy
        .iter()
        .enumerate()
        .map(|(i, point)| CoordinateLine {
            text: match point {
                Some(p) => format!("Point {} - X: {}, Y: {}", i + 1, p.x.round(), p.y.round()),
                None => format!("Point {} - Not set", i + 1),
            },
            bold: snapshot.current_xy_index == Some(i),
        })
        .collect();
    (terrain, image)
}
