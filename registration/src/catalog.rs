//! Helpers for the saved-map browser.

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;

use serde_json::Value;

use crate::api::MapEntry;
use crate::coords::HydrationInput;
use crate::geometry::LatLon;
use crate::registration::RegistrationData;

/// Shown instead of an empty list.
pub const EMPTY_LIST_TEXT: &str = "No saved maps yet.";

const UNTITLED: &str = "Untitled map";
const NO_METADATA: &str = "No metadata";
const META_SEPARATOR: &str = " • ";
const FALLBACK_FILENAME: &str = "map.png";

/// Sort by `map_id`, highest first. Entries without an id go last.
pub fn sort_newest_first(entries: &mut [MapEntry]) {
    entries.sort_by(|a, b| b.map_id.cmp(&a.map_id));
}

/// Entries whose card title contains `query`, ignoring case. A blank query
/// matches everything.
#[must_use]
pub fn filter_by_name<'a>(entries: &'a [MapEntry], query: &str) -> Vec<&'a MapEntry> {
    let needle = query.trim().to_lowercase();
    entries.iter().filter(|entry| needle.is_empty() || card_title(entry).to_lowercase().contains(&needle)).collect()
}

#[must_use]
pub fn card_title(entry: &MapEntry) -> &str {
    let name = entry.metadata.map_name.trim();
    if name.is_empty() { UNTITLED } else { name }
}

/// `area • event • date`, skipping blanks; falls back to the filename.
#[must_use]
pub fn meta_line(entry: &MapEntry) -> String {
    let m = &entry.metadata;
    let parts: Vec<&str> =
        [m.map_area.as_str(), m.map_event.as_str(), m.map_date.as_str()].into_iter().map(str::trim).filter(|p| !p.is_empty()).collect();
    if !parts.is_empty() {
        return parts.join(META_SEPARATOR);
    }
    let filename = m.map_filename.trim();
    if filename.is_empty() { NO_METADATA.to_owned() } else { filename.to_owned() }
}

/// Name given to the re-fetched original image.
#[must_use]
pub fn original_filename(entry: &MapEntry) -> String {
    let m = &entry.metadata;
    if !m.map_filename.is_empty() {
        return m.map_filename.clone();
    }
    if m.map_name.is_empty() {
        return FALLBACK_FILENAME.to_owned();
    }
    let mut sanitised = String::with_capacity(m.map_name.len() + 4);
    let mut in_run = false;
    for c in m.map_name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            sanitised.push(c);
            in_run = false;
        } else if !in_run {
            sanitised.push('_');
            in_run = true;
        }
    }
    sanitised.push_str(".png");
    sanitised
}

/// The registration fields of an entry, without server bookkeeping.
#[must_use]
pub fn to_registration_data(entry: &MapEntry) -> RegistrationData {
    RegistrationData { extra: serde_json::Map::new(), ..entry.clone() }
}

/// Saved control points in the shape the coordinate store loads.
#[must_use]
pub fn hydration_input(entry: &MapEntry) -> HydrationInput {
    let pairs = |list: &Option<Vec<Value>>| list.clone().unwrap_or_default();
    HydrationInput {
        lat_lon_pairs: pairs(&entry.selected_realworld_coords),
        image_pairs: pairs(&entry.selected_pixel_coords),
    }
}

/// Midpoint of the saved bounds.
#[must_use]
pub fn focus_center(entry: &MapEntry) -> Option<LatLon> {
    entry.bounds().map(crate::geometry::GeoBounds::center)
}
