//! Page state for the map registration screen.
//!
//! DESIGN
//! ======
//! Mirrors what the registration stores know (phase, points, URLs) as plain
//! data so components can render from a single `RwSignal<RegisterUiState>`.
//! The session republishes after every store change; nothing here is the
//! source of truth for coordinates or registration data.

#[cfg(test)]
#[path = "ui_test.rs"]
mod ui_test;

use registration::actions::StatusLevel;
use registration::api::MapEntry;
use registration::catalog;
use registration::coords::CoordinateSnapshot;
use registration::registration::{RegistrationMetadata, RegistrationPhase};

/// Tabs of the narrow-screen layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MobileTab {
    /// Drop zone and saved maps.
    #[default]
    Start,
    Terrain,
    Overlay,
    Metadata,
}

impl MobileTab {
    pub const ALL: [MobileTab; 4] = [MobileTab::Start, MobileTab::Terrain, MobileTab::Overlay, MobileTab::Metadata];

    pub fn key(self) -> &'static str {
        match self {
            MobileTab::Start => "start",
            MobileTab::Terrain => "terrain",
            MobileTab::Overlay => "overlay",
            MobileTab::Metadata => "metadata",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MobileTab::Start => "Start",
            MobileTab::Terrain => "Terrain",
            MobileTab::Overlay => "Map",
            MobileTab::Metadata => "Details",
        }
    }
}

/// One line in the status bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

/// Everything the registration page renders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegisterUiState {
    pub status: Option<StatusMessage>,
    pub tab: MobileTab,
    /// Narrow-screen layout is active.
    pub mobile: bool,
    pub phase: RegistrationPhase,
    pub snapshot: CoordinateSnapshot,
    /// `blob:` URL of the processed overlay image.
    pub overlay_src: Option<String>,
    /// Computed bounds are available to preview or save.
    pub has_registration: bool,
    pub preview_visible: bool,
    /// Raster or aerial terrain basemap.
    pub aerial: bool,
    pub uploading: bool,
    pub exporting: bool,
    pub maps: Vec<MapEntry>,
    pub maps_loaded: bool,
    pub map_filter: String,
    pub active_map_id: Option<i64>,
    /// Live values of the metadata form.
    pub metadata: RegistrationMetadata,
}

impl RegisterUiState {
    /// Fit button: all points placed, an image showing, nothing in flight.
    pub fn can_compute(&self) -> bool {
        self.snapshot.is_complete() && self.overlay_src.is_some() && !self.phase.is_busy() && !self.uploading
    }

    pub fn can_save(&self) -> bool {
        self.has_registration && !self.phase.is_busy() && !self.uploading
    }

    pub fn can_preview(&self) -> bool {
        self.has_registration
    }

    /// Saved maps whose title matches the filter box.
    pub fn visible_maps(&self) -> Vec<&MapEntry> {
        catalog::filter_by_name(&self.maps, &self.map_filter)
    }

    /// Placeholder text for the saved-map list, if any.
    pub fn empty_maps_text(&self) -> Option<&'static str> {
        if !self.maps_loaded {
            return Some("Loading saved maps...");
        }
        self.maps.is_empty().then_some(catalog::EMPTY_LIST_TEXT)
    }

    pub fn set_status(&mut self, level: StatusLevel, text: &str) {
        self.status = Some(StatusMessage { level, text: text.to_owned() });
    }

    /// Set one metadata field by its form key.
    pub fn set_metadata_field(&mut self, key: &str, value: String) {
        if let Some(field) = metadata_field_mut(&mut self.metadata, key) {
            *field = value;
        } else {
            log::warn!("unknown metadata field {key}");
        }
    }
}

/// Form fields in display order: `(key, label)`.
pub const METADATA_FIELDS: [(&str, &str); 10] = [
    ("map_name", "Map name"),
    ("map_filename", "Filename"),
    ("attribution", "Attribution"),
    ("map_area", "Area"),
    ("map_event", "Event"),
    ("map_date", "Date"),
    ("map_course", "Course"),
    ("map_club", "Club"),
    ("map_course_planner", "Course planner"),
    ("map_attribution", "Map attribution"),
];

pub fn metadata_field<'a>(metadata: &'a RegistrationMetadata, key: &str) -> Option<&'a str> {
    let value = match key {
        "map_name" => &metadata.map_name,
        "map_filename" => &metadata.map_filename,
        "attribution" => &metadata.attribution,
        "map_area" => &metadata.map_area,
        "map_event" => &metadata.map_event,
        "map_date" => &metadata.map_date,
        "map_course" => &metadata.map_course,
        "map_club" => &metadata.map_club,
        "map_course_planner" => &metadata.map_course_planner,
        "map_attribution" => &metadata.map_attribution,
        _ => return None,
    };
    Some(value.as_str())
}

fn metadata_field_mut<'a>(metadata: &'a mut RegistrationMetadata, key: &str) -> Option<&'a mut String> {
    Some(match key {
        "map_name" => &mut metadata.map_name,
        "map_filename" => &mut metadata.map_filename,
        "attribution" => &mut metadata.attribution,
        "map_area" => &mut metadata.map_area,
        "map_event" => &mut metadata.map_event,
        "map_date" => &mut metadata.map_date,
        "map_course" => &mut metadata.map_course,
        "map_club" => &mut metadata.map_club,
        "map_course_planner" => &mut metadata.map_course_planner,
        "map_attribution" => &mut metadata.map_attribution,
        _ => return None,
    })
}

/// CSS modifier for a status line.
pub fn status_class(level: StatusLevel) -> &'static str {
    match level {
        StatusLevel::Info => "registration-status registration-status--info",
        StatusLevel::Success => "registration-status registration-status--success",
        StatusLevel::Error => "registration-status registration-status--error",
    }
}

/// Label for the basemap toggle: names the layer a click switches to.
pub fn basemap_toggle_label(aerial: bool) -> &'static str {
    if aerial { "Raster map" } else { "Aerial map" }
}

pub fn preview_button_label(visible: bool) -> &'static str {
    if visible { "Hide preview" } else { "Preview" }
}
