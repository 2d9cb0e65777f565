//! Registration data and the store that owns a session's files and URLs.
//!
//! [`RegistrationData`] is the bag exchanged with the backend: computed
//! bounds and rotation, the selected control points, and the user's map
//! metadata. Unknown backend keys survive a round trip through `extra`.
//!
//! [`RegistrationStore`] owns the dropped image and two object URLs (the
//! processed image shown in the overlay viewport and the rendered registered
//! overlay used by the preview). URLs are created and revoked through
//! [`ObjectUrls`]; the store revokes a URL whenever it is replaced and again
//! on drop.

#[cfg(test)]
#[path = "registration_test.rs"]
mod registration_test;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::api::{ImageBlob, ImageFile};
use crate::coords::CoordinateSnapshot;
use crate::geometry::GeoBounds;

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// User-entered map details, read from the form once per action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationMetadata {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub map_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub map_filename: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attribution: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub map_area: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub map_event: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub map_date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub map_course: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub map_club: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub map_course_planner: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub map_attribution: String,
}

impl RegistrationMetadata {
    /// Fill an empty name and filename with the dropped file's name.
    #[must_use]
    pub fn with_default_names(mut self, file_name: &str) -> Self {
        if self.map_name.trim().is_empty() {
            self.map_name = file_name.to_owned();
        }
        if self.map_filename.trim().is_empty() {
            self.map_filename = file_name.to_owned();
        }
        self
    }
}

/// Computed registration merged with metadata and the points it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nw_coords: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub se_coords: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimal_rotation_angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_height: Option<f64>,
    /// Image points as sent to the backend; kept loosely typed so saved
    /// entries with odd shapes still hydrate what they can.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_pixel_coords: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_realworld_coords: Option<Vec<Value>>,
    #[serde(flatten)]
    pub metadata: RegistrationMetadata,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RegistrationData {
    /// Copy with `metadata` replacing every metadata field.
    #[must_use]
    pub fn merged(&self, metadata: &RegistrationMetadata) -> Self {
        Self { metadata: metadata.clone(), ..self.clone() }
    }

    /// Both corners present.
    #[must_use]
    pub fn has_bounds(&self) -> bool {
        self.nw_coords.is_some() && self.se_coords.is_some()
    }

    /// Validated bounds, `None` if a corner is missing or out of range.
    #[must_use]
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_corners(self.nw_coords?, self.se_coords?)
    }
}

// ── Phase ───────────────────────────────────────────────────────

/// Where one registration attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPhase {
    /// Points still missing.
    #[default]
    Idle,
    /// All points placed in both spaces.
    Ready,
    Computing,
    /// Bounds received; preview available.
    Computed,
    Saving,
    Saved,
}

impl RegistrationPhase {
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Computing | Self::Saving)
    }
}

// ── Object URLs ─────────────────────────────────────────────────

/// Creates and revokes `blob:` URLs.
pub trait ObjectUrls {
    /// Create a URL for `blob`, or `None` if the platform refused.
    fn create(&self, blob: &ImageBlob) -> Option<String>;
    fn revoke(&self, url: &str);
}

/// Session state that outlives a single action.
pub struct RegistrationStore<U: ObjectUrls> {
    urls: U,
    dropped_image: Option<ImageFile>,
    data: RegistrationData,
    source_url: Option<String>,
    overlay_url: Option<String>,
    phase: RegistrationPhase,
}

impl<U: ObjectUrls> RegistrationStore<U> {
    #[must_use]
    pub fn new(urls: U) -> Self {
        Self {
            urls,
            dropped_image: None,
            data: RegistrationData::default(),
            source_url: None,
            overlay_url: None,
            phase: RegistrationPhase::Idle,
        }
    }

    pub fn urls(&self) -> &U {
        &self.urls
    }

    // --- Dropped image ---

    pub fn set_dropped_image(&mut self, file: ImageFile) {
        self.dropped_image = Some(file);
    }

    #[must_use]
    pub fn dropped_image(&self) -> Option<&ImageFile> {
        self.dropped_image.as_ref()
    }

    // --- Registration data ---

    pub fn set_registration_data(&mut self, data: RegistrationData) {
        self.data = data;
    }

    #[must_use]
    pub fn registration_data(&self) -> &RegistrationData {
        &self.data
    }

    // --- URLs ---

    fn replace_url(urls: &U, slot: &mut Option<String>, blob: Option<&ImageBlob>) -> Option<String> {
        if let Some(previous) = slot.take() {
            urls.revoke(&previous);
        }
        *slot = blob.and_then(|b| urls.create(b));
        slot.clone()
    }

    /// Replace the processed overlay image URL. Returns the new URL.
    pub fn set_source_blob(&mut self, blob: Option<&ImageBlob>) -> Option<String> {
        Self::replace_url(&self.urls, &mut self.source_url, blob)
    }

    /// Replace the rendered registration URL. Returns the new URL.
    pub fn set_overlay_blob(&mut self, blob: Option<&ImageBlob>) -> Option<String> {
        Self::replace_url(&self.urls, &mut self.overlay_url, blob)
    }

    #[must_use]
    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    #[must_use]
    pub fn overlay_url(&self) -> Option<&str> {
        self.overlay_url.as_deref()
    }

    /// Revoke both URLs.
    pub fn release_urls(&mut self) {
        Self::replace_url(&self.urls, &mut self.source_url, None);
        Self::replace_url(&self.urls, &mut self.overlay_url, None);
    }

    // --- Phase ---

    #[must_use]
    pub fn phase(&self) -> RegistrationPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: RegistrationPhase) {
        if self.phase != phase {
            log::debug!("registration phase {:?} -> {phase:?}", self.phase);
        }
        self.phase = phase;
    }

    /// Recompute Idle/Ready from the points. Leaves in-flight phases alone;
    /// a completed phase drops back once a point is removed.
    pub fn refresh_readiness(&mut self, snapshot: &CoordinateSnapshot) {
        if self.phase.is_busy() {
            return;
        }
        let complete = snapshot.is_complete();
        let next = match self.phase {
            RegistrationPhase::Computed | RegistrationPhase::Saved if complete => self.phase,
            _ if complete => RegistrationPhase::Ready,
            _ => RegistrationPhase::Idle,
        };
        self.set_phase(next);
    }

    /// Phase after a failed action.
    pub fn fail(&mut self, snapshot: &CoordinateSnapshot) {
        self.phase = if snapshot.is_complete() { RegistrationPhase::Ready } else { RegistrationPhase::Idle };
    }
}

impl<U: ObjectUrls> Drop for RegistrationStore<U> {
    fn drop(&mut self) {
        self.release_urls();
    }
}
