//! Registration actions: compute, save, load, and the file drop.
//!
//! SYSTEM CONTEXT
//! ==============
//! The page builds one [`RegistrationActions`] and calls it from button and
//! drop handlers. Each action reads the stores once, talks to the backend,
//! and writes the stores back only after every request succeeded and its
//! ticket is still current. A failed action reports a status line and leaves
//! the stores as they were; a superseded one returns quietly.
//!
//! BORROWS
//! =======
//! Store borrows are never held across an `.await`, and the coordinate store
//! is only mutated while no other store is borrowed, since its subscribers
//! read the registration store.

#[cfg(test)]
#[path = "actions_test.rs"]
mod actions_test;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Value, json};

use crate::api::{Backend, ExportRequest, ImageBlob, ImageFile, MapEntry, OverlayRequest, SessionUser};
use crate::catalog;
use crate::consts::LAT_LON_DECIMALS;
use crate::coords::{CoordinateSnapshot, CoordinateStore};
use crate::error::RegistrationError;
use crate::geometry::{LatLon, Size};
use crate::preview::{PreviewController, PreviewHost};
use crate::registration::{ObjectUrls, RegistrationData, RegistrationMetadata, RegistrationPhase, RegistrationStore};
use crate::request::{LatestRequest, RequestKind};

// ── Status ──────────────────────────────────────────────────────

pub const UPLOADING: &str = "Uploading map, please wait...";
pub const UPLOAD_COMPLETE: &str = "Finished uploading map. To fit the map to the terrain, please select three points in the terrain view and their three corresponding locations in the map view. Press 'Fit map to terrain' when done.";
pub const COMPUTING: &str = "Fitting map to terrain...";
pub const COMPUTED: &str = "Map fitted to terrain. Use 'Preview' to check the fit, then save the map.";
pub const SAVING: &str = "Saving map, please wait...";
pub const SAVED: &str = "Map saved.";
pub const LOAD_FAILED: &str = "Failed to load selected map. Check console for details.";
pub const EXPORTED: &str = "Database export finished.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Receives every user-facing status line.
pub type StatusSink = Rc<dyn Fn(StatusLevel, &str)>;

// ── Results ─────────────────────────────────────────────────────

/// How an action that went to the backend ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    /// A newer request of the same kind started meanwhile, or another map
    /// was loaded or dropped; nothing changed.
    Superseded,
}

/// What the page needs after a saved map was loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMap {
    /// Values for the metadata form.
    pub metadata: RegistrationMetadata,
    /// Where to centre the terrain map, if the saved bounds are usable.
    pub focus: Option<LatLon>,
    pub zoom: u8,
}

// ── Payload ─────────────────────────────────────────────────────

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Build the overlay-coordinates payload from a full snapshot.
///
/// `overlay` is the natural size of the processed image; `None` (or a
/// degenerate size) means it has not loaded yet.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn build_overlay_request(snapshot: &CoordinateSnapshot, overlay: Option<Size>) -> Result<OverlayRequest, RegistrationError> {
    let overlay = overlay.filter(|size| size.is_positive()).ok_or(RegistrationError::OverlayNotLoaded)?;
    let incomplete = || RegistrationError::IncompletePoints { pairs: snapshot.len() };
    if !snapshot.is_complete() {
        return Err(incomplete());
    }
    let image = snapshot.image_points().ok_or_else(incomplete)?;
    let terrain = snapshot.lat_lon_points().ok_or_else(incomplete)?;

    Ok(OverlayRequest {
        image_coords: image.iter().map(|p| [p.x.round() as i64, p.y.round() as i64]).collect(),
        real_coords: terrain
            .iter()
            .map(|p| [round_to(p.lat, LAT_LON_DECIMALS), round_to(p.lon, LAT_LON_DECIMALS)])
            .collect(),
        overlay_width: overlay.width.round() as u32,
        overlay_height: overlay.height.round() as u32,
    })
}

/// Attach the points and overlay size a registration was computed from.
fn with_selection(response: RegistrationData, request: &OverlayRequest) -> RegistrationData {
    RegistrationData {
        overlay_width: Some(f64::from(request.overlay_width)),
        overlay_height: Some(f64::from(request.overlay_height)),
        selected_pixel_coords: Some(request.image_coords.iter().map(|p| json!(p)).collect()),
        selected_realworld_coords: Some(request.real_coords.iter().map(|p| json!(p)).collect()),
        ..response
    }
}

fn png_name(pdf_name: &str) -> String {
    let stem_len = pdf_name.len().saturating_sub(4);
    match pdf_name.get(stem_len..) {
        Some(ext) if ext.eq_ignore_ascii_case(".pdf") => format!("{}.png", &pdf_name[..stem_len]),
        _ => pdf_name.to_owned(),
    }
}

// ── Actions ─────────────────────────────────────────────────────

pub struct RegistrationActions<B: Backend, H: PreviewHost, U: ObjectUrls> {
    backend: B,
    coords: Rc<RefCell<CoordinateStore>>,
    store: Rc<RefCell<RegistrationStore<U>>>,
    preview: Rc<RefCell<PreviewController<H>>>,
    status: StatusSink,
    latest: LatestRequest,
    focus_zoom: u8,
}

impl<B: Backend, H: PreviewHost, U: ObjectUrls> RegistrationActions<B, H, U> {
    pub fn new(
        backend: B,
        coords: Rc<RefCell<CoordinateStore>>,
        store: Rc<RefCell<RegistrationStore<U>>>,
        preview: Rc<RefCell<PreviewController<H>>>,
        status: StatusSink,
        focus_zoom: u8,
    ) -> Self {
        Self { backend, coords, store, preview, status, latest: LatestRequest::new(), focus_zoom }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn report(&self, level: StatusLevel, message: &str) {
        (self.status)(level, message);
    }

    /// Log and surface `err`, then hand it back.
    fn report_failure(&self, action: &str, err: RegistrationError) -> RegistrationError {
        log::error!("{action} failed: {err}");
        self.report(StatusLevel::Error, &err.to_string());
        err
    }

    fn snapshot(&self) -> CoordinateSnapshot {
        self.coords.borrow().snapshot()
    }

    fn fail_phase(&self) {
        let snapshot = self.snapshot();
        self.store.borrow_mut().fail(&snapshot);
    }

    /// Compute and save results belong to the image they started from.
    fn retire_registration_requests(&self) {
        self.latest.supersede(&[RequestKind::Compute, RequestKind::Save]);
    }

    fn show_preview(&self) -> bool {
        let (data, url) = {
            let store = self.store.borrow();
            (store.registration_data().clone(), store.overlay_url().map(str::to_owned))
        };
        self.preview.borrow_mut().show(&data, url.as_deref())
    }

    // --- Compute ---

    /// Compute the registration for the placed points and render a preview
    /// image of it. Stores nothing unless both requests succeed.
    pub async fn compute_registration(
        &self,
        overlay: Option<Size>,
        metadata: &RegistrationMetadata,
    ) -> Result<ActionOutcome, RegistrationError> {
        let request = match build_overlay_request(&self.snapshot(), overlay) {
            Ok(request) => request,
            Err(err) => return Err(self.report_failure("compute", err)),
        };
        let Some(file) = self.store.borrow().dropped_image().cloned() else {
            return Err(self.report_failure("compute", RegistrationError::MissingImage));
        };

        let ticket = self.latest.begin(RequestKind::Compute);
        self.store.borrow_mut().set_phase(RegistrationPhase::Computing);
        self.report(StatusLevel::Info, COMPUTING);

        let result = self.fetch_registration(&request, &file, metadata).await;
        if !self.latest.is_current(ticket) {
            log::debug!("discarding superseded registration result");
            return Ok(ActionOutcome::Superseded);
        }

        match result {
            Ok((data, blob)) => {
                {
                    let mut store = self.store.borrow_mut();
                    store.set_registration_data(data);
                    store.set_overlay_blob(Some(&blob));
                    store.set_phase(RegistrationPhase::Computed);
                }
                self.preview.borrow_mut().clear();
                log::info!("registration computed");
                self.report(StatusLevel::Success, COMPUTED);
                Ok(ActionOutcome::Applied)
            }
            Err(err) => {
                self.fail_phase();
                Err(self.report_failure("compute", err))
            }
        }
    }

    async fn fetch_registration(
        &self,
        request: &OverlayRequest,
        file: &ImageFile,
        metadata: &RegistrationMetadata,
    ) -> Result<(RegistrationData, ImageBlob), RegistrationError> {
        let response = self.backend.overlay_coordinates(request).await?;
        if !response.has_bounds() {
            return Err(RegistrationError::InvalidResponse("missing nw_coords/se_coords".to_owned()));
        }
        let data = with_selection(response, request).merged(metadata);
        let blob = self.backend.transform_map(file, &data).await?;
        Ok((data, blob))
    }

    // --- Save ---

    /// Persist the computed registration with the latest metadata. Fails
    /// before any request when nothing has been computed.
    pub async fn save_registration(&self, metadata: &RegistrationMetadata) -> Result<ActionOutcome, RegistrationError> {
        let (data, file) = {
            let store = self.store.borrow();
            (store.registration_data().merged(metadata), store.dropped_image().cloned())
        };
        if !data.has_bounds() {
            return Err(self.report_failure("save", RegistrationError::MissingRegistration));
        }
        let Some(file) = file else {
            return Err(self.report_failure("save", RegistrationError::MissingImage));
        };

        let ticket = self.latest.begin(RequestKind::Save);
        self.store.borrow_mut().set_phase(RegistrationPhase::Saving);
        self.report(StatusLevel::Info, SAVING);

        let result = self.backend.transform_and_store(&file, &data).await;
        if !self.latest.is_current(ticket) {
            log::debug!("discarding superseded save result");
            return Ok(ActionOutcome::Superseded);
        }

        match result {
            Ok(blob) => {
                {
                    let mut store = self.store.borrow_mut();
                    store.set_registration_data(data);
                    store.set_overlay_blob(Some(&blob));
                    store.set_phase(RegistrationPhase::Saved);
                }
                self.show_preview();
                log::info!("registration saved");
                self.report(StatusLevel::Success, SAVED);
                Ok(ActionOutcome::Applied)
            }
            Err(err) => {
                self.fail_phase();
                Err(self.report_failure("save", err.into()))
            }
        }
    }

    // --- Dropped file ---

    /// Accept a dropped map file. PDFs are converted to PNG first. Returns
    /// the form metadata with empty name fields defaulted, or `None` when a
    /// newer drop superseded this one.
    pub async fn accept_dropped_file(
        &self,
        file: ImageFile,
        metadata: RegistrationMetadata,
    ) -> Result<Option<RegistrationMetadata>, RegistrationError> {
        let ticket = self.latest.begin(RequestKind::Upload);
        self.report(StatusLevel::Info, UPLOADING);

        let result = self.upload(file).await;
        if !self.latest.is_current(ticket) {
            log::debug!("discarding superseded upload");
            return Ok(None);
        }

        let (image, processed) = match result {
            Ok(uploaded) => uploaded,
            Err(err) => return Err(self.report_failure("upload", err)),
        };
        let metadata = metadata.with_default_names(&image.name);
        self.retire_registration_requests();
        {
            let mut store = self.store.borrow_mut();
            store.set_source_blob(Some(&processed));
            store.set_overlay_blob(None);
            store.set_registration_data(RegistrationData::default());
            store.set_dropped_image(image);
        }
        self.preview.borrow_mut().clear();
        let snapshot = self.snapshot();
        {
            let mut store = self.store.borrow_mut();
            store.set_phase(RegistrationPhase::Idle);
            store.refresh_readiness(&snapshot);
        }
        self.report(StatusLevel::Success, UPLOAD_COMPLETE);
        Ok(Some(metadata))
    }

    async fn upload(&self, file: ImageFile) -> Result<(ImageFile, ImageBlob), RegistrationError> {
        let image = if file.is_pdf() {
            let blob = self.backend.convert_pdf_to_image(&file).await?;
            ImageFile::new(png_name(&file.name), "image/png", blob.bytes)
        } else if file.is_image() {
            file
        } else {
            return Err(RegistrationError::UnsupportedFile { mime: file.mime });
        };
        let processed = self.backend.process_dropped_image(&image).await?;
        Ok((image, processed))
    }

    // --- Saved maps ---

    /// Saved maps, newest first.
    pub async fn list_maps(&self) -> Result<Vec<MapEntry>, RegistrationError> {
        match self.backend.list_maps().await {
            Ok(mut entries) => {
                catalog::sort_newest_first(&mut entries);
                log::debug!("listed {} saved maps", entries.len());
                Ok(entries)
            }
            Err(err) => Err(self.report_failure("list maps", err.into())),
        }
    }

    /// Load a saved map into both stores and show its preview. Returns
    /// `None` when a newer load superseded this one.
    pub async fn load_existing_map(&self, entry: &MapEntry) -> Result<Option<LoadedMap>, RegistrationError> {
        let ticket = self.latest.begin(RequestKind::LoadMap);
        let label = if entry.metadata.map_name.is_empty() { "selected map" } else { entry.metadata.map_name.as_str() };
        self.report(StatusLevel::Info, &format!("Loading \"{label}\" from database…"));

        let result = self.fetch_map_assets(entry).await;
        if !self.latest.is_current(ticket) {
            log::debug!("discarding superseded load of {label:?}");
            return Ok(None);
        }

        let (original, processed, rendered) = match result {
            Ok(assets) => assets,
            Err(err) => {
                log::error!("loading {label:?} failed: {err}");
                self.report(StatusLevel::Error, LOAD_FAILED);
                return Err(err);
            }
        };

        self.retire_registration_requests();
        {
            let mut store = self.store.borrow_mut();
            store.set_source_blob(Some(&processed));
            store.set_overlay_blob(Some(&rendered));
            store.set_registration_data(catalog::to_registration_data(entry));
            store.set_dropped_image(original);
        }
        let report = self.coords.borrow_mut().hydrate_coordinates(&catalog::hydration_input(entry));
        if !report.is_clean() {
            log::warn!(
                "saved map {label:?} has unusable points: terrain {:?}, image {:?}",
                report.lat_lon_errors,
                report.image_errors
            );
        }
        let snapshot = self.snapshot();
        {
            let mut store = self.store.borrow_mut();
            store.set_phase(RegistrationPhase::Saved);
            store.refresh_readiness(&snapshot);
        }
        self.show_preview();

        self.report(
            StatusLevel::Success,
            &format!(
                "Loaded \"{label}\". You can adjust the terrain fit by dragging the markers and clicking 'Fit map to terrain', or edit the map details if you want."
            ),
        );
        Ok(Some(LoadedMap { metadata: entry.metadata.clone(), focus: catalog::focus_center(entry), zoom: self.focus_zoom }))
    }

    async fn fetch_map_assets(&self, entry: &MapEntry) -> Result<(ImageFile, ImageBlob, ImageBlob), RegistrationError> {
        let name = entry.metadata.map_name.as_str();
        if name.is_empty() {
            return Err(RegistrationError::MissingMapName);
        }
        let original = self.backend.original_map_file(name).await?.into_file(catalog::original_filename(entry));
        let (processed, rendered) =
            futures::join!(self.backend.process_dropped_image(&original), self.backend.final_map_file(name));
        Ok((original, processed?, rendered?))
    }

    // --- Misc ---

    /// Show or hide the preview layer. Returns whether it is now visible.
    pub fn toggle_preview(&self) -> bool {
        let (data, url) = {
            let store = self.store.borrow();
            (store.registration_data().clone(), store.overlay_url().map(str::to_owned))
        };
        self.preview.borrow_mut().toggle(&data, url.as_deref())
    }

    /// Export the map database, originals included, overwriting old exports.
    pub async fn export_database(&self) -> Result<Value, RegistrationError> {
        match self.backend.export_database(&ExportRequest::default()).await {
            Ok(result) => {
                log::info!("database export result: {result}");
                self.report(StatusLevel::Success, EXPORTED);
                Ok(result)
            }
            Err(err) => Err(self.report_failure("export", err.into())),
        }
    }

    pub async fn current_user(&self) -> Result<SessionUser, RegistrationError> {
        Ok(self.backend.current_user().await?)
    }
}
