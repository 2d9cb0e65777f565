use std::collections::HashMap;

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::block_on;

use super::*;
use crate::api::{ApiError, ImageBlob, OverlayResponse};
use crate::coords::SetOptions;
use crate::geometry::GeoBounds;

// =============================================================
// Fakes
// =============================================================

#[derive(Default)]
struct FakeBackend {
    calls: RefCell<Vec<&'static str>>,
    overlay: RefCell<Option<OverlayResponse>>,
    failing: RefCell<Vec<&'static str>>,
    gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
    last_overlay_request: RefCell<Option<OverlayRequest>>,
    last_stored: RefCell<Option<RegistrationData>>,
    maps: RefCell<Vec<MapEntry>>,
}

impl FakeBackend {
    fn call(&self, endpoint: &'static str) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(endpoint);
        if self.failing.borrow().contains(&endpoint) {
            return Err(ApiError::Status { status: 500, message: format!("{endpoint} exploded") });
        }
        Ok(())
    }

    fn fail(&self, endpoint: &'static str) {
        self.failing.borrow_mut().push(endpoint);
    }

    /// Hold the call until the test releases the gate stored under `key`.
    async fn wait_at(&self, key: &str) -> Result<(), ApiError> {
        let gate = self.gates.borrow_mut().remove(key);
        if let Some(gate) = gate {
            if gate.await.is_err() {
                return Err(ApiError::Network("gate dropped".to_owned()));
            }
        }
        Ok(())
    }

    fn hold(&self, key: &str) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.gates.borrow_mut().insert(key.to_owned(), gate);
        release
    }

    fn count(&self, endpoint: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == endpoint).count()
    }
}

fn png(tag: &str) -> ImageBlob {
    ImageBlob::new("image/png", tag.as_bytes().to_vec())
}

#[async_trait(?Send)]
impl Backend for FakeBackend {
    async fn overlay_coordinates(&self, request: &OverlayRequest) -> Result<OverlayResponse, ApiError> {
        self.call("overlay")?;
        *self.last_overlay_request.borrow_mut() = Some(request.clone());
        self.wait_at("overlay").await?;
        Ok(self.overlay.borrow().clone().unwrap_or_default())
    }

    async fn transform_map(&self, _file: &ImageFile, _data: &RegistrationData) -> Result<ImageBlob, ApiError> {
        self.call("transform")?;
        Ok(png("transformed"))
    }

    async fn transform_and_store(&self, _file: &ImageFile, data: &RegistrationData) -> Result<ImageBlob, ApiError> {
        self.call("store")?;
        *self.last_stored.borrow_mut() = Some(data.clone());
        self.wait_at("store").await?;
        Ok(png("stored"))
    }

    async fn list_maps(&self) -> Result<Vec<MapEntry>, ApiError> {
        self.call("list")?;
        Ok(self.maps.borrow().clone())
    }

    async fn original_map_file(&self, map_name: &str) -> Result<ImageBlob, ApiError> {
        self.call("original")?;
        self.wait_at(map_name).await?;
        Ok(png(&format!("original:{map_name}")))
    }

    async fn final_map_file(&self, map_name: &str) -> Result<ImageBlob, ApiError> {
        self.call("final")?;
        Ok(png(&format!("final:{map_name}")))
    }

    async fn process_dropped_image(&self, file: &ImageFile) -> Result<ImageBlob, ApiError> {
        self.call("process")?;
        Ok(png(&format!("processed:{}", file.name)))
    }

    async fn convert_pdf_to_image(&self, _file: &ImageFile) -> Result<ImageBlob, ApiError> {
        self.call("pdf")?;
        Ok(ImageBlob::new("", b"converted".to_vec()))
    }

    async fn export_database(&self, request: &ExportRequest) -> Result<Value, ApiError> {
        self.call("export")?;
        Ok(json!({ "ok": true, "include_original": request.include_original }))
    }

    async fn current_user(&self) -> Result<SessionUser, ApiError> {
        self.call("me")?;
        Ok(SessionUser { username: Some("ola".to_owned()), ..Default::default() })
    }
}

#[derive(Clone, Default)]
struct FakeUrls {
    revoked: Rc<RefCell<Vec<String>>>,
}

impl ObjectUrls for FakeUrls {
    fn create(&self, blob: &ImageBlob) -> Option<String> {
        Some(format!("blob:{}", String::from_utf8_lossy(&blob.bytes)))
    }

    fn revoke(&self, url: &str) {
        self.revoked.borrow_mut().push(url.to_owned());
    }
}

#[derive(Default)]
struct FakeMap {
    layers: Vec<(u32, String)>,
    next: u32,
}

impl PreviewHost for FakeMap {
    type Layer = u32;

    fn add_overlay(&mut self, _bounds: GeoBounds, url: &str, _opacity: f64) -> u32 {
        self.next += 1;
        self.layers.push((self.next, url.to_owned()));
        self.next
    }

    fn remove_overlay(&mut self, layer: u32) {
        self.layers.retain(|(id, _)| *id != layer);
    }
}

struct Harness {
    actions: RegistrationActions<FakeBackend, FakeMap, FakeUrls>,
    coords: Rc<RefCell<CoordinateStore>>,
    store: Rc<RefCell<RegistrationStore<FakeUrls>>>,
    preview: Rc<RefCell<PreviewController<FakeMap>>>,
    statuses: Rc<RefCell<Vec<(StatusLevel, String)>>>,
}

impl Harness {
    fn new() -> Self {
        let coords = Rc::new(RefCell::new(CoordinateStore::new(3)));
        let store = Rc::new(RefCell::new(RegistrationStore::new(FakeUrls::default())));
        let preview = Rc::new(RefCell::new(PreviewController::new(FakeMap::default())));
        let statuses = Rc::new(RefCell::new(Vec::new()));
        let sink = statuses.clone();
        let status: StatusSink = Rc::new(move |level: StatusLevel, text: &str| sink.borrow_mut().push((level, text.to_owned())));
        let actions =
            RegistrationActions::new(FakeBackend::default(), coords.clone(), store.clone(), preview.clone(), status, 13);
        Self { actions, coords, store, preview, statuses }
    }

    fn backend(&self) -> &FakeBackend {
        self.actions.backend()
    }

    fn last_status(&self) -> (StatusLevel, String) {
        self.statuses.borrow().last().cloned().unwrap_or((StatusLevel::Info, String::new()))
    }

    fn place_points(&self) {
        let mut coords = self.coords.borrow_mut();
        coords.set_lat_lon_at(0, 60.123_456_78, 5.123_456_44, SetOptions::default());
        coords.set_lat_lon_at(1, 60.2, 5.2, SetOptions::default());
        coords.set_lat_lon_at(2, 60.3, 5.3, SetOptions::default());
        coords.set_image_coordinate_at(0, 10.4, 20.6, SetOptions::default());
        coords.set_image_coordinate_at(1, 300.5, 40.0, SetOptions::default());
        coords.set_image_coordinate_at(2, 150.0, 500.49, SetOptions::default());
    }

    fn drop_image(&self) {
        self.store.borrow_mut().set_dropped_image(ImageFile::new("floyen.png", "image/png", vec![1]));
    }

    fn respond_with_bounds(&self) {
        *self.backend().overlay.borrow_mut() = Some(RegistrationData {
            nw_coords: Some([60.41, 5.31]),
            se_coords: Some([60.39, 5.35]),
            optimal_rotation_angle: Some(3.2),
            ..Default::default()
        });
    }
}

const OVERLAY: Option<Size> = Some(Size { width: 1200.0, height: 800.0 });

fn metadata(name: &str) -> RegistrationMetadata {
    RegistrationMetadata { map_name: name.to_owned(), ..Default::default() }
}

fn saved_entry(id: i64, name: &str) -> MapEntry {
    MapEntry {
        map_id: Some(id),
        nw_coords: Some([60.4, 5.3]),
        se_coords: Some([60.2, 5.5]),
        selected_realworld_coords: Some(vec![json!([60.1, 5.1]), json!([60.2, 5.2]), json!([60.3, 5.3])]),
        selected_pixel_coords: Some(vec![json!([1, 2]), json!([3, 4]), json!([5, 6])]),
        metadata: RegistrationMetadata { map_name: name.to_owned(), map_area: "Bergen".to_owned(), ..Default::default() },
        ..Default::default()
    }
}

// =============================================================
// Payload
// =============================================================

#[test]
fn payload_rounds_pixels_and_degrees() {
    let h = Harness::new();
    h.place_points();
    let request = build_overlay_request(&h.coords.borrow().snapshot(), OVERLAY).unwrap_or_else(|_| OverlayRequest {
        image_coords: vec![],
        real_coords: vec![],
        overlay_width: 0,
        overlay_height: 0,
    });
    assert_eq!(request.image_coords, vec![[10, 21], [301, 40], [150, 500]]);
    assert_eq!(request.real_coords[0], [60.123_457, 5.123_456]);
    assert_eq!(request.real_coords.len(), 3);
    assert_eq!((request.overlay_width, request.overlay_height), (1200, 800));
}

#[test]
fn payload_needs_loaded_overlay_then_all_points() {
    let h = Harness::new();
    let empty = h.coords.borrow().snapshot();
    assert!(matches!(build_overlay_request(&empty, None), Err(RegistrationError::OverlayNotLoaded)));
    assert!(matches!(
        build_overlay_request(&empty, Some(Size::new(0.0, 10.0))),
        Err(RegistrationError::OverlayNotLoaded)
    ));
    assert!(matches!(build_overlay_request(&empty, OVERLAY), Err(RegistrationError::IncompletePoints { pairs: 3 })));
}

#[test]
fn pdf_names_become_png() {
    assert_eq!(png_name("kart.PDF"), "kart.png");
    assert_eq!(png_name("kart.pdf"), "kart.png");
    assert_eq!(png_name("kart"), "kart");
    assert_eq!(png_name("ø.pdf"), "ø.png");
}

// =============================================================
// Compute
// =============================================================

#[test]
fn compute_stores_merged_registration_and_render() {
    let h = Harness::new();
    h.place_points();
    h.drop_image();
    h.respond_with_bounds();

    let outcome = block_on(h.actions.compute_registration(OVERLAY, &metadata("Fløyen")));
    assert!(matches!(outcome, Ok(ActionOutcome::Applied)));

    let store = h.store.borrow();
    let data = store.registration_data();
    assert_eq!(data.nw_coords, Some([60.41, 5.31]));
    assert_eq!(data.metadata.map_name, "Fløyen");
    assert_eq!(data.overlay_width, Some(1200.0));
    assert_eq!(data.selected_pixel_coords.as_ref().map(Vec::len), Some(3));
    assert_eq!(store.overlay_url(), Some("blob:transformed"));
    assert_eq!(store.phase(), RegistrationPhase::Computed);
    assert_eq!(h.backend().calls.borrow().as_slice(), ["overlay", "transform"]);
    let sent = h.backend().last_overlay_request.borrow().clone();
    assert_eq!(sent.map(|r| r.image_coords.len()), Some(3));
    assert_eq!(h.last_status(), (StatusLevel::Success, COMPUTED.to_owned()));
}

#[test]
fn compute_clears_an_old_preview() {
    let h = Harness::new();
    h.place_points();
    h.drop_image();
    h.respond_with_bounds();
    assert!(matches!(block_on(h.actions.compute_registration(OVERLAY, &metadata("a"))), Ok(_)));
    assert!(h.actions.toggle_preview());

    assert!(matches!(block_on(h.actions.compute_registration(OVERLAY, &metadata("a"))), Ok(_)));
    assert!(!h.preview.borrow().is_visible());
    assert!(h.preview.borrow().host().layers.is_empty());
    assert_eq!(h.store.borrow().urls().revoked.borrow().as_slice(), ["blob:transformed".to_owned()]);
}

#[test]
fn compute_validation_issues_no_request() {
    let h = Harness::new();
    h.drop_image();
    let result = block_on(h.actions.compute_registration(OVERLAY, &metadata("a")));
    assert!(matches!(result, Err(RegistrationError::IncompletePoints { .. })));
    assert!(h.backend().calls.borrow().is_empty());
    assert_eq!(h.last_status().0, StatusLevel::Error);

    let h = Harness::new();
    h.place_points();
    let result = block_on(h.actions.compute_registration(OVERLAY, &metadata("a")));
    assert!(matches!(result, Err(RegistrationError::MissingImage)));
    assert!(h.backend().calls.borrow().is_empty());
}

#[test]
fn failed_compute_keeps_previous_registration() {
    let h = Harness::new();
    h.place_points();
    h.drop_image();
    h.respond_with_bounds();
    assert!(matches!(block_on(h.actions.compute_registration(OVERLAY, &metadata("first"))), Ok(_)));

    h.backend().fail("transform");
    let result = block_on(h.actions.compute_registration(OVERLAY, &metadata("second")));
    assert!(matches!(result, Err(RegistrationError::Api(ApiError::Status { status: 500, .. }))));

    let store = h.store.borrow();
    assert_eq!(store.registration_data().metadata.map_name, "first");
    assert_eq!(store.overlay_url(), Some("blob:transformed"));
    assert_eq!(store.phase(), RegistrationPhase::Ready);
    assert_eq!(h.last_status(), (StatusLevel::Error, "transform exploded".to_owned()));
}

#[test]
fn response_without_bounds_is_rejected() {
    let h = Harness::new();
    h.place_points();
    h.drop_image();
    let result = block_on(h.actions.compute_registration(OVERLAY, &metadata("a")));
    assert!(matches!(result, Err(RegistrationError::InvalidResponse(_))));
    assert_eq!(h.backend().count("transform"), 0);
    assert!(!h.store.borrow().registration_data().has_bounds());
}

// =============================================================
// Save
// =============================================================

#[test]
fn save_before_compute_fails_without_request() {
    let h = Harness::new();
    h.place_points();
    h.drop_image();
    let result = block_on(h.actions.save_registration(&metadata("a")));
    assert!(matches!(result, Err(RegistrationError::MissingRegistration)));
    assert!(h.backend().calls.borrow().is_empty());
    let (level, text) = h.last_status();
    assert_eq!(level, StatusLevel::Error);
    assert!(text.contains("missing registration"));
}

#[test]
fn save_sends_latest_metadata_and_shows_preview() {
    let h = Harness::new();
    h.place_points();
    h.drop_image();
    h.respond_with_bounds();
    assert!(matches!(block_on(h.actions.compute_registration(OVERLAY, &metadata("draft"))), Ok(_)));

    let edited = RegistrationMetadata { map_club: "IL Tyrving".to_owned(), ..metadata("final") };
    assert!(matches!(block_on(h.actions.save_registration(&edited)), Ok(ActionOutcome::Applied)));

    let stored = h.backend().last_stored.borrow().clone().unwrap_or_default();
    assert_eq!(stored.metadata.map_name, "final");
    assert_eq!(stored.metadata.map_club, "IL Tyrving");
    assert_eq!(stored.nw_coords, Some([60.41, 5.31]));

    let store = h.store.borrow();
    assert_eq!(store.phase(), RegistrationPhase::Saved);
    assert_eq!(store.overlay_url(), Some("blob:stored"));
    assert_eq!(h.preview.borrow().host().layers, vec![(1, "blob:stored".to_owned())]);
}

#[test]
fn only_the_newest_compute_is_applied() {
    let h = Harness::new();
    h.place_points();
    h.drop_image();
    h.respond_with_bounds();
    let release_first = h.backend().hold("overlay");
    let first_meta = metadata("First");
    let second_meta = metadata("Second");

    let (first, second) = block_on(async {
        let first = h.actions.compute_registration(OVERLAY, &first_meta);
        let second = async {
            let result = h.actions.compute_registration(OVERLAY, &second_meta).await;
            assert!(release_first.send(()).is_ok());
            result
        };
        futures::join!(first, second)
    });

    assert!(matches!(first, Ok(ActionOutcome::Superseded)));
    assert!(matches!(second, Ok(ActionOutcome::Applied)));
    let store = h.store.borrow();
    assert_eq!(store.registration_data().metadata.map_name, "Second");
    assert_eq!(store.phase(), RegistrationPhase::Computed);
    assert_eq!(h.last_status(), (StatusLevel::Success, COMPUTED.to_owned()));
}

#[test]
fn only_the_newest_save_is_applied() {
    let h = Harness::new();
    h.place_points();
    h.drop_image();
    h.respond_with_bounds();
    assert!(matches!(block_on(h.actions.compute_registration(OVERLAY, &metadata("draft"))), Ok(_)));
    let release_first = h.backend().hold("store");
    let first_meta = metadata("First");
    let second_meta = metadata("Second");

    let (first, second) = block_on(async {
        let first = h.actions.save_registration(&first_meta);
        let second = async {
            let result = h.actions.save_registration(&second_meta).await;
            assert!(release_first.send(()).is_ok());
            result
        };
        futures::join!(first, second)
    });

    assert!(matches!(first, Ok(ActionOutcome::Superseded)));
    assert!(matches!(second, Ok(ActionOutcome::Applied)));
    assert_eq!(h.store.borrow().registration_data().metadata.map_name, "Second");
    assert_eq!(h.preview.borrow().host().layers.len(), 1);
}

#[test]
fn loading_a_map_discards_a_running_compute() {
    let h = Harness::new();
    h.place_points();
    h.drop_image();
    h.respond_with_bounds();
    let release_compute = h.backend().hold("overlay");
    let stale = metadata("Stale compute");
    let entry = saved_entry(2, "New");

    let (compute, loaded) = block_on(async {
        let compute = h.actions.compute_registration(OVERLAY, &stale);
        let load = async {
            let result = h.actions.load_existing_map(&entry).await;
            assert!(release_compute.send(()).is_ok());
            result
        };
        futures::join!(compute, load)
    });

    assert!(matches!(compute, Ok(ActionOutcome::Superseded)));
    assert!(matches!(loaded, Ok(Some(_))));
    let store = h.store.borrow();
    assert_eq!(store.registration_data().metadata.map_name, "New");
    assert_eq!(store.registration_data().map_id, Some(2));
    assert_eq!(store.overlay_url(), Some("blob:final:New"));
    assert_eq!(store.phase(), RegistrationPhase::Saved);
    assert_eq!(store.dropped_image().map(|f| f.name.as_str()), Some("New.png"));
    assert!(h.preview.borrow().is_visible());
}

#[test]
fn dropping_a_file_discards_a_running_save() {
    let h = Harness::new();
    h.place_points();
    h.drop_image();
    h.respond_with_bounds();
    assert!(matches!(block_on(h.actions.compute_registration(OVERLAY, &metadata("draft"))), Ok(_)));
    let release_save = h.backend().hold("store");
    let saving = metadata("Old map");

    let (saved, dropped) = block_on(async {
        let save = h.actions.save_registration(&saving);
        let drop = async {
            let file = ImageFile::new("ny.png", "image/png", vec![9]);
            let result = h.actions.accept_dropped_file(file, RegistrationMetadata::default()).await;
            assert!(release_save.send(()).is_ok());
            result
        };
        futures::join!(save, drop)
    });

    assert!(matches!(saved, Ok(ActionOutcome::Superseded)));
    assert!(matches!(dropped, Ok(Some(_))));
    let store = h.store.borrow();
    assert!(!store.registration_data().has_bounds());
    assert!(store.overlay_url().is_none());
    assert_eq!(store.dropped_image().map(|f| f.name.as_str()), Some("ny.png"));
    assert!(!h.preview.borrow().is_visible());
}

// =============================================================
// Dropped files
// =============================================================

#[test]
fn dropped_image_is_processed_and_names_defaulted() {
    let h = Harness::new();
    let file = ImageFile::new("sandviken.jpg", "image/jpeg", vec![7]);
    let result = block_on(h.actions.accept_dropped_file(file, RegistrationMetadata::default()));
    let metadata = result.unwrap_or_default().unwrap_or_default();
    assert_eq!(metadata.map_name, "sandviken.jpg");
    assert_eq!(metadata.map_filename, "sandviken.jpg");

    let store = h.store.borrow();
    assert_eq!(store.source_url(), Some("blob:processed:sandviken.jpg"));
    assert_eq!(store.dropped_image().map(|f| f.mime.as_str()), Some("image/jpeg"));
    assert_eq!(h.last_status(), (StatusLevel::Success, UPLOAD_COMPLETE.to_owned()));
}

#[test]
fn dropped_pdf_is_converted_first() {
    let h = Harness::new();
    let file = ImageFile::new("kart.pdf", "application/pdf", vec![1]);
    let result = block_on(h.actions.accept_dropped_file(file, metadata("Kept")));
    let metadata = result.unwrap_or_default().unwrap_or_default();
    assert_eq!(metadata.map_name, "Kept");
    assert_eq!(metadata.map_filename, "kart.png");
    assert_eq!(h.backend().calls.borrow().as_slice(), ["pdf", "process"]);

    let store = h.store.borrow();
    let image = store.dropped_image().cloned().unwrap_or_else(|| ImageFile::new("", "", vec![]));
    assert_eq!(image.name, "kart.png");
    assert_eq!(image.mime, "image/png");
    assert_eq!(image.bytes, b"converted".to_vec());
}

#[test]
fn unsupported_drop_changes_nothing() {
    let h = Harness::new();
    let file = ImageFile::new("notes.txt", "text/plain", vec![1]);
    let result = block_on(h.actions.accept_dropped_file(file, RegistrationMetadata::default()));
    assert!(matches!(result, Err(RegistrationError::UnsupportedFile { .. })));
    assert!(h.backend().calls.borrow().is_empty());
    assert!(h.store.borrow().dropped_image().is_none());
    assert_eq!(h.last_status(), (StatusLevel::Error, "Please drop an image or PDF file.".to_owned()));
}

// =============================================================
// Saved maps
// =============================================================

#[test]
fn list_maps_sorted_newest_first() {
    let h = Harness::new();
    *h.backend().maps.borrow_mut() = vec![saved_entry(1, "a"), saved_entry(7, "b"), saved_entry(3, "c")];
    let ids: Vec<Option<i64>> =
        block_on(h.actions.list_maps()).unwrap_or_default().iter().map(|e| e.map_id).collect();
    assert_eq!(ids, vec![Some(7), Some(3), Some(1)]);
}

#[test]
fn loading_a_map_fills_both_stores() {
    let h = Harness::new();
    let loaded = block_on(h.actions.load_existing_map(&saved_entry(4, "Sandviken"))).unwrap_or_default();
    let loaded = loaded.unwrap_or_else(|| LoadedMap { metadata: RegistrationMetadata::default(), focus: None, zoom: 0 });
    assert_eq!(loaded.metadata.map_area, "Bergen");
    assert_eq!(loaded.zoom, 13);
    assert!(loaded.focus.is_some());

    assert!(h.coords.borrow().is_complete());
    let store = h.store.borrow();
    assert_eq!(store.source_url(), Some("blob:processed:Sandviken.png"));
    assert_eq!(store.overlay_url(), Some("blob:final:Sandviken"));
    assert_eq!(store.registration_data().map_id, Some(4));
    assert_eq!(store.dropped_image().map(|f| f.name.as_str()), Some("Sandviken.png"));
    assert_eq!(store.phase(), RegistrationPhase::Saved);
    assert!(h.preview.borrow().is_visible());
    assert!(h.last_status().1.starts_with("Loaded \"Sandviken\"."));
}

#[test]
fn stale_map_load_is_discarded() {
    let h = Harness::new();
    let release_first = h.backend().hold("Old");
    let old = saved_entry(1, "Old");
    let new = saved_entry(2, "New");

    let (first, second) = block_on(async {
        let first = h.actions.load_existing_map(&old);
        let second = async {
            let result = h.actions.load_existing_map(&new).await;
            assert!(release_first.send(()).is_ok());
            result
        };
        futures::join!(first, second)
    });

    assert!(matches!(first, Ok(None)));
    assert!(matches!(second, Ok(Some(_))));
    let store = h.store.borrow();
    assert_eq!(store.registration_data().metadata.map_name, "New");
    assert_eq!(store.overlay_url(), Some("blob:final:New"));
    assert_eq!(h.preview.borrow().host().layers.len(), 1);
    assert!(h.last_status().1.starts_with("Loaded \"New\"."));
}

#[test]
fn failed_map_load_reports_and_keeps_state() {
    let h = Harness::new();
    h.backend().fail("final");
    let result = block_on(h.actions.load_existing_map(&saved_entry(5, "Broken")));
    assert!(result.is_err());
    assert_eq!(h.last_status(), (StatusLevel::Error, LOAD_FAILED.to_owned()));
    assert!(h.store.borrow().source_url().is_none());
    assert!(h.coords.borrow().snapshot().is_blank());
}

#[test]
fn unnamed_map_is_not_fetched() {
    let h = Harness::new();
    let result = block_on(h.actions.load_existing_map(&saved_entry(6, "")));
    assert!(matches!(result, Err(RegistrationError::MissingMapName)));
    assert!(h.backend().calls.borrow().is_empty());
}

// =============================================================
// Misc
// =============================================================

#[test]
fn preview_toggle_needs_a_registration() {
    let h = Harness::new();
    assert!(!h.actions.toggle_preview());
    h.store.borrow_mut().set_registration_data(RegistrationData {
        nw_coords: Some([60.4, 5.3]),
        se_coords: Some([60.2, 5.5]),
        ..Default::default()
    });
    h.store.borrow_mut().set_overlay_blob(Some(&png("x")));
    assert!(h.actions.toggle_preview());
    assert!(!h.actions.toggle_preview());
    assert!(h.actions.toggle_preview());
    assert_eq!(h.preview.borrow().host().layers.len(), 1);
}

#[test]
fn export_posts_defaults() {
    let h = Harness::new();
    let result = block_on(h.actions.export_database()).unwrap_or_default();
    assert_eq!(result["include_original"], json!(true));
    assert_eq!(h.last_status(), (StatusLevel::Success, EXPORTED.to_owned()));
}

#[test]
fn session_expiry_is_recognisable() {
    let h = Harness::new();
    h.backend().failing.borrow_mut().push("me");
    let err = block_on(h.actions.current_user()).err();
    assert!(matches!(err, Some(RegistrationError::Api(ApiError::Status { .. }))));
    assert!(RegistrationError::from(ApiError::SessionExpired).is_session_expired());
}
