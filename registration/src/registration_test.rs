use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use super::*;
use crate::coords::{CoordinateStore, SetOptions};

#[derive(Default)]
struct UrlLog {
    created: Vec<String>,
    revoked: Vec<String>,
}

#[derive(Clone, Default)]
struct FakeUrls(Rc<RefCell<UrlLog>>);

impl ObjectUrls for FakeUrls {
    fn create(&self, blob: &ImageBlob) -> Option<String> {
        let mut log = self.0.borrow_mut();
        let url = format!("blob:{}-{}", log.created.len(), blob.bytes.len());
        log.created.push(url.clone());
        Some(url)
    }

    fn revoke(&self, url: &str) {
        self.0.borrow_mut().revoked.push(url.to_owned());
    }
}

fn blob(len: usize) -> ImageBlob {
    ImageBlob::new("image/png", vec![0; len])
}

fn complete_snapshot() -> CoordinateSnapshot {
    let mut store = CoordinateStore::new(1);
    store.set_lat_lon_at(0, 60.0, 5.0, SetOptions::default());
    store.set_image_coordinate_at(0, 1.0, 1.0, SetOptions::default());
    store.snapshot()
}

// =============================================================
// Metadata / data
// =============================================================

#[test]
fn default_names_fill_only_empty_fields() {
    let metadata = RegistrationMetadata { map_name: "Fløyen".to_owned(), ..Default::default() }.with_default_names("floyen.png");
    assert_eq!(metadata.map_name, "Fløyen");
    assert_eq!(metadata.map_filename, "floyen.png");

    let blank = RegistrationMetadata { map_name: "   ".to_owned(), ..Default::default() }.with_default_names("a.png");
    assert_eq!(blank.map_name, "a.png");
}

#[test]
fn data_keeps_unknown_backend_keys() {
    let data: RegistrationData = serde_json::from_value(json!({
        "nw_coords": [60.4, 5.3],
        "se_coords": [60.3, 5.4],
        "optimal_rotation_angle": 2.5,
        "map_name": "Fløyen",
        "map_area": null,
        "scale_factor": 0.42
    }))
    .unwrap_or_default();
    assert_eq!(data.nw_coords, Some([60.4, 5.3]));
    assert_eq!(data.metadata.map_name, "Fløyen");
    assert_eq!(data.metadata.map_area, "");
    assert_eq!(data.extra.get("scale_factor"), Some(&json!(0.42)));
    assert!(!data.extra.contains_key("map_name"));

    let back = serde_json::to_value(&data).unwrap_or_default();
    assert_eq!(back["scale_factor"], json!(0.42));
    assert_eq!(back["optimal_rotation_angle"], json!(2.5));
    assert!(back.get("map_id").is_none());
}

#[test]
fn merged_metadata_wins() {
    let data = RegistrationData {
        nw_coords: Some([60.4, 5.3]),
        metadata: RegistrationMetadata { map_name: "old".to_owned(), map_club: "IL Tyrving".to_owned(), ..Default::default() },
        ..Default::default()
    };
    let merged = data.merged(&RegistrationMetadata { map_name: "new".to_owned(), ..Default::default() });
    assert_eq!(merged.metadata.map_name, "new");
    assert_eq!(merged.metadata.map_club, "");
    assert_eq!(merged.nw_coords, Some([60.4, 5.3]));
}

#[test]
fn bounds_require_both_valid_corners() {
    let mut data = RegistrationData { nw_coords: Some([60.4, 5.3]), ..Default::default() };
    assert!(!data.has_bounds());
    assert!(data.bounds().is_none());
    data.se_coords = Some([60.3, 5.4]);
    assert!(data.has_bounds());
    assert!(data.bounds().is_some());
    data.se_coords = Some([260.3, 5.4]);
    assert!(data.has_bounds());
    assert!(data.bounds().is_none());
}

// =============================================================
// URL ownership
// =============================================================

#[test]
fn replacing_a_url_revokes_the_previous_one() {
    let urls = FakeUrls::default();
    let mut store = RegistrationStore::new(urls.clone());
    let first = store.set_overlay_blob(Some(&blob(1)));
    let second = store.set_overlay_blob(Some(&blob(2)));
    assert_ne!(first, second);
    assert_eq!(store.overlay_url(), second.as_deref());
    assert_eq!(urls.0.borrow().revoked, vec![first.unwrap_or_default()]);
}

#[test]
fn clearing_a_url_revokes_it() {
    let urls = FakeUrls::default();
    let mut store = RegistrationStore::new(urls.clone());
    store.set_source_blob(Some(&blob(3)));
    assert_eq!(store.set_source_blob(None), None);
    assert_eq!(store.source_url(), None);
    assert_eq!(urls.0.borrow().revoked.len(), 1);
}

#[test]
fn drop_revokes_every_live_url() {
    let urls = FakeUrls::default();
    {
        let mut store = RegistrationStore::new(urls.clone());
        store.set_source_blob(Some(&blob(1)));
        store.set_overlay_blob(Some(&blob(2)));
    }
    let log = urls.0.borrow();
    assert_eq!(log.created.len(), 2);
    assert_eq!(log.revoked.len(), 2);
}

#[test]
fn release_urls_is_idempotent() {
    let urls = FakeUrls::default();
    let mut store = RegistrationStore::new(urls.clone());
    store.set_overlay_blob(Some(&blob(1)));
    store.release_urls();
    store.release_urls();
    drop(store);
    assert_eq!(urls.0.borrow().revoked.len(), 1);
}

// =============================================================
// Phase
// =============================================================

#[test]
fn readiness_follows_point_completion() {
    let mut store = RegistrationStore::new(FakeUrls::default());
    store.refresh_readiness(&CoordinateStore::new(1).snapshot());
    assert_eq!(store.phase(), RegistrationPhase::Idle);
    store.refresh_readiness(&complete_snapshot());
    assert_eq!(store.phase(), RegistrationPhase::Ready);
}

#[test]
fn readiness_leaves_busy_and_completed_phases() {
    let mut store = RegistrationStore::new(FakeUrls::default());
    store.set_phase(RegistrationPhase::Computing);
    store.refresh_readiness(&CoordinateStore::new(1).snapshot());
    assert_eq!(store.phase(), RegistrationPhase::Computing);

    store.set_phase(RegistrationPhase::Computed);
    store.refresh_readiness(&complete_snapshot());
    assert_eq!(store.phase(), RegistrationPhase::Computed);
    store.refresh_readiness(&CoordinateStore::new(1).snapshot());
    assert_eq!(store.phase(), RegistrationPhase::Idle);
}

#[test]
fn failure_returns_to_ready_or_idle() {
    let mut store = RegistrationStore::new(FakeUrls::default());
    store.set_phase(RegistrationPhase::Saving);
    store.fail(&complete_snapshot());
    assert_eq!(store.phase(), RegistrationPhase::Ready);
    store.set_phase(RegistrationPhase::Computing);
    store.fail(&CoordinateStore::new(2).snapshot());
    assert_eq!(store.phase(), RegistrationPhase::Idle);
}
