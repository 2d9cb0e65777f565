use super::*;
use registration::registration::RegistrationData;

// =============================================================
// Points file
// =============================================================

const POINTS: &str = r#"{
    "lat_lon_pairs": [[60.1234567, 5.1], {"lat": 60.2, "lng": 5.2}, [60.3, 5.3]],
    "image_pairs": [[10.4, 20.6], {"x": 30, "y": 40}, ["50", "60"]]
}"#;

#[test]
fn points_file_builds_rounded_request() {
    let request = overlay_request_from_json(POINTS, 1200, 800).expect("request");
    assert_eq!(request.image_coords, vec![[10, 21], [30, 40], [50, 60]]);
    assert_eq!(request.real_coords[0], [60.123457, 5.1]);
    assert_eq!(request.real_coords[1], [60.2, 5.2]);
    assert_eq!(request.overlay_width, 1200);
    assert_eq!(request.overlay_height, 800);
}

#[test]
fn mismatched_pair_counts_are_rejected() {
    let raw = r#"{"lat_lon_pairs": [[60.1, 5.1], [60.2, 5.2]], "image_pairs": [[1, 2]]}"#;
    let err = overlay_request_from_json(raw, 100, 100).expect_err("mismatch");
    assert!(matches!(err, CliError::PairCount { terrain: 2, image: 1, .. }));
}

#[test]
fn empty_points_file_is_rejected() {
    let err = overlay_request_from_json("{}", 100, 100).expect_err("empty");
    assert!(matches!(err, CliError::PairCount { terrain: 0, image: 0, .. }));
}

#[test]
fn malformed_pairs_are_listed_by_slot() {
    let raw = r#"{"lat_lon_pairs": [[60.1, 5.1], [95.0, 5.2]], "image_pairs": [[1, 2], [-3, 4]]}"#;
    let err = overlay_request_from_json(raw, 100, 100).expect_err("bad pairs");
    let CliError::BadPairs(message) = err else {
        panic!("expected BadPairs, got {err:?}");
    };
    assert!(message.contains("terrain #2"));
    assert!(message.contains("image #2"));
}

#[test]
fn zero_overlay_size_is_reported_by_the_core() {
    let err = overlay_request_from_json(POINTS, 0, 800).expect_err("no overlay");
    assert!(matches!(err, CliError::Registration(RegistrationError::OverlayNotLoaded)));
}

#[test]
fn invalid_json_is_reported() {
    let err = overlay_request_from_json("not json", 100, 100).expect_err("json");
    assert!(matches!(err, CliError::InvalidJson(_)));
}

// =============================================================
// Output helpers
// =============================================================

#[test]
fn map_line_is_tab_separated() {
    let mut entry = RegistrationData { map_id: Some(7), ..RegistrationData::default() };
    entry.metadata.map_name = "Fløyen".to_owned();
    entry.metadata.map_area = "Bergen".to_owned();
    assert_eq!(map_line(&entry), format!("7\tFløyen\t{}", meta_line(&entry)));
}

#[test]
fn map_line_marks_missing_id() {
    let entry = RegistrationData::default();
    assert!(map_line(&entry).starts_with("-\t"));
}

#[test]
fn export_flags_invert_into_request() {
    assert_eq!(export_request(false, false), ExportRequest::default());
    let request = export_request(true, true);
    assert!(!request.include_original);
    assert!(!request.overwrite);
}

// =============================================================
// Backend helpers
// =============================================================

#[test]
fn base_url_loses_trailing_slash() {
    assert_eq!(backend::normalize_base_url("http://127.0.0.1:5000/").expect("url"), "http://127.0.0.1:5000");
}

#[test]
fn base_url_must_be_http() {
    assert!(matches!(backend::normalize_base_url("ftp://example.com"), Err(CliError::InvalidBaseUrl(_))));
    assert!(matches!(backend::normalize_base_url("not a url"), Err(CliError::InvalidBaseUrl(_))));
}

#[test]
fn content_type_parameters_are_dropped() {
    assert_eq!(backend::mime_from_header(Some("image/PNG; q=1")), "image/png");
    assert_eq!(backend::mime_from_header(None), "application/octet-stream");
}
