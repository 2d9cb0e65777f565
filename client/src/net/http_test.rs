use super::*;

// =============================================================
// Content type
// =============================================================

#[test]
fn mime_drops_parameters() {
    assert_eq!(mime_from_header(Some("image/png; charset=binary")), "image/png");
    assert_eq!(mime_from_header(Some("Image/JPEG")), "image/jpeg");
}

#[test]
fn missing_mime_defaults_to_octet_stream() {
    assert_eq!(mime_from_header(None), DEFAULT_BLOB_MIME);
    assert_eq!(mime_from_header(Some("  ; x=1")), DEFAULT_BLOB_MIME);
}

// =============================================================
// Errors
// =============================================================

#[test]
fn network_error_names_the_path() {
    let err = network_error("/api/dal/list_maps", "connection refused");
    assert_eq!(err, ApiError::Network("/api/dal/list_maps: connection refused".to_owned()));
    assert_eq!(err.to_string(), "network error: /api/dal/list_maps: connection refused");
}

#[test]
fn decode_error_keeps_message() {
    let err = decode_error("/api/auth/me", "expected value at line 1 column 1");
    assert_eq!(
        err.to_string(),
        "failed to decode response from /api/auth/me: expected value at line 1 column 1"
    );
}

// =============================================================
// Multipart payload
// =============================================================

#[test]
fn registration_json_uses_wire_field_names() {
    let mut data = RegistrationData { nw_coords: Some([60.4, 5.3]), se_coords: Some([60.3, 5.4]), ..RegistrationData::default() };
    data.metadata.map_name = "Fløyen".to_owned();
    let json = registration_json("/api/transformMap", &data).unwrap_or_default();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();
    assert_eq!(value["map_name"], "Fløyen");
    assert_eq!(value["nw_coords"][0], 60.4);
    assert!(value.get("map_id").is_none());
}
