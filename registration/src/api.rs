//! Backend wire types and the [`Backend`] seam.
//!
//! ARCHITECTURE
//! ============
//! Registration actions talk to the map backend only through [`Backend`].
//! The browser implements it over `gloo-net`, the CLI over `reqwest`, and
//! tests with an in-memory fake. Every implementation maps non-2xx responses
//! through [`error_from_response`] so status text is identical everywhere.
//!
//! A 401/403 on any endpoint becomes [`ApiError::SessionExpired`]; the
//! browser redirects to [`LOGIN_PAGE`] and nothing is retried.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registration::RegistrationData;

/// Where the browser goes when the session has expired.
pub const LOGIN_PAGE: &str = "/login.html";

pub const OVERLAY_COORDINATES_PATH: &str = "/api/getOverlayCoordinates";
pub const TRANSFORM_MAP_PATH: &str = "/api/transformMap";
pub const TRANSFORM_AND_STORE_PATH: &str = "/api/transformAndStoreMapData";
pub const LIST_MAPS_PATH: &str = "/api/dal/list_maps";
pub const PROCESS_DROPPED_IMAGE_PATH: &str = "/api/processDroppedImage";
pub const CONVERT_PDF_PATH: &str = "/api/convertPdfToImage";
pub const EXPORT_DATABASE_PATH: &str = "/api/dal/export_database";
pub const CURRENT_USER_PATH: &str = "/api/auth/me";

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";
/// Multipart field carrying registration JSON.
pub const REGISTRATION_FIELD: &str = "imageRegistrationData";

/// Failure talking to the backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// 401/403 from any endpoint.
    #[error("session expired, please log in again")]
    SessionExpired,
    /// Non-2xx response; the message is the backend's `error` field when it
    /// sent one.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
    /// The response body was not what the endpoint promises.
    #[error("failed to decode response from {path}: {message}")]
    Decode { path: String, message: String },
}

/// Map a non-2xx response to an [`ApiError`].
#[must_use]
pub fn error_from_response(path: &str, status: u16, status_text: &str, body: &str) -> ApiError {
    if status == 401 || status == 403 {
        return ApiError::SessionExpired;
    }
    let backend_message = match serde_json::from_str::<Value>(body) {
        Ok(json) => json.get("error").and_then(Value::as_str).map(str::to_owned).filter(|m| !m.trim().is_empty()),
        Err(_) => None,
    };
    let message = backend_message.unwrap_or_else(|| {
        format!("Request to {path} failed with status {status} {status_text}").trim_end().to_owned()
    });
    ApiError::Status { status, message }
}

/// Which stored rendition of a saved map to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFileKind {
    Original,
    Final,
}

impl MapFileKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Final => "final",
        }
    }
}

/// Percent-encode one URL path segment (RFC 3986 unreserved set kept).
#[must_use]
pub fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// `GET` path of a stored map file.
#[must_use]
pub fn map_file_path(kind: MapFileKind, map_name: &str) -> String {
    format!("/api/dal/mapfile/{}/{}", kind.as_str(), encode_path_segment(map_name))
}

// ── Wire types ──────────────────────────────────────────────────

/// Body of `POST /api/getOverlayCoordinates`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayRequest {
    /// Image points, natural pixels rounded to integers.
    pub image_coords: Vec<[i64; 2]>,
    /// Terrain points as `[lat, lon]`, six decimals.
    pub real_coords: Vec<[f64; 2]>,
    #[serde(rename = "overlayWidth")]
    pub overlay_width: u32,
    #[serde(rename = "overlayHeight")]
    pub overlay_height: u32,
}

/// Response of `POST /api/getOverlayCoordinates`.
pub type OverlayResponse = RegistrationData;

/// A saved map as listed by `GET /api/dal/list_maps`. Same shape as the
/// registration data it was saved from, plus server bookkeeping in `extra`.
pub type MapEntry = RegistrationData;

/// Body of `POST /api/dal/export_database`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub include_original: bool,
    pub overwrite: bool,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self { include_original: true, overwrite: true }
    }
}

/// Response of `GET /api/auth/me`. Only the fields the UI shows are typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A named file with its MIME type, e.g. the map image the user dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    #[must_use]
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), mime: mime.into(), bytes }
    }

    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.mime == "application/pdf"
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// A binary response body with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageBlob {
    #[must_use]
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { mime: mime.into(), bytes }
    }

    /// Wrap the blob as a file, defaulting the type to PNG.
    #[must_use]
    pub fn into_file(self, name: impl Into<String>) -> ImageFile {
        let mime = if self.mime.is_empty() { "image/png".to_owned() } else { self.mime };
        ImageFile { name: name.into(), mime, bytes: self.bytes }
    }
}

// ── Backend ─────────────────────────────────────────────────────

/// The map backend, one method per endpoint.
#[async_trait(?Send)]
pub trait Backend {
    /// `POST /api/getOverlayCoordinates`
    async fn overlay_coordinates(&self, request: &OverlayRequest) -> Result<OverlayResponse, ApiError>;

    /// `POST /api/transformMap` (multipart); renders a preview, nothing stored.
    async fn transform_map(&self, file: &ImageFile, data: &RegistrationData) -> Result<ImageBlob, ApiError>;

    /// `POST /api/transformAndStoreMapData` (multipart); renders and persists.
    async fn transform_and_store(&self, file: &ImageFile, data: &RegistrationData) -> Result<ImageBlob, ApiError>;

    /// `GET /api/dal/list_maps`
    async fn list_maps(&self) -> Result<Vec<MapEntry>, ApiError>;

    /// `GET /api/dal/mapfile/original/{name}`
    async fn original_map_file(&self, map_name: &str) -> Result<ImageBlob, ApiError>;

    /// `GET /api/dal/mapfile/final/{name}`
    async fn final_map_file(&self, map_name: &str) -> Result<ImageBlob, ApiError>;

    /// `POST /api/processDroppedImage` (multipart)
    async fn process_dropped_image(&self, file: &ImageFile) -> Result<ImageBlob, ApiError>;

    /// `POST /api/convertPdfToImage` (multipart)
    async fn convert_pdf_to_image(&self, file: &ImageFile) -> Result<ImageBlob, ApiError>;

    /// `POST /api/dal/export_database`
    async fn export_database(&self, request: &ExportRequest) -> Result<Value, ApiError>;

    /// `GET /api/auth/me`
    async fn current_user(&self) -> Result<SessionUser, ApiError>;
}
