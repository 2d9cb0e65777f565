//! `Backend` over `gloo-net`.
//!
//! JSON endpoints go through [`HttpBackend::post_json`] / [`HttpBackend::get_json`];
//! image endpoints send `multipart/form-data` with the file under `file` and,
//! where the endpoint needs it, registration JSON under
//! `imageRegistrationData`, and read the response body as bytes.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses go through `registration::api::error_from_response`.
//! A 401/403 sends the browser to the login page before the error is
//! returned, so callers only have to surface it.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

#[cfg(any(test, feature = "hydrate"))]
use registration::api::ApiError;
#[cfg(any(test, feature = "hydrate"))]
use registration::registration::RegistrationData;

#[cfg(feature = "hydrate")]
use async_trait::async_trait;
#[cfg(feature = "hydrate")]
use gloo_net::http::{Request, Response};
#[cfg(feature = "hydrate")]
use registration::api::{
    Backend, CONVERT_PDF_PATH, CURRENT_USER_PATH, EXPORT_DATABASE_PATH, ExportRequest, FILE_FIELD, ImageBlob,
    ImageFile, LIST_MAPS_PATH, LOGIN_PAGE, MapEntry, MapFileKind, OVERLAY_COORDINATES_PATH, OverlayRequest,
    OverlayResponse, PROCESS_DROPPED_IMAGE_PATH, REGISTRATION_FIELD, SessionUser, TRANSFORM_AND_STORE_PATH,
    TRANSFORM_MAP_PATH, error_from_response, map_file_path,
};
#[cfg(feature = "hydrate")]
use serde::{Serialize, de::DeserializeOwned};
#[cfg(feature = "hydrate")]
use serde_json::Value;

#[cfg(any(test, feature = "hydrate"))]
const DEFAULT_BLOB_MIME: &str = "application/octet-stream";

/// Media type from a `Content-Type` header, parameters dropped.
#[cfg(any(test, feature = "hydrate"))]
fn mime_from_header(header: Option<&str>) -> String {
    header
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .map_or_else(|| DEFAULT_BLOB_MIME.to_owned(), str::to_ascii_lowercase)
}

#[cfg(any(test, feature = "hydrate"))]
fn network_error(path: &str, err: impl std::fmt::Display) -> ApiError {
    ApiError::Network(format!("{path}: {err}"))
}

#[cfg(any(test, feature = "hydrate"))]
fn decode_error(path: &str, err: impl std::fmt::Display) -> ApiError {
    ApiError::Decode { path: path.to_owned(), message: err.to_string() }
}

/// Registration JSON for the multipart `imageRegistrationData` field.
#[cfg(any(test, feature = "hydrate"))]
fn registration_json(path: &str, data: &RegistrationData) -> Result<String, ApiError> {
    serde_json::to_string(data).map_err(|err| decode_error(path, err))
}

#[cfg(feature = "hydrate")]
fn redirect_to_login() {
    let Some(window) = web_sys::window() else {
        return;
    };
    log::warn!("session expired; redirecting to {LOGIN_PAGE}");
    if let Err(err) = window.location().set_href(LOGIN_PAGE) {
        log::error!("login redirect failed: {err:?}");
    }
}

/// HTTP client for the map backend.
#[cfg(feature = "hydrate")]
#[derive(Clone, Debug)]
pub struct HttpBackend {
    api_base: String,
}

#[cfg(feature = "hydrate")]
impl HttpBackend {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self { api_base: api_base.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base.trim_end_matches('/'))
    }

    async fn send(&self, path: &str, request: Result<Request, gloo_net::Error>) -> Result<Response, ApiError> {
        let request = request.map_err(|err| network_error(path, err))?;
        let response = request.send().await.map_err(|err| network_error(path, err))?;
        if response.ok() {
            return Ok(response);
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                log::debug!("{path}: unreadable error body: {err}");
                String::new()
            }
        };
        let err = error_from_response(path, response.status(), &response.status_text(), &body);
        if err == ApiError::SessionExpired {
            redirect_to_login();
        }
        Err(err)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = Request::get(&self.url(path)).header("Accept", "application/json").build();
        let response = self.send(path, request).await?;
        response.json::<T>().await.map_err(|err| decode_error(path, err))
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = Request::post(&self.url(path)).header("Accept", "application/json").json(body);
        let response = self.send(path, request).await?;
        response.json::<T>().await.map_err(|err| decode_error(path, err))
    }

    async fn get_blob(&self, path: &str) -> Result<ImageBlob, ApiError> {
        let response = self.send(path, Request::get(&self.url(path)).build()).await?;
        read_blob(path, response).await
    }

    async fn post_form(&self, path: &str, file: &ImageFile, data: Option<&RegistrationData>) -> Result<ImageBlob, ApiError> {
        let form = web_sys::FormData::new().map_err(|err| network_error(path, format!("{err:?}")))?;
        let blob =
            crate::util::files::bytes_to_blob(&file.bytes, &file.mime).map_err(|err| network_error(path, format!("{err:?}")))?;
        form.append_with_blob_and_filename(FILE_FIELD, &blob, &file.name)
            .map_err(|err| network_error(path, format!("{err:?}")))?;
        if let Some(data) = data {
            form.append_with_str(REGISTRATION_FIELD, &registration_json(path, data)?)
                .map_err(|err| network_error(path, format!("{err:?}")))?;
        }
        let response = self.send(path, Request::post(&self.url(path)).body(form)).await?;
        read_blob(path, response).await
    }
}

#[cfg(feature = "hydrate")]
async fn read_blob(path: &str, response: Response) -> Result<ImageBlob, ApiError> {
    let mime = mime_from_header(response.headers().get("content-type").as_deref());
    let bytes = response.binary().await.map_err(|err| decode_error(path, err))?;
    Ok(ImageBlob::new(mime, bytes))
}

#[cfg(feature = "hydrate")]
#[async_trait(?Send)]
impl Backend for HttpBackend {
    async fn overlay_coordinates(&self, request: &OverlayRequest) -> Result<OverlayResponse, ApiError> {
        self.post_json(OVERLAY_COORDINATES_PATH, request).await
    }

    async fn transform_map(&self, file: &ImageFile, data: &RegistrationData) -> Result<ImageBlob, ApiError> {
        self.post_form(TRANSFORM_MAP_PATH, file, Some(data)).await
    }

    async fn transform_and_store(&self, file: &ImageFile, data: &RegistrationData) -> Result<ImageBlob, ApiError> {
        self.post_form(TRANSFORM_AND_STORE_PATH, file, Some(data)).await
    }

    async fn list_maps(&self) -> Result<Vec<MapEntry>, ApiError> {
        self.get_json(LIST_MAPS_PATH).await
    }

    async fn original_map_file(&self, map_name: &str) -> Result<ImageBlob, ApiError> {
        self.get_blob(&map_file_path(MapFileKind::Original, map_name)).await
    }

    async fn final_map_file(&self, map_name: &str) -> Result<ImageBlob, ApiError> {
        self.get_blob(&map_file_path(MapFileKind::Final, map_name)).await
    }

    async fn process_dropped_image(&self, file: &ImageFile) -> Result<ImageBlob, ApiError> {
        self.post_form(PROCESS_DROPPED_IMAGE_PATH, file, None).await
    }

    async fn convert_pdf_to_image(&self, file: &ImageFile) -> Result<ImageBlob, ApiError> {
        self.post_form(CONVERT_PDF_PATH, file, None).await
    }

    async fn export_database(&self, request: &ExportRequest) -> Result<Value, ApiError> {
        self.post_json(EXPORT_DATABASE_PATH, request).await
    }

    async fn current_user(&self) -> Result<SessionUser, ApiError> {
        self.get_json(CURRENT_USER_PATH).await
    }
}
