//! `Backend` over `reqwest`.
//!
//! Same endpoints and error mapping as the browser client. A 401/403 comes
//! back as `ApiError::SessionExpired`; there is no login page to send the
//! user to, so the caller just reports it.

use async_trait::async_trait;
use registration::api::{
    ApiError, Backend, CONVERT_PDF_PATH, CURRENT_USER_PATH, EXPORT_DATABASE_PATH, ExportRequest, FILE_FIELD, ImageBlob,
    ImageFile, LIST_MAPS_PATH, MapEntry, MapFileKind, OVERLAY_COORDINATES_PATH, OverlayRequest, OverlayResponse,
    PROCESS_DROPPED_IMAGE_PATH, REGISTRATION_FIELD, SessionUser, TRANSFORM_AND_STORE_PATH, TRANSFORM_MAP_PATH,
    error_from_response, map_file_path,
};
use registration::registration::RegistrationData;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde_json::Value;

use crate::CliError;

const DEFAULT_BLOB_MIME: &str = "application/octet-stream";

fn network_error(path: &str, err: impl std::fmt::Display) -> ApiError {
    ApiError::Network(format!("{path}: {err}"))
}

fn decode_error(path: &str, err: impl std::fmt::Display) -> ApiError {
    ApiError::Decode { path: path.to_owned(), message: err.to_string() }
}

/// Media type from a `Content-Type` header, parameters dropped.
pub(crate) fn mime_from_header(header: Option<&str>) -> String {
    header
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .map_or_else(|| DEFAULT_BLOB_MIME.to_owned(), str::to_ascii_lowercase)
}

/// Validate and normalise the base URL: no trailing slash.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, CliError> {
    let parsed = reqwest::Url::parse(raw).map_err(|err| CliError::InvalidBaseUrl(format!("{raw}: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CliError::InvalidBaseUrl(format!("{raw}: scheme must be http or https")));
    }
    Ok(raw.trim_end_matches('/').to_owned())
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, session_cookie: Option<&str>) -> Result<Self, CliError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            headers.insert(COOKIE, HeaderValue::from_str(cookie)?);
        }
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { client, base_url: normalize_base_url(base_url)? })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|err| network_error(path, err))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let reason = status.canonical_reason().unwrap_or_default();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                eprintln!("{path}: unreadable error body: {err}");
                String::new()
            }
        };
        Err(error_from_response(path, status.as_u16(), reason, &body))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.client.get(self.url(path)).header(ACCEPT, "application/json");
        let response = self.send(path, request).await?;
        response.json::<T>().await.map_err(|err| decode_error(path, err))
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let request = self.client.post(self.url(path)).header(ACCEPT, "application/json").json(body);
        let response = self.send(path, request).await?;
        response.json::<T>().await.map_err(|err| decode_error(path, err))
    }

    async fn get_blob(&self, path: &str) -> Result<ImageBlob, ApiError> {
        let response = self.send(path, self.client.get(self.url(path))).await?;
        read_blob(path, response).await
    }

    async fn post_form(&self, path: &str, file: &ImageFile, data: Option<&RegistrationData>) -> Result<ImageBlob, ApiError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|err| network_error(path, err))?;
        let mut form = Form::new().part(FILE_FIELD, part);
        if let Some(data) = data {
            let json = serde_json::to_string(data).map_err(|err| decode_error(path, err))?;
            form = form.text(REGISTRATION_FIELD, json);
        }
        let response = self.send(path, self.client.post(self.url(path)).multipart(form)).await?;
        read_blob(path, response).await
    }
}

async fn read_blob(path: &str, response: Response) -> Result<ImageBlob, ApiError> {
    let header = match response.headers().get(CONTENT_TYPE).map(HeaderValue::to_str) {
        Some(Ok(value)) => Some(value),
        Some(Err(err)) => {
            eprintln!("{path}: unreadable content-type: {err}");
            None
        }
        None => None,
    };
    let mime = mime_from_header(header);
    let bytes = response.bytes().await.map_err(|err| decode_error(path, err))?;
    Ok(ImageBlob::new(mime, bytes.to_vec()))
}

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
