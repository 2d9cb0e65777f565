//! Errors surfaced by registration actions.
//!
//! Every variant renders as the status text shown to the user.

use crate::api::ApiError;

/// Failure of a registration action. Input errors are raised before any
/// request is issued; backend errors wrap an [`ApiError`].
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The overlay image has no known natural size yet.
    #[error("overlay image is not loaded yet")]
    OverlayNotLoaded,
    /// At least one terrain or image slot is still unset.
    #[error("place all {pairs} terrain and image points first")]
    IncompletePoints { pairs: usize },
    /// No map image has been dropped.
    #[error("drop a map image first")]
    MissingImage,
    /// Save was requested before a registration was computed.
    #[error("missing registration: compute the registration before saving")]
    MissingRegistration,
    /// The dropped file is neither an image nor a PDF.
    #[error("Please drop an image or PDF file.")]
    UnsupportedFile { mime: String },
    /// The selected saved map has no name to fetch its files by.
    #[error("Selected map is missing a name and cannot be loaded.")]
    MissingMapName,
    /// The backend answered with a shape we cannot use.
    #[error("invalid registration response: {0}")]
    InvalidResponse(String),
    /// Transport, status, or session failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl RegistrationError {
    /// Whether the page should leave for the login screen.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Api(ApiError::SessionExpired))
    }
}
