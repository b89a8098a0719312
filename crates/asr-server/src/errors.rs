//! HTTP error mapping for the `/asr` endpoint.

use asr_transcription::TranscriptionError;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

/// Detail used when the request carries no usable `file` part.
pub const NO_FILE_DETAIL: &str = "No file uploaded.";

/// Every failure the endpoint can report.
///
/// Each variant fixes its own status code and `detail` text.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed request (400). The message is the detail verbatim.
    #[error("{0}")]
    Validation(String),
    /// Audio could not be decoded (400).
    #[error("Could not decode audio: {0}")]
    Decode(String),
    /// The upload exceeded the configured body limit (413).
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),
    /// The model failed (500).
    #[error("An unexpected error occurred: {0}")]
    Inference(String),
    /// Anything else (500).
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// The request had no `file` part.
    pub fn no_file() -> Self {
        Self::Validation(NO_FILE_DETAIL.to_string())
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Inference(_) | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The `detail` string sent to the client.
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

impl From<TranscriptionError> for ApiError {
    fn from(err: TranscriptionError) -> Self {
        match err {
            TranscriptionError::AudioDecode(msg) => Self::Decode(msg),
            TranscriptionError::Inference(msg) => Self::Inference(msg),
            other @ (TranscriptionError::ModelNotAvailable(_)
            | TranscriptionError::Resample(_)
            | TranscriptionError::Io(_)) => Self::Unexpected(other.to_string()),
        }
    }
}

/// A multipart body that was present but could not be read. Only the size
/// limit gets its own status; truncated or garbled streams are unexpected.
impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::Unexpected(err.body_text())
        }
    }
}

/// Wire body for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            error!(status = status.as_u16(), %detail, "request failed");
        } else {
            warn!(status = status.as_u16(), %detail, "request rejected");
        }
        (status, Json(ErrorBody { detail })).into_response()
    }
}
