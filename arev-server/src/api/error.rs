//! HTTP error mapping
//!
//! Every failure leaves the service as `{"error": "<message>"}` with a status
//! matching its cause.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::ingest::IngestError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Multipart body could not be read
    #[error("Failed to parse multipart form: {0}")]
    Multipart(#[from] MultipartError),

    /// Ingest pipeline failure
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// IO error while spooling uploads
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// arev-common error (comment store)
    #[error(transparent)]
    Common(#[from] arev_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Multipart(err) => (
                err.status(),
                format!("Failed to parse multipart form: {}", err.body_text()),
            ),
            ApiError::Ingest(IngestError::MissingInput(detail)) => {
                warn!("Rejecting upload, missing files: {}", detail);
                (StatusCode::BAD_REQUEST, "Missing files".to_string())
            }
            ApiError::Ingest(err @ IngestError::UnreadableFile { .. }) => {
                error!("{}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Io(err) => {
                error!("Upload spooling failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("IO error: {}", err))
            }
            ApiError::Common(arev_common::Error::NotFound(what)) => {
                (StatusCode::NOT_FOUND, format!("Not found: {}", what))
            }
            ApiError::Common(arev_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, format!("Invalid input: {}", msg))
            }
            ApiError::Common(err) => {
                error!("Comment store error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
