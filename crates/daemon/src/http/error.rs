//! Mapping of domain errors onto HTTP responses.
//!
//! Every error leaves the server as `{ "error": "<message>" }`. Internal
//! details are logged and replaced by a generic message.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use protocol::ErrorBody;
use tracing::{error, warn};

use crate::files::{FileError, UploadError};

/// An error ready to be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Log `detail` and hide it behind a generic 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!("Internal server error: {}", detail);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    /// Map a file error raised while handling `subpath` of share `id`.
    ///
    /// Denied attempts are logged with the raw client subpath for auditing.
    pub fn for_share(err: FileError, id: &str, subpath: &str) -> Self {
        if matches!(err, FileError::Denied) {
            warn!(share = %id, subpath = %subpath, "Path traversal attempt denied");
        }
        err.into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.message))).into_response()
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::InvalidPath(_) => ApiError::bad_request("Invalid path"),
            FileError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "Not found"),
            FileError::IsADirectory => ApiError::new(StatusCode::NOT_FOUND, "File not found"),
            FileError::NotADirectory => ApiError::bad_request("Not a directory"),
            FileError::Denied => ApiError::new(StatusCode::FORBIDDEN, "Access denied"),
            FileError::Internal(_) | FileError::LockPoisoned { .. } => ApiError::internal(err),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Disabled => ApiError::new(StatusCode::FORBIDDEN, "Uploads are disabled"),
            UploadError::InvalidName(_) => ApiError::bad_request("Invalid file name"),
            UploadError::FileTooLarge { limit, .. } => ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("File too large (limit {} bytes)", limit),
            ),
            UploadError::NameExhausted(_) => {
                ApiError::new(StatusCode::CONFLICT, "Too many files with that name")
            }
            UploadError::Io(_) => ApiError::internal(err),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        // Body limit violations surface here as well.
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::new(status, "File too large");
        }
        ApiError::new(status, err.body_text())
    }
}
