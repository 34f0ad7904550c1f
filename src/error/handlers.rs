//! Error handlers
//!
//! Maps domain errors to HTTP status codes and user-visible messages.
//! Messages never contain filesystem paths.

use axum::http::StatusCode;
use log::{error, warn};

use crate::error::types::UploadError;

/// Log an upload failure server-side with full detail
pub fn handle_upload_error(err: &UploadError, target: &str) {
    match err {
        UploadError::IoError(e) => error!("Failed to save upload into /{}: {}", target, e),
        other => warn!("Upload into /{} rejected: {}", target, other),
    }
}

/// Convert an upload error to an HTTP status code
pub fn upload_error_to_status(err: &UploadError) -> StatusCode {
    match err {
        UploadError::InvalidName => StatusCode::BAD_REQUEST,
        UploadError::HiddenName(_) => StatusCode::BAD_REQUEST,
        UploadError::AlreadyExists(_) => StatusCode::CONFLICT,
        UploadError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        UploadError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert an upload error to the message shown to the user
pub fn upload_error_message(err: &UploadError) -> String {
    match err {
        UploadError::InvalidName => "Invalid filename.".to_string(),
        UploadError::HiddenName(_) => "Uploading hidden (dot) files is not allowed.".to_string(),
        UploadError::AlreadyExists(name) => {
            format!("File \"{}\" already exists. Rename it first.", name)
        }
        UploadError::TooLarge(limit) => format!("File is too large (max {}).", format_size(*limit)),
        UploadError::IoError(_) => "Error saving file. Please try again.".to_string(),
    }
}

/// Human-readable size, whole MB or KB where exact, bytes otherwise
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{} KB", bytes / KB)
    } else {
        format!("{} bytes", bytes)
    }
}
