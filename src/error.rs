//! Error types for the image-caption library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ClientError`]: **Fatal**: the client cannot be set up or an input
//!   cannot be loaded at all (bad base URL, unreadable file, HTTP client
//!   construction failure). Returned as `Err(ClientError)`.
//!
//! * [`CaptionError`]: **Non-fatal**: a single caption attempt failed
//!   (missing input, HTTP error, backend-reported error). Recorded inside
//!   [`crate::session::CaptionSession`] as the current error message; the
//!   user may fix the input and try again immediately.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Prefix shared by every [`CaptionError::Unknown`] message.
pub const UNKNOWN_PREFIX: &str = "Failed to generate caption";

/// All fatal errors returned by the image-caption library.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Image file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading the file failed for another I/O reason.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path points at a directory or other non-regular file.
    #[error("'{path}' is not a regular file")]
    NotAFile { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// reqwest refused to build a client from the configuration.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single caption attempt.
///
/// The `Display` output is exactly the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptionError {
    /// Neither a file nor a URL has been provided.
    #[error("Please select a file or enter an image URL")]
    MissingInput,

    /// Nothing could be sent for the active mode, so no response exists.
    #[error("No response from server.")]
    NoResponse,

    /// The backend answered with a non-success status code.
    #[error("HTTP error! status: {status}")]
    HttpError { status: u16 },

    /// The backend answered 2xx with an `error` field.
    #[error("{message}")]
    BackendError { message: String },

    /// Transport, timeout or decoding failure.
    #[error("{}: {}", UNKNOWN_PREFIX, unknown_detail(.message))]
    Unknown { message: Option<String> },

    /// The rendering layer could not display the preview.
    #[error("Failed to load image")]
    PreviewLoadFailed,
}

fn unknown_detail(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or("An unknown error occurred.")
}

impl CaptionError {
    /// Wrap any displayable failure as [`CaptionError::Unknown`].
    ///
    /// Empty messages collapse to the generic wording.
    pub fn unknown(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        CaptionError::Unknown {
            message: (!message.trim().is_empty()).then_some(message),
        }
    }

    /// Short machine-readable name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptionError::MissingInput => "missing_input",
            CaptionError::NoResponse => "no_response",
            CaptionError::HttpError { .. } => "http_error",
            CaptionError::BackendError { .. } => "backend_error",
            CaptionError::Unknown { .. } => "unknown",
            CaptionError::PreviewLoadFailed => "preview_load_failed",
        }
    }
}
