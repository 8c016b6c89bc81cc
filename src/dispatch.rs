//! Request construction and response interpretation.
//!
//! ```text
//! mode + inputs ──▶ CaptionRequest ──▶ CaptionBackend ──▶ interpret ──▶ caption | CaptionError
//! ```
//!
//! Everything here is free of session state so each step can be tested on
//! its own. [`crate::session::CaptionSession`] owns the state transitions.

use crate::backend::{BackendResponse, CaptionBackend};
use crate::error::CaptionError;
use crate::input::{FileInput, InputMode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Multipart field name the upload route expects.
pub const UPLOAD_FIELD: &str = "uploaded_file";

/// JSON body of the link route.
#[derive(Debug, Serialize)]
pub struct LinkRequest<'a> {
    pub image_link: &'a str,
}

/// Exactly one request, ready to send.
#[derive(Debug, Clone)]
pub enum CaptionRequest {
    Upload(FileInput),
    Link(String),
}

impl CaptionRequest {
    /// Pick the request for the active mode.
    ///
    /// * no file and no URL at all → [`CaptionError::MissingInput`]
    /// * the active mode has nothing to send (e.g. upload mode with only a
    ///   URL typed in) → [`CaptionError::NoResponse`]
    pub fn for_mode(
        mode: InputMode,
        file: Option<&FileInput>,
        url: &str,
    ) -> Result<Self, CaptionError> {
        if file.is_none() && url.is_empty() {
            return Err(CaptionError::MissingInput);
        }
        match (mode, file) {
            (InputMode::Upload, Some(file)) => Ok(CaptionRequest::Upload(file.clone())),
            (InputMode::Url, _) if !url.is_empty() => Ok(CaptionRequest::Link(url.to_string())),
            _ => Err(CaptionError::NoResponse),
        }
    }

    pub fn mode(&self) -> InputMode {
        match self {
            CaptionRequest::Upload(_) => InputMode::Upload,
            CaptionRequest::Link(_) => InputMode::Url,
        }
    }
}

/// Send one request and turn whatever comes back into a caption or an error.
pub async fn send(
    backend: &dyn CaptionBackend,
    request: &CaptionRequest,
) -> Result<String, CaptionError> {
    let response = match request {
        CaptionRequest::Upload(file) => backend.caption_upload(file).await,
        CaptionRequest::Link(link) => backend.caption_link(link).await,
    };

    match response {
        Ok(response) => interpret(&response),
        Err(e) => {
            if e.timed_out {
                warn!("Caption request timed out: {}", e);
            } else {
                warn!("Caption request failed before a response: {}", e);
            }
            Err(CaptionError::unknown(e))
        }
    }
}

/// Map a backend reply to a caption.
///
/// A non-2xx status wins over whatever the body says. A 2xx body is JSON
/// carrying either `error` or `caption`; a truthy `error` takes precedence.
pub fn interpret(response: &BackendResponse) -> Result<String, CaptionError> {
    if !response.is_success() {
        return Err(CaptionError::HttpError {
            status: response.status,
        });
    }

    let data: Value = serde_json::from_slice(&response.body).map_err(CaptionError::unknown)?;

    if let Some(message) = data.get("error").and_then(truthy_text) {
        debug!("Backend reported error: {}", message);
        return Err(CaptionError::BackendError { message });
    }

    match data.get("caption") {
        Some(Value::String(caption)) => Ok(caption.clone()),
        Some(Value::Null) | None => Err(CaptionError::unknown(
            "response contained neither a caption nor an error",
        )),
        Some(other) => Ok(other.to_string()),
    }
}

/// Text of a JSON value that counts as "set": not null, false, 0 or "".
fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
