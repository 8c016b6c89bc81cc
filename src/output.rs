//! Read-only views of session state for rendering surfaces.

use crate::error::CaptionError;
use crate::input::InputMode;
use serde::{Deserialize, Serialize};

/// Whether a caption request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
}

/// Snapshot of a [`crate::session::CaptionSession`].
///
/// Owns its data so it can outlive the session borrow, be sent to another
/// task, or be serialised as the CLI's `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub mode: InputMode,
    /// Name of the selected file, if any.
    pub file_name: Option<String>,
    /// Current URL input; may be empty.
    pub url: String,
    /// String a renderer should load, if any.
    pub preview: Option<String>,
    pub request_state: RequestState,
    pub caption: Option<String>,
    /// Human-readable error message.
    pub error: Option<String>,
    /// Structured form of `error`.
    pub error_detail: Option<CaptionError>,
}

impl SessionView {
    /// `true` when the last attempt produced a caption.
    pub fn succeeded(&self) -> bool {
        self.caption.is_some() && self.error.is_none()
    }
}
