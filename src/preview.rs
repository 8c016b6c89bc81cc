//! Preview resolution: turn the current input into something a renderer can
//! display.
//!
//! ## Why a temporary file?
//!
//! A renderer (terminal image viewer, web view, desktop toolkit) can open a
//! path or a `file://` URL but not a byte buffer owned by this process. The
//! selected file's bytes are therefore written to a temporary file that lives
//! exactly as long as the [`PreviewReference`] holding it. Replacing or
//! clearing the input drops the reference and deletes the file, so repeated
//! selections never accumulate stale copies on disk.
//!
//! Remote URLs are passed through untouched; whether they actually load is
//! only known when the renderer tries, and it reports failure back through
//! [`crate::session::CaptionSession::report_preview_failure`].

use crate::error::ClientError;
use crate::input::FileInput;
use reqwest::Url;
use serde::{Serialize, Serializer};
use std::fmt;
use std::io::Write;
use std::path::Path;
use tempfile::TempPath;
use tracing::debug;

/// A displayable image source derived from the current input.
#[derive(Debug)]
pub enum PreviewReference {
    /// Transient local copy of an uploaded file.
    Local(LocalPreview),
    /// The user-entered URL, verbatim.
    Remote(String),
}

/// A temporary on-disk copy of a [`FileInput`], removed on drop.
pub struct LocalPreview {
    path: TempPath,
    url: String,
}

impl fmt::Debug for LocalPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalPreview").field("url", &self.url).finish()
    }
}

impl Drop for LocalPreview {
    fn drop(&mut self) {
        debug!("Releasing preview {}", self.url);
    }
}

impl PreviewReference {
    /// Materialise a local preview for the selected file.
    pub fn for_file(file: &FileInput) -> Result<Self, ClientError> {
        let suffix = file.extension().map(|ext| format!(".{ext}"));
        let mut builder = tempfile::Builder::new();
        builder.prefix("caption-preview-");
        if let Some(ref suffix) = suffix {
            builder.suffix(suffix);
        }

        let mut tmp = builder
            .tempfile()
            .map_err(|e| ClientError::Internal(format!("preview tempfile: {e}")))?;
        tmp.write_all(file.bytes())
            .map_err(|e| ClientError::Internal(format!("preview tempfile write: {e}")))?;
        let path = tmp.into_temp_path();

        let url = Url::from_file_path(&path)
            .map_err(|_| {
                ClientError::Internal(format!(
                    "preview path is not absolute: {}",
                    path.display()
                ))
            })?
            .to_string();

        debug!("Created preview {} for '{}'", url, file.name());
        Ok(PreviewReference::Local(LocalPreview { path, url }))
    }

    /// Use the URL itself as the preview. Empty input yields no preview.
    pub fn for_url(url: &str) -> Option<Self> {
        (!url.is_empty()).then(|| PreviewReference::Remote(url.to_string()))
    }

    /// The string a renderer should load.
    pub fn as_str(&self) -> &str {
        match self {
            PreviewReference::Local(local) => &local.url,
            PreviewReference::Remote(url) => url,
        }
    }

    /// Path of the local copy, when this preview is backed by one.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            PreviewReference::Local(local) => Some(&*local.path),
            PreviewReference::Remote(_) => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, PreviewReference::Local(_))
    }
}

impl fmt::Display for PreviewReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PreviewReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
