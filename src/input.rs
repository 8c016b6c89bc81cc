//! Input selection: the active mode and the file handle for uploads.
//!
//! A [`FileInput`] owns the image bytes outright. Reading the whole file up
//! front means the multipart body can be rebuilt for every attempt without
//! reopening the file, and a file that disappears after selection does not
//! turn into a confusing mid-request I/O failure.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Content type used when the extension is not a known image format.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Which of the two mutually exclusive input methods is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    /// Local file sent as multipart form data. (default)
    #[default]
    Upload,
    /// Remote image address sent as JSON.
    Url,
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::Upload => f.write_str("upload"),
            InputMode::Url => f.write_str("url"),
        }
    }
}

impl FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upload" | "file" => Ok(InputMode::Upload),
            "url" | "link" => Ok(InputMode::Url),
            other => Err(format!("unknown input mode '{other}' (expected upload or url)")),
        }
    }
}

/// Check if the input string looks like a remote image address.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// A user-selected local image.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct FileInput {
    name: String,
    content_type: String,
    bytes: Arc<[u8]>,
}

impl fmt::Debug for FileInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileInput")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FileInput {
    /// Wrap in-memory bytes. The content type is derived from `name`.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let content_type = guess_content_type(Path::new(&name)).to_string();
        Self {
            name,
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Read a local file into memory.
    ///
    /// The file is not decoded: any bytes are accepted, and it is up to the
    /// backend to decide whether they form an image.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let owned = || PathBuf::from(path);

        let meta = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ClientError::FileNotFound { path: owned() },
            std::io::ErrorKind::PermissionDenied => ClientError::PermissionDenied { path: owned() },
            _ => ClientError::ReadFailed {
                path: owned(),
                source: e,
            },
        })?;
        if !meta.is_file() {
            return Err(ClientError::NotAFile { path: owned() });
        }

        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => ClientError::PermissionDenied { path: owned() },
            _ => ClientError::ReadFailed {
                path: owned(),
                source: e,
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Self {
            content_type: guess_content_type(path).to_string(),
            name,
            bytes: bytes.into(),
        })
    }

    /// File name sent in the multipart part.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type sent in the multipart part.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Extension to use for a temporary copy, derived from the name or the
    /// content type.
    pub(crate) fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .or_else(|| {
                image::ImageFormat::from_mime_type(&self.content_type)
                    .and_then(|f| f.extensions_str().first())
                    .map(|e| (*e).to_string())
            })
    }
}

/// Map a file extension to an image MIME type.
fn guess_content_type(path: &Path) -> &'static str {
    image::ImageFormat::from_path(path)
        .map(|f| f.to_mime_type())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}
