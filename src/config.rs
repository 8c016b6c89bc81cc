//! Configuration types for the caption client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via
//! its [`ClientConfigBuilder`]. The backend address is resolved once at
//! startup and never changes for the lifetime of a session.

use crate::backend::Backend;
use crate::error::ClientError;
use crate::observer::Observer;
use reqwest::Url;
use std::fmt;

/// Backend address used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for a [`crate::session::CaptionSession`].
///
/// # Example
/// ```rust
/// use image_caption::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://captioner.internal:8000/")
///     .request_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "http://captioner.internal:8000");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Base address of the captioning backend, without a trailing slash.
    /// Default: `http://localhost:8000`.
    pub base_url: String,

    /// Whole-request timeout in seconds. Default: `None` (wait indefinitely).
    ///
    /// Captioning a large image on a CPU-only backend can take a long time,
    /// so no limit is applied unless the caller asks for one.
    pub request_timeout_secs: Option<u64>,

    /// TCP connect timeout in seconds. Default: `None`.
    pub connect_timeout_secs: Option<u64>,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Optional observer notified of request lifecycle events.
    pub observer: Option<Observer>,

    /// Pre-constructed backend. When `None` the session builds an
    /// [`crate::backend::HttpBackend`] from this config.
    pub backend: Option<Backend>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            connect_timeout_secs: None,
            user_agent: concat!("image-caption/", env!("CARGO_PKG_VERSION")).to_string(),
            observer: None,
            backend: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn SessionObserver>"))
            .field("backend", &self.backend.as_ref().map(|_| "<dyn CaptionBackend>"))
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the multipart upload route.
    pub fn upload_endpoint(&self) -> String {
        format!("{}/caption/upload", self.base_url)
    }

    /// Full URL of the JSON link route.
    pub fn link_endpoint(&self) -> String {
        format!("{}/caption/link", self.base_url)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.config.observer = Some(observer);
        self
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = Some(backend);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ClientConfig, ClientError> {
        self.config.base_url = normalise_base_url(&self.config.base_url)?;

        if self.config.request_timeout_secs == Some(0) {
            return Err(ClientError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        if self.config.connect_timeout_secs == Some(0) {
            return Err(ClientError::InvalidConfig(
                "Connect timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Validate the backend address and strip trailing slashes so route paths
/// can be appended directly.
fn normalise_base_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidConfig("Base URL must not be empty".into()));
    }

    let parsed = Url::parse(trimmed).map_err(|e| {
        ClientError::InvalidConfig(format!("Base URL '{trimmed}' is not a valid URL: {e}"))
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ClientError::InvalidConfig(format!(
                "Base URL must use http or https, got '{other}'"
            )))
        }
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ClientError::InvalidConfig(format!(
            "Base URL '{trimmed}' must not carry a query or fragment"
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}
