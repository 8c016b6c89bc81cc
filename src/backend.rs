//! Transport to the captioning backend.
//!
//! [`CaptionBackend`] is the seam between the session state machine and the
//! network. [`HttpBackend`] is the real implementation; tests and embedders
//! can supply their own through
//! [`crate::config::ClientConfigBuilder::backend`].
//!
//! A backend only moves bytes. It reports the status code and raw body and
//! leaves every decision about what they mean to [`crate::dispatch`].

use crate::config::ClientConfig;
use crate::dispatch::{LinkRequest, UPLOAD_FIELD};
use crate::error::ClientError;
use crate::input::FileInput;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Status and body of a backend reply, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl BackendResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// No response was obtained: connect failure, timeout, broken body.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub timed_out: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest's own Display omits the cause ("error sending request for
        // url (...)"), so append the whole source chain.
        let mut message = e.to_string();
        let mut source = e.source();
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        Self {
            message,
            timed_out: e.is_timeout(),
        }
    }
}

/// Sends caption requests to a backend.
#[async_trait]
pub trait CaptionBackend: Send + Sync {
    /// `POST /caption/upload` with the file as a multipart part.
    async fn caption_upload(&self, file: &FileInput) -> Result<BackendResponse, TransportError>;

    /// `POST /caption/link` with `{"image_link": link}`.
    async fn caption_link(&self, link: &str) -> Result<BackendResponse, TransportError>;
}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type Backend = Arc<dyn CaptionBackend>;

/// [`CaptionBackend`] over HTTP using reqwest.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    upload_url: String,
    link_url: String,
}

impl HttpBackend {
    /// Build a client for the configured base address and timeouts.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            upload_url: config.upload_endpoint(),
            link_url: config.link_endpoint(),
        })
    }

    async fn read(response: reqwest::Response) -> Result<BackendResponse, TransportError> {
        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            // The status alone decides the outcome of a failed request.
            Err(e) if !status.is_success() => {
                warn!("Discarding unreadable body of HTTP {}: {}", status, e);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        debug!("Backend replied HTTP {} ({} bytes)", status, body.len());
        Ok(BackendResponse::new(status.as_u16(), body))
    }
}

#[async_trait]
impl CaptionBackend for HttpBackend {
    async fn caption_upload(&self, file: &FileInput) -> Result<BackendResponse, TransportError> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.content_type())?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        debug!("POST {} ({} bytes)", self.upload_url, file.len());
        let response = self.client.post(&self.upload_url).multipart(form).send().await?;
        Self::read(response).await
    }

    async fn caption_link(&self, link: &str) -> Result<BackendResponse, TransportError> {
        debug!("POST {} image_link={}", self.link_url, link);
        let response = self
            .client
            .post(&self.link_url)
            .json(&LinkRequest { image_link: link })
            .send()
            .await?;
        Self::read(response).await
    }
}
