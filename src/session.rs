//! The caption session: input selection, preview, request dispatch and
//! result state in one owned container.
//!
//! ## State machine
//!
//! ```text
//!             generate_caption()          response / failure
//!   ┌──────┐  (input present)   ┌─────────┐  (or future dropped)  ┌──────┐
//!   │ Idle │ ─────────────────▶ │ Loading │ ────────────────────▶ │ Idle │
//!   └──────┘                    └─────────┘                       └──────┘
//! ```
//!
//! Every mutation goes through a `&mut self` method, so at most one request
//! can be in flight per session and there is nothing to lock. Rendering
//! surfaces read the accessors (or a [`SessionView`]) between events, and
//! learn about the loading phase through [`crate::observer::SessionObserver`].

use crate::backend::{Backend, HttpBackend};
use crate::config::ClientConfig;
use crate::dispatch::{self, CaptionRequest};
use crate::error::{CaptionError, ClientError};
use crate::input::{FileInput, InputMode};
use crate::observer::{NoopObserver, Observer};
use crate::output::{RequestState, SessionView};
use crate::preview::PreviewReference;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Owns all user-visible state of one captioning session.
pub struct CaptionSession {
    config: ClientConfig,
    backend: Backend,
    observer: Observer,
    mode: InputMode,
    file: Option<FileInput>,
    url: String,
    preview: Option<PreviewReference>,
    request_state: RequestState,
    caption: Option<String>,
    error: Option<CaptionError>,
}

impl std::fmt::Debug for CaptionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionSession")
            .field("config", &self.config)
            .field("mode", &self.mode)
            .field("file", &self.file)
            .field("url", &self.url)
            .field("preview", &self.preview)
            .field("request_state", &self.request_state)
            .field("caption", &self.caption)
            .field("error", &self.error)
            .finish()
    }
}

/// Holds `Loading` for as long as it lives.
///
/// Dropping the `generate_caption` future mid-request drops this guard too,
/// so an abandoned request can never leave the session stuck in `Loading`.
struct LoadingGuard<'a> {
    state: &'a mut RequestState,
}

impl<'a> LoadingGuard<'a> {
    fn enter(state: &'a mut RequestState) -> Self {
        *state = RequestState::Loading;
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.state = RequestState::Idle;
    }
}

impl CaptionSession {
    /// Create a session, using `config.backend` if set or an
    /// [`HttpBackend`] for `config.base_url` otherwise.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let backend = match config.backend {
            Some(ref backend) => Arc::clone(backend),
            None => Arc::new(HttpBackend::new(&config)?),
        };
        let observer = config
            .observer
            .clone()
            .unwrap_or_else(|| Arc::new(NoopObserver));

        info!("Caption backend: {}", config.base_url);
        Ok(Self {
            config,
            backend,
            observer,
            mode: InputMode::default(),
            file: None,
            url: String::new(),
            preview: None,
            request_state: RequestState::Idle,
            caption: None,
            error: None,
        })
    }

    // ── Input selection ──────────────────────────────────────────────────

    /// Switch the active input mode.
    ///
    /// Both inputs are kept so switching back restores them; the preview is
    /// left alone.
    pub fn select_mode(&mut self, mode: InputMode) {
        if self.mode != mode {
            debug!("Input mode {} → {}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Select a file. `None` (the picker was dismissed) changes nothing.
    ///
    /// On success the previous preview is released, a new one is created and
    /// any caption or error is cleared. If the preview cannot be created the
    /// session is left exactly as it was.
    pub fn set_file(&mut self, file: Option<FileInput>) -> Result<(), ClientError> {
        let Some(file) = file else {
            return Ok(());
        };
        let preview = PreviewReference::for_file(&file)?;
        debug!("Selected file '{}' ({} bytes)", file.name(), file.len());

        self.file = Some(file);
        self.preview = Some(preview);
        self.clear_result();
        Ok(())
    }

    /// Store the URL input verbatim.
    ///
    /// A non-empty URL becomes the preview and clears any caption or error.
    /// An empty URL only updates the input.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        if let Some(preview) = PreviewReference::for_url(&self.url) {
            debug!("URL input set: {}", self.url);
            self.preview = Some(preview);
            self.clear_result();
        }
    }

    /// Reset both inputs, the preview, the caption and the error.
    pub fn clear_all(&mut self) {
        debug!("Clearing all inputs");
        self.file = None;
        self.url.clear();
        self.preview = None;
        self.clear_result();
    }

    /// Record that the renderer could not display the current preview.
    pub fn report_preview_failure(&mut self) {
        warn!(
            "Preview failed to load: {}",
            self.preview.as_ref().map(|p| p.as_str()).unwrap_or("<none>")
        );
        self.error = Some(CaptionError::PreviewLoadFailed);
    }

    // ── Request dispatch ─────────────────────────────────────────────────

    /// Send the current input to the backend and record the outcome.
    ///
    /// Exactly one of caption / error is set when this returns, and the
    /// request state is back to `Idle`. The returned value mirrors what was
    /// recorded so callers don't have to read it back.
    pub async fn generate_caption(&mut self) -> Result<String, CaptionError> {
        let request = match CaptionRequest::for_mode(self.mode, self.file.as_ref(), &self.url) {
            Ok(request) => request,
            Err(e) => return self.fail(e),
        };

        self.clear_result();
        self.observer.on_request_start(request.mode());
        info!("Requesting caption ({} mode)", request.mode());
        let start = Instant::now();

        let outcome = {
            let _loading = LoadingGuard::enter(&mut self.request_state);
            dispatch::send(self.backend.as_ref(), &request).await
        };

        match outcome {
            Ok(caption) => {
                info!(
                    "Caption received in {}ms: {:?}",
                    start.elapsed().as_millis(),
                    caption
                );
                self.observer.on_caption(&caption);
                self.caption = Some(caption.clone());
                Ok(caption)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Whether `generate_caption` would currently send anything.
    ///
    /// Mirrors the enabled state of a "Generate" button.
    pub fn can_generate(&self) -> bool {
        self.request_state == RequestState::Idle && (self.file.is_some() || !self.url.is_empty())
    }

    fn fail(&mut self, error: CaptionError) -> Result<String, CaptionError> {
        warn!("Caption attempt failed ({}): {}", error.kind(), error);
        self.observer.on_error(&error);
        self.caption = None;
        self.error = Some(error.clone());
        Err(error)
    }

    fn clear_result(&mut self) {
        self.caption = None;
        self.error = None;
    }

    // ── Result state ─────────────────────────────────────────────────────

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn file(&self) -> Option<&FileInput> {
        self.file.as_ref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn preview(&self) -> Option<&PreviewReference> {
        self.preview.as_ref()
    }

    pub fn request_state(&self) -> RequestState {
        self.request_state
    }

    pub fn is_loading(&self) -> bool {
        self.request_state == RequestState::Loading
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn error(&self) -> Option<&CaptionError> {
        self.error.as_ref()
    }

    /// The error as shown to the user.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    /// Owned snapshot of everything a renderer needs.
    pub fn view(&self) -> SessionView {
        SessionView {
            mode: self.mode,
            file_name: self.file.as_ref().map(|f| f.name().to_string()),
            url: self.url.clone(),
            preview: self.preview.as_ref().map(|p| p.as_str().to_string()),
            request_state: self.request_state,
            caption: self.caption.clone(),
            error: self.error_message(),
            error_detail: self.error.clone(),
        }
    }
}
