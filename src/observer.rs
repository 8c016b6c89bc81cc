//! Observer trait for caption request lifecycle events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::config::ClientConfigBuilder::observer`] to be told when a request
//! goes out and how it ended. The session itself is borrowed mutably for the
//! whole request, so this is the only way a rendering surface can react to
//! the LOADING phase (spinners, disabled buttons, status lines).
//!
//! # Example
//!
//! ```rust
//! use image_caption::{ClientConfig, InputMode, SessionObserver};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     started: AtomicUsize,
//! }
//!
//! impl SessionObserver for CountingObserver {
//!     fn on_request_start(&self, mode: InputMode) {
//!         self.started.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("sending {mode} request");
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { started: AtomicUsize::new(0) });
//!
//! let config = ClientConfig::builder()
//!     .observer(observer as Arc<dyn SessionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::CaptionError;
use crate::input::InputMode;
use std::sync::Arc;

/// Called by [`crate::session::CaptionSession`] around each caption attempt.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait SessionObserver: Send + Sync {
    /// Called after preconditions pass, just before the HTTP request is sent.
    fn on_request_start(&self, mode: InputMode) {
        let _ = mode;
    }

    /// Called when the backend returned a caption.
    fn on_caption(&self, caption: &str) {
        let _ = caption;
    }

    /// Called for every failed attempt, including precondition failures
    /// that never reached the network.
    fn on_error(&self, error: &CaptionError) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type Observer = Arc<dyn SessionObserver>;
