//! # image-caption
//!
//! Client for an image-captioning backend: submit a local image file or a
//! remote image URL and get back a one-line natural-language caption.
//!
//! ## Flow Overview
//!
//! ```text
//! user action
//!  │
//!  ├─ 1. Input     pick a mode (upload / url), choose a file or type a URL
//!  ├─ 2. Preview   local temp copy (file://) or the URL itself
//!  ├─ 3. Dispatch  POST /caption/upload (multipart) or /caption/link (JSON)
//!  └─ 4. Result    caption or one human-readable error, state back to Idle
//! ```
//!
//! All of this state lives in one [`CaptionSession`]. It is mutated only
//! through its methods, and read through accessors or a [`SessionView`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use image_caption::{CaptionSession, ClientConfig, FileInput, InputMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://localhost:8000")
//!         .build()?;
//!     let mut session = CaptionSession::new(config)?;
//!
//!     session.select_mode(InputMode::Upload);
//!     session.set_file(Some(FileInput::open("cat.jpg").await?))?;
//!
//!     match session.generate_caption().await {
//!         Ok(caption) => println!("{caption}"),
//!         Err(e) => eprintln!("{e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `caption` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod observer;
pub mod output;
pub mod preview;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{BackendResponse, CaptionBackend, HttpBackend, TransportError};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL};
pub use dispatch::{CaptionRequest, UPLOAD_FIELD};
pub use error::{CaptionError, ClientError};
pub use input::{is_url, FileInput, InputMode};
pub use observer::{NoopObserver, Observer, SessionObserver};
pub use output::{RequestState, SessionView};
pub use preview::PreviewReference;
pub use session::CaptionSession;
