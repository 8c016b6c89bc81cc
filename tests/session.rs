//! Session behaviour against an in-process backend.
//!
//! No network: [`FakeBackend`] records every call and answers with a canned
//! reply, so these tests pin down the state machine itself.

use async_trait::async_trait;
use image_caption::{
    BackendResponse, CaptionBackend, CaptionError, CaptionSession, ClientConfig, FileInput,
    InputMode, RequestState, SessionObserver, TransportError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Upload { name: String, bytes: Vec<u8> },
    Link(String),
}

enum Reply {
    Respond(BackendResponse),
    Fail(TransportError),
    Hang,
}

struct FakeBackend {
    reply: Reply,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    fn replying(status: u16, body: &str) -> Arc<Self> {
        Self::with(Reply::Respond(BackendResponse::new(status, body)))
    }

    fn failing(message: &str) -> Arc<Self> {
        Self::with(Reply::Fail(TransportError::new(message)))
    }

    fn hanging() -> Arc<Self> {
        Self::with(Reply::Hang)
    }

    fn with(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, call: Call) -> Result<BackendResponse, TransportError> {
        self.calls.lock().unwrap().push(call);
        match &self.reply {
            Reply::Respond(r) => Ok(r.clone()),
            Reply::Fail(e) => Err(e.clone()),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl CaptionBackend for FakeBackend {
    async fn caption_upload(&self, file: &FileInput) -> Result<BackendResponse, TransportError> {
        self.answer(Call::Upload {
            name: file.name().to_string(),
            bytes: file.bytes().to_vec(),
        })
        .await
    }

    async fn caption_link(&self, link: &str) -> Result<BackendResponse, TransportError> {
        self.answer(Call::Link(link.to_string())).await
    }
}

fn session_with(backend: Arc<FakeBackend>) -> CaptionSession {
    let config = ClientConfig::builder()
        .backend(backend)
        .build()
        .expect("valid config");
    CaptionSession::new(config).expect("session")
}

fn cat_jpg() -> FileInput {
    FileInput::from_bytes("cat.jpg", b"\xFF\xD8\xFF\xE0 fake jpeg".to_vec())
}

/// Exactly one of caption / error holds and the session is idle.
fn assert_settled(session: &CaptionSession) {
    assert_eq!(session.request_state(), RequestState::Idle);
    assert!(
        session.caption().is_some() ^ session.error().is_some(),
        "caption={:?} error={:?}",
        session.caption(),
        session.error()
    );
}

// ── Happy paths ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_returns_caption() {
    let backend = FakeBackend::replying(200, r#"{"caption":"a cat sitting on a chair"}"#);
    let mut session = session_with(backend.clone());

    session.select_mode(InputMode::Upload);
    session.set_file(Some(cat_jpg())).unwrap();
    let caption = session.generate_caption().await.unwrap();

    assert_eq!(caption, "a cat sitting on a chair");
    assert_eq!(session.caption(), Some("a cat sitting on a chair"));
    assert!(session.error().is_none());
    assert_settled(&session);
    assert_eq!(
        backend.calls(),
        vec![Call::Upload {
            name: "cat.jpg".into(),
            bytes: b"\xFF\xD8\xFF\xE0 fake jpeg".to_vec(),
        }]
    );
}

#[tokio::test]
async fn url_mode_sends_link() {
    let backend = FakeBackend::replying(200, r#"{"caption":"a red bicycle"}"#);
    let mut session = session_with(backend.clone());

    session.select_mode(InputMode::Url);
    session.set_url("https://x/y.jpg");
    session.generate_caption().await.unwrap();

    assert_eq!(session.caption(), Some("a red bicycle"));
    assert_eq!(backend.calls(), vec![Call::Link("https://x/y.jpg".into())]);
}

#[tokio::test]
async fn active_mode_picks_the_route_when_both_inputs_exist() {
    let backend = FakeBackend::replying(200, r#"{"caption":"ok"}"#);
    let mut session = session_with(backend.clone());

    session.set_file(Some(cat_jpg())).unwrap();
    session.set_url("https://x/y.jpg");

    session.select_mode(InputMode::Url);
    session.generate_caption().await.unwrap();
    session.select_mode(InputMode::Upload);
    session.generate_caption().await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], Call::Link("https://x/y.jpg".into()));
    assert!(matches!(calls[1], Call::Upload { ref name, .. } if name == "cat.jpg"));
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_input_makes_no_call() {
    let backend = FakeBackend::replying(200, r#"{"caption":"never"}"#);
    let mut session = session_with(backend.clone());

    let err = session.generate_caption().await.unwrap_err();

    assert_eq!(err, CaptionError::MissingInput);
    assert_eq!(
        session.error_message().as_deref(),
        Some("Please select a file or enter an image URL")
    );
    assert!(backend.calls().is_empty());
    assert_settled(&session);
}

#[tokio::test]
async fn clear_all_then_generate_is_missing_input() {
    let backend = FakeBackend::replying(200, r#"{"caption":"a cat"}"#);
    let mut session = session_with(backend.clone());

    session.set_file(Some(cat_jpg())).unwrap();
    session.set_url("https://x/y.jpg");
    session.generate_caption().await.unwrap();

    session.clear_all();
    assert!(session.caption().is_none());
    assert!(session.preview().is_none());

    let err = session.generate_caption().await.unwrap_err();
    assert_eq!(err, CaptionError::MissingInput);
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn input_for_other_mode_only_is_no_response() {
    let backend = FakeBackend::replying(200, r#"{"caption":"never"}"#);
    let mut session = session_with(backend.clone());

    session.set_url("https://x/y.jpg");
    session.select_mode(InputMode::Upload);
    let err = session.generate_caption().await.unwrap_err();

    assert_eq!(err, CaptionError::NoResponse);
    assert_eq!(session.error_message().as_deref(), Some("No response from server."));
    assert!(backend.calls().is_empty());
    assert_settled(&session);
}

#[tokio::test]
async fn http_500_sets_status_message() {
    let mut session = session_with(FakeBackend::replying(500, "Internal Server Error"));

    session.select_mode(InputMode::Url);
    session.set_url("https://x/y.jpg");
    session.generate_caption().await.unwrap_err();

    assert_eq!(session.error_message().as_deref(), Some("HTTP error! status: 500"));
    assert!(session.caption().is_none());
    assert_settled(&session);
}

#[tokio::test]
async fn backend_error_is_shown_verbatim() {
    let mut session = session_with(FakeBackend::replying(200, r#"{"error":"unsupported format"}"#));

    session.select_mode(InputMode::Url);
    session.set_url("https://x/y.jpg");
    session.generate_caption().await.unwrap_err();

    assert_eq!(session.error_message().as_deref(), Some("unsupported format"));
    assert_settled(&session);
}

#[tokio::test]
async fn transport_failure_is_wrapped() {
    let mut session = session_with(FakeBackend::failing("connection refused"));

    session.set_file(Some(cat_jpg())).unwrap();
    session.generate_caption().await.unwrap_err();

    let msg = session.error_message().unwrap();
    assert!(msg.starts_with("Failed to generate caption:"), "got: {msg}");
    assert!(msg.contains("connection refused"), "got: {msg}");
    assert_settled(&session);
}

#[tokio::test]
async fn success_after_failure_clears_error() {
    let mut session = session_with(FakeBackend::replying(200, r#"{"caption":"a boat"}"#));
    session.select_mode(InputMode::Url);
    session.generate_caption().await.unwrap_err();
    assert_eq!(session.error(), Some(&CaptionError::MissingInput));

    session.set_url("https://x/boat.jpg");
    assert!(session.error().is_none(), "setting input clears the error");
    session.generate_caption().await.unwrap();
    assert_eq!(session.caption(), Some("a boat"));
    assert!(session.error().is_none());
}

#[tokio::test]
async fn emptied_url_then_generate_clears_stale_caption() {
    let mut session = session_with(FakeBackend::replying(200, r#"{"caption":"a kite"}"#));
    session.select_mode(InputMode::Url);
    session.set_url("https://x/kite.jpg");
    session.generate_caption().await.unwrap();

    session.set_url("");
    assert_eq!(session.caption(), Some("a kite"), "empty URL leaves state alone");

    session.generate_caption().await.unwrap_err();
    assert!(session.caption().is_none());
    assert_settled(&session);
}

// ── Preview ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn preview_tracks_latest_input() {
    let mut session = session_with(FakeBackend::replying(200, "{}"));

    session.set_file(Some(cat_jpg())).unwrap();
    assert!(session.preview().unwrap().is_local());

    session.set_url("https://x/y.jpg");
    assert_eq!(session.preview().unwrap().as_str(), "https://x/y.jpg");

    // Empty URL does not wipe the preview.
    session.set_url("");
    assert_eq!(session.preview().unwrap().as_str(), "https://x/y.jpg");

    session.set_file(Some(FileInput::from_bytes("dog.png", b"png".to_vec()))).unwrap();
    let preview = session.preview().unwrap();
    assert!(preview.is_local());
    assert!(preview.as_str().ends_with(".png"));

    session.clear_all();
    assert!(session.preview().is_none());
    assert_eq!(session.url(), "");
    assert!(session.file().is_none());
}

#[tokio::test]
async fn set_input_clears_previous_result() {
    let mut session = session_with(FakeBackend::replying(200, r#"{"caption":"a cat"}"#));
    session.set_file(Some(cat_jpg())).unwrap();
    session.generate_caption().await.unwrap();
    assert!(session.caption().is_some());

    session.set_file(Some(cat_jpg())).unwrap();
    assert!(session.caption().is_none());
    assert!(session.error().is_none());
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dropped_request_returns_to_idle() {
    let mut session = session_with(FakeBackend::hanging());
    session.set_file(Some(cat_jpg())).unwrap();

    let result =
        tokio::time::timeout(Duration::from_millis(50), session.generate_caption()).await;
    assert!(result.is_err(), "backend never answers");

    assert_eq!(session.request_state(), RequestState::Idle);
    assert!(session.can_generate());
}

#[derive(Default)]
struct CountingObserver {
    starts: AtomicUsize,
    captions: AtomicUsize,
    errors: AtomicUsize,
}

impl SessionObserver for CountingObserver {
    fn on_request_start(&self, _mode: InputMode) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_caption(&self, _caption: &str) {
        self.captions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, _error: &CaptionError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn observer_sees_each_attempt() {
    let observer = Arc::new(CountingObserver::default());
    let config = ClientConfig::builder()
        .backend(FakeBackend::replying(200, r#"{"caption":"a cat"}"#))
        .observer(observer.clone())
        .build()
        .unwrap();
    let mut session = CaptionSession::new(config).unwrap();

    // Precondition failure: error event, no start.
    session.generate_caption().await.unwrap_err();
    session.set_file(Some(cat_jpg())).unwrap();
    session.generate_caption().await.unwrap();

    assert_eq!(observer.starts.load(Ordering::SeqCst), 1);
    assert_eq!(observer.captions.load(Ordering::SeqCst), 1);
    assert_eq!(observer.errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn view_reflects_state() {
    let mut session = session_with(FakeBackend::replying(404, ""));
    session.select_mode(InputMode::Url);
    session.set_url("https://x/missing.jpg");
    session.generate_caption().await.unwrap_err();

    let view = session.view();
    assert_eq!(view.mode, InputMode::Url);
    assert_eq!(view.url, "https://x/missing.jpg");
    assert_eq!(view.preview.as_deref(), Some("https://x/missing.jpg"));
    assert_eq!(view.request_state, RequestState::Idle);
    assert_eq!(view.error.as_deref(), Some("HTTP error! status: 404"));
    assert_eq!(view.error_detail, Some(CaptionError::HttpError { status: 404 }));
    assert!(!view.succeeded());
}
