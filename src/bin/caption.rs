//! CLI binary for image-caption.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig`, drives a `CaptionSession` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use image_caption::command::{self, Command, HELP};
use image_caption::{
    is_url, CaptionError, CaptionSession, ClientConfig, FileInput, InputMode, Observer,
    SessionObserver, DEFAULT_BASE_URL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Shows a spinner while a request is in flight.
struct SpinnerObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn stop(&self) {
        let bar = match self.bar.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    }
}

impl SessionObserver for SpinnerObserver {
    fn on_request_start(&self, mode: InputMode) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Generating");
        bar.set_message(match mode {
            InputMode::Upload => "uploading image…",
            InputMode::Url => "sending image link…",
        });
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_caption(&self, _caption: &str) {
        self.stop();
    }

    fn on_error(&self, _error: &CaptionError) {
        self.stop();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Caption a local file
  caption cat.jpg

  # Caption a remote image
  caption https://example.com/cat.jpg

  # Another backend, give up after 30 seconds
  caption --base-url http://gpu-box:8000 --timeout 30 cat.jpg

  # Structured output
  caption --json cat.jpg

  # Interactive session (mode / file / url / generate / clear / show)
  caption --interactive

ENVIRONMENT VARIABLES:
  CAPTION_BASE_URL         Backend address (default http://localhost:8000)
  CAPTION_TIMEOUT          Whole-request timeout in seconds
  CAPTION_CONNECT_TIMEOUT  Connect timeout in seconds
  RUST_LOG                 Overrides the log filter

BACKEND ROUTES:
  POST {base}/caption/upload   multipart, field "uploaded_file"
  POST {base}/caption/link     JSON {"image_link": "..."}
"#;

/// Caption images with a remote captioning backend.
#[derive(Parser, Debug)]
#[command(
    name = "caption",
    version,
    about = "Caption local image files or image URLs using a captioning backend",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image path or HTTP/HTTPS image URL.
    #[arg(required_unless_present = "interactive")]
    input: Option<String>,

    /// Input mode. Auto-detected from INPUT when omitted.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Base address of the captioning backend.
    #[arg(long, env = "CAPTION_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Whole-request timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "CAPTION_TIMEOUT")]
    timeout: Option<u64>,

    /// TCP connect timeout in seconds.
    #[arg(long, env = "CAPTION_CONNECT_TIMEOUT")]
    connect_timeout: Option<u64>,

    /// Print the final session state as JSON instead of the bare caption.
    #[arg(long, env = "CAPTION_JSON")]
    json: bool,

    /// Read commands from stdin instead of captioning INPUT once.
    #[arg(short, long, conflicts_with = "json")]
    interactive: bool,

    /// Disable the spinner.
    #[arg(long, env = "CAPTION_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CAPTION_VERBOSE")]
    verbose: bool,

    /// Suppress all output except the caption and errors.
    #[arg(short, long, env = "CAPTION_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Upload,
    Url,
}

impl From<ModeArg> for InputMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Upload => InputMode::Upload,
            ModeArg::Url => InputMode::Url,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs from
    // tearing through it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let observer: Option<Observer> = if show_progress {
        Some(SpinnerObserver::new() as Observer)
    } else {
        None
    };
    let config = build_config(&cli, observer)?;
    let mut session = CaptionSession::new(config).context("Failed to create caption client")?;

    if cli.interactive {
        return run_interactive(&mut session, cli.quiet).await;
    }

    // `required_unless_present` guarantees INPUT outside interactive mode.
    let input = cli.input.as_deref().unwrap_or_default();
    let mode = cli
        .mode
        .map(InputMode::from)
        .unwrap_or(if is_url(input) { InputMode::Url } else { InputMode::Upload });

    session.select_mode(mode);
    match mode {
        InputMode::Upload => {
            let file = FileInput::open(input)
                .await
                .with_context(|| format!("Failed to load image '{input}'"))?;
            session
                .set_file(Some(file))
                .context("Failed to prepare preview")?;
        }
        InputMode::Url => session.set_url(input),
    }

    let outcome = session.generate_caption().await;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&session.view()).context("Failed to serialise state")?;
        println!("{json}");
    } else {
        match &outcome {
            Ok(caption) => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                writeln!(handle, "{caption}").context("Failed to write to stdout")?;
            }
            Err(e) => eprintln!("{} {}", red("✘"), e),
        }
    }

    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Read commands from stdin until EOF or `quit`.
///
/// Exit status reflects the state at exit: failure if an error is showing.
async fn run_interactive(session: &mut CaptionSession, quiet: bool) -> Result<ExitCode> {
    if !quiet {
        eprintln!(
            "{} backend {}  {}",
            bold("caption"),
            session.config().base_url,
            dim("(type 'help' for commands)")
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !quiet {
            eprint!("{}> ", session.mode());
            io::stderr().flush().ok();
        }
        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        let cmd = match command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{} {}", red("✘"), e);
                continue;
            }
        };

        match cmd {
            Command::Mode(mode) => session.select_mode(mode),
            Command::File(path) => match FileInput::open(&path).await {
                Ok(file) => {
                    if let Err(e) = session.set_file(Some(file)) {
                        eprintln!("{} {}", red("✘"), e);
                    }
                }
                Err(e) => eprintln!("{} {}", red("✘"), e),
            },
            Command::Url(url) => session.set_url(url),
            Command::Generate => match session.generate_caption().await {
                Ok(caption) => println!("{} {}", green("✔"), caption),
                Err(e) => eprintln!("{} {}", red("✘"), e),
            },
            Command::Clear => session.clear_all(),
            Command::Show => print_state(session),
            Command::Help => eprintln!("{HELP}"),
            Command::Quit => break,
        }
    }

    Ok(if session.error().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_state(session: &CaptionSession) {
    let view = session.view();
    println!("Mode:     {}", view.mode);
    println!(
        "File:     {}",
        view.file_name.clone().unwrap_or_else(|| dim("(none)"))
    );
    println!(
        "URL:      {}",
        if view.url.is_empty() { dim("(empty)") } else { view.url.clone() }
    );
    println!(
        "Preview:  {}",
        view.preview.clone().unwrap_or_else(|| dim("(none)"))
    );
    if let Some(ref caption) = view.caption {
        println!("Caption:  {}", green(caption));
    }
    if let Some(ref error) = view.error {
        println!("Error:    {}", red(error));
    }
    if session.can_generate() {
        println!("{}", dim("ready: 'generate' to caption"));
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, observer: Option<Observer>) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder().base_url(cli.base_url.clone());

    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(secs) = cli.connect_timeout {
        builder = builder.connect_timeout_secs(secs);
    }
    if let Some(observer) = observer {
        builder = builder.observer(observer);
    }

    builder.build().context("Invalid configuration")
}
