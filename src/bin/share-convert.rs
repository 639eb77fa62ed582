//! CLI binary for share-convert.
//!
//! A thin shim over the library crate that maps CLI flags to `ShareConfig`,
//! runs one share request and prints the resulting JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use share_convert::{
    ConversionOutcome, JobState, MemoryShareStore, ProgressCallback, ShareConfig, ShareMode,
    ShareOrchestrator, ShareProgressCallback, ShareRequest,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that follows a conversion job through submission and polling.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message("submitting job…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ShareProgressCallback for CliProgressCallback {
    fn on_conversion_submitted(&self, job_id: &str) {
        self.bar.set_message(format!("job {job_id} submitted"));
    }

    fn on_poll(&self, job_id: &str, attempt: u32, state: JobState) {
        self.bar
            .set_message(format!("job {job_id}  poll #{attempt}  {state}"));
    }

    fn on_poll_error(&self, job_id: &str, attempt: u32, error: &str) {
        self.bar.println(format!(
            "  {} job {job_id} poll #{attempt}: {}",
            red("✗"),
            dim(error)
        ));
    }

    fn on_conversion_finished(&self, job_id: Option<&str>, outcome: ConversionOutcome) {
        self.bar.finish_and_clear();
        let job = job_id.unwrap_or("-");
        match outcome {
            ConversionOutcome::Completed => eprintln!("{} job {job} completed", green("✔")),
            ConversionOutcome::Failed(kind) => eprintln!("{} job {job}: {kind:?}", red("✘")),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Share a file as-is (no Conversion API call)
  share-convert example.docx --mode public

  # Share a converted copy
  share-convert example.docx --mode public --convert-to pdf

  # Point at a specific Conversion API with a tighter polling budget
  share-convert report.odt --convert-to pdf \
      --api-url http://conversions.internal:3001 \
      --poll-interval-ms 250 --max-poll-attempts 20

OUTPUT:
  On success the share is printed as JSON on stdout:
    {"id":"…","name":"example.pdf","mode":"public","originalFile":{"name":"example.docx"}}
  On failure the error body is printed as JSON on stdout and the exit code is 1:
    {"message":"Error converting file"}

ENVIRONMENT VARIABLES:
  CONVERSION_API_URL       Base URL of the Conversion API
  SHARE_REQUEST_TIMEOUT    Per-request HTTP timeout (seconds)
  SHARE_POLL_INTERVAL_MS   Initial delay between polls
  SHARE_POLL_MAX_INTERVAL_MS  Backoff cap between polls
  SHARE_MAX_POLL_ATTEMPTS  Maximum status fetches per job
  SHARE_POLL_TIMEOUT       Wall-clock polling limit (seconds)
  RUST_LOG                 Overrides the log filter
"#;

/// Share a file, optionally converting it through the Conversion API.
#[derive(Parser, Debug)]
#[command(
    name = "share-convert",
    version,
    about = "Share a file, optionally converting it through the Conversion API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// File name to share, including its extension.
    name: String,

    /// Share visibility.
    #[arg(long, value_enum, default_value = "public")]
    mode: ModeArg,

    /// Target format extension (e.g. pdf). Omit to share the file as-is.
    #[arg(long)]
    convert_to: Option<String>,

    /// Base URL of the Conversion API.
    #[arg(long, env = "CONVERSION_API_URL", default_value = "http://localhost:3001")]
    api_url: String,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "SHARE_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    /// Initial delay between status polls, in milliseconds.
    #[arg(long, env = "SHARE_POLL_INTERVAL_MS", default_value_t = 500)]
    poll_interval_ms: u64,

    /// Upper bound on the delay between polls, in milliseconds.
    #[arg(long, env = "SHARE_POLL_MAX_INTERVAL_MS", default_value_t = 5000)]
    poll_max_interval_ms: u64,

    /// Maximum number of status polls per conversion job.
    #[arg(long, env = "SHARE_MAX_POLL_ATTEMPTS", default_value_t = 60)]
    max_poll_attempts: u32,

    /// Wall-clock limit on polling, in seconds.
    #[arg(long, env = "SHARE_POLL_TIMEOUT", default_value_t = 120)]
    poll_timeout: u64,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "SHARE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SHARE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SHARE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Public,
    Private,
}

impl From<ModeArg> for ShareMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Public => ShareMode::Public,
            ModeArg::Private => ShareMode::Private,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs unless --verbose asks for them.
    let show_progress = !cli.quiet && !cli.no_progress && cli.convert_to.is_some();
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ShareProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let store = Arc::new(MemoryShareStore::new());
    let orchestrator = ShareOrchestrator::from_config(&config, store)
        .context("Failed to initialise the Conversion API client")?;

    let mut request = ShareRequest::new(cli.name.clone(), cli.mode.into());
    if let Some(ref target) = cli.convert_to {
        request = request.convert_to(target.clone());
    }

    // ── Run share ────────────────────────────────────────────────────────
    match orchestrator.create_share(&request).await {
        Ok(share) => {
            println!("{}", to_json(&share, cli.pretty)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", to_json(&e.response_body(), cli.pretty)?);
            if !cli.quiet {
                eprintln!("{} HTTP {}", red("✘"), e.status_code());
            }
            Err(anyhow::Error::new(e).context("Share creation failed"))
        }
    }
}

/// Map CLI args to `ShareConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ShareConfig> {
    let mut builder = ShareConfig::builder()
        .conversion_api_url(cli.api_url.clone())
        .request_timeout_secs(cli.request_timeout)
        .poll_interval_ms(cli.poll_interval_ms)
        .poll_max_interval_ms(cli.poll_max_interval_ms)
        .max_poll_attempts(cli.max_poll_attempts)
        .poll_timeout_secs(cli.poll_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("Failed to serialise output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_map_to_valid_config() {
        let cli = Cli::parse_from(["share-convert", "example.docx"]);
        assert!(cli.convert_to.is_none());
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.max_poll_attempts, 60);
    }

    #[test]
    fn cli_convert_and_mode_flags() {
        let cli = Cli::parse_from([
            "share-convert",
            "example.docx",
            "--mode",
            "private",
            "--convert-to",
            "pdf",
            "--poll-interval-ms",
            "10",
            "--poll-max-interval-ms",
            "40",
        ]);
        assert_eq!(ShareMode::from(cli.mode), ShareMode::Private);
        assert_eq!(cli.convert_to.as_deref(), Some("pdf"));
        let policy = build_config(&cli, None).unwrap().poll_policy();
        assert_eq!(policy.delay_before(2), Duration::from_millis(10));
    }

    #[test]
    fn inverted_poll_intervals_are_rejected() {
        let cli = Cli::parse_from([
            "share-convert",
            "example.docx",
            "--poll-interval-ms",
            "900",
            "--poll-max-interval-ms",
            "100",
        ]);
        assert!(build_config(&cli, None).is_err());
    }

    #[test]
    fn out_of_range_poll_flags_are_rejected() {
        let huge_timeout = Cli::parse_from([
            "share-convert",
            "example.docx",
            "--poll-timeout",
            "18446744073709551615",
        ]);
        assert!(build_config(&huge_timeout, None).is_err());

        let zero_interval = Cli::parse_from([
            "share-convert",
            "example.docx",
            "--poll-interval-ms",
            "0",
        ]);
        assert!(build_config(&zero_interval, None).is_err());
    }
}
