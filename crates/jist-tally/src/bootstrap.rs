use std::io;
use std::process::ExitCode;

use tally_core::error::TallyError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name onto a [`tracing_subscriber::EnvFilter`]
/// directive. Unknown names pass through unchanged.
pub fn filter_directive(log_level: &str) -> String {
    let upper = log_level.to_uppercase();
    match upper.as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Log output goes to stderr so that it never mixes with report rows on
/// stdout. Falls back to `"warn"` if the level string is not recognised.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

// ── Process exit ───────────────────────────────────────────────────────────────

/// `true` when `err` was caused by the reader of our stdout going away.
pub fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<io::Error>() {
            return e.kind() == io::ErrorKind::BrokenPipe;
        }
        if let Some(e) = cause.downcast_ref::<TallyError>() {
            return e.is_broken_pipe();
        }
        false
    })
}

/// Run a tool body and turn its outcome into an exit status. A closed
/// stdout ends the run quietly; anything else is printed to stderr.
pub fn run_main(body: impl FnOnce() -> anyhow::Result<()>) -> ExitCode {
    match body() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_broken_pipe(&e) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Run failed: {:?}", e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
