//! Summarise MEMPROF heap dump sessions per type.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use jist_tally::bootstrap;
use tally_core::settings::MemprofArgs;
use tally_data::memprof::{run_memprof, MemprofSession, SessionEvent, SessionPolicy};
use tally_data::reader::open_input;

fn main() -> ExitCode {
    let args = MemprofArgs::parse();
    if let Err(e) = bootstrap::setup_logging(&args.logging.log_level) {
        eprintln!("Warning: logging disabled: {e}");
    }
    bootstrap::run_main(|| run(&args))
}

fn run(args: &MemprofArgs) -> Result<()> {
    let policy = if args.strict {
        SessionPolicy::Strict
    } else {
        SessionPolicy::Lenient
    };
    let mut session = MemprofSession::new(args.min_fraction, policy);

    let inputs: Vec<Option<PathBuf>> = if args.inputs.is_empty() {
        vec![None]
    } else {
        args.inputs.iter().cloned().map(Some).collect()
    };

    let mut out = io::stdout().lock();
    let mut diagnostics = 0usize;
    for input in &inputs {
        let reader = open_input(input.as_deref())?;
        run_memprof(reader, &mut session, |event| {
            if matches!(event, SessionEvent::Diagnostic { .. }) {
                diagnostics += 1;
            }
            for line in event.render_lines() {
                writeln!(out, "{line}")?;
            }
            Ok(())
        })
        .with_context(|| match input {
            Some(path) => format!("Failed while reading {}", path.display()),
            None => "Failed while reading standard input".to_string(),
        })?;
    }
    out.flush()?;

    if diagnostics > 0 {
        tracing::info!("{} lines could not be processed", diagnostics);
    }
    Ok(())
}
