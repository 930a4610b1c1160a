//! Semicolon counter.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use jist_tally::bootstrap;
use tally_core::formatting::format_file_row;
use tally_core::models::TOTAL_KEY;
use tally_core::settings::SccArgs;
use tally_data::reader::{expand_patterns, read_file_list};
use tally_data::semicolon::{count_reader, FileTally};

fn main() -> ExitCode {
    let args = match SccArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            eprintln!("scc command syntax error");
            eprintln!("Try `scc --help' for more information.");
            return ExitCode::from(2);
        }
    };
    if let Err(e) = bootstrap::setup_logging(&args.logging.log_level) {
        eprintln!("Warning: logging disabled: {e}");
    }
    bootstrap::run_main(|| run(&args))
}

fn run(args: &SccArgs) -> Result<()> {
    let files: Vec<PathBuf> = if let Some(list) = &args.file_list {
        read_file_list(list)?
    } else if !args.files.is_empty() {
        expand_patterns(&args.files)
    } else {
        // Filter mode: count standard input and print the bare number.
        let count = count_reader(io::stdin().lock())?;
        let mut out = io::stdout().lock();
        writeln!(out, "{count}")?;
        out.flush()?;
        return Ok(());
    };

    let mut tally = FileTally::new();
    let mut out = io::stdout().lock();
    for path in &files {
        let outcome = tally.count(path)?;
        match &outcome.diagnostic {
            Some(diagnostic) => writeln!(out, "{diagnostic}")?,
            None if !args.total => writeln!(
                out,
                "{}",
                format_file_row(outcome.count.count, &path.display().to_string())
            )?,
            None => {}
        }
    }

    let label = if args.total { "" } else { TOTAL_KEY };
    writeln!(out, "{}", format_file_row(tally.grand_total(), label))?;
    out.flush()?;

    tracing::info!(
        "{} files counted, {} unreadable",
        files.len(),
        tally.failures()
    );
    Ok(())
}
