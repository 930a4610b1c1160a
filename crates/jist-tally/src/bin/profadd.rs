//! Add up CPU profile times per location.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use jist_tally::bootstrap;
use tally_core::formatting::{format_profile_row, format_report_json};
use tally_core::settings::ProfaddArgs;
use tally_data::profile::aggregate_profile;
use tally_data::reader::open_input;

/// Report column ranked on: time share.
const TIME_INDEX: usize = 0;

fn main() -> ExitCode {
    let args = ProfaddArgs::parse();
    if let Err(e) = bootstrap::setup_logging(&args.logging.log_level) {
        eprintln!("Warning: logging disabled: {e}");
    }
    bootstrap::run_main(|| run(&args))
}

fn run(args: &ProfaddArgs) -> Result<()> {
    let reader = open_input(args.input_path())?;
    let totals = aggregate_profile(reader).context("Malformed profile listing")?;
    let rows = totals.report(args.min_fraction, TIME_INDEX)?;
    tracing::info!("{} locations, {} reported", totals.len(), rows.len());

    let mut out = io::stdout().lock();
    if args.json {
        let json = format_report_json(&rows)?;
        writeln!(out, "{json}")?;
    } else {
        for row in &rows {
            writeln!(
                out,
                "{}",
                format_profile_row(row.primary, row.secondary as u64, &row.key)
            )?;
        }
    }
    out.flush()?;
    Ok(())
}
