//! CPU profile listings, as printed by the JVM sampling profiler.
//!
//! The interesting part of such a listing looks like
//!
//! ```text
//! CPU SAMPLES BEGIN (total = 1200) Sun Aug 10 22:42:40 2003
//! rank   self  accum   count trace method
//!    1 20.00% 20.00%     240 300012 java.lang.Object.wait
//!    2 10.00% 30.00%     120 300013 jist.runtime.Controller.run
//! CPU SAMPLES END
//! ```
//!
//! Samples are listed per stack trace, so one method shows up once for every
//! distinct trace that ends in it. Summing by the last column gives the time
//! spent per location.

use std::io::BufRead;

use tally_core::error::{Result, TallyError};
use tally_core::models::ProfileSample;
use tracing::debug;

use crate::aggregator::LineAggregator;

/// Tokens in a sample row: rank, self%, accum%, count, trace, location.
pub const PROFILE_FIELDS: usize = 6;

const HEADER_PREFIX: &str = "rank";
const FOOTER_PREFIX: &str = "CPU";

/// Parse one sample row into its location and sample.
pub fn parse_profile_line(line: &str) -> std::result::Result<(String, ProfileSample), String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != PROFILE_FIELDS {
        return Err(format!(
            "expected {PROFILE_FIELDS} fields, found {}",
            tokens.len()
        ));
    }

    let time = tokens[1]
        .strip_suffix('%')
        .ok_or_else(|| format!("time `{}` does not end in %", tokens[1]))?
        .parse::<f64>()
        .map_err(|_| format!("time `{}` is not a number", tokens[1]))?;
    let count = tokens[3]
        .parse::<u64>()
        .map_err(|_| format!("count `{}` is not a non-negative integer", tokens[3]))?;

    Ok((tokens[5].to_string(), ProfileSample { time, count }))
}

// ── ProfileScanner ────────────────────────────────────────────────────────────

/// Where a [`ProfileScanner`] is within the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Before the `rank` header.
    Preamble,
    /// Between the header and the `CPU` footer.
    Samples,
    /// After the footer; remaining input is ignored.
    Done,
}

/// Line-at-a-time driver that feeds sample rows into an aggregate.
#[derive(Debug)]
pub struct ProfileScanner {
    state: ScanState,
    line_no: usize,
    totals: LineAggregator<ProfileSample>,
}

impl Default for ProfileScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Preamble,
            line_no: 0,
            totals: LineAggregator::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Feed the next line. A malformed sample row is an error carrying the
    /// 1-based line number.
    pub fn feed(&mut self, line: &str) -> Result<()> {
        self.line_no += 1;
        match self.state {
            ScanState::Preamble => {
                if line.starts_with(HEADER_PREFIX) {
                    self.state = ScanState::Samples;
                }
            }
            ScanState::Samples => {
                if line.starts_with(FOOTER_PREFIX) {
                    self.state = ScanState::Done;
                    return Ok(());
                }
                let (location, sample) = parse_profile_line(line)
                    .map_err(|reason| TallyError::parse(self.line_no, reason))?;
                self.totals
                    .add(&location, sample)
                    .map_err(|e| TallyError::parse(self.line_no, e.to_string()))?;
            }
            ScanState::Done => {}
        }
        Ok(())
    }

    /// Finish scanning and hand over the aggregate.
    pub fn finish(self) -> LineAggregator<ProfileSample> {
        debug!(
            "Scanned {} lines, {} locations",
            self.line_no,
            self.totals.len()
        );
        self.totals
    }
}

/// Aggregate a whole listing. The first malformed sample row aborts the run.
pub fn aggregate_profile(reader: impl BufRead) -> Result<LineAggregator<ProfileSample>> {
    let mut scanner = ProfileScanner::new();
    for line in reader.lines() {
        scanner.feed(&line?)?;
        if scanner.state() == ScanState::Done {
            break;
        }
    }
    Ok(scanner.finish())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
