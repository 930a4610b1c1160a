use clap::{ArgAction, Args, Parser};
use std::path::{Path, PathBuf};

// ── Shared options ─────────────────────────────────────────────────────────────

/// Options every tool accepts.
#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    /// Logging level (diagnostics go to stderr)
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,
}

/// Parse a threshold in `0.0..=1.0`.
pub fn parse_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("`{s}` is not a number"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("`{s}` is not between 0 and 1"));
    }
    Ok(value)
}

/// `true` when `path` names standard input.
pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

// ── profadd ────────────────────────────────────────────────────────────────────

/// Add up CPU profile times per location
#[derive(Parser, Debug, Clone)]
#[command(
    name = "profadd",
    about = "Add up CPU profile times of all stack traces ending in the same location",
    version
)]
pub struct ProfaddArgs {
    /// Profile listing to read; `-` or omitted reads standard input
    pub input: Option<PathBuf>,

    /// Stop the report at the first location below this share of total time
    #[arg(long, default_value = "0", value_parser = parse_fraction)]
    pub min_fraction: f64,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

impl ProfaddArgs {
    /// The input file, or `None` for standard input.
    pub fn input_path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|p| !is_stdin(p))
    }
}

// ── memprof ────────────────────────────────────────────────────────────────────

/// Memory profile default threshold: rows under 2% of the bytes are cut.
pub const MIN_FRACTION: f64 = 0.02;

/// Default dump file name written by the heap profiler agent. Not read by the
/// tools themselves.
pub const DUMP_FILE: &str = "dump.memprof";

/// Summarise MEMPROF heap dumps per type
#[derive(Parser, Debug, Clone)]
#[command(
    name = "memprof",
    about = "Summarise MEMPROF heap dump sessions by object type",
    version
)]
pub struct MemprofArgs {
    /// Dump files to process in order; `-` or none reads standard input
    pub inputs: Vec<PathBuf>,

    /// Stop each session report at the first type below this share of bytes
    #[arg(long, default_value_t = MIN_FRACTION, value_parser = parse_fraction)]
    pub min_fraction: f64,

    /// Reject DATA and END records that appear outside a BEGIN/END session
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

// ── scc ────────────────────────────────────────────────────────────────────────

/// Semicolon counter
#[derive(Parser, Debug, Clone)]
#[command(
    name = "scc",
    about = "Semicolon counter",
    version,
    disable_help_flag = true,
    disable_version_flag = true,
    after_help = "With no file arguments and no --file, counts semicolons on standard input."
)]
pub struct SccArgs {
    /// Display this help information
    #[arg(short = 'h', long, short_alias = '?', action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Display version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,

    /// Read file names from this file, one per line; `-` = stdin
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file_list: Option<PathBuf>,

    /// Show only the total
    #[arg(short = 't', long)]
    pub total: bool,

    /// Files or glob patterns to count
    pub files: Vec<String>,

    #[command(flatten)]
    pub logging: LoggingArgs,
}
