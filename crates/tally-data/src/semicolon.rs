//! Semicolon counting over whole files.

use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tally_core::error::Result;
use tally_core::models::SemicolonCount;
use tracing::debug;

use crate::aggregator::LineAggregator;

/// Number of `;` in `text`: the number of pieces it splits into, minus one.
pub fn count_semicolons(text: &str) -> u64 {
    (text.split(';').count() - 1) as u64
}

/// [`count_semicolons`] over raw bytes, for files that are not UTF-8.
pub fn count_semicolon_bytes(bytes: &[u8]) -> u64 {
    bytecount::count(bytes, b';') as u64
}

/// Count semicolons in everything `reader` yields.
pub fn count_reader(mut reader: impl Read) -> Result<u64> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(count_semicolon_bytes(&buf))
}

// ── Per-file outcomes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFailure {
    NotFound,
    Io,
}

/// Why a file contributed zero without being counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiagnostic {
    pub path: PathBuf,
    pub kind: FileFailure,
}

impl fmt::Display for FileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FileFailure::NotFound => write!(f, "not found: {}", self.path.display()),
            FileFailure::Io => write!(f, "ioerror: {}", self.path.display()),
        }
    }
}

/// Result of counting one file. Unreadable files count as zero and carry a
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub count: SemicolonCount,
    pub diagnostic: Option<FileDiagnostic>,
}

/// Read `path` in full and count its semicolons.
pub fn count_file(path: &Path) -> FileOutcome {
    match std::fs::read(path) {
        Ok(bytes) => FileOutcome {
            path: path.to_path_buf(),
            count: SemicolonCount {
                count: count_semicolon_bytes(&bytes),
            },
            diagnostic: None,
        },
        Err(e) => {
            debug!("Failed to read {}: {}", path.display(), e);
            let kind = if e.kind() == io::ErrorKind::NotFound {
                FileFailure::NotFound
            } else {
                FileFailure::Io
            };
            FileOutcome {
                path: path.to_path_buf(),
                count: SemicolonCount::default(),
                diagnostic: Some(FileDiagnostic {
                    path: path.to_path_buf(),
                    kind,
                }),
            }
        }
    }
}

// ── FileTally ─────────────────────────────────────────────────────────────────

/// Running semicolon counts keyed by file name.
#[derive(Debug, Default)]
pub struct FileTally {
    totals: LineAggregator<SemicolonCount>,
    failures: usize,
}

impl FileTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `path` and fold it into the tally.
    pub fn count(&mut self, path: &Path) -> Result<FileOutcome> {
        let outcome = count_file(path);
        if outcome.diagnostic.is_some() {
            self.failures += 1;
        }
        self.totals.add(&path.to_string_lossy(), outcome.count)?;
        Ok(outcome)
    }

    /// Sum over every file counted so far.
    pub fn grand_total(&self) -> u64 {
        self.totals.total().values.count
    }

    /// Files that could not be read.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn totals(&self) -> &LineAggregator<SemicolonCount> {
        &self.totals
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
