use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the tally tools.
#[derive(Error, Debug)]
pub enum TallyError {
    /// A record was rejected by the aggregator (empty key, negative or
    /// non-finite value).
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// An input line could not be parsed.
    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report could not be serialised.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TallyError {
    /// Build a [`TallyError::Parse`] for the given 1-based line number.
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    /// `true` when the error is an I/O failure caused by a closed reader on
    /// the other end of a pipe.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}

/// Convenience alias used throughout the tally crates.
pub type Result<T> = std::result::Result<T, TallyError>;
