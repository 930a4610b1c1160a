//! Shared domain types for the jist tally tools.
//!
//! Holds the [`models::Tally`] trait and the record kinds of the three input
//! formats, the error type, fixed-width row formatting and the command-line
//! settings of the `profadd`, `memprof` and `scc` binaries.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
