//! Shared plumbing of the `profadd`, `memprof` and `scc` binaries.

pub mod bootstrap;

pub use tally_core as core;
pub use tally_data as data;
