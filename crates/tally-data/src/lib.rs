//! Input parsing and aggregation for the jist tally tools.
//!
//! [`aggregator::LineAggregator`] keeps keyed running sums; the `profile`,
//! `memprof` and `semicolon` modules turn their input formats into records
//! for it, and [`reader`] supplies the input streams.

pub mod aggregator;
pub mod memprof;
pub mod profile;
pub mod reader;
pub mod semicolon;

pub use tally_core as core;
