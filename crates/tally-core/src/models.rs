use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::{Result, TallyError};

/// Key used for the synthetic grand-total row.
pub const TOTAL_KEY: &str = "TOTAL";

/// A fixed-arity tuple of non-negative running sums.
///
/// Implementors are the per-record values of one input format. The
/// aggregator only needs to add two tallies together and to see their
/// components as `f64`s in declaration order, which is what sorting,
/// thresholding and validation work on.
pub trait Tally: Clone + Default + Debug {
    /// Numeric components in declaration order.
    fn components(&self) -> Vec<f64>;

    /// Add `other` component-wise into `self`.
    ///
    /// Fails with [`TallyError::InvalidRecord`] when a sum would overflow;
    /// `self` is unchanged in that case.
    fn accumulate(&mut self, other: &Self) -> Result<()>;
}

fn checked_sum(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b)
        .ok_or_else(|| TallyError::InvalidRecord(format!("sum {a} + {b} overflows")))
}

/// Samples attributed to one location in a CPU profile listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    /// Share of total CPU time, in percent.
    pub time: f64,
    /// Number of samples.
    pub count: u64,
}

impl Tally for ProfileSample {
    fn components(&self) -> Vec<f64> {
        vec![self.time, self.count as f64]
    }

    fn accumulate(&mut self, other: &Self) -> Result<()> {
        let time = self.time + other.time;
        if !time.is_finite() {
            return Err(TallyError::InvalidRecord(format!(
                "time {} + {} is out of range",
                self.time, other.time
            )));
        }
        self.count = checked_sum(self.count, other.count)?;
        self.time = time;
        Ok(())
    }
}

/// Live objects of one type in a heap dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Number of objects; every `DATA` record contributes one.
    pub count: u64,
    /// Bytes occupied by those objects.
    pub bytes: u64,
}

impl Allocation {
    /// A single object of `bytes` bytes.
    pub fn single(bytes: u64) -> Self {
        Self { count: 1, bytes }
    }
}

impl Tally for Allocation {
    fn components(&self) -> Vec<f64> {
        vec![self.count as f64, self.bytes as f64]
    }

    fn accumulate(&mut self, other: &Self) -> Result<()> {
        let count = checked_sum(self.count, other.count)?;
        self.bytes = checked_sum(self.bytes, other.bytes)?;
        self.count = count;
        Ok(())
    }
}

/// Semicolons found in one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemicolonCount {
    pub count: u64,
}

impl Tally for SemicolonCount {
    fn components(&self) -> Vec<f64> {
        vec![self.count as f64]
    }

    fn accumulate(&mut self, other: &Self) -> Result<()> {
        self.count = checked_sum(self.count, other.count)?;
        Ok(())
    }
}

/// One keyed entry of an aggregate, also used for the `TOTAL` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEntry<T> {
    pub key: String,
    pub values: T,
}

/// A sorted, display-ready projection of an aggregate entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Value the report is sorted and thresholded on.
    pub primary: f64,
    /// Tie-breaker; equals `primary` for single-component tallies.
    pub secondary: f64,
    pub key: String,
    /// `primary` as a fraction of the aggregate's primary total.
    pub fraction: f64,
}
