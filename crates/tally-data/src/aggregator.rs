//! Keyed running sums with a sorted, thresholded report.

use std::cmp::Ordering;
use std::collections::HashMap;

use tally_core::error::{Result, TallyError};
use tally_core::formatting::fraction;
use tally_core::models::{AggregateEntry, ReportEntry, Tally, TOTAL_KEY};

// ── LineAggregator ────────────────────────────────────────────────────────────

/// Accumulates one [`Tally`] per distinct key.
///
/// Keys remember the order in which they were first added; the report uses
/// it as the last tie-breaker so that equal rows come out in encounter order.
#[derive(Debug, Clone)]
pub struct LineAggregator<T: Tally> {
    entries: Vec<AggregateEntry<T>>,
    index: HashMap<String, usize>,
    /// Sum over every entry, kept in step with `entries`.
    running: T,
}

impl<T: Tally> Default for LineAggregator<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            running: T::default(),
        }
    }
}

impl<T: Tally> LineAggregator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.running = T::default();
    }

    /// Add `values` to the running sums of `key`, inserting it if absent.
    ///
    /// Rejects an empty key, any negative or non-finite component, and a
    /// value that would overflow the key's sums or the grand total; the
    /// aggregate is left untouched in that case.
    pub fn add(&mut self, key: &str, values: T) -> Result<()> {
        if key.is_empty() {
            return Err(TallyError::InvalidRecord("empty key".to_string()));
        }
        if let Some(bad) = values
            .components()
            .into_iter()
            .find(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(TallyError::InvalidRecord(format!(
                "value {bad} for `{key}` is not a non-negative number"
            )));
        }

        // Each entry is bounded by the grand total, so checking the total
        // first means the entry update below cannot fail halfway.
        let mut running = self.running.clone();
        running.accumulate(&values)?;

        match self.index.get(key) {
            Some(&i) => self.entries[i].values.accumulate(&values)?,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(AggregateEntry {
                    key: key.to_string(),
                    values,
                });
            }
        }
        self.running = running;
        Ok(())
    }

    /// Component-wise sum of every entry, under the key `TOTAL`.
    pub fn total(&self) -> AggregateEntry<T> {
        AggregateEntry {
            key: TOTAL_KEY.to_string(),
            values: self.running.clone(),
        }
    }

    /// Entries sorted descending by the component at `primary_index`.
    ///
    /// Ties fall back to the secondary component (the first one other than
    /// the primary), then to first-insertion order. With `min_fraction > 0`
    /// the report is the longest prefix whose entries all hold at least that
    /// share of the primary total.
    pub fn report(&self, min_fraction: f64, primary_index: usize) -> Result<Vec<ReportEntry>> {
        let arity = T::default().components().len();
        if primary_index >= arity {
            return Err(TallyError::Config(format!(
                "primary index {primary_index} out of range for {arity} values"
            )));
        }

        let total_primary = self.total().values.components()[primary_index];

        let mut rows: Vec<ReportEntry> = self
            .entries
            .iter()
            .map(|entry| {
                let components = entry.values.components();
                let primary = components[primary_index];
                let secondary = components
                    .iter()
                    .enumerate()
                    .find(|(i, _)| *i != primary_index)
                    .map(|(_, v)| *v)
                    .unwrap_or(primary);
                ReportEntry {
                    primary,
                    secondary,
                    key: entry.key.clone(),
                    fraction: fraction(primary, total_primary),
                }
            })
            .collect();

        // `sort_by` is stable, so exact ties keep insertion order.
        rows.sort_by(|a, b| {
            descending(a.primary, b.primary).then(descending(a.secondary, b.secondary))
        });

        if min_fraction > 0.0 {
            let keep = rows
                .iter()
                .take_while(|row| row.fraction >= min_fraction)
                .count();
            rows.truncate(keep);
        }

        Ok(rows)
    }

    /// Current sums for `key`.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.entries[i].values)
    }

    /// Entries in first-insertion order.
    pub fn entries(&self) -> &[AggregateEntry<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::models::{Allocation, ProfileSample, SemicolonCount};

    fn sample(time: f64, count: u64) -> ProfileSample {
        ProfileSample { time, count }
    }

    // ── add ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_add_inserts_then_accumulates() {
        let mut agg = LineAggregator::new();
        agg.add("Foo.run", sample(2.0, 3)).unwrap();
        agg.add("Foo.run", sample(1.0, 1)).unwrap();

        let mut single = LineAggregator::new();
        single.add("Foo.run", sample(3.0, 4)).unwrap();

        assert_eq!(agg.len(), 1);
        assert_eq!(agg.get("Foo.run"), single.get("Foo.run"));
    }

    #[test]
    fn test_add_rejects_empty_key() {
        let mut agg = LineAggregator::new();
        let err = agg.add("", Allocation::single(8)).unwrap_err();
        assert!(matches!(err, TallyError::InvalidRecord(_)));
        assert!(agg.is_empty());
    }

    #[test]
    fn test_add_rejects_negative_value() {
        let mut agg = LineAggregator::new();
        let err = agg.add("x", sample(-1.0, 2)).unwrap_err();
        assert!(matches!(err, TallyError::InvalidRecord(_)));
        assert!(agg.get("x").is_none());
    }

    #[test]
    fn test_add_rejects_non_finite_value() {
        let mut agg = LineAggregator::new();
        assert!(agg.add("x", sample(f64::NAN, 2)).is_err());
        assert!(agg.add("x", sample(f64::INFINITY, 2)).is_err());
        assert!(agg.is_empty());
    }

    #[test]
    fn test_failed_add_keeps_existing_sums() {
        let mut agg = LineAggregator::new();
        agg.add("x", sample(1.0, 1)).unwrap();
        assert!(agg.add("x", sample(-5.0, 1)).is_err());
        assert_eq!(agg.get("x"), Some(&sample(1.0, 1)));
    }

    #[test]
    fn test_add_rejects_overflowing_sum() {
        let mut agg = LineAggregator::new();
        agg.add("A", Allocation::single(u64::MAX)).unwrap();
        let err = agg.add("A", Allocation::single(u64::MAX)).unwrap_err();
        assert!(matches!(err, TallyError::InvalidRecord(_)));
        assert_eq!(agg.get("A"), Some(&Allocation::single(u64::MAX)));
        assert_eq!(agg.total().values, Allocation::single(u64::MAX));
    }

    #[test]
    fn test_add_rejects_overflowing_total_across_keys() {
        let mut agg = LineAggregator::new();
        agg.add("A", Allocation::single(u64::MAX)).unwrap();
        assert!(agg.add("B", Allocation::single(1)).is_err());
        assert_eq!(agg.len(), 1);
        assert!(agg.get("B").is_none());
    }

    // ── reset ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_reset_discards_entries() {
        let mut agg = LineAggregator::new();
        agg.add("a", Allocation::single(10)).unwrap();
        agg.add("b", Allocation::single(20)).unwrap();
        agg.reset();

        assert!(agg.is_empty());
        assert_eq!(agg.total().values, Allocation::default());

        agg.add("b", Allocation::single(5)).unwrap();
        assert_eq!(agg.entries()[0].key, "b");
    }

    // ── total ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_total_is_sum_of_all_adds() {
        let mut agg = LineAggregator::new();
        let adds = [("a", 100), ("b", 50), ("a", 25), ("c", 1)];
        for (key, bytes) in adds {
            agg.add(key, Allocation::single(bytes)).unwrap();
        }

        let total = agg.total();
        assert_eq!(total.key, "TOTAL");
        assert_eq!(total.values, Allocation { count: 4, bytes: 176 });
        // total() does not insert the synthetic key.
        assert!(agg.get("TOTAL").is_none());
        assert_eq!(agg.len(), 3);
    }

    // ── report ────────────────────────────────────────────────────────────────

    #[test]
    fn test_report_sorted_descending_by_primary() {
        let mut agg = LineAggregator::new();
        agg.add("low", sample(1.0, 9)).unwrap();
        agg.add("high", sample(5.0, 1)).unwrap();
        agg.add("mid", sample(3.0, 4)).unwrap();

        let keys: Vec<String> = agg
            .report(0.0, 0)
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_report_ties_broken_by_secondary() {
        let mut agg = LineAggregator::new();
        agg.add("few", sample(2.0, 1)).unwrap();
        agg.add("many", sample(2.0, 7)).unwrap();

        let rows = agg.report(0.0, 0).unwrap();
        assert_eq!(rows[0].key, "many");
        assert_eq!(rows[1].key, "few");
    }

    #[test]
    fn test_report_exact_ties_keep_insertion_order() {
        let mut agg = LineAggregator::new();
        for key in ["zeta", "alpha", "mu"] {
            agg.add(key, sample(1.0, 1)).unwrap();
        }

        let keys: Vec<String> = agg
            .report(0.0, 0)
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mu"]);
    }

    #[test]
    fn test_report_primary_index_selects_component() {
        let mut agg = LineAggregator::new();
        agg.add("many_small", Allocation { count: 10, bytes: 80 }).unwrap();
        agg.add("few_large", Allocation { count: 1, bytes: 4096 }).unwrap();

        let by_bytes = agg.report(0.0, 1).unwrap();
        assert_eq!(by_bytes[0].key, "few_large");
        assert_eq!(by_bytes[0].primary, 4096.0);
        assert_eq!(by_bytes[0].secondary, 1.0);

        let by_count = agg.report(0.0, 0).unwrap();
        assert_eq!(by_count[0].key, "many_small");
        assert_eq!(by_count[0].secondary, 80.0);
    }

    #[test]
    fn test_report_rejects_out_of_range_index() {
        let agg: LineAggregator<SemicolonCount> = LineAggregator::new();
        let err = agg.report(0.0, 1).unwrap_err();
        assert!(matches!(err, TallyError::Config(_)));
    }

    #[test]
    fn test_report_single_record_round_trip() {
        let mut agg = LineAggregator::new();
        agg.add("main.c", SemicolonCount { count: 12 }).unwrap();

        let rows = agg.report(0.0, 0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].primary, 12.0);
        assert_eq!(rows[0].secondary, 12.0);
        assert_eq!(rows[0].key, "main.c");
        assert_eq!(rows[0].fraction, 1.0);
    }

    #[test]
    fn test_report_is_lossless_without_threshold() {
        let mut agg = LineAggregator::new();
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            agg.add(key, Allocation::single(i as u64)).unwrap();
        }
        let rows = agg.report(0.0, 1).unwrap();
        assert_eq!(rows.len(), agg.len());
        let sum: f64 = rows.iter().map(|r| r.primary).sum();
        assert_eq!(sum, agg.total().values.bytes as f64);
    }

    #[test]
    fn test_report_threshold_is_monotonic_prefix() {
        let mut agg = LineAggregator::new();
        agg.add("big", Allocation::single(900)).unwrap();
        agg.add("medium", Allocation::single(80)).unwrap();
        agg.add("small", Allocation::single(15)).unwrap();
        agg.add("tiny", Allocation::single(5)).unwrap();

        let rows = agg.report(0.02, 1).unwrap();
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["big", "medium"]);
        assert!(rows.iter().all(|r| r.fraction >= 0.02));

        let all = agg.report(0.0, 1).unwrap();
        assert_eq!(&all[..rows.len()], &rows[..]);
        assert!(all[rows.len()].fraction < 0.02);
    }

    #[test]
    fn test_report_threshold_inclusive_at_boundary() {
        let mut agg = LineAggregator::new();
        agg.add("half", SemicolonCount { count: 1 }).unwrap();
        agg.add("other", SemicolonCount { count: 1 }).unwrap();

        let rows = agg.report(0.5, 0).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_report_zero_total() {
        let mut agg = LineAggregator::new();
        agg.add("empty.c", SemicolonCount { count: 0 }).unwrap();

        let unfiltered = agg.report(0.0, 0).unwrap();
        assert_eq!(unfiltered.len(), 1);
        assert_eq!(unfiltered[0].fraction, 0.0);

        assert!(agg.report(0.02, 0).unwrap().is_empty());
    }

    #[test]
    fn test_report_empty_aggregate() {
        let agg: LineAggregator<ProfileSample> = LineAggregator::new();
        assert!(agg.report(0.0, 0).unwrap().is_empty());
        assert!(agg.report(0.5, 0).unwrap().is_empty());
    }
}
