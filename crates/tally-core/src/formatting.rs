//! Fixed-width row rendering shared by the three tools.

use crate::error::Result;
use crate::models::ReportEntry;

/// `part / whole`, or `0.0` when `whole` is zero.
///
/// # Examples
///
/// ```
/// use tally_core::formatting::fraction;
///
/// assert!((fraction(50.0, 200.0) - 0.25).abs() < 1e-9);
/// assert_eq!(fraction(10.0, 0.0), 0.0);
/// ```
pub fn fraction(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    part / whole
}

/// Render a fraction as a percentage with one decimal place.
///
/// # Examples
///
/// ```
/// use tally_core::formatting::format_percent;
///
/// assert_eq!(format_percent(1.0), "100.0%");
/// assert_eq!(format_percent(0.0234), "2.3%");
/// ```
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// One `profadd` row: time share, sample count, location.
///
/// # Examples
///
/// ```
/// use tally_core::formatting::format_profile_row;
///
/// assert_eq!(format_profile_row(3.0, 8, "java.lang.Object.wait"), "3.0%   8 java.lang.Object.wait");
/// assert_eq!(format_profile_row(42.24, 1234, "x"), "42.2% 1234 x");
/// ```
pub fn format_profile_row(time: f64, count: u64, location: &str) -> String {
    format!("{:2.1}% {:3} {}", time, count, location)
}

/// One `memprof` row: object count, bytes, share of bytes, type name.
///
/// # Examples
///
/// ```
/// use tally_core::formatting::format_memory_row;
///
/// assert_eq!(
///     format_memory_row(2, 150, 1.0, "Foo"),
///     "       2        150 (100.0%) Foo"
/// );
/// ```
pub fn format_memory_row(count: u64, bytes: u64, fraction: f64, type_name: &str) -> String {
    format!(
        "{:>8} {:>10} ({:>6}) {}",
        count,
        bytes,
        format_percent(fraction),
        type_name
    )
}

/// One `scc` row: right-aligned semicolon count and a file name or label.
///
/// # Examples
///
/// ```
/// use tally_core::formatting::format_file_row;
///
/// assert_eq!(format_file_row(2, "a.c"), "     2  a.c");
/// assert_eq!(format_file_row(0, ""), "     0  ");
/// ```
pub fn format_file_row(count: u64, name: &str) -> String {
    format!("{:6}  {}", count, name)
}

/// Report rows as a pretty-printed JSON array.
pub fn format_report_json(rows: &[ReportEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
