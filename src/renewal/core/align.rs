//! align — reindex raw observations onto a gapless daily axis.
//!
//! Purpose
//! -------
//! Turn an [`ObservationTable`] into an [`AlignedObservations`]: a contiguous,
//! daily, strictly ascending date axis that starts `buffer_days` before the
//! first day with reported cases, plus the availability masks and date axes
//! the model builder needs.
//!
//! Key behaviors
//! -------------
//! - Locate the first row with `new_cases > 0` and drop everything before it.
//! - Prepend `buffer_days` unobserved days and fill internal gaps with
//!   unobserved entries.
//! - Rename the caller-named test column to `daily_tests`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Output dates are contiguous calendar days, one per entry.
//! - If no row has `new_cases > 0` the lookup falls back to the first row,
//!   so buffer days are still prepended before the very first date. This is
//!   a documented degenerate case and is not corrected.
//!
//! Testing notes
//! -------------
//! - Unit tests cover trimming, gap filling, buffer days, the all-zero case,
//!   and a property test for contiguity of the aligned axis.
use chrono::{Duration, NaiveDate};
use log::info;

use crate::renewal::{
    core::{
        masks::{AvailabilityMasks, DateAxes},
        observations::ObservationTable,
    },
    errors::{RenewalError, RenewalResult},
};

/// Default number of unobserved lead-in days.
pub const DEFAULT_BUFFER_DAYS: usize = 10;

/// Observations on a gapless daily axis, with masks and derived axes.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedObservations {
    pub dates: Vec<NaiveDate>,
    pub new_cases: Vec<Option<f64>>,
    pub daily_tests: Vec<Option<f64>>,
    pub masks: AvailabilityMasks,
    pub axes: DateAxes,
    pub buffer_days: usize,
}

impl AlignedObservations {
    /// Number of days on the full axis (`N`).
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Largest observed test count, or `None` if no test count is present.
    pub fn max_daily_tests(&self) -> Option<f64> {
        self.daily_tests.iter().flatten().copied().reduce(f64::max)
    }
}

/// Align `table` onto a contiguous daily axis with `buffer_days` lead-in days.
///
/// Parameters
/// ----------
/// - `table`: validated raw observations.
/// - `test_col`: name of the column that carries daily test counts.
/// - `buffer_days`: number of unobserved days to prepend.
///
/// Errors
/// ------
/// - `RenewalError::MissingColumn` if `test_col` is not part of `table`.
/// - `RenewalError::BufferOutOfRange` if the axis would start before the
///   earliest representable date.
pub fn align_observations(
    table: &ObservationTable, test_col: &str, buffer_days: usize,
) -> RenewalResult<AlignedObservations> {
    let tests = table.column(test_col)?;
    info!("Model will start with {buffer_days} unobserved buffer days before the data.");

    let first = first_nonzero(table.new_cases());
    let dates = &table.dates()[first..];
    let (Some(&first_day), Some(&end)) = (dates.first(), dates.last()) else {
        return Err(RenewalError::EmptySeries);
    };
    let start = i64::try_from(buffer_days)
        .ok()
        .and_then(Duration::try_days)
        .and_then(|lead| first_day.checked_sub_signed(lead))
        .ok_or_else(|| RenewalError::BufferOutOfRange { buffer_days, first_day: first_day.to_string() })?;

    let n = usize::try_from((end - start).num_days()).unwrap_or(0) + 1;
    let mut new_cases = vec![None; n];
    let mut daily_tests = vec![None; n];
    for (offset, date) in dates.iter().enumerate() {
        let row = first + offset;
        let slot = position(start, *date);
        new_cases[slot] = table.new_cases()[row];
        daily_tests[slot] = tests[row];
    }
    let full: Vec<NaiveDate> = (0..n).map(|i| start + days(i)).collect();

    let masks = AvailabilityMasks::from_series(&new_cases, &daily_tests);
    let axes = DateAxes::from_masks(&full, &masks);
    Ok(AlignedObservations { dates: full, new_cases, daily_tests, masks, axes, buffer_days })
}

/// Index of the first row with strictly positive cases; 0 if there is none.
fn first_nonzero(new_cases: &[Option<f64>]) -> usize {
    new_cases.iter().position(|v| v.is_some_and(|c| c > 0.0)).unwrap_or(0)
}

fn days(n: usize) -> Duration {
    Duration::days(n as i64)
}

fn position(start: NaiveDate, date: NaiveDate) -> usize {
    (date - start).num_days() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renewal::core::observations::ObservationTable;
    use proptest::prelude::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Leading zero trimming and buffer prepending.
    // - Gap filling for internal missing days.
    // - Degenerate all-zero input.
    // - Contiguity and subset properties for arbitrary inputs.
    // -------------------------------------------------------------------------

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).expect("valid date")
    }

    fn table(dates: Vec<NaiveDate>, cases: Vec<Option<f64>>, tests: Vec<Option<f64>>) -> ObservationTable {
        ObservationTable::new(dates, cases)
            .and_then(|t| t.with_column("tests", tests))
            .expect("valid table")
    }

    #[test]
    // Purpose
    // -------
    // Rows before the first positive count are dropped and replaced by
    // `buffer_days` unobserved days.
    //
    // Given
    // -----
    // - Dates 1..=5 with cases [0, 0, 3, 4, 5] and tests everywhere.
    // - buffer_days = 2.
    //
    // Expect
    // ------
    // - Axis starts on day 1 (3 - 2) and ends on day 5.
    // - Days 1 and 2 are unobserved even though the raw table had zeros there.
    fn align_trims_leading_zeros_and_prepends_buffer() {
        let t = table(
            (1..=5).map(day).collect(),
            vec![Some(0.0), Some(0.0), Some(3.0), Some(4.0), Some(5.0)],
            vec![Some(100.0); 5],
        );

        let aligned = align_observations(&t, "tests", 2).expect("alignment should succeed");

        assert_eq!(aligned.dates, (1..=5).map(day).collect::<Vec<_>>());
        assert_eq!(aligned.new_cases, vec![None, None, Some(3.0), Some(4.0), Some(5.0)]);
        assert_eq!(aligned.daily_tests[..2], [None::<f64>, None]);
        assert_eq!(aligned.axes.with_data, vec![day(3), day(4), day(5)]);
    }

    #[test]
    // Purpose
    // -------
    // Internal calendar gaps become unobserved days.
    //
    // Given
    // -----
    // - Dates [1, 2, 5] with positive cases, buffer 0.
    //
    // Expect
    // ------
    // - Five contiguous days; days 3 and 4 have no cases and no tests.
    fn align_fills_internal_gaps() {
        let t = table(
            vec![day(1), day(2), day(5)],
            vec![Some(1.0), Some(2.0), Some(3.0)],
            vec![Some(10.0), None, Some(12.0)],
        );

        let aligned = align_observations(&t, "tests", 0).expect("alignment should succeed");

        assert_eq!(aligned.len(), 5);
        assert_eq!(aligned.new_cases[2..4], [None::<f64>, None]);
        assert_eq!(aligned.masks.has_testcounts, vec![true, false, false, false, true]);
        assert_eq!(aligned.max_daily_tests(), Some(12.0));
    }

    #[test]
    // Purpose
    // -------
    // The all-zero series degenerates to index 0 (documented edge case).
    //
    // Given
    // -----
    // - Three days of zero cases, buffer 4.
    //
    // Expect
    // ------
    // - Seven days: four buffer days plus all three raw days.
    fn align_all_zero_series_keeps_every_row() {
        let t = table((10..=12).map(day).collect(), vec![Some(0.0); 3], vec![Some(5.0); 3]);

        let aligned = align_observations(&t, "tests", 4).expect("alignment should succeed");

        assert_eq!(aligned.len(), 7);
        assert_eq!(aligned.dates[0], day(6));
        assert_eq!(aligned.new_cases[4..], [Some(0.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    // Purpose
    // -------
    // A missing test column is a validation error.
    //
    // Given
    // -----
    // - A table with a "tests" column, queried for "total".
    //
    // Expect
    // ------
    // - `RenewalError::MissingColumn`.
    fn align_rejects_missing_test_column() {
        let t = table(vec![day(1)], vec![Some(1.0)], vec![Some(1.0)]);

        let result = align_observations(&t, "total", 3);

        assert!(matches!(result, Err(RenewalError::MissingColumn { .. })));
    }

    #[test]
    // Purpose
    // -------
    // A buffer reaching past the calendar is an error, not a wrap or panic.
    //
    // Given
    // -----
    // - One day of cases; buffers of `usize::MAX`, `i64::MAX` days and
    //   10^8 days (representable as a duration, not as a date).
    //
    // Expect
    // ------
    // - `BufferOutOfRange` for each.
    fn align_rejects_buffer_beyond_calendar() {
        let t = table(vec![day(1)], vec![Some(1.0)], vec![Some(1.0)]);

        for buffer in [usize::MAX, i64::MAX as usize, 100_000_000] {
            let result = align_observations(&t, "tests", buffer);

            assert!(
                matches!(result, Err(RenewalError::BufferOutOfRange { buffer_days, .. }) if buffer_days == buffer),
                "buffer {buffer}: {result:?}"
            );
        }
    }

    proptest! {
        #[test]
        fn aligned_axis_is_contiguous_and_nested(
            rows in prop::collection::btree_map(
                0u32..60,
                (prop::option::of(0.0f64..50.0), prop::option::of(0.0f64..500.0)),
                1..30,
            ),
            buffer in 0usize..12,
        ) {
            let base = NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date");
            let dates: Vec<NaiveDate> = rows.keys().map(|&o| base + Duration::days(o as i64)).collect();
            let cases: Vec<Option<f64>> = rows.values().map(|v| v.0).collect();
            let tests: Vec<Option<f64>> = rows.values().map(|v| v.1).collect();
            let t = table(dates, cases, tests);

            let aligned = align_observations(&t, "tests", buffer).expect("alignment should succeed");

            for pair in aligned.dates.windows(2) {
                prop_assert_eq!(pair[1] - pair[0], Duration::days(1));
            }
            for d in &aligned.axes.with_data {
                prop_assert!(aligned.axes.with_cases.contains(d));
                prop_assert!(aligned.axes.with_testcounts.contains(d));
            }
            for d in aligned.axes.with_cases.iter().chain(&aligned.axes.with_testcounts) {
                prop_assert!(aligned.axes.full.contains(d));
            }
            prop_assert!(aligned.new_cases[..buffer.min(aligned.len())].iter().all(Option::is_none));
        }
    }
}
