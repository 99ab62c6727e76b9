use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::renewal::errors::{RenewalError, RenewalResult};

/// Name of the case-count column every table carries.
pub const NEW_CASES: &str = "new_cases";

/// `ObservationTable` — date-keyed raw observations.
///
/// Purpose
/// -------
/// Hold the raw daily series a region reports: a `new_cases` column and any
/// number of caller-named extra columns (one of which carries test counts).
/// Missing values are represented as `None` and mean "unobserved".
///
/// Invariants
/// ----------
/// - At least one date.
/// - Dates are strictly ascending (unique), but need not be contiguous.
/// - Every column has exactly one entry per date.
/// - Present values are finite and non-negative.
///
/// Notes
/// -----
/// - Columns are kept in a `BTreeMap`, so iteration order is by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    dates: Vec<NaiveDate>,
    new_cases: Vec<Option<f64>>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl ObservationTable {
    /// Construct a validated table from dates and daily case counts.
    ///
    /// Errors
    /// ------
    /// - `RenewalError::EmptySeries` when `dates` is empty.
    /// - `RenewalError::UnsortedIndex { index }` at the first date that is not
    ///   strictly after its predecessor.
    /// - `RenewalError::ColumnLengthMismatch` when `new_cases.len() != dates.len()`.
    /// - `RenewalError::NonFiniteValue` / `NegativeValue` for invalid counts.
    pub fn new(dates: Vec<NaiveDate>, new_cases: Vec<Option<f64>>) -> RenewalResult<Self> {
        if dates.is_empty() {
            return Err(RenewalError::EmptySeries);
        }
        for (index, pair) in dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(RenewalError::UnsortedIndex { index: index + 1 });
            }
        }
        validate_column(NEW_CASES, &new_cases, dates.len())?;
        Ok(Self { dates, new_cases, columns: BTreeMap::new() })
    }

    /// Construct a table from ISO-8601 (`YYYY-MM-DD`) date labels.
    ///
    /// Errors
    /// ------
    /// - `RenewalError::InvalidDate` for the first label that does not parse.
    /// - Everything [`ObservationTable::new`] can return.
    pub fn from_iso_dates(labels: &[&str], new_cases: Vec<Option<f64>>) -> RenewalResult<Self> {
        let dates = labels
            .iter()
            .enumerate()
            .map(|(index, label)| {
                NaiveDate::parse_from_str(label, "%Y-%m-%d")
                    .map_err(|_| RenewalError::InvalidDate { index, label: label.to_string() })
            })
            .collect::<RenewalResult<Vec<_>>>()?;
        Self::new(dates, new_cases)
    }

    /// Add a named column (e.g. the test counts), consuming and returning the table.
    ///
    /// Errors
    /// ------
    /// - `RenewalError::DuplicateColumn` if the name is taken (including `new_cases`).
    /// - Length / value validation errors as in [`ObservationTable::new`].
    pub fn with_column(mut self, name: &str, values: Vec<Option<f64>>) -> RenewalResult<Self> {
        if name == NEW_CASES || self.columns.contains_key(name) {
            return Err(RenewalError::DuplicateColumn { column: name.to_string() });
        }
        validate_column(name, &values, self.dates.len())?;
        self.columns.insert(name.to_string(), values);
        Ok(self)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn new_cases(&self) -> &[Option<f64>] {
        &self.new_cases
    }

    /// Look up a caller-named column.
    ///
    /// Errors
    /// ------
    /// - `RenewalError::MissingColumn` when no such column exists.
    pub fn column(&self, name: &str) -> RenewalResult<&[Option<f64>]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| RenewalError::MissingColumn { column: name.to_string() })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

fn validate_column(name: &str, values: &[Option<f64>], expected: usize) -> RenewalResult<()> {
    if values.len() != expected {
        return Err(RenewalError::ColumnLengthMismatch {
            column: name.to_string(),
            expected,
            actual: values.len(),
        });
    }
    for (index, value) in values.iter().enumerate() {
        if let Some(value) = *value {
            if !value.is_finite() {
                return Err(RenewalError::NonFiniteValue { column: name.to_string(), index, value });
            }
            if value < 0.0 {
                return Err(RenewalError::NegativeValue { column: name.to_string(), index, value });
            }
        }
    }
    Ok(())
}
