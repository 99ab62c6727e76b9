//! Errors for the renewal model (observation validation, alignment,
//! distribution checks, kernel/graph construction, and density evaluation).
//!
//! This module defines [`RenewalError`], the validation error family raised
//! while turning raw observations into a probabilistic graph and while
//! evaluating that graph's log density. It implements `Display`/`Error` and
//! converts into the optimizer and sampler error surfaces.
//!
//! ## Conventions
//! - **Indices are 0-based** and refer to the offending position in the input
//!   that was being validated (table row, distribution weight, θ element).
//! - Build-time errors abort construction immediately; no partially built
//!   graph is ever handed back to the caller.
//! - Numerical degeneracies (zero totals, non-finite densities) are **not**
//!   errors here; they flow into outputs as non-finite values.
use statrs::distribution::{ExpError, GammaError, NormalError};

/// Result alias for renewal-model operations that may produce [`RenewalError`].
pub type RenewalResult<T> = Result<T, RenewalError>;

/// Unified validation error for the renewal model.
#[derive(Debug, Clone, PartialEq)]
pub enum RenewalError {
    // ---- Observation table ----
    /// A date label could not be parsed as an ISO-8601 calendar date.
    InvalidDate { index: usize, label: String },

    /// Dates must be strictly ascending (no duplicates).
    UnsortedIndex { index: usize },

    /// Observation table has no rows.
    EmptySeries,

    /// A column's length does not match the number of dates.
    ColumnLengthMismatch { column: String, expected: usize, actual: usize },

    /// The requested column is not part of the table.
    MissingColumn { column: String },

    /// A column with the same name was already added.
    DuplicateColumn { column: String },

    /// Observed values must be non-negative.
    NegativeValue { column: String, index: usize, value: f64 },

    /// Observed values must be finite when present.
    NonFiniteValue { column: String, index: usize, value: f64 },

    /// The buffer reaches back past the earliest representable date.
    BufferOutOfRange { buffer_days: usize, first_day: String },

    // ---- Distributions / kernel ----
    /// Probability mass must have at least one weight.
    EmptyDistribution { name: &'static str },

    /// Probability mass weights must be non-negative.
    NegativeWeight { name: &'static str, index: usize, value: f64 },

    /// Probability mass weights must be finite.
    NonFiniteWeight { name: &'static str, index: usize, value: f64 },

    /// The aligned axis needs at least two days for the renewal recursion.
    AxisTooShort { len: usize },

    // ---- Graph structure ----
    /// A node with this name already exists in the graph.
    DuplicateNode { name: String },

    /// A coordinate axis with this name already exists in the graph.
    DuplicateAxis { name: String },

    /// A node references an id that is not (yet) part of the graph.
    UnknownNode { id: usize },

    /// A lookup by name found no matching node.
    UnknownNodeName { name: String },

    /// A node declares a dim that is not a registered coordinate axis.
    UnknownAxis { name: String },

    /// Node values do not match the declared dims / expected length.
    ShapeMismatch { name: String, expected: usize, actual: usize },

    /// Prior hyper-parameters must be finite and strictly positive.
    InvalidPriorParameter { param: &'static str, value: f64 },

    // ---- Density evaluation ----
    /// Unconstrained parameter vector has the wrong length.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// A constrained value was supplied for a node that is not a free variable.
    UnknownFreeVariable { name: String },

    /// No value was supplied for a free variable.
    MissingFreeVariable { name: String },

    /// Constrained value outside the support of its prior (e.g. seed <= 0).
    OutOfSupport { name: String, index: usize, value: f64 },

    // ---- statrs distribution errors ----
    /// Wrapper for statrs::distribution::NormalError
    InvalidNormalParam,

    /// Wrapper for statrs::distribution::ExpError
    InvalidExpParam,

    /// Wrapper for statrs::distribution::GammaError
    InvalidGammaParam,
}

impl std::error::Error for RenewalError {}

impl std::fmt::Display for RenewalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Observation table ----
            RenewalError::InvalidDate { index, label } => {
                write!(f, "Index label at position {index} is not a date: '{label}'")
            }
            RenewalError::UnsortedIndex { index } => {
                write!(f, "Date index must be strictly ascending; violated at position {index}")
            }
            RenewalError::EmptySeries => {
                write!(f, "Observation table is empty.")
            }
            RenewalError::ColumnLengthMismatch { column, expected, actual } => {
                write!(f, "Column '{column}' has {actual} values, expected {expected}")
            }
            RenewalError::MissingColumn { column } => {
                write!(f, "Column '{column}' is missing from the observation table")
            }
            RenewalError::DuplicateColumn { column } => {
                write!(f, "Column '{column}' already exists")
            }
            RenewalError::NegativeValue { column, index, value } => {
                write!(f, "Column '{column}' has a negative value at index {index}: {value}")
            }
            RenewalError::NonFiniteValue { column, index, value } => {
                write!(f, "Column '{column}' has a non-finite value at index {index}: {value}")
            }
            RenewalError::BufferOutOfRange { buffer_days, first_day } => {
                write!(f, "{buffer_days} buffer days before {first_day} leave the calendar range")
            }

            // ---- Distributions / kernel ----
            RenewalError::EmptyDistribution { name } => {
                write!(f, "Distribution '{name}' is empty")
            }
            RenewalError::NegativeWeight { name, index, value } => {
                write!(f, "Distribution '{name}' has a negative weight at index {index}: {value}")
            }
            RenewalError::NonFiniteWeight { name, index, value } => {
                write!(f, "Distribution '{name}' has a non-finite weight at index {index}: {value}")
            }
            RenewalError::AxisTooShort { len } => {
                write!(f, "Aligned date axis has {len} day(s); at least 2 are required")
            }

            // ---- Graph structure ----
            RenewalError::DuplicateNode { name } => {
                write!(f, "Graph already contains a node named '{name}'")
            }
            RenewalError::DuplicateAxis { name } => {
                write!(f, "Graph already contains a coordinate axis named '{name}'")
            }
            RenewalError::UnknownNode { id } => {
                write!(f, "Node id {id} is not defined in the graph")
            }
            RenewalError::UnknownNodeName { name } => {
                write!(f, "Graph has no node named '{name}'")
            }
            RenewalError::UnknownAxis { name } => {
                write!(f, "Coordinate axis '{name}' is not defined in the graph")
            }
            RenewalError::ShapeMismatch { name, expected, actual } => {
                write!(f, "Node '{name}' has length {actual}, expected {expected}")
            }
            RenewalError::InvalidPriorParameter { param, value } => {
                write!(f, "Prior parameter '{param}' must be finite and > 0; got {value}")
            }

            // ---- Density evaluation ----
            RenewalError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            RenewalError::UnknownFreeVariable { name } => {
                write!(f, "'{name}' is not a free random variable of the graph")
            }
            RenewalError::MissingFreeVariable { name } => {
                write!(f, "No value supplied for free variable '{name}'")
            }
            RenewalError::OutOfSupport { name, index, value } => {
                write!(f, "Value {value} at index {index} is outside the support of '{name}'")
            }

            // ---- statrs distribution errors ----
            RenewalError::InvalidNormalParam => {
                write!(f, "Invalid normal distribution parameters")
            }
            RenewalError::InvalidExpParam => {
                write!(f, "Invalid exponential distribution parameter")
            }
            RenewalError::InvalidGammaParam => {
                write!(f, "Invalid gamma distribution parameters")
            }
        }
    }
}

impl From<NormalError> for RenewalError {
    fn from(_: NormalError) -> Self {
        RenewalError::InvalidNormalParam
    }
}

impl From<ExpError> for RenewalError {
    fn from(_: ExpError) -> Self {
        RenewalError::InvalidExpParam
    }
}

impl From<GammaError> for RenewalError {
    fn from(_: GammaError) -> Self {
        RenewalError::InvalidGammaParam
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Display strings carry the offending field values.
    // - statrs constructor errors convert into the matching wrapper variant.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Display output should name the offending column and index.
    //
    // Given
    // -----
    // - A `NegativeValue` error for column "tests" at index 3.
    //
    // Expect
    // ------
    // - The rendered message contains the column name, index and value.
    fn display_negative_value_mentions_column_and_index() {
        let err = RenewalError::NegativeValue { column: "tests".to_string(), index: 3, value: -1.0 };

        let msg = err.to_string();

        assert!(msg.contains("tests"));
        assert!(msg.contains("index 3"));
        assert!(msg.contains("-1"));
    }

    #[test]
    // Purpose
    // -------
    // statrs errors are mapped onto the wrapper variants.
    //
    // Given
    // -----
    // - An invalid exponential rate and an invalid gamma shape.
    //
    // Expect
    // ------
    // - `InvalidExpParam` and `InvalidGammaParam` respectively.
    fn statrs_errors_convert_to_wrappers() {
        let exp_err = statrs::distribution::Exp::new(-1.0).unwrap_err();
        let gamma_err = statrs::distribution::Gamma::new(-1.0, 1.0).unwrap_err();

        assert_eq!(RenewalError::from(exp_err), RenewalError::InvalidExpParam);
        assert_eq!(RenewalError::from(gamma_err), RenewalError::InvalidGammaParam);
    }
}
