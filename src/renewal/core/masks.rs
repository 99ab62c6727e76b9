//! Availability masks and the date axes derived from them.
//!
//! Every aligned series carries two independent "is observed" patterns: case
//! counts and test counts. The model needs them in several frames of
//! reference:
//!
//! - over the full axis (`has_cases`, `has_testcounts`, `has_data`);
//! - relative to the with-cases sub-axis (`has_data_wrt_cases`) and the
//!   with-testcounts sub-axis (`has_data_wrt_testcounts`), for slicing nodes
//!   that are already shorter than the full axis.
//!
//! [`DateAxes`] materializes the four ordered coordinate axes that the graph
//! registers. By construction each axis is an ascending subsequence of the
//! full axis and `with_data ⊆ with_cases ∩ with_testcounts`.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Boolean availability masks over the full aligned axis and its sub-axes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityMasks {
    pub has_cases: Vec<bool>,
    pub has_testcounts: Vec<bool>,
    pub has_data: Vec<bool>,
    /// `has_data` restricted to positions where `has_cases` holds.
    pub has_data_wrt_cases: Vec<bool>,
    /// `has_data` restricted to positions where `has_testcounts` holds.
    pub has_data_wrt_testcounts: Vec<bool>,
}

impl AvailabilityMasks {
    /// Derive all masks from the aligned case and test columns.
    pub fn from_series(new_cases: &[Option<f64>], daily_tests: &[Option<f64>]) -> Self {
        let has_cases: Vec<bool> = new_cases.iter().map(Option::is_some).collect();
        let has_testcounts: Vec<bool> = daily_tests.iter().map(Option::is_some).collect();
        let has_data: Vec<bool> =
            has_cases.iter().zip(&has_testcounts).map(|(&c, &t)| c && t).collect();
        let has_data_wrt_cases = restrict(&has_data, &has_cases);
        let has_data_wrt_testcounts = restrict(&has_data, &has_testcounts);
        Self { has_cases, has_testcounts, has_data, has_data_wrt_cases, has_data_wrt_testcounts }
    }

    /// Number of days on the full axis.
    pub fn len(&self) -> usize {
        self.has_cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.has_cases.is_empty()
    }
}

/// The four ordered coordinate axes of an aligned series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateAxes {
    pub full: Vec<NaiveDate>,
    pub with_cases: Vec<NaiveDate>,
    pub with_testcounts: Vec<NaiveDate>,
    pub with_data: Vec<NaiveDate>,
}

impl DateAxes {
    pub fn from_masks(full: &[NaiveDate], masks: &AvailabilityMasks) -> Self {
        Self {
            full: full.to_vec(),
            with_cases: select(full, &masks.has_cases),
            with_testcounts: select(full, &masks.has_testcounts),
            with_data: select(full, &masks.has_data),
        }
    }
}

/// Positions where `mask` holds, in ascending order.
pub fn mask_indices(mask: &[bool]) -> Vec<usize> {
    mask.iter().enumerate().filter_map(|(i, &keep)| keep.then_some(i)).collect()
}

/// Elements of `values` where `mask` holds.
pub fn select<T: Clone>(values: &[T], mask: &[bool]) -> Vec<T> {
    values.iter().zip(mask).filter(|(_, keep)| **keep).map(|(v, _)| v.clone()).collect()
}

fn restrict(mask: &[bool], frame: &[bool]) -> Vec<bool> {
    select(mask, frame)
}
