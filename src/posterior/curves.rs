//! curves — scaled case curves from posterior infections.
//!
//! Purpose
//! -------
//! Turn the posterior of (relative) daily infections into three
//! date × sample curves in case units:
//!
//! - `new_cases = infections · scale_factor`
//! - `total_cases`: cumulative sum over dates
//! - `active_cases`: `new_cases` convolved with `p_active = 1 − cumsum(gt)`,
//!   truncated to the date axis; the generation time doubles as the
//!   probability that a case is still infectious `k` days later.
//!
//! Conventions
//! -----------
//! - Rows are dates (copied from the infections axis), columns are
//!   chain-major samples.
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::{
    posterior::{
        errors::PosteriorResult,
        schema::{INFECTIONS, P_GENERATION_TIME},
        view::PosteriorView,
    },
    renewal::core::{pmf::survival, recursion::convolve_truncated},
};

/// New, cumulative and active cases per date and sample.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseCurves {
    pub dates: Vec<NaiveDate>,
    pub new_cases: Array2<f64>,
    pub total_cases: Array2<f64>,
    pub active_cases: Array2<f64>,
}

impl CaseCurves {
    pub fn n_days(&self) -> usize {
        self.dates.len()
    }

    pub fn n_samples(&self) -> usize {
        self.new_cases.ncols()
    }
}

/// Compute the case curves of `view`.
///
/// # Errors
/// - Layout errors from the view and the scale factor.
pub fn case_curves(view: &PosteriorView<'_>) -> PosteriorResult<CaseCurves> {
    let infections = view.per_sample(INFECTIONS)?;
    let scale = view.scale_factor()?;
    let p_active = survival(view.vector(P_GENERATION_TIME)?);

    let new_cases = &infections.t() * scale.values();
    let total_cases = cumulative(new_cases.view());
    let active_cases = active(new_cases.view(), p_active.view());
    Ok(CaseCurves { dates: view.dates_of(INFECTIONS)?.to_vec(), new_cases, total_cases, active_cases })
}

/// Cumulative sum down each column.
pub fn cumulative(new_cases: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut total = new_cases.to_owned();
    total.accumulate_axis_inplace(Axis(0), |&previous, current| *current += previous);
    total
}

/// Causal convolution of each column with `p_active`, truncated to the
/// number of rows.
pub fn active(new_cases: ArrayView2<'_, f64>, p_active: ArrayView1<'_, f64>) -> Array2<f64> {
    let mut active = Array2::zeros(new_cases.dim());
    for (column, mut out) in new_cases.columns().into_iter().zip(active.columns_mut()) {
        out.assign(&convolve_truncated(column, p_active));
    }
    active
}
