//! scale — per-sample factor from inferred infections to case counts.
//!
//! Purpose
//! -------
//! The renewal model infers infections up to an unknown scale. The factor
//! compares, on the with-data dates only, the exposure-weighted
//! test-adjusted positives of each draw with the observed total:
//!
//! ```text
//! profile        = exposure[with_data] / max(exposure)
//! total_inferred = Σ tap[with_data] · profile          (per sample)
//! total_observed = Σ observed_positive[with_data]
//! p_observe      = Σ p_delay
//! scale          = total_observed / total_inferred / p_observe
//! ```
//!
//! Key behaviors
//! -------------
//! - Samples are flattened chain-major.
//! - A draw with `total_inferred = 0` yields a non-finite factor; it is
//!   kept, counted by [`ScaleFactor::non_finite_count`] and logged at warn
//!   level.
//! - The factor assumes every infection is eventually reported, so it is a
//!   lower bound.
use log::warn;
use ndarray::{Array1, Axis};

use crate::posterior::{
    errors::PosteriorResult,
    schema::{EXPOSURE, OBSERVED_POSITIVE, P_DELAY, TEST_ADJUSTED_POSITIVE},
    view::PosteriorView,
};

/// One scale factor per posterior sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleFactor {
    values: Array1<f64>,
}

impl ScaleFactor {
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Samples whose factor is NaN or infinite.
    pub fn non_finite_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_finite()).count()
    }
}

/// Compute the scale factor for every sample of `view`.
///
/// # Errors
/// - Layout errors from the view (missing variables, with-data dates absent
///   from an axis).
pub fn scale_factor(view: &PosteriorView<'_>) -> PosteriorResult<ScaleFactor> {
    let tap = view.per_sample(TEST_ADJUSTED_POSITIVE)?;
    let exposure = view.per_sample(EXPOSURE)?;
    let observed = view.vector(OBSERVED_POSITIVE)?;

    let tap = tap.select(Axis(1), &view.with_data_positions(TEST_ADJUSTED_POSITIVE)?);
    let max_exposure = exposure.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let profile = exposure.select(Axis(1), &view.with_data_positions(EXPOSURE)?) / max_exposure;
    let total_inferred = (&tap * &profile).sum_axis(Axis(1));

    let total_observed: f64 =
        view.with_data_positions(OBSERVED_POSITIVE)?.iter().map(|&i| observed[i]).sum();
    let p_observe = view.vector(P_DELAY)?.sum();

    let values = total_inferred.mapv(|inferred| total_observed / inferred / p_observe);
    let factor = ScaleFactor { values };
    let bad = factor.non_finite_count();
    if bad > 0 {
        warn!("{bad} of {} samples have a non-finite scale factor (zero inferred total).", factor.len());
    }
    Ok(factor)
}
