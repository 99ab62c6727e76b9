//! kernel — banded generation-time convolution matrix.
//!
//! Purpose
//! -------
//! Precompute the `(N - 1) × N` matrix `K` that turns the bounded look-back
//! sum of the renewal equation into a per-step dot product:
//!
//! ```text
//! infections[t] = r_t[t] · Σ_j K[t-1, j] · infections[j],   t = 1 … N-1
//! ```
//!
//! Key behaviors
//! -------------
//! - For day `t`, let `begin = max(0, t - len(gt) + 1)`. Row `t - 1` holds the
//!   reversed weights `gt[1 ..= t - begin]` at columns `[begin, t)`, i.e.
//!   `K[t-1, j] = gt[t - j]`, and zero elsewhere.
//! - `gt[0]` (same-day transmission) is never used.
//! - [`GenerationTimeKernel::band`] exposes the column range a row may be
//!   non-zero on, so the recursion can skip the zeros.
//!
//! Invariants & assumptions
//! ------------------------
//! - `N >= 2`.
//! - A generation-time mass of length 1 yields an all-zero kernel.
//!
//! Conventions
//! -----------
//! - Rows are indexed by `t - 1`, columns by the source day `j`.
use std::ops::Range;

use ndarray::{s, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::renewal::{
    core::pmf::Pmf,
    errors::{RenewalError, RenewalResult},
};

/// Immutable banded generation-time kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTimeKernel {
    matrix: Array2<f64>,
    /// Number of look-back days, `len(gt) - 1`.
    window: usize,
}

impl GenerationTimeKernel {
    /// Build the kernel for an axis of `n` days.
    ///
    /// Errors
    /// ------
    /// - `RenewalError::AxisTooShort` when `n < 2`.
    pub fn new(gt: &Pmf, n: usize) -> RenewalResult<Self> {
        if n < 2 {
            return Err(RenewalError::AxisTooShort { len: n });
        }
        let weights = gt.weights();
        let window = weights.len() - 1;
        let mut matrix = Array2::zeros((n - 1, n));
        for t in 1..n {
            let begin = t.saturating_sub(window);
            let count = t - begin;
            let reversed = weights.slice(s![1..=count; -1]);
            matrix.slice_mut(s![t - 1, begin..begin + count]).assign(&reversed);
        }
        Ok(Self { matrix, window })
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Axis length `N`.
    pub fn n_days(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Columns on which row `t - 1` may be non-zero.
    pub fn band(&self, t: usize) -> Range<usize> {
        t.saturating_sub(self.window)..t
    }

    /// Row `t - 1` restricted to its band.
    pub fn band_weights(&self, t: usize) -> ArrayView1<'_, f64> {
        let band = self.band(t);
        self.matrix.slice(s![t - 1, band])
    }
}
