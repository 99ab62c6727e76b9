use ndarray::{Array1, ArrayView1};

use crate::renewal::errors::{RenewalError, RenewalResult};

/// `Pmf` — validated probability mass over day offsets `0, 1, 2, …`.
///
/// Used for both the generation-time and the reporting-delay distribution.
/// Weights need not sum to exactly one; the delay mass in particular is
/// interpreted as "probability an infection is ever captured".
///
/// Invariants
/// ----------
/// - At least one weight.
/// - Every weight is finite and `>= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pmf {
    name: &'static str,
    weights: Array1<f64>,
}

impl Pmf {
    /// Validate `weights` as a probability mass named `name` (used in errors).
    ///
    /// Errors
    /// ------
    /// - `RenewalError::EmptyDistribution` when `weights` is empty.
    /// - `RenewalError::NonFiniteWeight` / `NegativeWeight` for the first
    ///   offending weight.
    pub fn new(name: &'static str, weights: &[f64]) -> RenewalResult<Self> {
        if weights.is_empty() {
            return Err(RenewalError::EmptyDistribution { name });
        }
        for (index, &value) in weights.iter().enumerate() {
            if !value.is_finite() {
                return Err(RenewalError::NonFiniteWeight { name, index, value });
            }
            if value < 0.0 {
                return Err(RenewalError::NegativeWeight { name, index, value });
            }
        }
        Ok(Self { name, weights: Array1::from(weights.to_vec()) })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Total mass.
    pub fn total(&self) -> f64 {
        self.weights.sum()
    }

    /// Survival curve `1 - cumsum(p)`; `survival[k]` is the probability that
    /// the event has not happened by the end of day `k`.
    pub fn survival(&self) -> Array1<f64> {
        survival(self.weights.view())
    }
}

/// `1 - cumsum(weights)`.
pub fn survival(weights: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut acc = 0.0;
    weights
        .iter()
        .map(|&w| {
            acc += w;
            1.0 - acc
        })
        .collect()
}
