//! distributions — log densities and their gradients.
//!
//! Purpose
//! -------
//! Evaluate the priors of the random variables and the negative-binomial
//! observation model, together with analytic gradients w.r.t. the value
//! (priors) or the parameters (likelihood).
//!
//! Conventions
//! -----------
//! - Densities are evaluated in constrained space; Jacobian terms of the
//!   unconstrained parameterization are added by the density evaluator.
//! - Log densities outside the support are `-∞`, never errors. Errors only
//!   signal invalid hyper-parameters.
//! - The negative binomial uses the mean/dispersion form
//!   `NB(y | mu, α) = Γ(y+α) / (Γ(α) y!) · (α/(α+mu))^α · (mu/(α+mu))^y`.
use ndarray::{Array1, ArrayView1};
use statrs::{
    distribution::{Continuous, Exp, Gamma, Normal},
    function::gamma::{digamma, ln_gamma},
};

use crate::renewal::{errors::RenewalResult, graph::node::Prior};

impl Prior {
    /// Log prior density of a constrained value.
    ///
    /// Errors
    /// ------
    /// - Wrapped statrs errors when the hyper-parameters are invalid.
    pub fn ln_density(&self, value: ArrayView1<'_, f64>) -> RenewalResult<f64> {
        match *self {
            Prior::GaussianRandomWalk { sigma } => {
                let step = Normal::new(0.0, sigma)?;
                Ok(value.windows(2).into_iter().map(|w| step.ln_pdf(w[1] - w[0])).sum())
            }
            Prior::Exponential { rate } => {
                let dist = Exp::new(rate)?;
                Ok(value.iter().map(|&x| dist.ln_pdf(x)).sum())
            }
            Prior::Gamma { shape, rate } => {
                let dist = Gamma::new(shape, rate)?;
                Ok(value.iter().map(|&x| dist.ln_pdf(x)).sum())
            }
        }
    }

    /// Gradient of [`Prior::ln_density`] w.r.t. the constrained value.
    pub fn grad_ln_density(&self, value: ArrayView1<'_, f64>) -> Array1<f64> {
        match *self {
            Prior::GaussianRandomWalk { sigma } => {
                let var = sigma * sigma;
                let mut grad = Array1::zeros(value.len());
                for i in 1..value.len() {
                    let pull = (value[i] - value[i - 1]) / var;
                    grad[i] -= pull;
                    grad[i - 1] += pull;
                }
                grad
            }
            Prior::Exponential { rate } => Array1::from_elem(value.len(), -rate),
            Prior::Gamma { shape, rate } => value.mapv(|x| (shape - 1.0) / x - rate),
        }
    }
}

/// Log probability of `y` under `NB(mu, alpha)`.
///
/// `mu = 0` is only compatible with `y = 0`; other non-positive means give `-∞`.
pub fn negative_binomial_ln_pmf(y: f64, mu: f64, alpha: f64) -> f64 {
    if !(mu > 0.0) || !(alpha > 0.0) {
        return if mu == 0.0 && y == 0.0 && alpha > 0.0 { 0.0 } else { f64::NEG_INFINITY };
    }
    let total = alpha + mu;
    let count_term = if y == 0.0 { 0.0 } else { y * (mu / total).ln() };
    ln_gamma(y + alpha) - ln_gamma(alpha) - ln_gamma(y + 1.0) + alpha * (alpha / total).ln()
        + count_term
}

/// Partial derivatives `(∂/∂mu, ∂/∂alpha)` of [`negative_binomial_ln_pmf`].
///
/// The `y / mu` term is dropped for `y = 0`, so a zero count at `mu = 0`
/// stays finite.
pub fn negative_binomial_grad(y: f64, mu: f64, alpha: f64) -> (f64, f64) {
    let total = alpha + mu;
    let count_term = if y == 0.0 { 0.0 } else { y / mu };
    let d_mu = count_term - (alpha + y) / total;
    let d_alpha = digamma(y + alpha) - digamma(alpha) + (alpha / total).ln() + (mu - y) / total;
    (d_mu, d_alpha)
}
