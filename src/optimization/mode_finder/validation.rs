//! Validation helpers for mode finding.
//!
//! Tolerances must be finite and strictly positive when set. Gradients,
//! modes and log-density values must be finite.
use crate::optimization::{
    errors::{OptError, OptResult},
    mode_finder::{Grad, Theta},
};

/// Why a set tolerance is rejected, if it is.
fn tolerance_problem(tol: f64) -> Option<&'static str> {
    if !tol.is_finite() {
        Some("must be finite")
    } else if tol <= 0.0 {
        Some("must be positive")
    } else {
        None
    }
}

/// First non-finite entry as `(index, value)`.
fn first_non_finite(values: &Theta) -> Option<(usize, f64)> {
    values.iter().copied().enumerate().find(|(_, v)| !v.is_finite())
}

/// # Errors
/// [`OptError::InvalidGradientTolerance`] for a non-finite or non-positive value.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    match tol.and_then(|t| tolerance_problem(t).map(|reason| (t, reason))) {
        Some((tol, reason)) => Err(OptError::InvalidGradientTolerance { tol, reason }),
        None => Ok(()),
    }
}

/// # Errors
/// [`OptError::InvalidDensityTolerance`] for a non-finite or non-positive value.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    match tol.and_then(|t| tolerance_problem(t).map(|reason| (t, reason))) {
        Some((tol, reason)) => Err(OptError::InvalidDensityTolerance { tol, reason }),
        None => Ok(()),
    }
}

/// Check a gradient's length against `dim` and that every entry is finite.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] on a length mismatch.
/// - [`OptError::InvalidGradient`] at the first non-finite entry.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match first_non_finite(grad) {
        Some((index, value)) => Err(OptError::InvalidGradient { index, value, reason: "must be finite" }),
        None => Ok(()),
    }
}

/// Unwrap the solver's best θ, which must exist and be finite.
///
/// # Errors
/// - [`OptError::MissingMode`] for `None`.
/// - [`OptError::NonFiniteMode`] at the first non-finite entry.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta = theta_hat.ok_or(OptError::MissingMode)?;
    match first_non_finite(&theta) {
        Some((index, value)) => Err(OptError::NonFiniteMode { index, value, reason: "must be finite" }),
        None => Ok(theta),
    }
}

/// # Errors
/// [`OptError::NonFiniteLogDensity`] for `NaN` or `±∞`.
pub fn validate_value(value: f64) -> OptResult<()> {
    if value.is_finite() { Ok(()) } else { Err(OptError::NonFiniteLogDensity { value }) }
}
