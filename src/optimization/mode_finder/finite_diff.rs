//! mode_finder::finite_diff — finite-difference gradients with error capture.
//!
//! Purpose
//! -------
//! Approximate `∇f(θ)` when a [`LogDensity`](super::LogDensity) has no
//! analytic gradient, and check analytic gradients in tests. `finitediff`
//! closures must return plain `f64`, so evaluation errors are routed through
//! a shared `RefCell` and turned back into [`OptError`] afterwards.
//!
//! Key behaviors
//! -------------
//! - [`central_fd_grad`]: central differences; the preferred path.
//! - [`run_fd_diff`]: forward differences; the fallback when the central
//!   pass hit an error or produced a non-finite gradient.
//!
//! Invariants & assumptions
//! ------------------------
//! - Gradients returned from here always satisfy [`validate_grad`].
//! - An error captured inside the closure is a hard failure.
use crate::optimization::{
    errors::{OptError, OptResult},
    mode_finder::{Grad, Theta, validation::validate_grad},
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient of `func` at `theta`.
///
/// `func` is expected to store any evaluation error in `closure_err` and
/// return `NaN`; the cell is cleared on entry.
///
/// # Errors
/// - The captured error, converted to [`OptError`].
/// - [`OptError::GradientDimMismatch`] / [`OptError::InvalidGradient`] from
///   [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Central-difference gradient of a fallible objective.
///
/// # Errors
/// - The first error returned by `func`.
/// - Validation errors for non-finite entries.
pub fn central_fd_grad<G: Fn(&Theta) -> OptResult<f64>>(theta: &Theta, func: &G) -> OptResult<Grad> {
    let first_err: RefCell<Option<OptError>> = RefCell::new(None);
    let wrapped = |x: &Theta| match func(x) {
        Ok(v) => v,
        Err(e) => {
            first_err.borrow_mut().get_or_insert(e);
            f64::NAN
        }
    };
    let fd_grad = theta.central_diff(&wrapped);
    if let Some(err) = first_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}
