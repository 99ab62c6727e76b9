//! High-level entry point for maximizing a [`LogDensity`].
use crate::optimization::{
    errors::OptResult,
    mode_finder::{
        ModeEstimate, Theta,
        adapter::ArgMinAdapter,
        builders::{hager_zhang, more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogDensity, ModeOptions},
    },
};

/// Maximize `ℓ(θ)` using L-BFGS with the configured line search.
///
/// # Behavior
/// - Validates the start via `f.check(&theta0)`.
/// - Wraps `f` in an [`ArgMinAdapter`] minimizing `-ℓ(θ)`.
/// - Builds L-BFGS with Hager–Zhang or More–Thuente per `opts.line_searcher`
///   and delegates to [`run_lbfgs`].
///
/// # Errors
/// - Propagates `f.check`, builder, and runtime solver errors.
///
/// # Example
/// ```
/// use ndarray::{array, Array1};
/// use rtlive::optimization::{
///     errors::OptResult,
///     mode_finder::{maximize, LogDensity, ModeOptions},
/// };
///
/// struct Bowl;
/// impl LogDensity for Bowl {
///     fn value(&self, theta: &Array1<f64>) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Array1<f64>) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Bowl, array![0.5, -0.25], &ModeOptions::default())?;
/// assert!(out.log_density <= 0.0);
/// # Ok::<(), rtlive::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogDensity>(f: &F, theta0: Theta, opts: &ModeOptions) -> OptResult<ModeEstimate> {
    f.check(&theta0)?;
    let problem = ArgMinAdapter::new(f);
    match opts.line_searcher {
        LineSearcher::MoreThuente => run_lbfgs(theta0, opts, problem, more_thuente(opts)?),
        LineSearcher::HagerZhang => run_lbfgs(theta0, opts, problem, hager_zhang(opts)?),
    }
}
