//! Execution helper that runs an argmin solver on a log-density problem and
//! returns an [`ModeEstimate`].
use crate::optimization::{
    errors::OptResult,
    mode_finder::{Grad, LogDensity, ModeOptions, ModeEstimate, Theta, adapter::ArgMinAdapter},
};
use argmin::core::{Executor, State};
use log::info;

/// Run an argmin optimization for a log-density problem.
///
/// Wires the adapted problem, the solver, the initial parameter `theta0`
/// and the optional iteration cap, then converts the final state into a
/// [`ModeEstimate`] holding `ℓ` at the mode. With `opts.verbose` the
/// outcome is logged at info level.
///
/// # Errors
/// - Any argmin runtime error (solver, line search), via
///   `From<argmin::core::Error>`.
/// - Validation errors when building the outcome.
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &ModeOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<ModeEstimate>
where
    F: LogDensity,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    let outcome = ModeEstimate::new(
        result.take_best_param(),
        -result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )?;
    if opts.verbose {
        info!(
            "L-BFGS finished after {} iterations ({}): log density {:.6}",
            outcome.iterations, outcome.status, outcome.log_density
        );
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use crate::optimization::{
        errors::{OptError, OptResult},
        mode_finder::{Grad, LineSearcher, LogDensity, ModeOptions, Theta, Tolerances, maximize},
    };
    use ndarray::array;

    // Gaussian log density centered at (2, -1) with unit variances.
    struct Gaussian;

    impl LogDensity for Gaussian {
        fn value(&self, theta: &Theta) -> OptResult<f64> {
            Ok(-0.5 * ((theta[0] - 2.0).powi(2) + (theta[1] + 1.0).powi(2)))
        }

        fn check(&self, theta: &Theta) -> OptResult<()> {
            if theta.len() == 2 {
                Ok(())
            } else {
                Err(OptError::GradientDimMismatch { expected: 2, found: theta.len() })
            }
        }

        fn grad(&self, theta: &Theta) -> OptResult<Grad> {
            Ok(array![-(theta[0] - 2.0), -(theta[1] + 1.0)])
        }
    }

    #[test]
    // Purpose
    // -------
    // Both line searches locate the mode of a Gaussian.
    //
    // Given
    // -----
    // - Start at the origin, tol_grad 1e-8, up to 100 iterations.
    //
    // Expect
    // ------
    // - θ̂ ≈ (2, -1), ℓ(θ̂) ≈ 0, `converged` set.
    fn maximize_finds_gaussian_mode_with_either_line_search() {
        let tols = Tolerances::new(Some(1e-8), None, Some(100)).expect("valid tolerances");
        for ls in [LineSearcher::MoreThuente, LineSearcher::HagerZhang] {
            let opts = ModeOptions::new(tols, ls, false, None).expect("valid options");

            let out = maximize(&Gaussian, array![0.0, 0.0], &opts).expect("optimization succeeds");

            assert!((out.mode[0] - 2.0).abs() < 1e-5, "{ls:?}: {:?}", out.mode);
            assert!((out.mode[1] + 1.0).abs() < 1e-5, "{ls:?}: {:?}", out.mode);
            assert!(out.log_density.abs() < 1e-9);
            assert!(out.converged);
        }
    }

    #[test]
    // Purpose
    // -------
    // The start point is checked before any solver work.
    //
    // Given
    // -----
    // - A three-element start for a two-parameter density.
    //
    // Expect
    // ------
    // - The density's own `check` error.
    fn maximize_rejects_invalid_start() {
        let result = maximize(&Gaussian, array![0.0, 0.0, 0.0], &ModeOptions::default());

        assert_eq!(result, Err(OptError::GradientDimMismatch { expected: 2, found: 3 }));
    }
}
