//! Public surface for log-density maximization.
//!
//! - [`LogDensity`]: trait implemented by models.
//! - [`ModeOptions`] and [`Tolerances`]: optimizer configuration.
//! - [`LineSearcher`]: line search used by L-BFGS.
//! - [`ModeEstimate`]: normalized result of [`maximize`](super::maximize).
//!
//! Convention: we *maximize* `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`. Analytic
//! gradients are gradients of `ℓ`; the adapter flips the sign.
use crate::optimization::{
    errors::{OptError, OptResult},
    mode_finder::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Log density over an unconstrained parameter vector.
///
/// Required:
/// - `value(&Theta) -> OptResult<Cost>`: evaluate `ℓ(θ)`. Points outside the
///   support may return `-∞`; the adapter reports those as non-finite costs.
/// - `check(&Theta) -> OptResult<()>`: reject obviously invalid starting
///   points. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta) -> OptResult<Grad>`: analytic `∇ℓ(θ)`. If not implemented,
///   finite differences are used.
pub trait LogDensity {
    fn value(&self, theta: &Theta) -> OptResult<Cost>;
    fn check(&self, theta: &Theta) -> OptResult<()>;

    fn grad(&self, _theta: &Theta) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`); unknown
/// names return `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = None`, `max_iter = 300`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None` (uses [`DEFAULT_LBFGS_MEM`](super::DEFAULT_LBFGS_MEM))
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl ModeOptions {
    /// Create optimizer options.
    ///
    /// # Errors
    /// - [`OptError::InvalidMemory`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if lbfgs_mem == Some(0) {
            return Err(OptError::InvalidMemory {
                mem: 0,
                reason: "L-BFGS memory must be greater than zero.",
            });
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for ModeOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits.
///
/// Any field can be `None` but at least one must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidGradientTolerance`] / [`OptError::InvalidDensityTolerance`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Posterior mode found by [`maximize`](super::maximize).
///
/// `log_density` is `ℓ(mode)`, not the cost. `converged` is false only when
/// argmin stopped without terminating (iteration cap).
#[derive(Debug, Clone, PartialEq)]
pub struct ModeEstimate {
    pub mode: Theta,
    pub log_density: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl ModeEstimate {
    /// Validate raw solver state.
    ///
    /// # Errors
    /// - `MissingMode`/`NonFiniteMode` for the best parameter vector.
    /// - `NonFiniteLogDensity` for the best value.
    pub fn new(
        mode: Option<Theta>, log_density: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let mode = validate_theta_hat(mode)?;
        validate_value(log_density)?;
        let converged = !matches!(termination, TerminationStatus::NotTerminated);
        Ok(Self {
            mode,
            log_density,
            converged,
            status: format!("{termination:?}"),
            iterations: iterations as usize,
            fn_evals,
            grad_norm: grad.map(|g| g.l2_norm()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Option constructors reject degenerate settings.
    //
    // Given
    // -----
    // - No tolerances at all; `max_iter = 0`; `lbfgs_mem = 0`; an unknown
    //   line-search name.
    //
    // Expect
    // ------
    // - The matching `OptError` variant for each.
    fn option_constructors_reject_degenerate_settings() {
        let tols = Tolerances::new(Some(1e-6), None, Some(10)).expect("valid tolerances");

        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));
        assert!(matches!(
            ModeOptions::new(tols, LineSearcher::HagerZhang, false, Some(0)),
            Err(OptError::InvalidMemory { .. })
        ));
        assert!(matches!("newton".parse::<LineSearcher>(), Err(OptError::InvalidLineSearch { .. })));
        assert_eq!("HAGERZHANG".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
    }

    #[test]
    // Purpose
    // -------
    // Options load from a config file.
    //
    // Given
    // -----
    // - The default options serialized to JSON.
    //
    // Expect
    // ------
    // - Deserializing yields the defaults again.
    fn mode_options_roundtrip_through_json() {
        let opts = ModeOptions::default();

        let json = serde_json::to_string(&opts).expect("serializable");
        let back: ModeOptions = serde_json::from_str(&json).expect("deserializable");

        assert_eq!(back, opts);
    }
}
