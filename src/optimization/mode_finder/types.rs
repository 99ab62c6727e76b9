//! Numeric aliases shared by the mode finder. `Cost` is always the negated
//! log density.
use argmin::solver::quasinewton::LBFGS;
use ndarray::Array1;
use std::collections::HashMap;

/// Unconstrained parameter vector `θ`.
pub type Theta = Array1<f64>;

/// `∇ℓ(θ)` or `∇c(θ)`, same length as [`Theta`].
pub type Grad = Array1<f64>;

/// `c(θ) = -ℓ(θ)`.
pub type Cost = f64;

/// argmin evaluation counters, e.g. `"cost_count"`.
pub type FnEvalMap = HashMap<String, u64>;

/// L-BFGS history length when none is configured.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// L-BFGS over θ with line search `L`.
pub type Lbfgs<L> = LBFGS<L, Theta, Grad, Cost>;
