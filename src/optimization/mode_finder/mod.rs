//! mode_finder — argmin-powered maximization of log densities.
//!
//! Purpose
//! -------
//! Find a mode of a log density `ℓ(θ)` with L-BFGS. Callers implement
//! [`LogDensity`] and call [`maximize`] with a starting point and
//! [`ModeOptions`].
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into the argmin cost
//!   `c(θ) = -ℓ(θ)`, negating analytic gradients and falling back to
//!   finite differences when none are provided.
//! - [`maximize`] validates the start with [`LogDensity::check`], selects a
//!   solver via [`builders`], runs it via [`run::run_lbfgs`], and returns an
//!   [`ModeEstimate`].
//! - [`finite_diff::run_fd_diff`] is the forward-difference fallback with
//!   error capture.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`LogDensity::value`] and [`LogDensity::grad`] report invalid inputs
//!   as [`OptError`](crate::optimization::errors::OptError) values, never panics.
//! - Parameters live in unconstrained space; any constrained ↔
//!   unconstrained mapping happens in the model layer.
//!
//! Testing notes
//! -------------
//! - Unit tests cover sign conventions in the adapter, solver wiring in the
//!   builders, finite-difference fallbacks, and option validation.
//! - The renewal density is maximized end to end in its own tests.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogDensity, ModeOptions, ModeEstimate, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogDensity, ModeOptions, ModeEstimate, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
