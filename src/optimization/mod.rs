//! optimization — posterior mode finding and its error surface.
//!
//! Purpose
//! -------
//! Provide an argmin-backed L-BFGS layer that **maximizes a log density**
//! `ℓ(θ)` over an unconstrained parameter vector. Samplers use it for the
//! `map` initialization; callers may also use it directly to obtain a
//! posterior mode of a renewal model.
//!
//! Key behaviors
//! -------------
//! - `mode_finder`: the [`LogDensity`](mode_finder::LogDensity) trait, the
//!   argmin adapter, solver builders, and the [`maximize`](mode_finder::maximize)
//!   entry point.
//! - `errors`: a single enum ([`OptError`](errors::OptError)) normalizing
//!   configuration issues, model failures, and backend solver errors.
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing the cost `c(θ) = -ℓ(θ)`;
//!   user-facing outcomes are expressed in terms of `ℓ`.
//! - Public entry points return `OptResult<T>`; callers never see raw argmin
//!   errors.
//! - Logging goes through the `log` facade and only when `verbose` is set.

pub mod errors;
pub mod mode_finder;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::mode_finder::prelude::*;
}
