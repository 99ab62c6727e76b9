//! renewal — the test-adjusted renewal model of daily case counts.
//!
//! Purpose
//! -------
//! Build and evaluate the Bayesian model that links a latent reproduction
//! number `r_t` to reported positive tests: infections follow the renewal
//! equation, are delayed by the reporting distribution, scaled by test
//! exposure and observed through a negative binomial.
//!
//! Key behaviors
//! -------------
//! - `core`: observation tables, alignment and masks, probability masses,
//!   the generation-time kernel, recursion primitives and model options.
//! - `graph`: the probabilistic-graph container and its log density.
//! - `models`: [`build_model`](models::builder::build_model) and
//!   [`attach_model`](models::builder::attach_model).
//! - `errors`: [`RenewalError`](errors::RenewalError).

pub mod core;
pub mod errors;
pub mod graph;
pub mod models;

pub mod prelude {
    pub use super::core::{
        align::{AlignedObservations, align_observations},
        observations::ObservationTable,
        options::ModelOptions,
        pmf::Pmf,
    };
    pub use super::errors::{RenewalError, RenewalResult};
    pub use super::graph::{container::ProbabilisticGraph, density::ModelDensity};
    pub use super::models::builder::{attach_model, build_model};
}
