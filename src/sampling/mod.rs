//! sampling — posterior sampling of probabilistic graphs.
//!
//! Purpose
//! -------
//! Turn a [`ProbabilisticGraph`](crate::renewal::graph::container::ProbabilisticGraph)
//! into a version-tagged [`PosteriorEnsemble`](ensemble::PosteriorEnsemble)
//! through any implementation of the [`Sampler`](traits::Sampler) trait.
//!
//! Key behaviors
//! -------------
//! - `config`: defaults, string/serde overrides and validation.
//! - `api`: [`sample`](api::sample) merges the config, runs the sampler,
//!   adds posterior predictive draws and stamps the model version.
//! - `hmc`: diagonal-mass HMC with dual-averaging step size
//!   (`adaptation` holds the warm-up machinery).
//! - `fixed`: a sampler that replays one supplied point.
//! - `ensemble`: the labelled posterior store.
//!
//! Conventions
//! -----------
//! - Chains are seeded deterministically from `random_seed`; parallelism
//!   never changes the draws.
//! - Progress goes to `debug!`, divergences to `warn!`.

pub mod adaptation;
pub mod api;
pub mod config;
pub mod ensemble;
pub mod errors;
pub mod fixed;
pub mod hmc;
pub mod predictive;
pub mod traits;

pub mod prelude {
    pub use super::api::sample;
    pub use super::config::{InitMethod, SamplerConfig, SamplerOverrides};
    pub use super::ensemble::{DataArray, PosteriorEnsemble};
    pub use super::errors::{SamplingError, SamplingResult};
    pub use super::fixed::FixedSampler;
    pub use super::hmc::{HamiltonianSampler, HmcOptions};
    pub use super::traits::{MODEL_VERSION, Sampler};
}
