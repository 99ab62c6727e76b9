//! The [`Sampler`] seam and the model version stamped on every ensemble.
use crate::{
    renewal::graph::container::ProbabilisticGraph,
    sampling::{config::SamplerConfig, ensemble::PosteriorEnsemble, errors::SamplingResult},
};

/// Version of the renewal model layout written into `attrs["model_version"]`.
pub const MODEL_VERSION: &str = "1.1.0";

/// A posterior sampler over a [`ProbabilisticGraph`].
///
/// Implementations receive a merged, validated [`SamplerConfig`] and return
/// an ensemble with `chains × draws` kept draws. Posterior predictive draws
/// and the version stamp are added by [`sample`](super::api::sample).
pub trait Sampler {
    fn sample(&self, graph: &ProbabilisticGraph, config: &SamplerConfig) -> SamplingResult<PosteriorEnsemble>;
}
