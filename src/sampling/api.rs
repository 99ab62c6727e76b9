//! High-level entry point: configure, sample, post-process.
use log::info;

use crate::{
    renewal::graph::container::ProbabilisticGraph,
    sampling::{
        config::{SamplerConfig, SamplerOverrides},
        ensemble::{MODEL_VERSION_ATTR, PosteriorEnsemble},
        errors::SamplingResult,
        predictive::draw_posterior_predictive,
        traits::{MODEL_VERSION, Sampler},
    },
};

/// Sample the posterior of `graph` with `sampler`.
///
/// # Behavior
/// - Merges `overrides` into [`SamplerConfig::default`] and validates.
/// - Runs `sampler` with the merged config.
/// - Draws the posterior predictive when `posterior_predictive` is set,
///   seeded from `random_seed + chains` (entropy when unseeded).
/// - Stamps `attrs["model_version"]` with [`MODEL_VERSION`].
///
/// # Errors
/// - Configuration errors, then anything the sampler or the predictive
///   step reports.
pub fn sample<S: Sampler + ?Sized>(
    graph: &ProbabilisticGraph, sampler: &S, overrides: &SamplerOverrides,
) -> SamplingResult<PosteriorEnsemble> {
    let config = SamplerConfig::default().merged(overrides)?;
    info!(
        "Sampling {} chains × {} draws ({} tune), target_accept {}, init {}.",
        config.chains, config.draws, config.tune, config.target_accept, config.init
    );
    let mut ensemble = sampler.sample(graph, &config)?;
    if config.posterior_predictive {
        let seed = config.random_seed.unwrap_or_else(rand::random).wrapping_add(config.chains as u64);
        draw_posterior_predictive(graph, &mut ensemble, seed)?;
    }
    ensemble.attrs.insert(MODEL_VERSION_ATTR.to_string(), MODEL_VERSION.to_string());
    let divergences = ensemble.divergences();
    if divergences > 0 {
        info!("Sampling finished with {divergences} divergent transitions.");
    }
    Ok(ensemble)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{renewal::models::fixtures::example_graph, sampling::fixed::FixedSampler};
    use ndarray::Array1;

    fn fixed(n: usize) -> FixedSampler {
        FixedSampler::default()
            .with("log_r_t", Array1::zeros(n))
            .with("seed", Array1::from_elem(1, 1.0))
            .with("alpha", Array1::from_elem(1, 10.0))
    }

    #[test]
    // Purpose
    // -------
    // The adapter merges overrides, stamps the version and adds predictive
    // draws.
    //
    // Given
    // -----
    // - A fixed sampler, overrides chains 1, draws 4.
    //
    // Expect
    // ------
    // - 1 × 4 ensemble, version "1.1.0", predictive draws present.
    fn sample_stamps_version_and_predictive() {
        let graph = example_graph();
        let overrides =
            SamplerOverrides::from_pairs([("chains", "1"), ("draws", "4"), ("random_seed", "5")]).expect("valid");

        let ensemble = sample(&graph, &fixed(14), &overrides).expect("sampling succeeds");

        assert_eq!((ensemble.n_chains(), ensemble.n_draws()), (1, 4));
        assert_eq!(ensemble.model_version(), Some(MODEL_VERSION));
        assert!(ensemble.posterior_predictive.contains_key("likelihood"));
    }

    #[test]
    // Purpose
    // -------
    // Disabling the predictive step and invalid overrides.
    //
    // Given
    // -----
    // - posterior_predictive = false; then target_accept = 0.
    //
    // Expect
    // ------
    // - No predictive group; `InvalidTargetAccept` before sampling.
    fn sample_respects_predictive_flag_and_validation() {
        let graph = example_graph();
        let off = SamplerOverrides { posterior_predictive: Some(false), draws: Some(2), ..Default::default() };
        let bad = SamplerOverrides { target_accept: Some(0.0), ..Default::default() };

        let ensemble = sample(&graph, &fixed(14), &off).expect("sampling succeeds");

        assert!(ensemble.posterior_predictive.is_empty());
        assert_eq!(
            sample(&graph, &fixed(14), &bad).unwrap_err(),
            crate::sampling::errors::SamplingError::InvalidTargetAccept { value: 0.0 }
        );
    }
}
