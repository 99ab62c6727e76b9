//! Posterior predictive draws for negative-binomial likelihoods.
//!
//! For every likelihood node and every posterior sample, draw
//! `y ~ NegativeBinomial(mu, alpha)` as the Gamma–Poisson mixture
//! `λ ~ Gamma(alpha, mu / alpha)`, `y ~ Poisson(λ)`. A zero mean yields 0.
use log::debug;
use ndarray::{Array2, ArrayD, IxDyn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Gamma, Poisson};

use crate::{
    renewal::graph::{
        container::ProbabilisticGraph,
        node::{NodeId, NodeKind, ObservationModel},
    },
    sampling::{
        ensemble::{CHAIN, DRAW, DataArray, PosteriorEnsemble},
        errors::{SamplingError, SamplingResult},
    },
};

/// Fill `ensemble.posterior_predictive` with one draw per posterior sample.
///
/// # Errors
/// - `MissingVariable` when a likelihood's mean or dispersion is not in the
///   posterior.
/// - `ShapeMismatch` when the mean's length differs from the likelihood's.
pub fn draw_posterior_predictive(
    graph: &ProbabilisticGraph, ensemble: &mut PosteriorEnsemble, seed: u64,
) -> SamplingResult<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (chains, draws) = (ensemble.n_chains(), ensemble.n_draws());
    for (_, node) in graph.likelihoods() {
        let NodeKind::Likelihood { model: ObservationModel::NegativeBinomial { mu, alpha }, .. } = &node.kind
        else {
            continue;
        };
        let mu = sample_matrix(graph, ensemble, *mu)?;
        let alpha = sample_matrix(graph, ensemble, *alpha)?;
        if mu.ncols() != node.len {
            return Err(SamplingError::ShapeMismatch { name: node.name.clone(), expected: node.len, actual: mu.ncols() });
        }

        let mut flat = Vec::with_capacity(mu.len());
        for (row, a) in mu.rows().into_iter().zip(alpha.column(0).iter()) {
            flat.extend(row.iter().map(|&m| negative_binomial_draw(m, *a, &mut rng)));
        }
        let mut dims = vec![CHAIN.to_string(), DRAW.to_string()];
        dims.extend(node.dims.iter().cloned());
        let values = ArrayD::from_shape_vec(IxDyn(&[chains, draws, node.len]), flat).map_err(|_| {
            SamplingError::ShapeMismatch { name: node.name.clone(), expected: chains * draws * node.len, actual: 0 }
        })?;
        ensemble.posterior_predictive.insert(node.name.clone(), DataArray { dims, values });
        debug!("Drew {} posterior predictive samples for '{}'.", chains * draws, node.name);
    }
    Ok(())
}

fn sample_matrix(graph: &ProbabilisticGraph, ensemble: &PosteriorEnsemble, id: NodeId) -> SamplingResult<Array2<f64>> {
    let name = &graph.node(id)?.name;
    ensemble
        .posterior
        .get(name)
        .and_then(DataArray::sample_matrix)
        .ok_or_else(|| SamplingError::MissingVariable { name: name.clone() })
}

/// One NegativeBinomial(mu, alpha) draw; non-finite or non-positive
/// parameters give NaN and 0 respectively.
fn negative_binomial_draw<R: Rng>(mu: f64, alpha: f64, rng: &mut R) -> f64 {
    if !(mu.is_finite() && alpha.is_finite()) {
        return f64::NAN;
    }
    if mu <= 0.0 || alpha <= 0.0 {
        return 0.0;
    }
    let Ok(gamma) = Gamma::new(alpha, mu / alpha) else { return f64::NAN };
    let lambda: f64 = gamma.sample(rng);
    if lambda <= 0.0 {
        return 0.0;
    }
    match Poisson::new(lambda) {
        Ok(poisson) => poisson.sample(rng),
        Err(_) => f64::NAN,
    }
}
