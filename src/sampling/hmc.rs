//! hmc — diagonal-mass Hamiltonian Monte Carlo over a model density.
//!
//! Purpose
//! -------
//! Reference [`Sampler`] for renewal graphs: independent chains of static
//! HMC (a fixed number of leapfrog steps per transition) with step-size
//! and diagonal mass adaptation during warm-up.
//!
//! Key behaviors
//! -------------
//! - Chains run in parallel on a rayon pool with `config.cores` workers;
//!   chain `c` uses `ChaCha8Rng::seed_from_u64(seed + c)`.
//! - Warm-up (`config.tune` iterations) adapts the step size by dual
//!   averaging toward `config.target_accept` and the inverse mass diagonal
//!   from windowed variance estimates; warm-up draws are discarded.
//! - A trajectory whose energy becomes non-finite, or grows by more than
//!   [`DIVERGENCE_THRESHOLD`], is a divergence: the proposal is rejected
//!   and the draw is flagged.
//! - `map` initialization runs L-BFGS from the initial point and keeps the
//!   mode only when it improves the log density.
//!
//! Invariants & assumptions
//! ------------------------
//! - The graph is read-only; chains share nothing mutable.
//! - Every chain starts from a point with finite log density.
use std::collections::BTreeMap;

use log::{debug, warn};
use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    optimization::mode_finder::{ModeOptions, maximize},
    renewal::graph::{container::ProbabilisticGraph, density::ModelDensity},
    sampling::{
        adaptation::WarmUp,
        config::{InitMethod, SamplerConfig},
        ensemble::{ChainRecord, ChainStats, PosteriorEnsemble},
        errors::{SamplingError, SamplingResult},
        traits::Sampler,
    },
};

/// Energy error beyond which a transition counts as divergent.
pub const DIVERGENCE_THRESHOLD: f64 = 1000.0;

/// HMC settings that are not part of the generic sampler config.
///
/// Default:
/// - `n_leapfrog = 16`
/// - `initial_step_size = 0.05`
/// - `mode`: default [`ModeOptions`], used by `map` initialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HmcOptions {
    pub n_leapfrog: usize,
    pub initial_step_size: f64,
    pub mode: ModeOptions,
}

impl Default for HmcOptions {
    fn default() -> Self {
        Self { n_leapfrog: 16, initial_step_size: 0.05, mode: ModeOptions::default() }
    }
}

impl HmcOptions {
    /// # Errors
    /// - `SamplingError::InvalidLeapfrog` for zero steps or a non-positive
    ///   or non-finite initial step size.
    pub fn validate(&self) -> SamplingResult<()> {
        if self.n_leapfrog == 0 || !(self.initial_step_size.is_finite() && self.initial_step_size > 0.0) {
            return Err(SamplingError::InvalidLeapfrog {
                steps: self.n_leapfrog,
                step_size: self.initial_step_size,
            });
        }
        Ok(())
    }
}

/// Diagonal-mass static HMC.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HamiltonianSampler {
    pub options: HmcOptions,
}

impl HamiltonianSampler {
    pub fn new(options: HmcOptions) -> Self {
        Self { options }
    }
}

impl Sampler for HamiltonianSampler {
    fn sample(&self, graph: &ProbabilisticGraph, config: &SamplerConfig) -> SamplingResult<PosteriorEnsemble> {
        self.options.validate()?;
        config.validate()?;
        let density = ModelDensity::new(graph);
        let start = self.start_point(&density, config.init)?;
        let base_seed = config.random_seed.unwrap_or_else(rand::random);
        debug!(
            "Sampling {} chains × ({} tune + {} draws) on {} cores, seed {base_seed}, init {}.",
            config.chains, config.tune, config.draws, config.cores, config.init
        );

        let pool = rayon::ThreadPoolBuilder::new().num_threads(config.cores).build()?;
        let records: Vec<SamplingResult<ChainRecord>> = pool.install(|| {
            (0..config.chains)
                .into_par_iter()
                .map(|chain| {
                    let seed = base_seed.wrapping_add(chain as u64);
                    self.run_chain(&density, config, &start, chain, seed)
                })
                .collect()
        });
        let records = records.into_iter().collect::<SamplingResult<Vec<_>>>()?;
        let ensemble = PosteriorEnsemble::from_chains(graph, &records)?;
        for (key, values) in chain_summary(&ensemble) {
            debug!("{key} per chain: {values:.3?}");
        }
        Ok(ensemble)
    }
}

/// Position, log density and gradient at one point.
#[derive(Debug, Clone)]
struct State {
    theta: Array1<f64>,
    log_density: f64,
    grad: Array1<f64>,
}

struct Transition {
    state: State,
    accept_prob: f64,
    diverging: bool,
}

impl HamiltonianSampler {
    /// Shared starting point before per-chain jitter.
    fn start_point(&self, density: &ModelDensity<'_>, init: InitMethod) -> SamplingResult<Array1<f64>> {
        let initial = density.initial_point();
        if init != InitMethod::Map {
            return Ok(initial);
        }
        let start_value = density.log_density(initial.view())?;
        match maximize(density, initial.clone(), &self.options.mode) {
            Ok(outcome) if outcome.log_density.is_finite() && outcome.log_density >= start_value => {
                debug!("MAP initialization: log density {start_value:.3} -> {:.3}.", outcome.log_density);
                Ok(outcome.mode)
            }
            Ok(outcome) => {
                warn!(
                    "MAP initialization did not improve the log density ({:.3} < {start_value:.3}); using the initial point.",
                    outcome.log_density
                );
                Ok(initial)
            }
            Err(err) => {
                warn!("MAP initialization failed ({err}); using the initial point.");
                Ok(initial)
            }
        }
    }

    fn run_chain(
        &self, density: &ModelDensity<'_>, config: &SamplerConfig, start: &Array1<f64>, chain: usize, seed: u64,
    ) -> SamplingResult<ChainRecord> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut theta = start.clone();
        if config.init == InitMethod::JitterAdaptDiag {
            theta.mapv_inplace(|u| u + rng.gen_range(-1.0..1.0));
        }
        let mut state = evaluate(density, theta)?;
        if !state.log_density.is_finite() {
            return Err(SamplingError::InvalidPoint { log_density: state.log_density });
        }

        let dim = density.dim();
        let mut inv_mass = Array1::ones(dim);
        let mut step_size = self.options.initial_step_size;
        let mut warm_up = WarmUp::new(dim, config.tune, step_size, config.target_accept);
        let mut thetas = Vec::with_capacity(config.draws);
        let mut stats = ChainStats::default();
        let mut accept_sum = 0.0;

        for iteration in 0..config.tune + config.draws {
            let transition = self.transition(density, &state, step_size, &inv_mass, &mut rng)?;
            state = transition.state;
            if iteration < config.tune {
                let tuned = warm_up.observe(iteration, transition.accept_prob, &state.theta);
                step_size = tuned.step_size;
                if let Some(variance) = tuned.inv_mass {
                    inv_mass = variance;
                }
            } else {
                accept_sum += transition.accept_prob;
                stats.diverging.push(transition.diverging);
                stats.log_density.push(state.log_density);
                thetas.push(state.theta.clone());
            }
            if config.progress_every > 0 && (iteration + 1) % config.progress_every == 0 {
                debug!(
                    "Chain {chain}: iteration {}/{}, step size {step_size:.4}, log density {:.3}.",
                    iteration + 1,
                    config.tune + config.draws,
                    state.log_density
                );
            }
        }

        stats.acceptance_rate = accept_sum / config.draws as f64;
        stats.step_size = step_size;
        let divergences = stats.divergences();
        if divergences > 0 {
            warn!("Chain {chain}: {divergences} divergent transitions after tuning.");
        }
        Ok(ChainRecord { thetas, stats })
    }

    /// One static-HMC transition with momentum `p ~ N(0, M)`, `M = diag(1 / inv_mass)`.
    fn transition(
        &self, density: &ModelDensity<'_>, current: &State, step_size: f64, inv_mass: &Array1<f64>,
        rng: &mut ChaCha8Rng,
    ) -> SamplingResult<Transition> {
        let momentum: Array1<f64> =
            inv_mass.mapv(|m| rng.sample::<f64, _>(StandardNormal) / m.sqrt());
        let energy0 = -current.log_density + kinetic(&momentum, inv_mass);

        let mut p = momentum;
        let mut proposal = current.clone();
        let mut diverging = false;
        for _ in 0..self.options.n_leapfrog {
            p.scaled_add(0.5 * step_size, &proposal.grad);
            let theta = &proposal.theta + &(step_size * inv_mass * &p);
            proposal = evaluate(density, theta)?;
            if !proposal.log_density.is_finite() || proposal.grad.iter().any(|g| !g.is_finite()) {
                diverging = true;
                break;
            }
            p.scaled_add(0.5 * step_size, &proposal.grad);
        }

        let energy1 = -proposal.log_density + kinetic(&p, inv_mass);
        let delta = energy0 - energy1;
        if diverging || !energy1.is_finite() || delta < -DIVERGENCE_THRESHOLD {
            return Ok(Transition { state: current.clone(), accept_prob: 0.0, diverging: true });
        }
        let accept_prob = delta.exp().min(1.0);
        let state = if rng.gen::<f64>() < accept_prob { proposal } else { current.clone() };
        Ok(Transition { state, accept_prob, diverging: false })
    }
}

fn kinetic(p: &Array1<f64>, inv_mass: &Array1<f64>) -> f64 {
    0.5 * p.iter().zip(inv_mass.iter()).map(|(p, m)| m * p * p).sum::<f64>()
}

fn evaluate(density: &ModelDensity<'_>, theta: Array1<f64>) -> SamplingResult<State> {
    let (log_density, grad) = density.log_density_and_grad(theta.view())?;
    Ok(State { theta, log_density, grad })
}

/// Per-chain acceptance rate and final step size.
pub fn chain_summary(ensemble: &PosteriorEnsemble) -> BTreeMap<&'static str, Vec<f64>> {
    let column = |key: &str| {
        ensemble.sample_stats.get(key).map(|a| a.values.iter().copied().collect()).unwrap_or_default()
    };
    BTreeMap::from([("acceptance_rate", column("acceptance_rate")), ("step_size", column("step_size"))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renewal::models::fixtures::example_graph;

    fn short_config(init: InitMethod) -> SamplerConfig {
        SamplerConfig {
            chains: 2,
            draws: 20,
            tune: 40,
            cores: 2,
            init,
            random_seed: Some(11),
            target_accept: 0.8,
            ..SamplerConfig::default()
        }
    }

    #[test]
    // Purpose
    // -------
    // A short run yields the configured layout and finite draws.
    //
    // Given
    // -----
    // - The example model, 2 chains × (40 tune + 20 draws), seed 11.
    //
    // Expect
    // ------
    // - (2, 20, 14) infections, finite log densities, positive step sizes,
    //   acceptance rates in [0, 1].
    fn short_run_has_expected_layout() {
        let graph = example_graph();
        let sampler = HamiltonianSampler::new(HmcOptions { n_leapfrog: 8, ..HmcOptions::default() });

        let ensemble = sampler.sample(&graph, &short_config(InitMethod::JitterAdaptDiag)).expect("sampling succeeds");

        assert_eq!(ensemble.posterior["infections"].values.shape(), &[2, 20, 14]);
        assert!(ensemble.sample_stats["lp"].values.iter().all(|lp| lp.is_finite()));
        let summary = chain_summary(&ensemble);
        assert!(summary["step_size"].iter().all(|&s| s > 0.0 && s.is_finite()));
        assert!(summary["acceptance_rate"].iter().all(|&a| (0.0..=1.0).contains(&a)));
    }

    #[test]
    // Purpose
    // -------
    // Runs are reproducible for a fixed seed, independent of core count.
    //
    // Given
    // -----
    // - The same config run with 1 and 2 cores.
    //
    // Expect
    // ------
    // - Identical posterior draws.
    fn seeded_runs_are_reproducible() {
        let graph = example_graph();
        let sampler = HamiltonianSampler::new(HmcOptions { n_leapfrog: 4, ..HmcOptions::default() });
        let config = short_config(InitMethod::AdaptDiag);

        let a = sampler.sample(&graph, &config).expect("sampling succeeds");
        let b = sampler.sample(&graph, &SamplerConfig { cores: 1, ..config }).expect("sampling succeeds");

        assert_eq!(a.posterior["log_r_t"], b.posterior["log_r_t"]);
    }

    #[test]
    // Purpose
    // -------
    // `map` initialization never starts below the initial point.
    //
    // Given
    // -----
    // - The example model's density and default mode options.
    //
    // Expect
    // ------
    // - log p(start) ≥ log p(initial point).
    fn map_start_does_not_lower_density() {
        let graph = example_graph();
        let density = ModelDensity::new(&graph);
        let sampler = HamiltonianSampler::default();

        let start = sampler.start_point(&density, InitMethod::Map).expect("start point");

        let initial = density.log_density(density.initial_point().view()).expect("finite");
        let at_start = density.log_density(start.view()).expect("finite");
        assert!(at_start >= initial, "{at_start} < {initial}");
    }

    #[test]
    // Purpose
    // -------
    // Invalid leapfrog settings are rejected up front.
    //
    // Given
    // -----
    // - Zero leapfrog steps; a NaN step size.
    //
    // Expect
    // ------
    // - `InvalidLeapfrog`.
    fn invalid_leapfrog_settings_are_rejected() {
        let graph = example_graph();
        let zero = HamiltonianSampler::new(HmcOptions { n_leapfrog: 0, ..HmcOptions::default() });
        let nan = HamiltonianSampler::new(HmcOptions { initial_step_size: f64::NAN, ..HmcOptions::default() });

        assert!(matches!(zero.sample(&graph, &SamplerConfig::default()), Err(SamplingError::InvalidLeapfrog { .. })));
        assert!(matches!(nan.sample(&graph, &SamplerConfig::default()), Err(SamplingError::InvalidLeapfrog { .. })));
    }
}
