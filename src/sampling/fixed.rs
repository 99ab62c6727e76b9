//! A sampler that replays one caller-supplied point.
use std::collections::BTreeMap;

use ndarray::Array1;

use crate::{
    renewal::graph::{container::ProbabilisticGraph, density::ModelDensity},
    sampling::{
        config::SamplerConfig,
        ensemble::{ChainRecord, ChainStats, PosteriorEnsemble},
        errors::SamplingResult,
        traits::Sampler,
    },
};

/// Evaluates the graph at fixed constrained values and replicates them for
/// every chain and draw.
///
/// Values are keyed by free-variable name (scoped names for regional
/// graphs) and must cover every free variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FixedSampler {
    pub values: BTreeMap<String, Array1<f64>>,
}

impl FixedSampler {
    pub fn new(values: BTreeMap<String, Array1<f64>>) -> Self {
        Self { values }
    }

    /// Add or replace the value of one free variable.
    pub fn with(mut self, name: &str, value: Array1<f64>) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }
}

impl Sampler for FixedSampler {
    fn sample(&self, graph: &ProbabilisticGraph, config: &SamplerConfig) -> SamplingResult<PosteriorEnsemble> {
        let density = ModelDensity::new(graph);
        let theta = density.theta_from_values(&self.values)?;
        let log_density = density.log_density(theta.view())?;
        let record = ChainRecord {
            thetas: vec![theta; config.draws],
            stats: ChainStats {
                acceptance_rate: 1.0,
                step_size: 0.0,
                diverging: vec![false; config.draws],
                log_density: vec![log_density; config.draws],
            },
        };
        PosteriorEnsemble::from_chains(graph, &vec![record; config.chains])
    }
}
