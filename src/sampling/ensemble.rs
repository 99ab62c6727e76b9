//! ensemble — labelled store of posterior draws.
//!
//! Purpose
//! -------
//! Hold everything a sampler run produces in one serde-serializable value:
//! draws of every random variable and deterministic node, copies of the
//! data nodes, the likelihood observations, posterior predictive draws,
//! per-chain sample statistics, the coordinate axes and attributes.
//!
//! Key behaviors
//! -------------
//! - [`PosteriorEnsemble::from_chains`] turns per-chain θ draws into node
//!   values by re-running the graph's forward pass for every draw.
//! - Every stored variable is a [`DataArray`]: an n-d array plus one dim
//!   label per axis. Posterior variables lead with `("chain", "draw")`.
//!
//! Conventions
//! -----------
//! - Scalar nodes are stored without a trailing axis; vector nodes without
//!   declared dims get a synthetic `"{name}_dim_0"` label.
//! - Samples are flattened chain-major: `sample = chain · draws + draw`.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use ndarray::{Array1, Array2, ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::{
    renewal::graph::{
        container::ProbabilisticGraph,
        density::ModelDensity,
        node::{Node, NodeKind},
    },
    sampling::errors::{SamplingError, SamplingResult},
};

pub const CHAIN: &str = "chain";
pub const DRAW: &str = "draw";
pub const MODEL_VERSION_ATTR: &str = "model_version";

/// An n-d array with one dim label per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataArray {
    pub dims: Vec<String>,
    pub values: ArrayD<f64>,
}

impl DataArray {
    /// # Errors
    /// - `SamplingError::ShapeMismatch` when `dims.len() != values.ndim()`.
    pub fn new(dims: Vec<String>, values: ArrayD<f64>) -> SamplingResult<Self> {
        if dims.len() != values.ndim() {
            return Err(SamplingError::ShapeMismatch {
                name: "dims".to_string(),
                expected: values.ndim(),
                actual: dims.len(),
            });
        }
        Ok(Self { dims, values })
    }

    pub fn from_vec(dim: &str, values: Array1<f64>) -> Self {
        Self { dims: vec![dim.to_string()], values: values.into_dyn() }
    }

    /// Label of the last axis, if any.
    pub fn last_dim(&self) -> Option<&str> {
        self.dims.last().map(String::as_str)
    }

    /// Whether the array leads with `("chain", "draw")`.
    pub fn has_sample_dims(&self) -> bool {
        self.dims.len() >= 2 && self.dims[0] == CHAIN && self.dims[1] == DRAW
    }

    /// Chain-major `(sample, k)` view of a posterior variable; scalars give
    /// `k = 1`. `None` for arrays without sample dims or with more than one
    /// trailing axis.
    pub fn sample_matrix(&self) -> Option<Array2<f64>> {
        if !self.has_sample_dims() || self.values.ndim() > 3 {
            return None;
        }
        let shape = self.values.shape();
        let samples = shape[0] * shape[1];
        let k = shape.get(2).copied().unwrap_or(1);
        let flat: Vec<f64> = self.values.iter().copied().collect();
        Array2::from_shape_vec((samples, k), flat).ok()
    }
}

/// Per-chain statistics recorded by a sampler.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainStats {
    /// Mean acceptance probability over the kept draws.
    pub acceptance_rate: f64,
    /// Adapted step size (0 for samplers without one).
    pub step_size: f64,
    /// One flag per kept draw.
    pub diverging: Vec<bool>,
    /// Log density of each kept draw.
    pub log_density: Vec<f64>,
}

impl ChainStats {
    pub fn divergences(&self) -> usize {
        self.diverging.iter().filter(|&&d| d).count()
    }
}

/// Kept draws of one chain, in unconstrained θ space.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRecord {
    pub thetas: Vec<Array1<f64>>,
    pub stats: ChainStats,
}

/// Labelled posterior store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PosteriorEnsemble {
    pub posterior: BTreeMap<String, DataArray>,
    pub constant_data: BTreeMap<String, DataArray>,
    pub observed_data: BTreeMap<String, DataArray>,
    pub posterior_predictive: BTreeMap<String, DataArray>,
    pub sample_stats: BTreeMap<String, DataArray>,
    pub coords: BTreeMap<String, Vec<NaiveDate>>,
    pub attrs: BTreeMap<String, String>,
}

impl PosteriorEnsemble {
    /// Assemble an ensemble from per-chain θ draws.
    ///
    /// Every draw is pushed through the forward pass so deterministic nodes
    /// are stored alongside the random variables.
    ///
    /// # Errors
    /// - `ShapeMismatch` if no chain is given or chains differ in draw
    ///   count, or a stats vector does not match its chain.
    /// - `Model` for θ of the wrong length.
    pub fn from_chains(graph: &ProbabilisticGraph, chains: &[ChainRecord]) -> SamplingResult<Self> {
        let Some(first) = chains.first() else {
            return Err(SamplingError::ShapeMismatch { name: CHAIN.to_string(), expected: 1, actual: 0 });
        };
        let draws = first.thetas.len();
        for record in chains {
            for (name, actual) in [
                (DRAW, record.thetas.len()),
                ("diverging", record.stats.diverging.len()),
                ("lp", record.stats.log_density.len()),
            ] {
                if actual != draws {
                    return Err(SamplingError::ShapeMismatch { name: name.to_string(), expected: draws, actual });
                }
            }
        }

        let density = ModelDensity::new(graph);
        let nodes = graph.nodes();
        let mut flat: Vec<Vec<f64>> = vec![Vec::new(); nodes.len()];
        for record in chains {
            for theta in &record.thetas {
                let evaluation = density.evaluate(theta.view())?;
                for (i, node) in nodes.iter().enumerate() {
                    if is_posterior(node) {
                        flat[i].extend(evaluation.values[i].iter().copied());
                    }
                }
            }
        }

        let mut ensemble = Self { coords: graph.coords().clone(), ..Self::default() };
        for (node, values) in nodes.iter().zip(flat) {
            let dims = node_dims(node);
            match &node.kind {
                NodeKind::RandomVariable { .. } | NodeKind::Deterministic { .. } => {
                    let mut shape = vec![chains.len(), draws];
                    let mut labels = vec![CHAIN.to_string(), DRAW.to_string()];
                    if !dims.is_empty() {
                        shape.push(node.len);
                        labels.extend(dims);
                    }
                    let values = ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(|_| {
                        SamplingError::ShapeMismatch { name: node.name.clone(), expected: node.len, actual: 0 }
                    })?;
                    ensemble.posterior.insert(node.name.clone(), DataArray { dims: labels, values });
                }
                NodeKind::Data { values } => {
                    let array = DataArray { dims, values: values.clone().into_dyn() };
                    ensemble.constant_data.insert(node.name.clone(), array);
                }
                NodeKind::Likelihood { observed, .. } => {
                    let observed = graph.node(*observed)?;
                    let NodeKind::Data { values } = &observed.kind else {
                        return Err(SamplingError::MissingVariable { name: observed.name.clone() });
                    };
                    let array = DataArray { dims, values: values.clone().into_dyn() };
                    ensemble.observed_data.insert(node.name.clone(), array);
                }
            }
        }
        ensemble.insert_stats(chains, draws);
        Ok(ensemble)
    }

    fn insert_stats(&mut self, chains: &[ChainRecord], draws: usize) {
        let sample_dims = vec![CHAIN.to_string(), DRAW.to_string()];
        let diverging = per_draw(chains, draws, |s: &ChainStats| {
            s.diverging.iter().map(|&d| if d { 1.0 } else { 0.0 }).collect()
        });
        if let Some(values) = diverging {
            self.sample_stats.insert("diverging".to_string(), DataArray { dims: sample_dims.clone(), values });
        }
        if let Some(values) = per_draw(chains, draws, |s: &ChainStats| s.log_density.clone()) {
            self.sample_stats.insert("lp".to_string(), DataArray { dims: sample_dims, values });
        }
        let chain_dims = vec![CHAIN.to_string()];
        self.sample_stats.insert(
            "acceptance_rate".to_string(),
            DataArray { dims: chain_dims.clone(), values: per_chain(chains, |s: &ChainStats| s.acceptance_rate) },
        );
        self.sample_stats.insert(
            "step_size".to_string(),
            DataArray { dims: chain_dims, values: per_chain(chains, |s: &ChainStats| s.step_size) },
        );
    }

    /// Number of chains, read from the posterior.
    pub fn n_chains(&self) -> usize {
        self.posterior.values().next().map_or(0, |v| v.values.shape()[0])
    }

    /// Draws per chain, read from the posterior.
    pub fn n_draws(&self) -> usize {
        self.posterior.values().next().map_or(0, |v| v.values.shape()[1])
    }

    pub fn n_samples(&self) -> usize {
        self.n_chains() * self.n_draws()
    }

    pub fn model_version(&self) -> Option<&str> {
        self.attrs.get(MODEL_VERSION_ATTR).map(String::as_str)
    }

    /// Total divergent transitions across chains.
    pub fn divergences(&self) -> usize {
        self.sample_stats
            .get("diverging")
            .map_or(0, |d| d.values.iter().filter(|&&v| v > 0.0).count())
    }
}

fn per_draw(
    chains: &[ChainRecord], draws: usize, f: impl Fn(&ChainStats) -> Vec<f64>,
) -> Option<ArrayD<f64>> {
    let flat: Vec<f64> = chains.iter().flat_map(|c| f(&c.stats)).collect();
    ArrayD::from_shape_vec(IxDyn(&[chains.len(), draws]), flat).ok()
}

fn per_chain(chains: &[ChainRecord], f: impl Fn(&ChainStats) -> f64) -> ArrayD<f64> {
    chains.iter().map(|c| f(&c.stats)).collect::<Array1<f64>>().into_dyn()
}

fn is_posterior(node: &Node) -> bool {
    matches!(node.kind, NodeKind::RandomVariable { .. } | NodeKind::Deterministic { .. })
}

fn node_dims(node: &Node) -> Vec<String> {
    match (node.dims.is_empty(), node.len) {
        (false, _) => node.dims.clone(),
        (true, 1) if !matches!(node.kind, NodeKind::Data { .. }) => Vec::new(),
        (true, _) => vec![format!("{}_dim_0", node.name)],
    }
}
