//! node — tagged node kinds of the probabilistic graph.
//!
//! Purpose
//! -------
//! Describe a single graph node as plain data: its name, dims, length, and
//! a tagged payload ([`NodeKind`]). Upstream dependencies are stored as
//! [`NodeId`]s, never as references, so a graph can be cloned, serialized
//! and merged freely.
//!
//! Key behaviors
//! -------------
//! - [`NodeKind::RandomVariable`]: a free latent variable with a [`Prior`].
//! - [`NodeKind::Deterministic`]: a pure function ([`Op`]) of earlier nodes.
//! - [`NodeKind::Data`]: constant input values.
//! - [`NodeKind::Likelihood`]: an [`ObservationModel`] tying earlier nodes to
//!   an observed data node.
//!
//! Invariants & assumptions
//! ------------------------
//! - A node only references ids smaller than its own (checked on insertion
//!   by [`ProbabilisticGraph`](crate::renewal::graph::container::ProbabilisticGraph)).
//! - Scalars have `len == 1` and no dims; vectors have at most one dim.
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::renewal::core::kernel::GenerationTimeKernel;

/// Stable identifier of a node: its insertion position in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    fn shifted(self, offset: usize) -> Self {
        NodeId(self.0 + offset)
    }
}

/// Prior distribution of a random variable (in constrained space).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Prior {
    /// Gaussian random walk with fixed step sd and a flat first element.
    GaussianRandomWalk { sigma: f64 },
    /// Exponential with the given rate (mean `1 / rate`).
    Exponential { rate: f64 },
    /// Gamma with shape/rate parameterization.
    Gamma { shape: f64, rate: f64 },
}

impl Prior {
    /// Gamma prior from mean and standard deviation:
    /// `shape = mean² / sd²`, `rate = mean / sd²`.
    pub fn gamma_from_mean_sd(mean: f64, sd: f64) -> Self {
        let var = sd * sd;
        Prior::Gamma { shape: mean * mean / var, rate: mean / var }
    }

    /// Exponential prior from its mean.
    pub fn exponential_from_mean(mean: f64) -> Self {
        Prior::Exponential { rate: 1.0 / mean }
    }

    /// Map to unconstrained space used by samplers and optimizers.
    pub fn transform(&self) -> Transform {
        match self {
            Prior::GaussianRandomWalk { .. } => Transform::Identity,
            Prior::Exponential { .. } | Prior::Gamma { .. } => Transform::Log,
        }
    }

    /// Deterministic starting value in constrained space (the prior mean,
    /// or zeros for the random walk).
    pub fn initial_value(&self, len: usize) -> Array1<f64> {
        match self {
            Prior::GaussianRandomWalk { .. } => Array1::zeros(len),
            Prior::Exponential { rate } => Array1::from_elem(len, 1.0 / rate),
            Prior::Gamma { shape, rate } => Array1::from_elem(len, shape / rate),
        }
    }
}

/// Bijection between unconstrained `u` and constrained value `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    /// `x = u`.
    Identity,
    /// `x = exp(u)`, log-Jacobian `u`.
    Log,
}

impl Transform {
    pub fn forward(self, u: f64) -> f64 {
        match self {
            Transform::Identity => u,
            Transform::Log => u.exp(),
        }
    }

    pub fn inverse(self, x: f64) -> f64 {
        match self {
            Transform::Identity => x,
            Transform::Log => x.ln(),
        }
    }

    /// `log |dx/du|`.
    pub fn log_jacobian(self, u: f64) -> f64 {
        match self {
            Transform::Identity => 0.0,
            Transform::Log => u,
        }
    }

    /// Chain an adjoint on `x` back to `u`, including the Jacobian term.
    pub fn pullback(self, x: f64, adj_x: f64) -> f64 {
        match self {
            Transform::Identity => adj_x,
            Transform::Log => adj_x * x + 1.0,
        }
    }
}

/// Deterministic operation of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Elementwise `exp(input)`.
    Exp { input: NodeId },
    /// Renewal recursion seeded by a scalar and driven by `r_t`.
    Renewal { kernel: GenerationTimeKernel, seed: NodeId, r_t: NodeId },
    /// Full convolution of `input` with the mass in `pmf`, truncated to `len(input)`.
    DelayConvolution { input: NodeId, pmf: NodeId },
    /// Elementwise clamp to `[lower, upper]`.
    Clip { input: NodeId, lower: f64, upper: f64 },
    /// `out[i] = scale[i] · input[indices[i]]`.
    MaskedProduct { scale: NodeId, input: NodeId, indices: Vec<usize> },
    /// `out[i] = input[indices[i]]`.
    Gather { input: NodeId, indices: Vec<usize> },
}

impl Op {
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            Op::Exp { input } | Op::Clip { input, .. } | Op::Gather { input, .. } => vec![*input],
            Op::Renewal { seed, r_t, .. } => vec![*seed, *r_t],
            Op::DelayConvolution { input, pmf } => vec![*input, *pmf],
            Op::MaskedProduct { scale, input, .. } => vec![*scale, *input],
        }
    }

    fn shift(&mut self, offset: usize) {
        match self {
            Op::Exp { input } | Op::Clip { input, .. } | Op::Gather { input, .. } => {
                *input = input.shifted(offset);
            }
            Op::Renewal { seed, r_t, .. } => {
                *seed = seed.shifted(offset);
                *r_t = r_t.shifted(offset);
            }
            Op::DelayConvolution { input, pmf } => {
                *input = input.shifted(offset);
                *pmf = pmf.shifted(offset);
            }
            Op::MaskedProduct { scale, input, .. } => {
                *scale = scale.shifted(offset);
                *input = input.shifted(offset);
            }
        }
    }
}

/// Distribution of observed data given upstream nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObservationModel {
    /// Negative binomial with mean `mu` and dispersion `alpha` (scalar).
    NegativeBinomial { mu: NodeId, alpha: NodeId },
}

impl ObservationModel {
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            ObservationModel::NegativeBinomial { mu, alpha } => vec![*mu, *alpha],
        }
    }

    fn shift(&mut self, offset: usize) {
        match self {
            ObservationModel::NegativeBinomial { mu, alpha } => {
                *mu = mu.shifted(offset);
                *alpha = alpha.shifted(offset);
            }
        }
    }
}

/// Tagged payload of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    RandomVariable { prior: Prior },
    Deterministic { op: Op },
    Data { values: Array1<f64> },
    Likelihood { model: ObservationModel, observed: NodeId },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::RandomVariable { .. } => "RandomVariable",
            NodeKind::Deterministic { .. } => "Deterministic",
            NodeKind::Data { .. } => "Data",
            NodeKind::Likelihood { .. } => "Likelihood",
        }
    }
}

/// A named graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub dims: Vec<String>,
    pub len: usize,
    pub kind: NodeKind,
}

impl Node {
    pub fn random_variable(name: String, dims: Vec<String>, len: usize, prior: Prior) -> Self {
        Self { name, dims, len, kind: NodeKind::RandomVariable { prior } }
    }

    pub fn deterministic(name: String, dims: Vec<String>, len: usize, op: Op) -> Self {
        Self { name, dims, len, kind: NodeKind::Deterministic { op } }
    }

    pub fn data(name: String, dims: Vec<String>, values: Array1<f64>) -> Self {
        Self { name, dims, len: values.len(), kind: NodeKind::Data { values } }
    }

    pub fn likelihood(
        name: String, dims: Vec<String>, len: usize, model: ObservationModel, observed: NodeId,
    ) -> Self {
        Self { name, dims, len, kind: NodeKind::Likelihood { model, observed } }
    }

    /// Upstream node ids, in payload order.
    pub fn inputs(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::RandomVariable { .. } | NodeKind::Data { .. } => Vec::new(),
            NodeKind::Deterministic { op } => op.inputs(),
            NodeKind::Likelihood { model, observed } => {
                let mut ids = model.inputs();
                ids.push(*observed);
                ids
            }
        }
    }

    /// Move every upstream reference by `offset` (used when merging graphs).
    pub(crate) fn shift(&mut self, offset: usize) {
        match &mut self.kind {
            NodeKind::RandomVariable { .. } | NodeKind::Data { .. } => {}
            NodeKind::Deterministic { op } => op.shift(offset),
            NodeKind::Likelihood { model, observed } => {
                model.shift(offset);
                *observed = observed.shifted(offset);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // The Gamma(mean, sd) helper yields the reference shape/rate.
    //
    // Given
    // -----
    // - mean 6, sd 1.
    //
    // Expect
    // ------
    // - shape 36, rate 6; initial value 6; log transform.
    fn gamma_from_mean_sd_matches_moments() {
        let prior = Prior::gamma_from_mean_sd(6.0, 1.0);

        assert_eq!(prior, Prior::Gamma { shape: 36.0, rate: 6.0 });
        assert_eq!(prior.initial_value(1)[0], 6.0);
        assert_eq!(prior.transform(), Transform::Log);
    }

    #[test]
    // Purpose
    // -------
    // Shifting a likelihood moves every reference, including `observed`.
    //
    // Given
    // -----
    // - NB(mu = 3, alpha = 4) observed = 5, shifted by 10.
    //
    // Expect
    // ------
    // - Inputs become [13, 14, 15].
    fn shift_moves_all_references() {
        let mut node = Node::likelihood(
            "likelihood".to_string(),
            vec![],
            1,
            ObservationModel::NegativeBinomial { mu: NodeId(3), alpha: NodeId(4) },
            NodeId(5),
        );

        node.shift(10);

        assert_eq!(node.inputs(), vec![NodeId(13), NodeId(14), NodeId(15)]);
    }

    #[test]
    // Purpose
    // -------
    // Log transform round-trips and its pullback includes the Jacobian.
    //
    // Given
    // -----
    // - u = 0.3, adjoint on x of 2.
    //
    // Expect
    // ------
    // - inverse(forward(u)) = u; pullback = 2·e^0.3 + 1.
    fn log_transform_pullback_includes_jacobian() {
        let t = Transform::Log;
        let x = t.forward(0.3);

        assert!((t.inverse(x) - 0.3).abs() < 1e-12);
        assert!((t.pullback(x, 2.0) - (2.0 * 0.3f64.exp() + 1.0)).abs() < 1e-12);
    }
}
