//! renewal::graph — a small probabilistic-graph container and its density.
//!
//! Purpose
//! -------
//! Represent a Bayesian model as an ordered list of named nodes (free
//! random variables, deterministic ops, data and likelihoods) attached to
//! named date axes, and evaluate its joint log density and gradient over
//! the unconstrained free parameters.
//!
//! Key behaviors
//! -------------
//! - `node`: node payloads, priors, transforms and ops.
//! - `container`: [`ProbabilisticGraph`](container::ProbabilisticGraph) with
//!   structural validation and atomic region merges.
//! - `distributions`: prior and negative-binomial log densities and their
//!   gradients.
//! - `ops`: forward values and vector-Jacobian products of the ops.
//! - `density`: [`ModelDensity`](density::ModelDensity), the θ layout and
//!   reverse-mode gradient.
//!
//! Conventions
//! -----------
//! - Nodes only reference earlier nodes, so declaration order is a
//!   topological order.

pub mod container;
pub mod density;
pub mod distributions;
pub mod node;
pub mod ops;
