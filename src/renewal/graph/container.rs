//! container — the probabilistic graph.
//!
//! Purpose
//! -------
//! Own an ordered list of [`Node`]s plus the named coordinate axes they are
//! laid out on. Insertion validates every structural invariant, so a graph
//! that exists is always acyclic and shape-consistent.
//!
//! Key behaviors
//! -------------
//! - [`ProbabilisticGraph::add_coord`] / [`ProbabilisticGraph::add_node`]:
//!   append axes and nodes, rejecting duplicates, unknown dims, forward
//!   references and shape mismatches.
//! - [`ProbabilisticGraph::absorb`]: merge another graph (e.g. a second
//!   region) atomically; on any collision nothing is changed.
//! - Lookups by id and by name, and iteration over free random variables.
//!
//! Invariants & assumptions
//! ------------------------
//! - `nodes[i]` only references ids `< i`.
//! - Node names and axis names are unique.
//! - A node with one dim has `len == coords[dim].len()`.
//!
//! Conventions
//! -----------
//! - The graph is plain data (`Clone`, `Serialize`, `Deserialize`, `Sync`)
//!   and is shared read-only with samplers.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::renewal::{
    errors::{RenewalError, RenewalResult},
    graph::node::{Node, NodeId, NodeKind, ObservationModel, Prior},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbabilisticGraph {
    nodes: Vec<Node>,
    names: BTreeMap<String, NodeId>,
    coords: BTreeMap<String, Vec<NaiveDate>>,
}

impl ProbabilisticGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named coordinate axis.
    ///
    /// Errors
    /// ------
    /// - `RenewalError::DuplicateAxis` if the name is taken.
    pub fn add_coord(&mut self, name: &str, dates: Vec<NaiveDate>) -> RenewalResult<()> {
        if self.coords.contains_key(name) {
            return Err(RenewalError::DuplicateAxis { name: name.to_string() });
        }
        self.coords.insert(name.to_string(), dates);
        Ok(())
    }

    /// Append a node and return its id.
    ///
    /// Errors
    /// ------
    /// - `DuplicateNode` for a taken name.
    /// - `UnknownAxis` for an unregistered dim.
    /// - `UnknownNode` for a reference to a node that does not exist yet.
    /// - `ShapeMismatch` when the length disagrees with the dim, the data,
    ///   or the op's inputs.
    pub fn add_node(&mut self, node: Node) -> RenewalResult<NodeId> {
        if self.names.contains_key(&node.name) {
            return Err(RenewalError::DuplicateNode { name: node.name });
        }
        for dim in &node.dims {
            let axis = self
                .coords
                .get(dim)
                .ok_or_else(|| RenewalError::UnknownAxis { name: dim.clone() })?;
            if axis.len() != node.len {
                return Err(RenewalError::ShapeMismatch {
                    name: node.name.clone(),
                    expected: axis.len(),
                    actual: node.len,
                });
            }
        }
        if let Some(id) = node.inputs().into_iter().find(|id| id.index() >= self.nodes.len()) {
            return Err(RenewalError::UnknownNode { id: id.index() });
        }
        self.validate_payload(&node)?;

        let id = NodeId(self.nodes.len());
        self.names.insert(node.name.clone(), id);
        self.nodes.push(node);
        Ok(id)
    }

    fn validate_payload(&self, node: &Node) -> RenewalResult<()> {
        let mismatch = |name: &str, expected: usize, actual: usize| RenewalError::ShapeMismatch {
            name: name.to_string(),
            expected,
            actual,
        };
        match &node.kind {
            NodeKind::RandomVariable { prior } => validate_prior(prior),
            NodeKind::Data { values } if values.len() != node.len => {
                Err(mismatch(&node.name, node.len, values.len()))
            }
            NodeKind::Data { .. } => Ok(()),
            NodeKind::Deterministic { op } => op.validate(&node.name, node.len, &self.nodes),
            NodeKind::Likelihood { model, observed } => {
                let observed = &self.nodes[observed.index()];
                if observed.len != node.len {
                    return Err(mismatch(&observed.name, node.len, observed.len));
                }
                match model {
                    ObservationModel::NegativeBinomial { mu, alpha } => {
                        let (mu, alpha) = (&self.nodes[mu.index()], &self.nodes[alpha.index()]);
                        if mu.len != node.len {
                            return Err(mismatch(&mu.name, node.len, mu.len));
                        }
                        if alpha.len != 1 {
                            return Err(mismatch(&alpha.name, 1, alpha.len));
                        }
                        Ok(())
                    }
                }
            }
        }
    }

    /// Merge `other` into `self`, shifting its node ids.
    ///
    /// Either every node and axis of `other` is added, or (on a name
    /// collision) `self` is left untouched.
    ///
    /// Errors
    /// ------
    /// - `DuplicateAxis` / `DuplicateNode` on the first collision found.
    pub fn absorb(&mut self, other: ProbabilisticGraph) -> RenewalResult<()> {
        if let Some(name) = other.coords.keys().find(|k| self.coords.contains_key(*k)) {
            return Err(RenewalError::DuplicateAxis { name: name.clone() });
        }
        if let Some(name) = other.names.keys().find(|k| self.names.contains_key(*k)) {
            return Err(RenewalError::DuplicateNode { name: name.clone() });
        }
        let offset = self.nodes.len();
        self.coords.extend(other.coords);
        for mut node in other.nodes {
            node.shift(offset);
            self.names.insert(node.name.clone(), NodeId(self.nodes.len()));
            self.nodes.push(node);
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> RenewalResult<&Node> {
        self.nodes.get(id.index()).ok_or(RenewalError::UnknownNode { id: id.index() })
    }

    pub fn id(&self, name: &str) -> RenewalResult<NodeId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| RenewalError::UnknownNodeName { name: name.to_string() })
    }

    pub fn node_by_name(&self, name: &str) -> RenewalResult<&Node> {
        self.node(self.id(name)?)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn coords(&self) -> &BTreeMap<String, Vec<NaiveDate>> {
        &self.coords
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Free random variables in declaration order.
    pub fn free_variables(&self) -> impl Iterator<Item = (NodeId, &Node, &Prior)> {
        self.nodes.iter().enumerate().filter_map(|(i, node)| match &node.kind {
            NodeKind::RandomVariable { prior } => Some((NodeId(i), node, prior)),
            _ => None,
        })
    }

    /// Likelihood nodes in declaration order.
    pub fn likelihoods(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Likelihood { .. }))
            .map(|(i, node)| (NodeId(i), node))
    }
}

fn validate_prior(prior: &Prior) -> RenewalResult<()> {
    let params: Vec<(&'static str, f64)> = match *prior {
        Prior::GaussianRandomWalk { sigma } => vec![("sigma", sigma)],
        Prior::Exponential { rate } => vec![("rate", rate)],
        Prior::Gamma { shape, rate } => vec![("shape", shape), ("rate", rate)],
    };
    for (param, value) in params {
        if !value.is_finite() || value <= 0.0 {
            return Err(RenewalError::InvalidPriorParameter { param, value });
        }
    }
    Ok(())
}
