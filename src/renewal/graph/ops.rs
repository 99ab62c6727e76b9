//! ops — forward evaluation and vector-Jacobian products of deterministic ops.
//!
//! Every [`Op`] is evaluated against the value table of already-computed
//! nodes (indexed by [`NodeId`]). The reverse pass returns one adjoint
//! contribution per upstream input; the density evaluator accumulates them.
use ndarray::{Array1, ArrayView1};

use crate::renewal::{
    core::recursion::{
        clip, clip_vjp, convolve_truncated, convolve_truncated_vjp, simulate_infections,
        simulate_infections_vjp,
    },
    errors::{RenewalError, RenewalResult},
    graph::node::{Node, NodeId, Op},
};

impl Op {
    /// Compute the op's output from the values of its inputs.
    pub fn forward(&self, values: &[Array1<f64>]) -> Array1<f64> {
        let v = |id: &NodeId| values[id.index()].view();
        match self {
            Op::Exp { input } => v(input).mapv(f64::exp),
            Op::Renewal { kernel, seed, r_t } => simulate_infections(kernel, v(seed)[0], v(r_t)),
            Op::DelayConvolution { input, pmf } => convolve_truncated(v(input), v(pmf)),
            Op::Clip { input, lower, upper } => clip(v(input), *lower, *upper),
            Op::MaskedProduct { scale, input, indices } => {
                let (scale, input) = (v(scale), v(input));
                indices.iter().enumerate().map(|(i, &j)| scale[i] * input[j]).collect()
            }
            Op::Gather { input, indices } => {
                let input = v(input);
                indices.iter().map(|&j| input[j]).collect()
            }
        }
    }

    /// Adjoint contributions to each input given the output adjoint `adj`.
    ///
    /// `output` is the value produced by [`Op::forward`] for the same inputs.
    pub fn vjp(
        &self, values: &[Array1<f64>], output: ArrayView1<'_, f64>, adj: ArrayView1<'_, f64>,
    ) -> Vec<(NodeId, Array1<f64>)> {
        let v = |id: &NodeId| values[id.index()].view();
        match self {
            Op::Exp { input } => vec![(*input, &adj * &output)],
            Op::Renewal { kernel, seed, r_t } => {
                let (d_seed, d_r) = simulate_infections_vjp(kernel, v(r_t), output, adj);
                vec![(*seed, Array1::from_elem(1, d_seed)), (*r_t, d_r)]
            }
            Op::DelayConvolution { input, pmf } => {
                vec![(*input, convolve_truncated_vjp(adj, v(pmf)))]
            }
            Op::Clip { input, lower, upper } => {
                vec![(*input, clip_vjp(v(input), adj, *lower, *upper))]
            }
            Op::MaskedProduct { scale, input, indices } => {
                let (scale_v, input_v) = (v(scale), v(input));
                let mut d_scale = Array1::zeros(scale_v.len());
                let mut d_input = Array1::zeros(input_v.len());
                for (i, &j) in indices.iter().enumerate() {
                    d_scale[i] += adj[i] * input_v[j];
                    d_input[j] += adj[i] * scale_v[i];
                }
                vec![(*scale, d_scale), (*input, d_input)]
            }
            Op::Gather { input, indices } => {
                let mut d_input = Array1::zeros(v(input).len());
                for (i, &j) in indices.iter().enumerate() {
                    d_input[j] += adj[i];
                }
                vec![(*input, d_input)]
            }
        }
    }

    /// Check that the op is consistent with the nodes it references and with
    /// the declared output length.
    ///
    /// Errors
    /// ------
    /// - `RenewalError::ShapeMismatch` when an input or the output has the
    ///   wrong length, or an index points past its input.
    pub fn validate(&self, name: &str, len: usize, nodes: &[Node]) -> RenewalResult<()> {
        let len_of = |id: &NodeId| nodes[id.index()].len;
        let expect = |what: &str, expected: usize, actual: usize| {
            if expected == actual {
                Ok(())
            } else {
                Err(RenewalError::ShapeMismatch { name: what.to_string(), expected, actual })
            }
        };
        match self {
            Op::Exp { input } | Op::Clip { input, .. } | Op::DelayConvolution { input, .. } => {
                expect(name, len_of(input), len)
            }
            Op::Renewal { kernel, seed, r_t } => {
                expect(name, kernel.n_days(), len)?;
                expect(&nodes[seed.index()].name, 1, len_of(seed))?;
                expect(&nodes[r_t.index()].name, len, len_of(r_t))
            }
            Op::MaskedProduct { scale, input, indices } => {
                expect(name, indices.len(), len)?;
                expect(&nodes[scale.index()].name, len, len_of(scale))?;
                check_indices(name, indices, len_of(input))
            }
            Op::Gather { input, indices } => {
                expect(name, indices.len(), len)?;
                check_indices(name, indices, len_of(input))
            }
        }
    }
}

fn check_indices(name: &str, indices: &[usize], bound: usize) -> RenewalResult<()> {
    match indices.iter().find(|&&j| j >= bound) {
        Some(&j) => {
            Err(RenewalError::ShapeMismatch { name: name.to_string(), expected: bound, actual: j + 1 })
        }
        None => Ok(()),
    }
}
