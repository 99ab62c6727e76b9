//! builder — assemble the renewal model graph from observations.
//!
//! Purpose
//! -------
//! Turn a raw [`ObservationTable`], a generation-time mass and a reporting
//! delay mass into the fifteen-node [`ProbabilisticGraph`] of the
//! test-adjusted renewal model:
//!
//! ```text
//! log_r_t ~ GRW(σ)              r_t = exp(log_r_t)
//! seed ~ Exp(mean 0.02)         infections = renewal(seed, r_t; K)
//! test_adjusted_positive = infections ⊛ p_delay (truncated)
//! exposure = clip(tests, 0.1·max(tests), 1e9)
//! positive = exposure ⊙ test_adjusted_positive[has_testcounts]
//! alpha ~ Gamma(mean 6, sd 1)
//! observed_positive_where_data ~ NB(positive[has_data_wrt_testcounts], alpha)
//! ```
//!
//! Key behaviors
//! -------------
//! - [`build_model`] returns a fresh graph; [`attach_model`] adds one region
//!   to an existing graph, so several regions can share a container.
//! - Every input is validated before anything is attached. The region is
//!   staged in its own graph and merged atomically, so a failed build never
//!   leaves a partial region behind.
//! - Construction is deterministic and consumes no randomness.
//!
//! Conventions
//! -----------
//! - With `options.region = Some(r)`, node and axis names become `"r::name"`.
use log::info;
use ndarray::Array1;

use crate::renewal::{
    core::{
        align::{align_observations, AlignedObservations},
        kernel::GenerationTimeKernel,
        masks::{mask_indices, select},
        observations::ObservationTable,
        options::ModelOptions,
        pmf::Pmf,
    },
    errors::RenewalResult,
    graph::{
        container::ProbabilisticGraph,
        node::{Node, ObservationModel, Op, Prior},
    },
};

pub const DATE: &str = "date";
pub const DATE_WITH_CASES: &str = "date_with_cases";
pub const DATE_WITH_TESTCOUNTS: &str = "date_with_testcounts";
pub const DATE_WITH_DATA: &str = "date_with_data";

/// Build the renewal model for `observed` into a new graph.
///
/// Parameters
/// ----------
/// - `observed`: raw observations with a `new_cases` column and `test_col`.
/// - `p_generation_time`, `p_delay`: probability masses over day offsets.
/// - `test_col`: name of the column holding daily test counts.
/// - `options`: buffer days, region scope and prior constants.
///
/// Errors
/// ------
/// - `RenewalError` for a missing test column, empty or invalid masses,
///   fewer than two aligned days, or invalid options.
pub fn build_model(
    observed: &ObservationTable, p_generation_time: &[f64], p_delay: &[f64], test_col: &str,
    options: &ModelOptions,
) -> RenewalResult<ProbabilisticGraph> {
    let mut graph = ProbabilisticGraph::new();
    attach_model(&mut graph, observed, p_generation_time, p_delay, test_col, options)?;
    Ok(graph)
}

/// Build the renewal model for `observed` and merge it into `graph`.
///
/// Errors
/// ------
/// - Everything [`build_model`] reports, plus `DuplicateNode` /
///   `DuplicateAxis` when the region's names collide with `graph`. On error
///   `graph` is unchanged.
pub fn attach_model(
    graph: &mut ProbabilisticGraph, observed: &ObservationTable, p_generation_time: &[f64],
    p_delay: &[f64], test_col: &str, options: &ModelOptions,
) -> RenewalResult<()> {
    options.validate()?;
    let gt = Pmf::new("p_generation_time", p_generation_time)?;
    let delay = Pmf::new("p_delay", p_delay)?;
    let aligned = align_observations(observed, test_col, options.buffer_days)?;
    let kernel = GenerationTimeKernel::new(&gt, aligned.len())?;

    info!(
        "Building renewal model{}: {} days, {} with cases, {} with test counts, {} with both.",
        options.region.as_deref().map(|r| format!(" for {r}")).unwrap_or_default(),
        aligned.len(),
        aligned.axes.with_cases.len(),
        aligned.axes.with_testcounts.len(),
        aligned.axes.with_data.len(),
    );

    let staged = stage_region(&aligned, &gt, &delay, kernel, options)?;
    graph.absorb(staged)
}

fn stage_region(
    aligned: &AlignedObservations, gt: &Pmf, delay: &Pmf, kernel: GenerationTimeKernel,
    options: &ModelOptions,
) -> RenewalResult<ProbabilisticGraph> {
    let name = |n: &str| options.scoped(n);
    let dims = |axis: &str| vec![options.scoped(axis)];
    let n = aligned.len();
    let masks = &aligned.masks;

    let mut g = ProbabilisticGraph::new();
    g.add_coord(&name(DATE), aligned.axes.full.clone())?;
    g.add_coord(&name(DATE_WITH_CASES), aligned.axes.with_cases.clone())?;
    g.add_coord(&name(DATE_WITH_TESTCOUNTS), aligned.axes.with_testcounts.clone())?;
    g.add_coord(&name(DATE_WITH_DATA), aligned.axes.with_data.clone())?;

    let log_r_t = g.add_node(Node::random_variable(
        name("log_r_t"),
        dims(DATE),
        n,
        Prior::GaussianRandomWalk { sigma: options.random_walk_sigma },
    ))?;
    let r_t = g.add_node(Node::deterministic(name("r_t"), dims(DATE), n, Op::Exp { input: log_r_t }))?;
    g.add_node(Node::data(name("p_generation_time"), vec![], gt.weights().clone()))?;
    let seed = g.add_node(Node::random_variable(
        name("seed"),
        vec![],
        1,
        Prior::exponential_from_mean(options.seed_mean),
    ))?;
    let infections = g.add_node(Node::deterministic(
        name("infections"),
        dims(DATE),
        n,
        Op::Renewal { kernel, seed, r_t },
    ))?;
    let p_delay = g.add_node(Node::data(name("p_delay"), vec![], delay.weights().clone()))?;
    let test_adjusted_positive = g.add_node(Node::deterministic(
        name("test_adjusted_positive"),
        dims(DATE),
        n,
        Op::DelayConvolution { input: infections, pmf: p_delay },
    ))?;

    let tests: Array1<f64> = select(&aligned.daily_tests, &masks.has_testcounts).into_iter().flatten().collect();
    let n_tests = tests.len();
    let floor = options.exposure_floor_fraction * aligned.max_daily_tests().unwrap_or(0.0);
    let tests = g.add_node(Node::data(name("tests"), dims(DATE_WITH_TESTCOUNTS), tests))?;
    let exposure = g.add_node(Node::deterministic(
        name("exposure"),
        dims(DATE_WITH_TESTCOUNTS),
        n_tests,
        Op::Clip { input: tests, lower: floor, upper: options.exposure_cap },
    ))?;
    let positive = g.add_node(Node::deterministic(
        name("positive"),
        dims(DATE_WITH_TESTCOUNTS),
        n_tests,
        Op::MaskedProduct {
            scale: exposure,
            input: test_adjusted_positive,
            indices: mask_indices(&masks.has_testcounts),
        },
    ))?;
    let where_data = mask_indices(&masks.has_data_wrt_testcounts);
    let n_data = where_data.len();
    let positive_where_data = g.add_node(Node::deterministic(
        name("positive_where_data"),
        dims(DATE_WITH_DATA),
        n_data,
        Op::Gather { input: positive, indices: where_data },
    ))?;

    let observed_positive: Array1<f64> =
        select(&aligned.new_cases, &masks.has_cases).into_iter().flatten().collect();
    g.add_node(Node::data(name("observed_positive"), dims(DATE_WITH_CASES), observed_positive))?;
    let observed_where_data: Array1<f64> =
        select(&aligned.new_cases, &masks.has_data).into_iter().flatten().collect();
    let observed_where_data = g.add_node(Node::data(
        name("observed_positive_where_data"),
        dims(DATE_WITH_DATA),
        observed_where_data,
    ))?;

    let alpha = g.add_node(Node::random_variable(
        name("alpha"),
        vec![],
        1,
        Prior::gamma_from_mean_sd(options.alpha_mean, options.alpha_sd),
    ))?;
    g.add_node(Node::likelihood(
        name("likelihood"),
        dims(DATE_WITH_DATA),
        n_data,
        ObservationModel::NegativeBinomial { mu: positive_where_data, alpha },
        observed_where_data,
    ))?;
    Ok(g)
}
