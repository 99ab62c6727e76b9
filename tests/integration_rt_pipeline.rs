//! Integration tests for the renewal pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path: raw observations → model graph →
//!   posterior ensemble → scale factor and case curves.
//! - Exercise both reference samplers through the public `sample` entry
//!   point, including posterior predictive draws and the version stamp.
//!
//! Coverage
//! --------
//! - `renewal::models::builder`: single- and multi-region builds.
//! - `sampling::api::sample` with `FixedSampler` and `HamiltonianSampler`.
//! - `posterior::view`: scale factor and case curves, with and without a
//!   region scope.
//!
//! Exclusions
//! ----------
//! - Building blocks (alignment, kernel, ops, adaptation) are covered by
//!   unit tests.
//! - Posterior accuracy of the HMC sampler; runs here are short smoke runs.
use ndarray::Array1;
use rtlive::{
    posterior::view::PosteriorView,
    renewal::{
        core::{observations::ObservationTable, options::ModelOptions},
        graph::container::ProbabilisticGraph,
        models::builder::{attach_model, build_model},
    },
    sampling::{
        api::sample,
        config::SamplerOverrides,
        fixed::FixedSampler,
        hmc::{HamiltonianSampler, HmcOptions},
        traits::MODEL_VERSION,
    },
};

const GENERATION_TIME: [f64; 5] = [0.0, 0.2, 0.3, 0.3, 0.2];
const DELAY: [f64; 4] = [0.1, 0.4, 0.3, 0.2];

/// 14 days from 2020-03-01: cases [0, 0, 0, 5, 6, …, 15], 100 tests a day.
fn observations() -> ObservationTable {
    let labels: Vec<String> = (1..=14).map(|d| format!("2020-03-{d:02}")).collect();
    let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
    let cases = [0.0, 0.0, 0.0].into_iter().chain((5..=15).map(f64::from)).map(Some).collect();
    ObservationTable::from_iso_dates(&labels, cases)
        .and_then(|t| t.with_column("daily_tests", vec![Some(100.0); 14]))
        .expect("valid observations")
}

fn fixed_point(region: Option<&str>, n: usize) -> FixedSampler {
    let name = |n: &str| region.map_or(n.to_string(), |r| format!("{r}::{n}"));
    FixedSampler::default()
        .with(&name("log_r_t"), Array1::zeros(n))
        .with(&name("seed"), Array1::from_elem(1, 1.0))
        .with(&name("alpha"), Array1::from_elem(1, 10.0))
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
// Purpose
// -------
// The reference scenario runs end to end with a fixed posterior.
//
// Given
// -----
// - 14 observed days, 3 buffer days, the reference masses.
// - seed = 1, r_t ≡ 1, alpha = 10 for 2 chains × 5 draws.
//
// Expect
// ------
// - Version-tagged ensemble; finite scale factors; curves of 14 days,
//   finite and non-negative, with non-decreasing totals.
fn fixed_posterior_yields_finite_curves() {
    init_logger();
    let graph = build_model(
        &observations(),
        &GENERATION_TIME,
        &DELAY,
        "daily_tests",
        &ModelOptions::with_buffer_days(3),
    )
    .expect("model builds");
    let n = graph.coords()["date"].len();
    let overrides = SamplerOverrides::from_pairs([("chains", "2"), ("draws", "5"), ("random_seed", "42")])
        .expect("valid overrides");

    let ensemble = sample(&graph, &fixed_point(None, n), &overrides).expect("sampling succeeds");
    let view = PosteriorView::new(&ensemble, None).expect("current layout");
    let scale = view.scale_factor().expect("scale factor");
    let curves = view.case_curves().expect("case curves");

    assert_eq!(n, 14);
    assert_eq!(ensemble.model_version(), Some(MODEL_VERSION));
    assert_eq!(scale.len(), 10);
    assert_eq!(scale.non_finite_count(), 0);
    assert_eq!(curves.n_days(), 14);
    assert_eq!(curves.n_samples(), 10);
    assert_eq!(curves.dates, graph.coords()["date"]);
    for curve in [&curves.new_cases, &curves.total_cases, &curves.active_cases] {
        assert!(curve.iter().all(|v| v.is_finite() && *v >= 0.0));
    }
    for column in curves.total_cases.columns() {
        assert!(column.iter().zip(column.iter().skip(1)).all(|(a, b)| b >= a));
    }
}

#[test]
// Purpose
// -------
// A short HMC run produces a complete ensemble.
//
// Given
// -----
// - The reference scenario, 2 chains × (30 tune + 15 draws), seed 7,
//   8 leapfrog steps, 2 cores.
//
// Expect
// ------
// - Posterior shapes (2, 15, …), version tag, finite predictive counts on
//   `date_with_data`, per-chain sample stats, finite curves.
fn short_hmc_run_is_complete() {
    init_logger();
    let graph = build_model(
        &observations(),
        &GENERATION_TIME,
        &DELAY,
        "daily_tests",
        &ModelOptions::with_buffer_days(3),
    )
    .expect("model builds");
    let overrides = SamplerOverrides::from_pairs([
        ("chains", "2"),
        ("draws", "15"),
        ("tune", "30"),
        ("cores", "2"),
        ("target_accept", "0.8"),
        ("random_seed", "7"),
    ])
    .expect("valid overrides");
    let sampler = HamiltonianSampler::new(HmcOptions { n_leapfrog: 8, ..HmcOptions::default() });

    let ensemble = sample(&graph, &sampler, &overrides).expect("sampling succeeds");

    assert_eq!(ensemble.posterior["log_r_t"].values.shape(), &[2, 15, 14]);
    assert_eq!(ensemble.posterior["seed"].values.shape(), &[2, 15]);
    assert_eq!(ensemble.model_version(), Some(MODEL_VERSION));
    let predictive = &ensemble.posterior_predictive["likelihood"];
    assert_eq!(predictive.last_dim(), Some("date_with_data"));
    assert!(predictive.values.iter().all(|y| y.is_finite() && *y >= 0.0));
    assert_eq!(ensemble.sample_stats["acceptance_rate"].values.len(), 2);
    assert_eq!(ensemble.sample_stats["diverging"].values.shape(), &[2, 15]);

    let view = PosteriorView::new(&ensemble, None).expect("current layout");
    let curves = view.case_curves().expect("case curves");
    assert_eq!(curves.new_cases.dim(), (14, 30));
}

#[test]
// Purpose
// -------
// Two regions share one graph and are reconstructed independently.
//
// Given
// -----
// - The reference scenario attached as "BY" and "BE" to one graph.
// - A fixed posterior for both regions.
//
// Expect
// ------
// - Scoped names in the ensemble; each region's view resolves and yields
//   identical factors (identical data and parameters).
fn regions_are_reconstructed_independently() {
    init_logger();
    let mut graph = ProbabilisticGraph::new();
    for region in ["BY", "BE"] {
        attach_model(
            &mut graph,
            &observations(),
            &GENERATION_TIME,
            &DELAY,
            "daily_tests",
            &ModelOptions::for_region(region, 3),
        )
        .expect("region attaches");
    }
    let n = graph.coords()["BY::date"].len();
    let mut sampler = fixed_point(Some("BY"), n);
    sampler.values.extend(fixed_point(Some("BE"), n).values);
    let overrides = SamplerOverrides { chains: Some(1), draws: Some(3), ..SamplerOverrides::default() };

    let ensemble = sample(&graph, &sampler, &overrides).expect("sampling succeeds");
    let by = PosteriorView::new(&ensemble, Some("BY")).and_then(|v| v.scale_factor()).expect("BY");
    let be = PosteriorView::new(&ensemble, Some("BE")).and_then(|v| v.scale_factor()).expect("BE");

    assert!(ensemble.posterior.contains_key("BY::infections"));
    assert!(ensemble.observed_data.contains_key("BE::likelihood"));
    assert_eq!(by, be);
    assert!(PosteriorView::new(&ensemble, None).is_err());
}
