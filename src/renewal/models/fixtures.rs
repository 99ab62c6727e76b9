//! Shared test fixtures: a small synthetic region and its model graph.
use chrono::NaiveDate;

use crate::renewal::{
    core::{observations::ObservationTable, options::ModelOptions},
    graph::container::ProbabilisticGraph,
    models::builder::build_model,
};

pub(crate) const GENERATION_TIME: [f64; 5] = [0.0, 0.2, 0.3, 0.3, 0.2];
pub(crate) const DELAY: [f64; 4] = [0.1, 0.4, 0.3, 0.2];
pub(crate) const BUFFER_DAYS: usize = 3;

/// 14 days from 2020-03-01: three zero-case days, then 5..=15 cases, with
/// 100 tests every day.
pub(crate) fn example_table() -> ObservationTable {
    let start = NaiveDate::from_ymd_opt(2020, 3, 1).expect("valid date");
    let dates = start.iter_days().take(14).collect();
    let cases = [0.0, 0.0, 0.0].into_iter().chain((5..=15).map(f64::from)).map(Some).collect();
    ObservationTable::new(dates, cases)
        .and_then(|t| t.with_column("daily_tests", vec![Some(100.0); 14]))
        .expect("valid example table")
}

pub(crate) fn example_graph() -> ProbabilisticGraph {
    build_model(
        &example_table(),
        &GENERATION_TIME,
        &DELAY,
        "daily_tests",
        &ModelOptions::with_buffer_days(BUFFER_DAYS),
    )
    .expect("example model builds")
}
