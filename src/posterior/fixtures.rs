//! Hand-built ensembles in the current and the legacy layout.
//!
//! Six days d0..d5; cases on d2..=d5, tests on d1..=d4, so the with-data
//! days are d2..=d4. One chain, two draws; draw 1 doubles draw 0.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use ndarray::{Array1, ArrayD, IxDyn};

use crate::sampling::{
    ensemble::{DataArray, PosteriorEnsemble},
    traits::MODEL_VERSION,
};

pub(crate) const P_OBSERVE: f64 = 0.9;

fn day(i: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 4, 1 + i).expect("valid date")
}

fn days(range: std::ops::RangeInclusive<u32>) -> Vec<NaiveDate> {
    range.map(day).collect()
}

fn draws(axis: &str, row: &[f64]) -> DataArray {
    let flat: Vec<f64> = row.iter().copied().chain(row.iter().map(|v| 2.0 * v)).collect();
    let values = ArrayD::from_shape_vec(IxDyn(&[1, 2, row.len()]), flat).expect("matching shape");
    DataArray { dims: vec!["chain".into(), "draw".into(), axis.into()], values }
}

fn data(axis: &str, values: &[f64]) -> DataArray {
    DataArray::from_vec(axis, Array1::from(values.to_vec()))
}

fn base() -> PosteriorEnsemble {
    let mut ensemble = PosteriorEnsemble::default();
    ensemble.posterior.insert("infections".into(), draws("date", &[1.0, 1.5, 2.0, 2.5, 3.0, 3.5]));
    ensemble
        .posterior
        .insert("test_adjusted_positive".into(), draws("date", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    ensemble.constant_data.insert("p_delay".into(), data("p_delay_dim_0", &[0.4, 0.3, 0.2]));
    ensemble
        .constant_data
        .insert("p_generation_time".into(), data("p_generation_time_dim_0", &[0.0, 0.5, 0.5]));
    ensemble.coords = BTreeMap::from([("date".to_string(), days(0..=5))]);
    ensemble.attrs.insert("model_version".into(), MODEL_VERSION.into());
    ensemble
}

pub(crate) fn current_layout() -> PosteriorEnsemble {
    let mut ensemble = base();
    let exposure = [50.0, 100.0, 80.0, 60.0];
    let flat: Vec<f64> = exposure.iter().chain(exposure.iter()).copied().collect();
    let values = ArrayD::from_shape_vec(IxDyn(&[1, 2, 4]), flat).expect("matching shape");
    ensemble.posterior.insert(
        "exposure".into(),
        DataArray { dims: vec!["chain".into(), "draw".into(), "date_with_testcounts".into()], values },
    );
    ensemble
        .constant_data
        .insert("observed_positive".into(), data("date_with_cases", &[10.0, 20.0, 30.0, 40.0]));
    ensemble.observed_data.insert("likelihood".into(), data("date_with_data", &[10.0, 20.0, 30.0]));
    ensemble.coords.insert("date_with_cases".into(), days(2..=5));
    ensemble.coords.insert("date_with_testcounts".into(), days(1..=4));
    ensemble.coords.insert("date_with_data".into(), days(2..=4));
    ensemble
}

pub(crate) fn legacy_layout() -> PosteriorEnsemble {
    let mut ensemble = base();
    ensemble.constant_data.insert("exposure".into(), data("date", &[10.0, 50.0, 100.0, 80.0, 60.0, 10.0]));
    ensemble
        .constant_data
        .insert("observed_positive".into(), data("date", &[0.0, 0.0, 10.0, 20.0, 30.0, 40.0]));
    ensemble.observed_data.insert("likelihood".into(), data("nonzero_date", &[10.0, 20.0, 30.0]));
    ensemble.coords.insert("nonzero_date".into(), days(2..=4));
    ensemble
}
