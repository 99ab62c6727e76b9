use serde::{Deserialize, Serialize};

use crate::renewal::{
    core::align::DEFAULT_BUFFER_DAYS,
    errors::{RenewalError, RenewalResult},
};

/// Step standard deviation of the `log_r_t` random walk.
pub const RANDOM_WALK_SIGMA: f64 = 0.035;
/// Prior mean of the initial infection seed.
pub const SEED_MEAN: f64 = 0.02;
/// Prior mean of the negative-binomial dispersion `alpha`.
pub const ALPHA_MEAN: f64 = 6.0;
/// Prior standard deviation of `alpha`.
pub const ALPHA_SD: f64 = 1.0;
/// Exposure floor as a fraction of the largest daily test count.
pub const EXPOSURE_FLOOR_FRACTION: f64 = 0.1;
/// Numerical cap on exposure.
pub const EXPOSURE_CAP: f64 = 1e9;

/// `ModelOptions` — configuration for [`build_model`](crate::renewal::models::builder::build_model).
///
/// Purpose
/// -------
/// Carry the build-time knobs of the renewal model: the number of buffer
/// days, an optional region scope used to compose several regions into one
/// graph, and the prior constants. `Default` reproduces the reference
/// model; the constants are exposed mainly for sensitivity studies.
///
/// Fields
/// ------
/// - `buffer_days`: unobserved lead-in days (default 10).
/// - `region`: when `Some(r)`, node and axis names are prefixed `"r::"`.
/// - `random_walk_sigma`, `seed_mean`, `alpha_mean`, `alpha_sd`: prior constants.
/// - `exposure_floor_fraction`, `exposure_cap`: exposure clip bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub buffer_days: usize,
    pub region: Option<String>,
    pub random_walk_sigma: f64,
    pub seed_mean: f64,
    pub alpha_mean: f64,
    pub alpha_sd: f64,
    pub exposure_floor_fraction: f64,
    pub exposure_cap: f64,
}

impl ModelOptions {
    /// Default options with a custom number of buffer days.
    pub fn with_buffer_days(buffer_days: usize) -> Self {
        Self { buffer_days, ..Self::default() }
    }

    /// Default options scoped to `region`.
    pub fn for_region(region: &str, buffer_days: usize) -> Self {
        Self { buffer_days, region: Some(region.to_string()), ..Self::default() }
    }

    /// Check that every prior constant is finite and strictly positive.
    ///
    /// Errors
    /// ------
    /// - `RenewalError::InvalidPriorParameter` naming the first offending field.
    pub fn validate(&self) -> RenewalResult<()> {
        let checks = [
            ("random_walk_sigma", self.random_walk_sigma),
            ("seed_mean", self.seed_mean),
            ("alpha_mean", self.alpha_mean),
            ("alpha_sd", self.alpha_sd),
            ("exposure_floor_fraction", self.exposure_floor_fraction),
            ("exposure_cap", self.exposure_cap),
        ];
        for (param, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(RenewalError::InvalidPriorParameter { param, value });
            }
        }
        Ok(())
    }

    /// Prefix `name` with the region scope, if any.
    pub fn scoped(&self, name: &str) -> String {
        scoped(self.region.as_deref(), name)
    }
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            buffer_days: DEFAULT_BUFFER_DAYS,
            region: None,
            random_walk_sigma: RANDOM_WALK_SIGMA,
            seed_mean: SEED_MEAN,
            alpha_mean: ALPHA_MEAN,
            alpha_sd: ALPHA_SD,
            exposure_floor_fraction: EXPOSURE_FLOOR_FRACTION,
            exposure_cap: EXPOSURE_CAP,
        }
    }
}

/// `"region::name"` when a region is given, otherwise `name`.
pub fn scoped(region: Option<&str>, name: &str) -> String {
    match region {
        Some(region) => format!("{region}::{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Defaults mirror the reference model constants.
    //
    // Given
    // -----
    // - `ModelOptions::default()`.
    //
    // Expect
    // ------
    // - 10 buffer days, sigma 0.035, seed mean 0.02, alpha ~ (6, 1), no region.
    fn defaults_match_reference_constants() {
        let opts = ModelOptions::default();

        assert_eq!(opts.buffer_days, 10);
        assert_eq!(opts.random_walk_sigma, 0.035);
        assert_eq!(opts.seed_mean, 0.02);
        assert_eq!((opts.alpha_mean, opts.alpha_sd), (6.0, 1.0));
        assert!(opts.region.is_none());
        assert!(opts.validate().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Region scoping prefixes names; partial config files keep defaults.
    //
    // Given
    // -----
    // - A region "BY" and a JSON document that only sets `buffer_days`.
    //
    // Expect
    // ------
    // - "BY::seed" and defaults for every field not present in the JSON.
    fn scoping_and_partial_deserialization() {
        let opts = ModelOptions::for_region("BY", 7);
        let parsed: ModelOptions =
            serde_json::from_str(r#"{"buffer_days": 3}"#).expect("valid json");

        assert_eq!(opts.scoped("seed"), "BY::seed");
        assert_eq!(parsed.buffer_days, 3);
        assert_eq!(parsed.alpha_mean, ALPHA_MEAN);
    }

    #[test]
    // Purpose
    // -------
    // Non-positive constants are rejected.
    //
    // Given
    // -----
    // - `alpha_sd = 0`.
    //
    // Expect
    // ------
    // - `InvalidPriorParameter { param: "alpha_sd", .. }`.
    fn validate_rejects_non_positive_constants() {
        let opts = ModelOptions { alpha_sd: 0.0, ..ModelOptions::default() };

        assert_eq!(
            opts.validate().unwrap_err(),
            RenewalError::InvalidPriorParameter { param: "alpha_sd", value: 0.0 }
        );
    }
}
