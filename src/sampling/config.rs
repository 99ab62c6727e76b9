//! Sampler configuration: defaults, key-wise overrides and validation.
//!
//! - [`SamplerConfig`]: the merged, validated settings a [`Sampler`](super::traits::Sampler)
//!   receives.
//! - [`SamplerOverrides`]: caller-supplied settings; every present field wins
//!   over the default.
//! - [`InitMethod`]: how chains pick their starting point.
//!
//! Both config types are serde (de)serializable so they can live in config
//! files; missing fields fall back to the defaults.
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sampling::errors::{SamplingError, SamplingResult};

/// Starting-point strategy for each chain.
///
/// Parsing accepts `"adapt_diag"`, `"jitter+adapt_diag"` and `"map"`
/// (case-insensitive); anything else is `SamplingError::InvalidInitMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitMethod {
    /// Start at the graph's deterministic initial point.
    #[serde(rename = "adapt_diag")]
    AdaptDiag,
    /// Initial point plus U(-1, 1) jitter on every unconstrained coordinate.
    #[serde(rename = "jitter+adapt_diag")]
    JitterAdaptDiag,
    /// Posterior mode found by L-BFGS.
    #[serde(rename = "map")]
    Map,
}

impl FromStr for InitMethod {
    type Err = SamplingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adapt_diag" => Ok(InitMethod::AdaptDiag),
            "jitter+adapt_diag" => Ok(InitMethod::JitterAdaptDiag),
            "map" => Ok(InitMethod::Map),
            _ => Err(SamplingError::InvalidInitMethod { name: s.to_string() }),
        }
    }
}

impl std::fmt::Display for InitMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InitMethod::AdaptDiag => "adapt_diag",
            InitMethod::JitterAdaptDiag => "jitter+adapt_diag",
            InitMethod::Map => "map",
        };
        write!(f, "{name}")
    }
}

/// Merged sampler settings.
///
/// Default:
/// - `chains = 4`, `draws = 200`, `tune = 700`, `target_accept = 0.95`
/// - `init = jitter+adapt_diag`, `cores = 4`
/// - `random_seed = None` (seeded from entropy), `posterior_predictive = true`
/// - `progress_every = 100` iterations (0 disables progress logging)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub chains: usize,
    pub draws: usize,
    pub tune: usize,
    pub target_accept: f64,
    pub init: InitMethod,
    pub cores: usize,
    pub random_seed: Option<u64>,
    pub posterior_predictive: bool,
    pub progress_every: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            chains: 4,
            draws: 200,
            tune: 700,
            target_accept: 0.95,
            init: InitMethod::JitterAdaptDiag,
            cores: 4,
            random_seed: None,
            posterior_predictive: true,
            progress_every: 100,
        }
    }
}

impl SamplerConfig {
    /// Apply `overrides` key by key on top of `self` and validate the result.
    ///
    /// # Errors
    /// - Any error from [`SamplerConfig::validate`].
    pub fn merged(&self, overrides: &SamplerOverrides) -> SamplingResult<Self> {
        let SamplerOverrides {
            chains,
            draws,
            tune,
            target_accept,
            init,
            cores,
            random_seed,
            posterior_predictive,
            progress_every,
        } = overrides.clone();
        let merged = Self {
            chains: chains.unwrap_or(self.chains),
            draws: draws.unwrap_or(self.draws),
            tune: tune.unwrap_or(self.tune),
            target_accept: target_accept.unwrap_or(self.target_accept),
            init: init.unwrap_or(self.init),
            cores: cores.unwrap_or(self.cores),
            random_seed: random_seed.or(self.random_seed),
            posterior_predictive: posterior_predictive.unwrap_or(self.posterior_predictive),
            progress_every: progress_every.unwrap_or(self.progress_every),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Check the count and probability settings.
    ///
    /// # Errors
    /// - `InvalidChains`, `InvalidDraws`, `InvalidCores` for zero counts.
    /// - `InvalidTargetAccept` unless `0 < target_accept < 1`.
    pub fn validate(&self) -> SamplingResult<()> {
        if self.chains == 0 {
            return Err(SamplingError::InvalidChains { chains: self.chains });
        }
        if self.draws == 0 {
            return Err(SamplingError::InvalidDraws { draws: self.draws });
        }
        if self.cores == 0 {
            return Err(SamplingError::InvalidCores { cores: self.cores });
        }
        if !(self.target_accept > 0.0 && self.target_accept < 1.0) {
            return Err(SamplingError::InvalidTargetAccept { value: self.target_accept });
        }
        Ok(())
    }
}

/// Caller-supplied sampler settings; `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerOverrides {
    pub chains: Option<usize>,
    pub draws: Option<usize>,
    pub tune: Option<usize>,
    pub target_accept: Option<f64>,
    pub init: Option<InitMethod>,
    pub cores: Option<usize>,
    pub random_seed: Option<u64>,
    pub posterior_predictive: Option<bool>,
    pub progress_every: Option<usize>,
}

impl SamplerOverrides {
    /// Set one override from a string key/value pair.
    ///
    /// # Errors
    /// - `UnknownConfigKey` if `key` is not a sampler setting.
    /// - `InvalidConfigValue` if `value` does not parse for that key.
    /// - `InvalidInitMethod` for an unknown `init` name.
    pub fn set(&mut self, key: &str, value: &str) -> SamplingResult<()> {
        match key {
            "chains" => self.chains = Some(parse(key, value)?),
            "draws" => self.draws = Some(parse(key, value)?),
            "tune" => self.tune = Some(parse(key, value)?),
            "target_accept" => self.target_accept = Some(parse(key, value)?),
            "init" => self.init = Some(value.parse()?),
            "cores" => self.cores = Some(parse(key, value)?),
            "random_seed" => self.random_seed = Some(parse(key, value)?),
            "posterior_predictive" => self.posterior_predictive = Some(parse(key, value)?),
            "progress_every" => self.progress_every = Some(parse(key, value)?),
            _ => return Err(SamplingError::UnknownConfigKey { key: key.to_string() }),
        }
        Ok(())
    }

    /// Build overrides from string pairs, e.g. parsed command-line options.
    pub fn from_pairs<'a, I>(pairs: I) -> SamplingResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut overrides = Self::default();
        for (key, value) in pairs {
            overrides.set(key, value)?;
        }
        Ok(overrides)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> SamplingResult<T> {
    value.trim().parse().map_err(|_| SamplingError::InvalidConfigValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
