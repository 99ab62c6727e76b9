//! Errors for posterior sampling (configuration, sampler runs, ensemble
//! assembly).
//!
//! [`SamplingError`] covers invalid sampler settings, thread-pool failures,
//! inconsistent draws handed to the ensemble builder, and wraps the model
//! and mode-finding error families.
//!
//! ## Conventions
//! - Configuration errors carry the offending value.
//! - Numerical trouble inside a chain (non-finite energy) is a divergence,
//!   recorded in the sample stats, never an error.
use crate::{optimization::errors::OptError, renewal::errors::RenewalError};

/// Result alias for sampling operations.
pub type SamplingResult<T> = Result<T, SamplingError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SamplingError {
    // ---- Configuration ----
    /// `chains` must be at least 1.
    InvalidChains { chains: usize },

    /// `draws` must be at least 1.
    InvalidDraws { draws: usize },

    /// `cores` must be at least 1.
    InvalidCores { cores: usize },

    /// `target_accept` must lie strictly between 0 and 1.
    InvalidTargetAccept { value: f64 },

    /// Unknown initialization method name.
    InvalidInitMethod { name: String },

    /// Override key that is not a sampler setting.
    UnknownConfigKey { key: String },

    /// Override value that cannot be parsed for its key.
    InvalidConfigValue { key: String, value: String },

    /// Leapfrog steps must be at least 1 and the initial step size finite and > 0.
    InvalidLeapfrog { steps: usize, step_size: f64 },

    // ---- Execution ----
    /// The rayon pool could not be created.
    ThreadPool { text: String },

    /// Draws do not match the ensemble layout.
    ShapeMismatch { name: String, expected: usize, actual: usize },

    /// A required value was not supplied.
    MissingVariable { name: String },

    /// The starting point has a non-finite log density.
    InvalidPoint { log_density: f64 },

    // ---- Wrapped ----
    Model(RenewalError),
    ModeFinding(OptError),
}

impl std::error::Error for SamplingError {}

impl std::fmt::Display for SamplingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            SamplingError::InvalidChains { chains } => {
                write!(f, "Number of chains must be at least 1; got {chains}")
            }
            SamplingError::InvalidDraws { draws } => {
                write!(f, "Number of draws must be at least 1; got {draws}")
            }
            SamplingError::InvalidCores { cores } => {
                write!(f, "Number of cores must be at least 1; got {cores}")
            }
            SamplingError::InvalidTargetAccept { value } => {
                write!(f, "target_accept must be in (0, 1); got {value}")
            }
            SamplingError::InvalidInitMethod { name } => {
                write!(f, "Unknown init method '{name}'; use adapt_diag, jitter+adapt_diag or map")
            }
            SamplingError::UnknownConfigKey { key } => {
                write!(f, "Unknown sampler setting '{key}'")
            }
            SamplingError::InvalidConfigValue { key, value } => {
                write!(f, "Invalid value '{value}' for sampler setting '{key}'")
            }
            SamplingError::InvalidLeapfrog { steps, step_size } => {
                write!(
                    f,
                    "Leapfrog needs at least 1 step and a finite positive step size; got {steps} steps of {step_size}"
                )
            }

            // ---- Execution ----
            SamplingError::ThreadPool { text } => {
                write!(f, "Failed to build sampler thread pool: {text}")
            }
            SamplingError::ShapeMismatch { name, expected, actual } => {
                write!(f, "'{name}' has length {actual}, expected {expected}")
            }
            SamplingError::MissingVariable { name } => {
                write!(f, "No value supplied for '{name}'")
            }
            SamplingError::InvalidPoint { log_density } => {
                write!(f, "Starting point has non-finite log density {log_density}")
            }

            // ---- Wrapped ----
            SamplingError::Model(err) => write!(f, "Model error: {err}"),
            SamplingError::ModeFinding(err) => write!(f, "Mode finding failed: {err}"),
        }
    }
}

impl From<RenewalError> for SamplingError {
    fn from(err: RenewalError) -> Self {
        SamplingError::Model(err)
    }
}

impl From<OptError> for SamplingError {
    fn from(err: OptError) -> Self {
        SamplingError::ModeFinding(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for SamplingError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        SamplingError::ThreadPool { text: err.to_string() }
    }
}
