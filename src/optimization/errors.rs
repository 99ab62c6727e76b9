//! Errors raised while searching for the posterior mode.
use argmin::core::{ArgminError, Error};

use crate::renewal::errors::RenewalError;

/// Result alias for mode-finding operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// No analytic gradient; callers fall back to finite differences.
    GradientNotImplemented,
    GradientDimMismatch { expected: usize, found: usize },
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- ModeOptions ----
    InvalidGradientTolerance { tol: f64, reason: &'static str },
    InvalidDensityTolerance { tol: f64, reason: &'static str },
    InvalidMaxIter { max_iter: usize, reason: &'static str },
    NoTolerancesProvided,
    InvalidLineSearch { name: String, reason: &'static str },
    InvalidMemory { mem: usize, reason: &'static str },

    // ---- Log density ----
    NonFiniteLogDensity { value: f64 },
    /// The model rejected θ or failed to evaluate.
    ModelEvaluation { text: String },

    // ---- Outcome ----
    NonFiniteMode { index: usize, value: f64, reason: &'static str },
    /// The solver finished without a best parameter vector.
    MissingMode,

    // ---- Solver ----
    /// An argmin failure; `kind` names the argmin category.
    Solver { kind: &'static str, text: String },
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptError::GradientNotImplemented => write!(f, "No analytic gradient available"),
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient has {found} entries, θ has {expected}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Gradient entry {index} is {value}: {reason}")
            }

            OptError::InvalidGradientTolerance { tol, reason } => {
                write!(f, "Gradient tolerance {tol} rejected: {reason}")
            }
            OptError::InvalidDensityTolerance { tol, reason } => {
                write!(f, "Log-density change tolerance {tol} rejected: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Iteration cap {max_iter} rejected: {reason}")
            }
            OptError::NoTolerancesProvided => write!(f, "Mode finding needs at least one tolerance"),
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Line search '{name}' rejected: {reason}")
            }
            OptError::InvalidMemory { mem, reason } => {
                write!(f, "L-BFGS history length {mem} rejected: {reason}")
            }

            OptError::NonFiniteLogDensity { value } => {
                write!(f, "Log density evaluated to {value}")
            }
            OptError::ModelEvaluation { text } => write!(f, "Model evaluation failed: {text}"),

            OptError::NonFiniteMode { index, value, reason } => {
                write!(f, "Mode estimate entry {index} is {value}: {reason}")
            }
            OptError::MissingMode => write!(f, "Solver returned no mode estimate"),

            OptError::Solver { kind, text } => write!(f, "L-BFGS failed ({kind}): {text}"),
        }
    }
}

impl From<Error> for OptError {
    fn from(err: Error) -> Self {
        let err = match err.downcast::<OptError>() {
            Ok(own) => return own,
            Err(err) => err,
        };
        let (kind, text) = match err.downcast::<ArgminError>() {
            Ok(ArgminError::InvalidParameter { text }) => ("invalid parameter", text),
            Ok(ArgminError::NotImplemented { text }) => ("not implemented", text),
            Ok(ArgminError::NotInitialized { text }) => ("not initialized", text),
            Ok(ArgminError::ConditionViolated { text }) => ("condition violated", text),
            Ok(ArgminError::CheckpointNotFound { text }) => ("checkpoint not found", text),
            Ok(ArgminError::PotentialBug { text }) => ("potential bug", text),
            Ok(ArgminError::ImpossibleError { text }) => ("impossible state", text),
            Ok(other) => ("argmin", other.to_string()),
            Err(err) => ("backend", err.to_string()),
        };
        OptError::Solver { kind, text }
    }
}

impl From<RenewalError> for OptError {
    fn from(err: RenewalError) -> Self {
        OptError::ModelEvaluation { text: err.to_string() }
    }
}
