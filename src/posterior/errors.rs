//! Errors raised while reading a posterior ensemble.
//!
//! [`PosteriorError`] is the compatibility family: the ensemble's layout
//! does not match any known model version, or a variable or axis the
//! resolved layout requires is absent or misplaced. Numerical degeneracy
//! (a zero inferred total) is never an error; it flows into the outputs as
//! non-finite values.

/// Result alias for posterior reconstruction.
pub type PosteriorResult<T> = Result<T, PosteriorError>;

#[derive(Debug, Clone, PartialEq)]
pub enum PosteriorError {
    // ---- Schema ----
    /// The likelihood's observed data sits on an axis of no known layout.
    UnknownSchema { label: String },

    /// The ensemble holds no posterior draws.
    EmptyEnsemble,

    // ---- Layout ----
    /// A variable the layout requires is absent from its group.
    MissingVariable { group: &'static str, name: String },

    /// A coordinate axis referenced by a variable is not in `coords`.
    MissingAxis { name: String },

    /// A variable sits on the wrong axis or has the wrong length.
    AxisMismatch { name: String, expected: String, actual: String },
}

impl std::error::Error for PosteriorError {}

impl std::fmt::Display for PosteriorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Schema ----
            PosteriorError::UnknownSchema { label } => {
                write!(f, "Unknown ensemble layout: observed data is on axis '{label}'")
            }
            PosteriorError::EmptyEnsemble => {
                write!(f, "Ensemble holds no posterior draws")
            }

            // ---- Layout ----
            PosteriorError::MissingVariable { group, name } => {
                write!(f, "Variable '{name}' is missing from group '{group}'")
            }
            PosteriorError::MissingAxis { name } => {
                write!(f, "Coordinate axis '{name}' is missing from the ensemble")
            }
            PosteriorError::AxisMismatch { name, expected, actual } => {
                write!(f, "Variable '{name}' expected on {expected}, found {actual}")
            }
        }
    }
}
