//! renewal::core — observation handling and numerical building blocks.
//!
//! Purpose
//! -------
//! Hold everything the renewal model needs *before* a graph exists:
//! validated raw observations, the gapless alignment with its masks and
//! axes, validated probability masses, the banded generation-time kernel,
//! the recursion/convolution primitives (with their reverse-mode passes),
//! and build-time options.
//!
//! Conventions
//! -----------
//! - All numeric vectors are `ndarray::Array1<f64>`; dates are
//!   `chrono::NaiveDate`.
//! - Missing observations are `None`, never `NaN`.
//! - Constructors validate and return `RenewalResult<T>`.

pub mod align;
pub mod kernel;
pub mod masks;
pub mod observations;
pub mod options;
pub mod pmf;
pub mod recursion;
