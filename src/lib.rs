//! rtlive — Bayesian estimation of the effective reproduction number.
//!
//! Purpose
//! -------
//! Estimate the time-varying reproduction number `r_t` of an epidemic from
//! daily positive test counts and testing volume, with a test-adjusted
//! renewal model, and reconstruct case curves from the fitted posterior.
//!
//! Key behaviors
//! -------------
//! - `renewal`: align raw observations onto a gapless daily axis, build the
//!   probabilistic graph of the renewal model (optionally several regions
//!   in one graph), and evaluate its log density and gradient.
//! - `sampling`: the [`Sampler`](sampling::traits::Sampler) seam, sampler
//!   configuration, a reference HMC sampler, a fixed-point sampler, and the
//!   version-tagged posterior ensemble.
//! - `posterior`: resolve the ensemble layout and compute the scale factor
//!   and the new/total/active case curves.
//! - `optimization`: L-BFGS posterior-mode finding (argmin), used by the
//!   `map` initialization.
//!
//! Invariants & assumptions
//! ------------------------
//! - Raw data ingestion, plotting and persistence live outside this crate.
//! - The library logs through the `log` facade and never installs a logger.
//!
//! Conventions
//! -----------
//! - Dates are `chrono::NaiveDate`; numeric data is `ndarray`.
//! - Each area has its own error enum and `Result` alias; `From`
//!   conversions connect them.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code; `tests/` holds the end-to-end
//!   pipeline from observations to case curves.

pub mod optimization;
pub mod posterior;
pub mod renewal;
pub mod sampling;
