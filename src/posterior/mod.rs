//! posterior — case curves reconstructed from a posterior ensemble.
//!
//! Purpose
//! -------
//! Read a [`PosteriorEnsemble`](crate::sampling::ensemble::PosteriorEnsemble)
//! of the renewal model, whatever model version wrote it, and derive the
//! per-sample scale factor and the new/total/active case curves.
//!
//! Key behaviors
//! -------------
//! - `schema`: identify the ensemble layout once from the likelihood axis.
//! - `view`: [`PosteriorView`](view::PosteriorView), layout-checked access.
//! - `scale`: [`ScaleFactor`](scale::ScaleFactor).
//! - `curves`: [`CaseCurves`](curves::CaseCurves).
//!
//! Conventions
//! -----------
//! - Pure functions of the ensemble; nothing is cached.
//! - Layout problems are [`PosteriorError`](errors::PosteriorError)s;
//!   numerical degeneracy flows into the outputs.

pub mod curves;
pub mod errors;
pub mod scale;
pub mod schema;
pub mod view;

#[cfg(test)]
pub(crate) mod fixtures;

pub mod prelude {
    pub use super::curves::CaseCurves;
    pub use super::errors::{PosteriorError, PosteriorResult};
    pub use super::scale::ScaleFactor;
    pub use super::schema::SchemaVersion;
    pub use super::view::PosteriorView;
}
