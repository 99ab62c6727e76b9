//! renewal::models — model constructors on top of the graph container.
//!
//! [`builder::build_model`] assembles the test-adjusted renewal model for
//! one region; [`builder::attach_model`] adds a region to an existing graph.

pub mod builder;

#[cfg(test)]
pub(crate) mod fixtures;
