//! view — schema-aware read access to a posterior ensemble.
//!
//! Purpose
//! -------
//! [`PosteriorView`] resolves the ensemble's layout once, checks that every
//! variable the reconstruction needs is present on its expected axis, and
//! then serves those variables by their unscoped names. The scale factor
//! and case curves are computed on demand from the view and never cached.
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed view has passed the layout check: required variables
//!   exist, sit on their expected axes, and match their axis lengths.
//! - The ensemble is read-only; the view borrows it.
use std::collections::BTreeSet;

use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1};

use crate::{
    posterior::{
        curves::{CaseCurves, case_curves},
        errors::{PosteriorError, PosteriorResult},
        scale::{ScaleFactor, scale_factor},
        schema::{Group, LIKELIHOOD, SchemaVersion},
    },
    renewal::core::options::scoped,
    sampling::ensemble::{DataArray, PosteriorEnsemble},
};

/// Read access to one region of a posterior ensemble.
#[derive(Debug, Clone)]
pub struct PosteriorView<'a> {
    ensemble: &'a PosteriorEnsemble,
    region: Option<String>,
    schema: SchemaVersion,
}

impl<'a> PosteriorView<'a> {
    /// Resolve the layout of `ensemble` for `region` and check it.
    ///
    /// # Errors
    /// - `EmptyEnsemble` without posterior draws.
    /// - `UnknownSchema` for an unrecognized layout.
    /// - `MissingVariable`, `MissingAxis`, `AxisMismatch` when the resolved
    ///   layout is incomplete.
    pub fn new(ensemble: &'a PosteriorEnsemble, region: Option<&str>) -> PosteriorResult<Self> {
        if ensemble.posterior.is_empty() || ensemble.n_samples() == 0 {
            return Err(PosteriorError::EmptyEnsemble);
        }
        let schema = SchemaVersion::resolve(ensemble, region)?;
        let view = Self { ensemble, region: region.map(str::to_string), schema };
        view.check_layout()?;
        Ok(view)
    }

    fn check_layout(&self) -> PosteriorResult<()> {
        self.with_data_dates()?;
        for placement in self.schema.layout() {
            let name = self.scoped(placement.name);
            let array = placement.group.get(self.ensemble, &name)?;
            if placement.group == Group::Posterior && array.sample_matrix().is_none() {
                return Err(PosteriorError::AxisMismatch {
                    name,
                    expected: "(chain, draw, …)".to_string(),
                    actual: format!("{:?}", array.dims),
                });
            }
            let Some(axis) = placement.axis else { continue };
            let axis = self.scoped(axis);
            let actual = array.last_dim().unwrap_or_default();
            if actual != axis {
                return Err(PosteriorError::AxisMismatch { name, expected: axis, actual: actual.to_string() });
            }
            let days = self.axis(&axis)?.len();
            let len = array.values.shape().last().copied().unwrap_or(0);
            if len != days {
                return Err(PosteriorError::AxisMismatch {
                    name,
                    expected: format!("{axis} ({days} days)"),
                    actual: format!("{len} values"),
                });
            }
        }
        Ok(())
    }

    pub fn ensemble(&self) -> &'a PosteriorEnsemble {
        self.ensemble
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// `name` with the region prefix applied.
    pub fn scoped(&self, name: &str) -> String {
        scoped(self.region.as_deref(), name)
    }

    /// A variable by unscoped name, from the group the layout assigns it.
    /// Names outside the layout are looked up in the posterior.
    pub fn variable(&self, name: &str) -> PosteriorResult<&'a DataArray> {
        let group = self.schema.placement(name).map_or(Group::Posterior, |p| p.group);
        group.get(self.ensemble, &self.scoped(name))
    }

    /// Dates of a (scoped) axis label.
    pub fn axis(&self, label: &str) -> PosteriorResult<&'a [NaiveDate]> {
        self.ensemble
            .coords
            .get(label)
            .map(Vec::as_slice)
            .ok_or_else(|| PosteriorError::MissingAxis { name: label.to_string() })
    }

    /// Dates of the with-data axis, read from the likelihood observation.
    pub fn with_data_dates(&self) -> PosteriorResult<&'a [NaiveDate]> {
        let observed = Group::ObservedData.get(self.ensemble, &self.scoped(LIKELIHOOD))?;
        let label = observed.dims.first().map(String::as_str).unwrap_or_default();
        self.axis(label)
    }

    /// Dates of the last axis of a variable.
    pub fn dates_of(&self, name: &str) -> PosteriorResult<&'a [NaiveDate]> {
        let array = self.variable(name)?;
        self.axis(array.last_dim().unwrap_or_default())
    }

    /// Positions on a variable's last axis whose date is a with-data date.
    pub fn with_data_positions(&self, name: &str) -> PosteriorResult<Vec<usize>> {
        let with_data: BTreeSet<NaiveDate> = self.with_data_dates()?.iter().copied().collect();
        let positions: Vec<usize> = self
            .dates_of(name)?
            .iter()
            .enumerate()
            .filter_map(|(i, d)| with_data.contains(d).then_some(i))
            .collect();
        if positions.len() != with_data.len() {
            return Err(PosteriorError::AxisMismatch {
                name: self.scoped(name),
                expected: format!("all {} with-data dates", with_data.len()),
                actual: format!("{} of them", positions.len()),
            });
        }
        Ok(positions)
    }

    /// `(sample, k)` matrix of a variable; data variables are repeated for
    /// every sample.
    pub fn per_sample(&self, name: &str) -> PosteriorResult<Array2<f64>> {
        let array = self.variable(name)?;
        if let Some(matrix) = array.sample_matrix() {
            return Ok(matrix);
        }
        let values = self.vector(name)?;
        let samples = self.ensemble.n_samples();
        Ok(Array2::from_shape_fn((samples, values.len()), |(_, j)| values[j]))
    }

    /// A one-dimensional data variable.
    pub fn vector(&self, name: &str) -> PosteriorResult<ArrayView1<'a, f64>> {
        let array = self.variable(name)?;
        array.values.view().into_dimensionality().map_err(|_| PosteriorError::AxisMismatch {
            name: self.scoped(name),
            expected: "one axis".to_string(),
            actual: format!("{:?}", array.dims),
        })
    }

    /// Per-sample scale factor from inferred to observed case counts.
    pub fn scale_factor(&self) -> PosteriorResult<ScaleFactor> {
        scale_factor(self)
    }

    /// New, total and active case curves (date × sample).
    pub fn case_curves(&self) -> PosteriorResult<CaseCurves> {
        case_curves(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posterior::fixtures::{current_layout, legacy_layout};

    #[test]
    // Purpose
    // -------
    // Both known layouts resolve.
    //
    // Given
    // -----
    // - The current and legacy synthetic ensembles.
    //
    // Expect
    // ------
    // - `SchemaV1_1Plus` and `SchemaV1`; exposure read from the posterior
    //   resp. constant data.
    fn resolves_both_layouts() {
        let current = current_layout();
        let legacy = legacy_layout();

        let current_view = PosteriorView::new(&current, None).expect("current layout");
        let legacy_view = PosteriorView::new(&legacy, None).expect("legacy layout");

        assert_eq!(current_view.schema(), SchemaVersion::SchemaV1_1Plus);
        assert_eq!(legacy_view.schema(), SchemaVersion::SchemaV1);
        assert!(current_view.variable("exposure").expect("exposure").has_sample_dims());
        assert!(!legacy_view.variable("exposure").expect("exposure").has_sample_dims());
    }

    #[test]
    // Purpose
    // -------
    // Unknown or incomplete layouts are compatibility errors.
    //
    // Given
    // -----
    // - Observed data relabelled to "day"; exposure removed; exposure
    //   moved to the wrong axis; an empty ensemble.
    //
    // Expect
    // ------
    // - `UnknownSchema`, `MissingVariable`, `AxisMismatch`, `EmptyEnsemble`.
    fn rejects_unknown_and_incomplete_layouts() {
        let mut unknown = current_layout();
        if let Some(observed) = unknown.observed_data.get_mut("likelihood") {
            observed.dims = vec!["day".to_string()];
        }
        let mut missing = current_layout();
        missing.posterior.remove("exposure");
        let mut misplaced = current_layout();
        if let Some(exposure) = misplaced.posterior.get_mut("exposure") {
            exposure.dims[2] = "date_with_cases".to_string();
        }

        assert_eq!(
            PosteriorView::new(&unknown, None).unwrap_err(),
            PosteriorError::UnknownSchema { label: "day".to_string() }
        );
        assert_eq!(
            PosteriorView::new(&missing, None).unwrap_err(),
            PosteriorError::MissingVariable { group: "posterior", name: "exposure".to_string() }
        );
        assert!(matches!(PosteriorView::new(&misplaced, None), Err(PosteriorError::AxisMismatch { .. })));
        assert_eq!(
            PosteriorView::new(&PosteriorEnsemble::default(), None).unwrap_err(),
            PosteriorError::EmptyEnsemble
        );
    }

    #[test]
    // Purpose
    // -------
    // With-data positions are found on every axis a variable may use.
    //
    // Given
    // -----
    // - The current layout: with-data days 2..=4 of 6.
    //
    // Expect
    // ------
    // - tap (on date) → [2, 3, 4]; exposure (tests on days 1..=4) → [1, 2, 3];
    //   observed (cases on days 2..=5) → [0, 1, 2].
    fn with_data_positions_per_axis() {
        let ensemble = current_layout();
        let view = PosteriorView::new(&ensemble, None).expect("current layout");

        assert_eq!(view.with_data_positions("test_adjusted_positive").expect("tap"), vec![2, 3, 4]);
        assert_eq!(view.with_data_positions("exposure").expect("exposure"), vec![1, 2, 3]);
        assert_eq!(view.with_data_positions("observed_positive").expect("observed"), vec![0, 1, 2]);
    }
}
