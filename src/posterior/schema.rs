//! schema — resolve which model layout produced an ensemble.
//!
//! Purpose
//! -------
//! Ensembles written by different model versions place the same quantities
//! on different axes and in different groups. [`SchemaVersion::resolve`]
//! identifies the layout once, from the axis label of the likelihood's
//! observed data, so downstream code never branches on version strings.
//!
//! Layouts
//! -------
//! - `SchemaV1_1Plus` (observed data on `date_with_data`):
//!   `test_adjusted_positive` and `infections` on `date` (posterior),
//!   `exposure` on `date_with_testcounts` (posterior), `observed_positive`
//!   on `date_with_cases` (constant data).
//! - `SchemaV1` (observed data on `nonzero_date`): `test_adjusted_positive`,
//!   `infections` and `observed_positive` on `date`; `exposure` is a data
//!   node on `date` stored in constant data.
use crate::{
    posterior::errors::{PosteriorError, PosteriorResult},
    renewal::{
        core::options::scoped,
        models::builder::{DATE, DATE_WITH_CASES, DATE_WITH_DATA, DATE_WITH_TESTCOUNTS},
    },
    sampling::ensemble::{DataArray, PosteriorEnsemble},
};

/// Axis label of the with-data dates in the legacy layout.
pub const NONZERO_DATE: &str = "nonzero_date";

pub const LIKELIHOOD: &str = "likelihood";
pub const INFECTIONS: &str = "infections";
pub const TEST_ADJUSTED_POSITIVE: &str = "test_adjusted_positive";
pub const EXPOSURE: &str = "exposure";
pub const OBSERVED_POSITIVE: &str = "observed_positive";
pub const P_DELAY: &str = "p_delay";
pub const P_GENERATION_TIME: &str = "p_generation_time";

/// Ensemble group a variable is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Posterior,
    ConstantData,
    ObservedData,
}

impl Group {
    pub fn name(self) -> &'static str {
        match self {
            Group::Posterior => "posterior",
            Group::ConstantData => "constant_data",
            Group::ObservedData => "observed_data",
        }
    }

    /// Look `name` up in this group of `ensemble`.
    pub fn get<'a>(self, ensemble: &'a PosteriorEnsemble, name: &str) -> PosteriorResult<&'a DataArray> {
        let group = match self {
            Group::Posterior => &ensemble.posterior,
            Group::ConstantData => &ensemble.constant_data,
            Group::ObservedData => &ensemble.observed_data,
        };
        group
            .get(name)
            .ok_or_else(|| PosteriorError::MissingVariable { group: self.name(), name: name.to_string() })
    }
}

/// Where one variable lives in a layout: group and last-axis label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub name: &'static str,
    pub group: Group,
    pub axis: Option<&'static str>,
}

/// Known ensemble layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    SchemaV1,
    SchemaV1_1Plus,
}

impl SchemaVersion {
    /// Identify the layout of `ensemble` for an optional region scope.
    ///
    /// # Errors
    /// - `MissingVariable` if the likelihood has no observed data.
    /// - `UnknownSchema` for an unrecognized axis label.
    pub fn resolve(ensemble: &PosteriorEnsemble, region: Option<&str>) -> PosteriorResult<Self> {
        let observed = Group::ObservedData.get(ensemble, &scoped(region, LIKELIHOOD))?;
        let label = observed.dims.first().map(String::as_str).unwrap_or_default();
        if label == scoped(region, DATE_WITH_DATA) {
            Ok(SchemaVersion::SchemaV1_1Plus)
        } else if label == scoped(region, NONZERO_DATE) {
            Ok(SchemaVersion::SchemaV1)
        } else {
            Err(PosteriorError::UnknownSchema { label: label.to_string() })
        }
    }

    /// Variables the reconstruction reads, with their expected placement.
    pub fn layout(self) -> [Placement; 6] {
        let (exposure_group, exposure_axis, observed_axis) = match self {
            SchemaVersion::SchemaV1 => (Group::ConstantData, DATE, DATE),
            SchemaVersion::SchemaV1_1Plus => (Group::Posterior, DATE_WITH_TESTCOUNTS, DATE_WITH_CASES),
        };
        [
            Placement { name: INFECTIONS, group: Group::Posterior, axis: Some(DATE) },
            Placement { name: TEST_ADJUSTED_POSITIVE, group: Group::Posterior, axis: Some(DATE) },
            Placement { name: EXPOSURE, group: exposure_group, axis: Some(exposure_axis) },
            Placement { name: OBSERVED_POSITIVE, group: Group::ConstantData, axis: Some(observed_axis) },
            Placement { name: P_DELAY, group: Group::ConstantData, axis: None },
            Placement { name: P_GENERATION_TIME, group: Group::ConstantData, axis: None },
        ]
    }

    /// Placement of one variable in this layout.
    pub fn placement(self, name: &str) -> Option<Placement> {
        self.layout().into_iter().find(|p| p.name == name)
    }
}
