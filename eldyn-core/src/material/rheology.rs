//! Constitutive models behind a common interface.
//!
//! A [`Rheology`] turns strain, properties and the committed history of a
//! quadrature point into stress and a consistent tangent. The model is
//! chosen once when the material is configured.

use super::drucker_prager::DruckerPrager3D;
use super::elastic::ElasticIsotropic3D;
use super::properties::MaterialProperties;
use crate::error::Result;
use crate::scales::Nondimensional;
use crate::types::{ConstitutiveMatrix, StrainTensor, StressTensor};
use serde::{Deserialize, Serialize};

/// History variables of a quadrature point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateVars {
    /// Total plastic strain.
    pub plastic_strain: StrainTensor,
    /// Accumulated plastic multiplier. Apex returns add the multiplier of
    /// the volumetric return, or √J2/μ without dilatancy.
    pub plastic_multiplier: f64,
}

/// Reference state the constitutive relation is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InitialState {
    pub stress: StressTensor,
    pub strain: StrainTensor,
}

impl InitialState {
    pub fn new(stress: StressTensor, strain: StrainTensor) -> Self {
        Self { stress, strain }
    }

    /// Stress is divided by the pressure scale; strain is dimensionless.
    pub fn nondimensionalize(&self, n: &Nondimensional) -> Self {
        Self {
            stress: StressTensor(self.stress.0 / n.pressure_scale),
            strain: self.strain,
        }
    }

    pub fn dimensionalize(&self, n: &Nondimensional) -> Self {
        Self {
            stress: StressTensor(self.stress.0 * n.pressure_scale),
            strain: self.strain,
        }
    }
}

/// Result of a stress evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressUpdate {
    pub stress: StressTensor,
    /// State that committing this evaluation would produce.
    pub state: StateVars,
    /// Whether the trial stress violated the yield condition.
    pub yielded: bool,
}

/// Constitutive model capability set.
///
/// Evaluation is pure: `evaluate_stress` and `evaluate_tangent` never touch
/// the committed state. Only [`Rheology::update_state`] writes history.
pub trait Rheology: Send + Sync {
    /// Model name for diagnostics.
    fn name(&self) -> &'static str;

    /// Names of the database values the model is built from.
    fn db_names(&self) -> &'static [&'static str];

    /// Dimensional properties from database values in [`Rheology::db_names`]
    /// order.
    fn properties_from_db(&self, values: &[f64]) -> Result<MaterialProperties>;

    /// Mass density at a point.
    fn density(&self, properties: &MaterialProperties) -> f64 {
        properties.density
    }

    /// Stress for the given total strain, measured against committed state.
    fn evaluate_stress(
        &self,
        strain: &StrainTensor,
        properties: &MaterialProperties,
        state: &StateVars,
        initial: &InitialState,
    ) -> StressUpdate;

    /// Consistent tangent dσ/dε, on the same branch as
    /// [`Rheology::evaluate_stress`] for the same inputs.
    fn evaluate_tangent(
        &self,
        strain: &StrainTensor,
        properties: &MaterialProperties,
        state: &StateVars,
        initial: &InitialState,
    ) -> ConstitutiveMatrix;

    /// Commit the history produced by `strain`. Returns true if the point
    /// yielded.
    fn update_state(
        &self,
        strain: &StrainTensor,
        properties: &MaterialProperties,
        state: &mut StateVars,
        initial: &InitialState,
    ) -> bool {
        let update = self.evaluate_stress(strain, properties, state, initial);
        *state = update.state;
        update.yielded
    }

    /// Force the elastic branch. Models without a plastic branch ignore it.
    fn use_elastic_behavior(&mut self, _flag: bool) {}
}

/// Available constitutive models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RheologyKind {
    ElasticIsotropic,
    DruckerPrager,
}

/// Build a constitutive model.
pub fn create_rheology(kind: RheologyKind, elastic_behavior: bool) -> Box<dyn Rheology> {
    match kind {
        RheologyKind::ElasticIsotropic => Box::new(ElasticIsotropic3D),
        RheologyKind::DruckerPrager => {
            Box::new(DruckerPrager3D::new().with_elastic_behavior(elastic_behavior))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_factory_names() {
        assert_eq!(
            create_rheology(RheologyKind::ElasticIsotropic, false).name(),
            "elastic-isotropic-3d"
        );
        let dp = create_rheology(RheologyKind::DruckerPrager, false);
        assert_eq!(dp.name(), "drucker-prager-3d");
        assert_eq!(dp.db_names().len(), 6);
    }

    #[test]
    fn test_kind_from_json() {
        let kind: RheologyKind = serde_json::from_str("\"drucker_prager\"").unwrap();
        assert_eq!(kind, RheologyKind::DruckerPrager);
    }

    #[test]
    fn test_initial_state_scaling() {
        let n = Nondimensional::new(1.0, 1.0e6, 1.0, 1.0);
        let init = InitialState::new(
            StressTensor::new([-2.0e6, -2.0e6, -2.0e6, 0.0, 0.0, 0.0]),
            StrainTensor::new([1.0e-4, 0.0, 0.0, 0.0, 0.0, 0.0]),
        );
        let nd = init.nondimensionalize(&n);
        assert_relative_eq!(nd.stress.0[0], -2.0);
        assert_relative_eq!(nd.strain.0[0], 1.0e-4);
        assert_eq!(nd.dimensionalize(&n), init);
    }
}
