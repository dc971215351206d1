//! Isotropic linear elasticity.

use super::properties::{DbValues, MaterialProperties, ELASTIC_DB_NAMES};
use super::rheology::{InitialState, Rheology, StateVars, StressUpdate};
use crate::error::Result;
use crate::types::{ConstitutiveMatrix, StrainTensor, StressTensor, KRONECKER};
use nalgebra::Vector6;

/// σ = λ tr(ε - ε₀) I + 2μ (ε - ε₀) + σ₀
pub(crate) fn elastic_stress(
    lambda: f64,
    mu: f64,
    strain: &Vector6<f64>,
    initial: &InitialState,
) -> StressTensor {
    let e = strain - initial.strain.0;
    let trace = e[0] + e[1] + e[2];
    let kronecker = Vector6::from_row_slice(&KRONECKER);
    StressTensor(kronecker * (lambda * trace) + e * (2.0 * mu) + initial.stress.0)
}

/// Isotropic elastic tangent in tensor-shear form.
pub(crate) fn elastic_tangent(lambda: f64, mu: f64) -> ConstitutiveMatrix {
    let c11 = lambda + 2.0 * mu;
    let c12 = lambda;
    let c44 = 2.0 * mu;

    ConstitutiveMatrix::new(
        c11, c12, c12, 0.0, 0.0, 0.0,
        c12, c11, c12, 0.0, 0.0, 0.0,
        c12, c12, c11, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, c44, 0.0, 0.0,
        0.0, 0.0, 0.0, 0.0, c44, 0.0,
        0.0, 0.0, 0.0, 0.0, 0.0, c44,
    )
}

/// Isotropic linear elastic material in 3D.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElasticIsotropic3D;

impl Rheology for ElasticIsotropic3D {
    fn name(&self) -> &'static str {
        "elastic-isotropic-3d"
    }

    fn db_names(&self) -> &'static [&'static str] {
        ELASTIC_DB_NAMES
    }

    fn properties_from_db(&self, values: &[f64]) -> Result<MaterialProperties> {
        DbValues::from_query(values)?.elastic_properties()
    }

    fn evaluate_stress(
        &self,
        strain: &StrainTensor,
        properties: &MaterialProperties,
        state: &StateVars,
        initial: &InitialState,
    ) -> StressUpdate {
        StressUpdate {
            stress: elastic_stress(properties.lambda, properties.mu, &strain.0, initial),
            state: *state,
            yielded: false,
        }
    }

    fn evaluate_tangent(
        &self,
        _strain: &StrainTensor,
        properties: &MaterialProperties,
        _state: &StateVars,
        _initial: &InitialState,
    ) -> ConstitutiveMatrix {
        elastic_tangent(properties.lambda, properties.mu)
    }

    fn update_state(
        &self,
        _strain: &StrainTensor,
        _properties: &MaterialProperties,
        _state: &mut StateVars,
        _initial: &InitialState,
    ) -> bool {
        false
    }
}
