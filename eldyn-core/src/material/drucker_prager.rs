//! Elastic-perfectly-plastic Drucker-Prager model.
//!
//! Yield surface f = 3 α_y p + √J₂ - β, plastic potential
//! g = 3 α_f p + √J₂ (non-associated when α_f ≠ α_y). The return is a
//! closed-form projection: onto the cone when the corrected deviator keeps
//! its direction, otherwise onto the apex.

use super::elastic::{elastic_stress, elastic_tangent};
use super::properties::{DbValues, MaterialProperties, PlasticityParams, DRUCKER_PRAGER_DB_NAMES};
use super::rheology::{InitialState, Rheology, StateVars, StressUpdate};
use crate::error::Result;
use crate::types::{mean_and_deviator, scalar_product, ConstitutiveMatrix, StrainTensor, StressTensor, KRONECKER};
use nalgebra::Vector6;

/// Relative tolerance on the yield function.
const YIELD_TOLERANCE: f64 = 1.0e-12;

/// Trial state of a point: the stress if the step were elastic.
struct Trial {
    bulk: f64,
    mean: f64,
    deviator: Vector6<f64>,
    sqrt_j2: f64,
    yield_value: f64,
    params: PlasticityParams,
}

impl Trial {
    fn new(
        strain: &StrainTensor,
        properties: &MaterialProperties,
        state: &StateVars,
        initial: &InitialState,
        params: PlasticityParams,
    ) -> Self {
        let bulk = properties.bulk_modulus();
        let elastic_strain = strain.0 - initial.strain.0 - state.plastic_strain.0;
        let (e_mean, e_dev) = mean_and_deviator(&elastic_strain);
        let (p0, s0) = mean_and_deviator(&initial.stress.0);

        let mean = 3.0 * bulk * e_mean + p0;
        let deviator = e_dev * (2.0 * properties.mu) + s0;
        let sqrt_j2 = (0.5 * scalar_product(&deviator, &deviator)).sqrt();
        let yield_value = 3.0 * params.alpha_yield * mean + sqrt_j2 - params.beta;
        Self {
            bulk,
            mean,
            deviator,
            sqrt_j2,
            yield_value,
            params,
        }
    }

    fn is_plastic(&self) -> bool {
        let scale =
            self.params.beta.abs() + 3.0 * self.params.alpha_yield * self.mean.abs() + self.sqrt_j2;
        self.yield_value > YIELD_TOLERANCE * scale
    }

    /// Denominator of the plastic multiplier, μ + 9 K α_y α_f.
    fn hardening(&self, mu: f64) -> f64 {
        mu + 9.0 * self.bulk * self.params.alpha_yield * self.params.alpha_flow
    }

    fn stress(&self) -> StressTensor {
        StressTensor(kronecker() * self.mean + self.deviator)
    }
}

/// Outcome of the return mapping.
enum Return {
    Elastic,
    Cone { multiplier: f64 },
    Apex,
}

fn kronecker() -> Vector6<f64> {
    Vector6::from_row_slice(&KRONECKER)
}

fn return_mapping(trial: &Trial, mu: f64) -> Return {
    if !trial.is_plastic() {
        return Return::Elastic;
    }
    let multiplier = trial.yield_value / trial.hardening(mu);
    if trial.sqrt_j2 > 0.0 && trial.sqrt_j2 - mu * multiplier >= 0.0 {
        Return::Cone { multiplier }
    } else {
        Return::Apex
    }
}

/// Multiplier consumed by the apex return.
///
/// Volumetric plastic strain per unit multiplier is 3 α_f, so the multiplier
/// is the volumetric return (p_trial - p_apex) / K divided by 3 α_f. Without
/// dilatancy only the deviatoric part flows, and the multiplier is the one
/// that removes √J2 entirely, √J2 / μ.
fn apex_multiplier(trial: &Trial, apex_mean: f64, mu: f64) -> f64 {
    let alpha_flow = trial.params.alpha_flow;
    if alpha_flow > 0.0 {
        (trial.mean - apex_mean) / (3.0 * trial.bulk * alpha_flow)
    } else {
        trial.sqrt_j2 / mu
    }
}

/// Drucker-Prager plasticity in 3D.
#[derive(Debug, Clone, Copy, Default)]
pub struct DruckerPrager3D {
    use_elastic_behavior: bool,
}

impl DruckerPrager3D {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow the elastic branch regardless of the yield condition.
    pub fn with_elastic_behavior(mut self, flag: bool) -> Self {
        self.use_elastic_behavior = flag;
        self
    }

    pub fn elastic_behavior(&self) -> bool {
        self.use_elastic_behavior
    }

    fn params(&self, properties: &MaterialProperties) -> Option<PlasticityParams> {
        if self.use_elastic_behavior {
            None
        } else {
            properties.plasticity
        }
    }
}

impl Rheology for DruckerPrager3D {
    fn name(&self) -> &'static str {
        "drucker-prager-3d"
    }

    fn db_names(&self) -> &'static [&'static str] {
        DRUCKER_PRAGER_DB_NAMES
    }

    fn properties_from_db(&self, values: &[f64]) -> Result<MaterialProperties> {
        DbValues::from_query(values)?.drucker_prager_properties()
    }

    fn evaluate_stress(
        &self,
        strain: &StrainTensor,
        properties: &MaterialProperties,
        state: &StateVars,
        initial: &InitialState,
    ) -> StressUpdate {
        let Some(params) = self.params(properties) else {
            let total = strain.0 - state.plastic_strain.0;
            return StressUpdate {
                stress: elastic_stress(properties.lambda, properties.mu, &total, initial),
                state: *state,
                yielded: false,
            };
        };

        let trial = Trial::new(strain, properties, state, initial, params);
        let mu = properties.mu;
        match return_mapping(&trial, mu) {
            Return::Elastic => StressUpdate {
                stress: trial.stress(),
                state: *state,
                yielded: false,
            },
            Return::Cone { multiplier } => {
                let factor = 1.0 - mu * multiplier / trial.sqrt_j2;
                let mean = trial.mean - 3.0 * trial.bulk * params.alpha_flow * multiplier;
                let deviator = trial.deviator * factor;

                let flow = kronecker() * params.alpha_flow + trial.deviator / (2.0 * trial.sqrt_j2);
                let mut next = *state;
                next.plastic_strain.0 += flow * multiplier;
                next.plastic_multiplier += multiplier;
                StressUpdate {
                    stress: StressTensor(kronecker() * mean + deviator),
                    state: next,
                    yielded: true,
                }
            }
            Return::Apex => {
                let mean = params.beta / (3.0 * params.alpha_yield);
                // Whole trial excess is plastic: Δεᵖ = C⁻¹ (σ_trial - σ_apex).
                let increment = trial.deviator / (2.0 * mu)
                    + kronecker() * ((trial.mean - mean) / (3.0 * trial.bulk));
                let mut next = *state;
                next.plastic_strain.0 += increment;
                next.plastic_multiplier += apex_multiplier(&trial, mean, mu);
                StressUpdate {
                    stress: StressTensor(kronecker() * mean),
                    state: next,
                    yielded: true,
                }
            }
        }
    }

    fn evaluate_tangent(
        &self,
        strain: &StrainTensor,
        properties: &MaterialProperties,
        state: &StateVars,
        initial: &InitialState,
    ) -> ConstitutiveMatrix {
        let (lambda, mu) = (properties.lambda, properties.mu);
        let Some(params) = self.params(properties) else {
            return elastic_tangent(lambda, mu);
        };

        let trial = Trial::new(strain, properties, state, initial, params);
        match return_mapping(&trial, mu) {
            Return::Elastic => elastic_tangent(lambda, mu),
            Return::Apex => ConstitutiveMatrix::zeros(),
            Return::Cone { multiplier } => {
                let bulk = trial.bulk;
                let m = kronecker();
                let deviatoric_projector =
                    ConstitutiveMatrix::identity() - m * m.transpose() / 3.0;

                // Unit deviator direction and its contraction weights.
                let n = trial.deviator / (2.0_f64.sqrt() * trial.sqrt_j2);
                let mut n_weighted = n;
                for i in 3..6 {
                    n_weighted[i] *= 2.0;
                }

                let theta = mu * multiplier / trial.sqrt_j2;
                let sqrt2_mu = 2.0_f64.sqrt() * mu;
                let flow = n * sqrt2_mu + m * (3.0 * bulk * params.alpha_flow);
                let yield_gradient = m * (3.0 * params.alpha_yield * bulk) + n_weighted * sqrt2_mu;

                deviatoric_projector * (2.0 * mu * (1.0 - theta))
                    + n * n_weighted.transpose() * (2.0 * mu * theta)
                    + m * m.transpose() * bulk
                    - flow * yield_gradient.transpose() / trial.hardening(mu)
            }
        }
    }

    fn use_elastic_behavior(&mut self, flag: bool) {
        self.use_elastic_behavior = flag;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Nondimensional rock-like properties: φ = 30°, ψ = 10°, c = 1e-3.
    fn props() -> MaterialProperties {
        MaterialProperties::elastic(1.0, 1.0, 1.0).with_plasticity(PlasticityParams::from_friction(
            30.0_f64.to_radians(),
            1.0e-3,
            10.0_f64.to_radians(),
        ))
    }

    fn yield_function(stress: &StressTensor, p: &MaterialProperties) -> f64 {
        let params = p.plasticity.unwrap();
        3.0 * params.alpha_yield * stress.mean() + stress.j2().sqrt() - params.beta
    }

    fn shear_strain(gamma: f64) -> StrainTensor {
        StrainTensor::new([0.0, 0.0, 0.0, gamma, 0.0, 0.0])
    }

    #[test]
    fn test_below_yield_is_elastic() {
        let p = props();
        let strain = shear_strain(1.0e-5);
        let update = DruckerPrager3D::new().evaluate_stress(
            &strain,
            &p,
            &StateVars::default(),
            &InitialState::default(),
        );
        assert!(!update.yielded);
        assert_relative_eq!(update.stress.0[3], 2.0 * 1.0e-5, max_relative = 1e-12);
        assert_eq!(update.state, StateVars::default());
    }

    #[test]
    fn test_return_to_cone() {
        let p = props();
        let strain = StrainTensor::new([-1.0e-3, 0.0, 0.0, 5.0e-3, 0.0, 0.0]);
        let model = DruckerPrager3D::new();
        let trial = model.evaluate_stress(&strain, &p, &StateVars::default(), &InitialState::default());
        let elastic = elastic_stress(p.lambda, p.mu, &strain.0, &InitialState::default());
        assert!(yield_function(&elastic, &p) > 0.0);
        assert!(trial.yielded);
        assert_relative_eq!(yield_function(&trial.stress, &p), 0.0, epsilon = 1e-12);
        assert!(trial.stress.j2() > 0.0);
        assert!(trial.state.plastic_multiplier > 0.0);

        let mut state = StateVars::default();
        assert!(model.update_state(&strain, &p, &mut state, &InitialState::default()));
        assert_eq!(state, trial.state);

        // Re-evaluating the committed state at the same strain sits on the surface.
        let again = model.evaluate_stress(&strain, &p, &state, &InitialState::default());
        assert!(!again.yielded);
        assert_relative_eq!(yield_function(&again.stress, &p), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_return_to_apex() {
        let p = props();
        let params = p.plasticity.unwrap();
        // Hydrostatic tension far beyond the apex.
        let strain = StrainTensor::new([1.0e-2, 1.0e-2, 1.0e-2, 1.0e-4, 0.0, 0.0]);
        let update = DruckerPrager3D::new().evaluate_stress(
            &strain,
            &p,
            &StateVars::default(),
            &InitialState::default(),
        );
        assert!(update.yielded);
        assert_relative_eq!(update.stress.mean(), params.beta / (3.0 * params.alpha_yield), max_relative = 1e-12);
        assert_relative_eq!(update.stress.j2(), 0.0, epsilon = 1e-20);
        assert_relative_eq!(yield_function(&update.stress, &p), 0.0, epsilon = 1e-12);

        // The remaining elastic strain reproduces the apex stress.
        let recovered = elastic_stress(
            p.lambda,
            p.mu,
            &(strain.0 - update.state.plastic_strain.0),
            &InitialState::default(),
        );
        for i in 0..6 {
            assert_relative_eq!(recovered.0[i], update.stress.0[i], epsilon = 1e-12);
        }

        // The stored multiplier reproduces the volumetric plastic strain, 3 α_f Δλ.
        let volumetric = update.state.plastic_strain.0.dot(&kronecker());
        assert_relative_eq!(
            volumetric,
            3.0 * params.alpha_flow * update.state.plastic_multiplier,
            max_relative = 1e-10
        );
        assert!(update.state.plastic_multiplier > 0.0);
    }

    #[test]
    fn test_apex_multiplier_without_dilatancy() {
        let p = MaterialProperties::elastic(1.0, 1.0, 1.0)
            .with_plasticity(PlasticityParams::from_friction(30.0_f64.to_radians(), 1.0e-3, 0.0));
        let strain = StrainTensor::new([1.0e-2, 1.0e-2, 1.0e-2, 1.0e-4, 0.0, 0.0]);
        let update = DruckerPrager3D::new().evaluate_stress(
            &strain,
            &p,
            &StateVars::default(),
            &InitialState::default(),
        );
        assert!(update.yielded);
        let elastic = elastic_stress(p.lambda, p.mu, &strain.0, &InitialState::default());
        assert_relative_eq!(
            update.state.plastic_multiplier,
            elastic.j2().sqrt() / p.mu,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_evaluation_does_not_mutate() {
        let p = props();
        let state = StateVars {
            plastic_strain: StrainTensor::new([1.0e-4, 0.0, 0.0, 0.0, 0.0, 0.0]),
            plastic_multiplier: 2.0e-4,
        };
        let before = state;
        let strain = shear_strain(1.0e-2);
        let model = DruckerPrager3D::new();
        let _ = model.evaluate_stress(&strain, &p, &state, &InitialState::default());
        let _ = model.evaluate_tangent(&strain, &p, &state, &InitialState::default());
        assert_eq!(state, before);
    }

    #[test]
    fn test_tangent_matches_finite_difference_on_cone() {
        let p = props();
        let model = DruckerPrager3D::new();
        let strain = StrainTensor::new([-2.0e-3, -1.0e-3, -1.5e-3, 4.0e-3, 1.0e-3, -2.0e-3]);
        let state = StateVars::default();
        let initial = InitialState::default();
        assert!(model.evaluate_stress(&strain, &p, &state, &initial).yielded);

        let d = model.evaluate_tangent(&strain, &p, &state, &initial);
        let h = 1.0e-8;
        for j in 0..6 {
            let mut plus = strain;
            let mut minus = strain;
            plus.0[j] += h;
            minus.0[j] -= h;
            let sp = model.evaluate_stress(&plus, &p, &state, &initial).stress.0;
            let sm = model.evaluate_stress(&minus, &p, &state, &initial).stress.0;
            for i in 0..6 {
                let fd = (sp[i] - sm[i]) / (2.0 * h);
                assert_relative_eq!(d[(i, j)], fd, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_tangent_follows_stress_branch() {
        let p = props();
        let model = DruckerPrager3D::new();
        let state = StateVars::default();
        let initial = InitialState::default();

        let elastic = shear_strain(1.0e-5);
        assert_relative_eq!(
            model.evaluate_tangent(&elastic, &p, &state, &initial),
            elastic_tangent(p.lambda, p.mu)
        );

        let apex = StrainTensor::new([1.0e-2, 1.0e-2, 1.0e-2, 0.0, 0.0, 0.0]);
        assert_eq!(
            model.evaluate_tangent(&apex, &p, &state, &initial),
            ConstitutiveMatrix::zeros()
        );
    }

    #[test]
    fn test_elastic_behavior_switch() {
        let p = props();
        let strain = StrainTensor::new([-1.0e-3, 0.0, 0.0, 5.0e-3, 0.0, 0.0]);
        let mut model = DruckerPrager3D::new().with_elastic_behavior(true);
        let update = model.evaluate_stress(&strain, &p, &StateVars::default(), &InitialState::default());
        assert!(!update.yielded);
        let expected = elastic_stress(p.lambda, p.mu, &strain.0, &InitialState::default());
        assert_eq!(update.stress, expected);
        assert_relative_eq!(
            model.evaluate_tangent(&strain, &p, &StateVars::default(), &InitialState::default()),
            elastic_tangent(p.lambda, p.mu)
        );

        model.use_elastic_behavior(false);
        assert!(model
            .evaluate_stress(&strain, &p, &StateVars::default(), &InitialState::default())
            .yielded);
    }

    #[test]
    fn test_initial_stress_counts_toward_yield() {
        let p = props();
        let params = p.plasticity.unwrap();
        // Initial shear at twice the cohesive strength; zero strain.
        let tau = 2.0 * params.beta;
        let initial = InitialState::new(
            StressTensor::new([0.0, 0.0, 0.0, tau, 0.0, 0.0]),
            StrainTensor::zero(),
        );
        let update = DruckerPrager3D::new().evaluate_stress(
            &StrainTensor::zero(),
            &p,
            &StateVars::default(),
            &initial,
        );
        assert!(update.yielded);
        assert_relative_eq!(yield_function(&update.stress, &p), 0.0, epsilon = 1e-12);
    }
}
