//! Material properties and their conversion from database values.
//!
//! Databases provide physical quantities (density, wave speeds, friction
//! and dilatation angles, cohesion). The kernels consume nondimensional
//! elastic constants plus the Drucker-Prager cone parameters, which are
//! computed once here rather than on every stress evaluation.

use crate::error::{Error, Result};
use crate::scales::Nondimensional;
use serde::{Deserialize, Serialize};

/// Database value names for an isotropic elastic material.
pub const ELASTIC_DB_NAMES: &[&str] = &["density", "vs", "vp"];

/// Database value names for a Drucker-Prager material.
///
/// Angles are in degrees.
pub const DRUCKER_PRAGER_DB_NAMES: &[&str] = &[
    "density",
    "vs",
    "vp",
    "friction-angle",
    "cohesion",
    "dilatation-angle",
];

/// Drucker-Prager cone parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlasticityParams {
    /// Slope of the yield cone against mean stress.
    pub alpha_yield: f64,
    /// Cohesion-like intercept of the yield cone (stress units).
    pub beta: f64,
    /// Slope of the plastic potential (dilatancy).
    pub alpha_flow: f64,
}

impl PlasticityParams {
    /// Parameters matching a Mohr-Coulomb surface through the compressive
    /// meridian.
    ///
    /// Angles in radians.
    pub fn from_friction(friction_angle: f64, cohesion: f64, dilatation_angle: f64) -> Self {
        let sqrt3 = 3.0_f64.sqrt();
        let (sin_phi, cos_phi) = friction_angle.sin_cos();
        let sin_psi = dilatation_angle.sin();
        Self {
            alpha_yield: 2.0 * sin_phi / (sqrt3 * (3.0 - sin_phi)),
            beta: 6.0 * cohesion * cos_phi / (sqrt3 * (3.0 - sin_phi)),
            alpha_flow: 2.0 * sin_psi / (sqrt3 * (3.0 - sin_psi)),
        }
    }
}

/// Properties at one quadrature point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialProperties {
    /// Mass density.
    pub density: f64,
    /// Lamé's first parameter λ.
    pub lambda: f64,
    /// Shear modulus μ.
    pub mu: f64,
    /// Present for elastoplastic materials.
    pub plasticity: Option<PlasticityParams>,
}

impl MaterialProperties {
    /// Isotropic elastic properties.
    pub fn elastic(density: f64, lambda: f64, mu: f64) -> Self {
        Self {
            density,
            lambda,
            mu,
            plasticity: None,
        }
    }

    /// Attach Drucker-Prager parameters.
    pub fn with_plasticity(mut self, params: PlasticityParams) -> Self {
        self.plasticity = Some(params);
        self
    }

    /// Bulk modulus K = λ + 2μ/3.
    pub fn bulk_modulus(&self) -> f64 {
        self.lambda + 2.0 * self.mu / 3.0
    }

    /// Compressional wave speed √((λ + 2μ)/ρ).
    pub fn p_wave_speed(&self) -> f64 {
        ((self.lambda + 2.0 * self.mu) / self.density).sqrt()
    }

    /// Divide by the density and pressure scales.
    pub fn nondimensionalize(&self, n: &Nondimensional) -> Self {
        Self {
            density: n.nondimensionalize(self.density, n.density_scale),
            lambda: n.nondimensionalize(self.lambda, n.pressure_scale),
            mu: n.nondimensionalize(self.mu, n.pressure_scale),
            plasticity: self.plasticity.map(|p| PlasticityParams {
                beta: n.nondimensionalize(p.beta, n.pressure_scale),
                ..p
            }),
        }
    }

    /// Inverse of [`MaterialProperties::nondimensionalize`].
    pub fn dimensionalize(&self, n: &Nondimensional) -> Self {
        Self {
            density: n.dimensionalize(self.density, n.density_scale),
            lambda: n.dimensionalize(self.lambda, n.pressure_scale),
            mu: n.dimensionalize(self.mu, n.pressure_scale),
            plasticity: self.plasticity.map(|p| PlasticityParams {
                beta: n.dimensionalize(p.beta, n.pressure_scale),
                ..p
            }),
        }
    }
}

/// Physical values as stored in a spatial database or configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbValues {
    /// Mass density (kg/m³).
    pub density: f64,
    /// Shear wave speed (m/s).
    pub vs: f64,
    /// Compressional wave speed (m/s).
    pub vp: f64,
    /// Friction angle (degrees).
    #[serde(default)]
    pub friction_angle: f64,
    /// Cohesion (Pa).
    #[serde(default)]
    pub cohesion: f64,
    /// Dilatation angle (degrees).
    #[serde(default)]
    pub dilatation_angle: f64,
}

impl DbValues {
    /// Elastic-only values.
    pub fn elastic(density: f64, vs: f64, vp: f64) -> Self {
        Self {
            density,
            vs,
            vp,
            friction_angle: 0.0,
            cohesion: 0.0,
            dilatation_angle: 0.0,
        }
    }

    /// Values in [`ELASTIC_DB_NAMES`] or [`DRUCKER_PRAGER_DB_NAMES`] order.
    pub fn from_query(values: &[f64]) -> Result<Self> {
        match values.len() {
            3 => Ok(Self::elastic(values[0], values[1], values[2])),
            6 => Ok(Self {
                density: values[0],
                vs: values[1],
                vp: values[2],
                friction_angle: values[3],
                cohesion: values[4],
                dilatation_angle: values[5],
            }),
            n => Err(Error::InvalidMaterial(format!(
                "expected 3 or 6 database values, got {}",
                n
            ))),
        }
    }

    /// Dimensional values as a spatial database would list them.
    pub fn to_entries(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("density", self.density),
            ("vs", self.vs),
            ("vp", self.vp),
            ("friction-angle", self.friction_angle),
            ("cohesion", self.cohesion),
            ("dilatation-angle", self.dilatation_angle),
        ]
    }

    /// Dimensional elastic properties: μ = ρ vs², λ = ρ vp² - 2μ.
    pub fn elastic_properties(&self) -> Result<MaterialProperties> {
        if !(self.density > 0.0) || !(self.vs > 0.0) || !(self.vp > 0.0) {
            return Err(Error::InvalidMaterial(format!(
                "density ({}), vs ({}) and vp ({}) must be positive",
                self.density, self.vs, self.vp
            )));
        }
        let mu = self.density * self.vs * self.vs;
        let lambda = self.density * self.vp * self.vp - 2.0 * mu;
        if lambda <= 0.0 {
            return Err(Error::InvalidMaterial(format!(
                "Lame's constant lambda must be positive, got {} (vs = {}, vp = {})",
                lambda, self.vs, self.vp
            )));
        }
        Ok(MaterialProperties::elastic(self.density, lambda, mu))
    }

    /// Dimensional Drucker-Prager properties.
    pub fn drucker_prager_properties(&self) -> Result<MaterialProperties> {
        let elastic = self.elastic_properties()?;
        if self.cohesion < 0.0 {
            return Err(Error::InvalidMaterial(format!(
                "cohesion must be non-negative, got {}",
                self.cohesion
            )));
        }
        if !(0.0..90.0).contains(&self.friction_angle) {
            return Err(Error::InvalidMaterial(format!(
                "friction angle must be in [0, 90) degrees, got {}",
                self.friction_angle
            )));
        }
        if self.dilatation_angle < 0.0 || self.dilatation_angle > self.friction_angle {
            return Err(Error::InvalidMaterial(format!(
                "dilatation angle ({}) must be in [0, friction angle ({})]",
                self.dilatation_angle, self.friction_angle
            )));
        }
        let params = PlasticityParams::from_friction(
            self.friction_angle.to_radians(),
            self.cohesion,
            self.dilatation_angle.to_radians(),
        );
        Ok(elastic.with_plasticity(params))
    }
}
