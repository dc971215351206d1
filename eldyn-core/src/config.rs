//! Run configuration.
//!
//! Plain structs with defaults, loadable from JSON. Values are physical;
//! conversion to nondimensional form happens when the integrator is built.

use crate::assembly::ElasticityExplicitTet4;
use crate::element::gauss::Quadrature;
use crate::error::{Error, Result};
use crate::material::{create_rheology, DbValues, InitialState, Material, RheologyKind};
use crate::mesh::Topology;
use crate::residual::MassMatrix;
use crate::scales::Nondimensional;
use crate::spatialdb::UniformDb;
use crate::types::{StrainTensor, StressTensor};
use serde::{Deserialize, Serialize};

/// Integrator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Time step (s).
    pub dt: f64,
    /// Mass matrix used for the residual.
    pub mass: MassMatrix,
    /// Uniform gravitational acceleration (m/s²), if any.
    pub gravity: Option<[f64; 3]>,
    /// Nondimensionalization scales.
    pub normalizer: Nondimensional,
    /// Evaluate cells on the Rayon pool.
    pub parallel: bool,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            dt: 1.0e-3,
            mass: MassMatrix::Lumped,
            gravity: None,
            normalizer: Nondimensional::default(),
            parallel: true,
        }
    }
}

/// Material configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// Identifier matching the mesh `material-id` label.
    pub id: i32,
    pub label: String,
    pub rheology: RheologyKind,
    /// Force the elastic branch of a plastic model.
    #[serde(default)]
    pub elastic_behavior: bool,
    /// Uniform physical property values.
    pub properties: DbValues,
    /// Initial stress (Pa), [xx, yy, zz, xy, yz, xz].
    #[serde(default)]
    pub initial_stress: Option<[f64; 6]>,
    /// Initial strain, [xx, yy, zz, xy, yz, xz].
    #[serde(default)]
    pub initial_strain: Option<[f64; 6]>,
}

impl MaterialConfig {
    /// Uniform property database for this material.
    pub fn property_db(&self) -> UniformDb {
        UniformDb::new(self.label.clone(), &self.properties.to_entries())
    }

    /// Uninitialized material.
    pub fn build_material(&self) -> Material {
        Material::new(
            self.id,
            self.label.clone(),
            create_rheology(self.rheology, self.elastic_behavior),
        )
    }

    /// Dimensional initial state.
    pub fn initial_state(&self) -> InitialState {
        InitialState::new(
            self.initial_stress.map(StressTensor::new).unwrap_or_default(),
            self.initial_strain.map(StrainTensor::new).unwrap_or_default(),
        )
    }
}

/// Complete run description: one integrator setup shared by all materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub integrator: IntegratorConfig,
    pub materials: Vec<MaterialConfig>,
}

impl Config {
    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check values that do not depend on the mesh.
    pub fn validate(&self) -> Result<()> {
        if !(self.integrator.dt > 0.0) {
            return Err(Error::Configuration(format!(
                "time step must be positive, got {}",
                self.integrator.dt
            )));
        }
        let n = &self.integrator.normalizer;
        let scales = [
            n.length_scale,
            n.pressure_scale,
            n.time_scale,
            n.density_scale,
        ];
        if scales.iter().any(|&s| !(s > 0.0)) {
            return Err(Error::Configuration(format!(
                "nondimensionalization scales must be positive, got {:?}",
                scales
            )));
        }
        for (i, m) in self.materials.iter().enumerate() {
            if self.materials[..i].iter().any(|other| other.id == m.id) {
                return Err(Error::Configuration(format!(
                    "duplicate material id {} ('{}')",
                    m.id, m.label
                )));
            }
        }
        Ok(())
    }

    /// Build and initialize one integrator per material.
    pub fn build_integrators<T: Topology + ?Sized>(
        &self,
        mesh: &T,
    ) -> Result<Vec<ElasticityExplicitTet4>> {
        self.materials
            .iter()
            .map(|m| self.integrator.build(m, mesh))
            .collect()
    }
}

impl IntegratorConfig {
    /// Build an integrator for one material on a mesh.
    pub fn build<T: Topology + ?Sized>(
        &self,
        material: &MaterialConfig,
        mesh: &T,
    ) -> Result<ElasticityExplicitTet4> {
        let mut integrator =
            ElasticityExplicitTet4::new(Quadrature::tet4(), material.build_material())?;
        integrator.set_normalizer(self.normalizer);
        integrator.set_parallel(self.parallel);
        integrator.set_mass_matrix(self.mass);
        if let Some(g) = self.gravity {
            integrator.set_gravity_field(Box::new(UniformDb::gravity(g)));
        }
        integrator.initialize(mesh, &material.property_db())?;
        integrator
            .material_mut()
            .set_initial_state(material.initial_state().nondimensionalize(&self.normalizer));
        integrator.time_step(self.normalizer.nondimensionalize(self.dt, self.normalizer.time_scale))?;
        Ok(integrator)
    }
}
