//! Materials: per-point properties, history and the constitutive model.
//!
//! A [`Material`] owns one [`PointState`] per quadrature point of the cells
//! carrying its identifier. Tet4 cells have a single point, so point `i`
//! belongs to the `i`-th cell returned by [`Material::cells`].
//!
//! Everything stored here is nondimensional.

pub mod drucker_prager;
pub mod elastic;
pub mod properties;
pub mod rheology;

pub use drucker_prager::DruckerPrager3D;
pub use elastic::ElasticIsotropic3D;
pub use properties::{DbValues, MaterialProperties, PlasticityParams};
pub use rheology::{create_rheology, InitialState, Rheology, RheologyKind, StateVars, StressUpdate};

use crate::element::tet4::{self, CellVector};
use crate::error::{Error, Result};
use crate::mesh::Topology;
use crate::scales::Nondimensional;
use crate::spatialdb::SpatialDb;
use crate::types::{ConstitutiveMatrix, StrainTensor, StressTensor};
use rayon::prelude::*;

/// Properties and history of one quadrature point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointState {
    pub properties: MaterialProperties,
    pub state: StateVars,
    pub initial: InitialState,
}

/// A material region: constitutive model plus point data for its cells.
pub struct Material {
    id: i32,
    label: String,
    rheology: Box<dyn Rheology>,
    cells: Vec<usize>,
    points: Vec<PointState>,
    dt: Option<f64>,
    needs_new_jacobian: bool,
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("rheology", &self.rheology.name())
            .field("n_points", &self.points.len())
            .field("dt", &self.dt)
            .field("needs_new_jacobian", &self.needs_new_jacobian)
            .finish()
    }
}

impl Material {
    /// Create an uninitialized material.
    pub fn new<S: Into<String>>(id: i32, label: S, rheology: Box<dyn Rheology>) -> Self {
        Self {
            id,
            label: label.into(),
            rheology,
            cells: Vec::new(),
            points: Vec::new(),
            dt: None,
            needs_new_jacobian: true,
        }
    }

    /// Material identifier matched against the mesh labels.
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rheology(&self) -> &dyn Rheology {
        self.rheology.as_ref()
    }

    /// Cells of this material, in point order.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    pub fn points(&self) -> &[PointState] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Result<&PointState> {
        self.points.get(index).ok_or_else(|| {
            Error::Configuration(format!(
                "material '{}' has no quadrature point {}",
                self.label, index
            ))
        })
    }

    /// Query properties for every cell tagged with this material.
    ///
    /// The database is queried at the dimensional centroid of each cell.
    /// Values are validated, converted and stored nondimensionally.
    pub fn initialize<T: Topology + ?Sized>(
        &mut self,
        mesh: &T,
        db: &dyn SpatialDb,
        normalizer: &Nondimensional,
    ) -> Result<()> {
        let cells = mesh.cells_with_material(self.id);
        let names = self.rheology.db_names();
        let mut points = Vec::with_capacity(cells.len());
        let mut coords: CellVector = [0.0; tet4::CELL_DOFS];
        for &cell in &cells {
            mesh.restrict_coordinates(cell, &mut coords)?;
            let centroid = tet4::centroid(&coords) * normalizer.length_scale;
            let values = db.query(names, &centroid, mesh.coordsys())?;
            let properties = self
                .rheology
                .properties_from_db(&values)
                .map_err(|e| match e {
                    Error::InvalidMaterial(msg) => Error::InvalidMaterial(format!(
                        "material '{}', cell {}: {}",
                        self.label, cell, msg
                    )),
                    other => other,
                })?
                .nondimensionalize(normalizer);
            points.push(PointState {
                properties,
                state: StateVars::default(),
                initial: InitialState::default(),
            });
        }

        log::info!(
            "Initialized material '{}' ({}) on {} cells from database '{}'",
            self.label,
            self.rheology.name(),
            cells.len(),
            db.label()
        );
        if cells.is_empty() {
            log::warn!("Material '{}' (id {}) has no cells", self.label, self.id);
        }

        self.cells = cells;
        self.points = points;
        self.needs_new_jacobian = true;
        Ok(())
    }

    /// Set the same (nondimensional) initial stress and strain at every point.
    pub fn set_initial_state(&mut self, initial: InitialState) {
        for point in &mut self.points {
            point.initial = initial;
        }
    }

    /// Switch the constitutive model to (or back from) the elastic branch.
    pub fn use_elastic_behavior(&mut self, flag: bool) {
        self.rheology.use_elastic_behavior(flag);
        self.needs_new_jacobian = true;
    }

    /// Record the (nondimensional) time step.
    pub fn time_step(&mut self, dt: f64) {
        if self.dt != Some(dt) {
            self.needs_new_jacobian = true;
        }
        self.dt = Some(dt);
    }

    pub fn dt(&self) -> Option<f64> {
        self.dt
    }

    /// Density at a point.
    pub fn density(&self, index: usize) -> Result<f64> {
        let point = self.point(index)?;
        Ok(self.rheology.density(&point.properties))
    }

    /// Stress at a point from committed state, without committing.
    pub fn calc_stress(&self, index: usize, strain: &StrainTensor) -> Result<StressTensor> {
        let p = self.point(index)?;
        Ok(self
            .rheology
            .evaluate_stress(strain, &p.properties, &p.state, &p.initial)
            .stress)
    }

    /// Stress at a point, optionally committing the resulting history.
    pub fn evaluate_stress(
        &mut self,
        index: usize,
        strain: &StrainTensor,
        update_state: bool,
    ) -> Result<StressTensor> {
        if !update_state {
            return self.calc_stress(index, strain);
        }
        let rheology = self.rheology.as_ref();
        let label = &self.label;
        let p = self.points.get_mut(index).ok_or_else(|| {
            Error::Configuration(format!(
                "material '{}' has no quadrature point {}",
                label, index
            ))
        })?;
        let update = rheology.evaluate_stress(strain, &p.properties, &p.state, &p.initial);
        p.state = update.state;
        if update.yielded {
            self.needs_new_jacobian = true;
        }
        Ok(update.stress)
    }

    /// Consistent tangent at a point.
    pub fn calc_tangent(&self, index: usize, strain: &StrainTensor) -> Result<ConstitutiveMatrix> {
        let p = self.point(index)?;
        Ok(self
            .rheology
            .evaluate_tangent(strain, &p.properties, &p.state, &p.initial))
    }

    /// Commit history at every point; `strains[i]` belongs to point `i`.
    ///
    /// Returns the number of points that yielded.
    pub fn commit_states(&mut self, strains: &[StrainTensor], parallel: bool) -> Result<usize> {
        if strains.len() != self.points.len() {
            return Err(Error::Configuration(format!(
                "material '{}': {} strains for {} quadrature points",
                self.label,
                strains.len(),
                self.points.len()
            )));
        }
        let rheology = self.rheology.as_ref();
        let commit = |(p, strain): (&mut PointState, &StrainTensor)| {
            rheology.update_state(strain, &p.properties, &mut p.state, &p.initial) as usize
        };
        let yielded: usize = if parallel {
            self.points.par_iter_mut().zip(strains.par_iter()).map(commit).sum()
        } else {
            self.points.iter_mut().zip(strains.iter()).map(commit).sum()
        };

        if yielded > 0 {
            log::debug!(
                "Material '{}': {} of {} points yielded",
                self.label,
                yielded,
                self.points.len()
            );
            self.needs_new_jacobian = true;
        }
        Ok(yielded)
    }

    pub fn needs_new_jacobian(&self) -> bool {
        self.needs_new_jacobian
    }

    pub fn reset_needs_new_jacobian(&mut self) {
        self.needs_new_jacobian = false;
    }

    /// Largest stable explicit time step: min over cells of shortest edge
    /// over the P-wave speed.
    pub fn stable_time_step_explicit<T: Topology + ?Sized>(&self, mesh: &T) -> Result<f64> {
        let mut coords: CellVector = [0.0; tet4::CELL_DOFS];
        let mut dt = f64::INFINITY;
        for (point, &cell) in self.points.iter().zip(&self.cells) {
            mesh.restrict_coordinates(cell, &mut coords)?;
            let edge = tet4::min_edge_length(&coords);
            dt = dt.min(edge / point.properties.p_wave_speed());
        }
        Ok(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::spatialdb::UniformDb;
    use crate::types::Point3;
    use approx::assert_relative_eq;

    fn unit_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_vertex(Point3::new(0.0, 0.0, 1.0));
        mesh.add_vertex(Point3::new(1.0, 1.0, 1.0));
        mesh.add_cell([0, 1, 2, 3], 1).unwrap();
        mesh.add_cell([1, 2, 3, 4], 1).unwrap();
        mesh.add_cell([1, 3, 2, 4], 7).unwrap();
        mesh
    }

    fn rock_db() -> UniformDb {
        let values = DbValues {
            density: 2500.0,
            vs: 3000.0,
            vp: 5291.502622129181,
            friction_angle: 30.0,
            cohesion: 1.0e6,
            dilatation_angle: 10.0,
        };
        UniformDb::new("rock", &values.to_entries())
    }

    fn material(kind: RheologyKind) -> Material {
        let mut m = Material::new(1, "rock", create_rheology(kind, false));
        let scales = Nondimensional::new(1.0, 2.25e10, 1.0, 2500.0);
        m.initialize(&unit_mesh(), &rock_db(), &scales).unwrap();
        m
    }

    #[test]
    fn test_initialize_picks_tagged_cells() {
        let m = material(RheologyKind::ElasticIsotropic);
        assert_eq!(m.cells(), &[0, 1]);
        assert_eq!(m.points().len(), 2);
        let p = m.point(0).unwrap().properties;
        assert_relative_eq!(p.density, 1.0, max_relative = 1e-12);
        assert_relative_eq!(p.mu, 1.0, max_relative = 1e-12);
        assert!(p.plasticity.is_none());
        assert!(m.needs_new_jacobian());
    }

    #[test]
    fn test_query_outside_database_fails() {
        let db = rock_db().with_bounds(Point3::zeros(), Point3::new(0.4, 0.4, 0.4));
        let mut m = Material::new(1, "rock", create_rheology(RheologyKind::DruckerPrager, false));
        let r = m.initialize(&unit_mesh(), &db, &Nondimensional::default());
        assert!(matches!(r, Err(Error::SpatialQuery(_))));
    }

    #[test]
    fn test_invalid_properties_fail() {
        let db = UniformDb::new("bad", &[("density", 2500.0), ("vs", 3000.0), ("vp", 3000.0)]);
        let mut m = Material::new(1, "bad", create_rheology(RheologyKind::ElasticIsotropic, false));
        let r = m.initialize(&unit_mesh(), &db, &Nondimensional::default());
        assert!(matches!(r, Err(Error::InvalidMaterial(_))));
    }

    #[test]
    fn test_calc_stress_leaves_state() {
        let mut m = material(RheologyKind::DruckerPrager);
        let strain = StrainTensor::new([0.0, 0.0, 0.0, 1.0e-2, 0.0, 0.0]);
        let trial = m.calc_stress(0, &strain).unwrap();
        assert_eq!(m.point(0).unwrap().state, StateVars::default());

        m.reset_needs_new_jacobian();
        let committed = m.evaluate_stress(0, &strain, true).unwrap();
        assert_eq!(trial, committed);
        assert!(m.point(0).unwrap().state.plastic_multiplier > 0.0);
        assert_eq!(m.point(1).unwrap().state, StateVars::default());
        assert!(m.needs_new_jacobian());
    }

    #[test]
    fn test_commit_states_serial_matches_parallel() {
        let strains = [
            StrainTensor::new([0.0, 0.0, 0.0, 1.0e-2, 0.0, 0.0]),
            StrainTensor::new([1.0e-6, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ];
        let mut serial = material(RheologyKind::DruckerPrager);
        let mut parallel = material(RheologyKind::DruckerPrager);
        assert_eq!(serial.commit_states(&strains, false).unwrap(), 1);
        assert_eq!(parallel.commit_states(&strains, true).unwrap(), 1);
        assert_eq!(serial.points(), parallel.points());
        assert!(serial.commit_states(&strains[..1], false).is_err());
    }

    #[test]
    fn test_stable_time_step() {
        let m = material(RheologyKind::ElasticIsotropic);
        // Nondimensional vp = √((λ + 2μ)/ρ) = √(28e6·2500/2.25e10 / 1)
        let vp = (2500.0 * 5291.502622129181_f64.powi(2) / 2.25e10).sqrt();
        let dt = m.stable_time_step_explicit(&unit_mesh()).unwrap();
        assert_relative_eq!(dt, 1.0 / vp, max_relative = 1e-10);
    }

    #[test]
    fn test_elastic_behavior_tangent() {
        let mut m = material(RheologyKind::DruckerPrager);
        let strain = StrainTensor::new([0.0, 0.0, 0.0, 1.0e-2, 0.0, 0.0]);
        let p = m.point(0).unwrap().properties;
        let elastic = elastic::elastic_tangent(p.lambda, p.mu);
        assert!((m.calc_tangent(0, &strain).unwrap() - elastic).norm() > 1e-6);

        m.use_elastic_behavior(true);
        assert_relative_eq!(m.calc_tangent(0, &strain).unwrap(), elastic);
        assert_eq!(m.commit_states(&[strain, strain], true).unwrap(), 0);
        assert_eq!(m.point(0).unwrap().state, StateVars::default());
    }

    #[test]
    fn test_time_step_marks_jacobian() {
        let mut m = material(RheologyKind::ElasticIsotropic);
        m.time_step(0.1);
        m.reset_needs_new_jacobian();
        m.time_step(0.1);
        assert!(!m.needs_new_jacobian());
        assert_eq!(m.dt(), Some(0.1));
    }
}
