//! Explicit elastodynamics integrator for Tet4 cells.
//!
//! [`ElasticityExplicitTet4`] loops over the cells of one material, restricts
//! the global fields to cell buffers, evaluates the cell kernels and
//! scatter-adds the results into caller-owned storage.
//!
//! Cell kernels run in parallel with Rayon. Their results are collected in
//! cell order and scattered serially, so the global sums are the same
//! whether the loop runs in parallel or not.
//!
//! # Example
//!
//! ```ignore
//! use eldyn_core::assembly::ElasticityExplicitTet4;
//! use eldyn_core::element::gauss::Quadrature;
//! use eldyn_core::field::{Field, SolutionFields, DISP_T, DISP_T_MINUS_DT};
//! use eldyn_core::material::{create_rheology, Material, RheologyKind};
//!
//! let material = Material::new(1, "crust", create_rheology(RheologyKind::ElasticIsotropic, false));
//! let mut integrator = ElasticityExplicitTet4::new(Quadrature::tet4(), material)?;
//! integrator.initialize(&mesh, &property_db)?;
//! integrator.time_step(0.01)?;
//!
//! let mut residual = Field::new("residual", mesh.n_vertices());
//! integrator.integrate_residual_lumped(&mut residual, &mesh, &fields)?;
//! integrator.update_state_vars(&mesh, &fields)?;
//! ```

use crate::element::gauss::Quadrature;
use crate::element::tet4::{self, CellVector, Tet4Geometry, CELL_DOFS, NUM_BASIS};
use crate::error::{Error, Result};
use crate::field::{Field, SolutionFields, DISP_T, DISP_T_MINUS_DT};
use crate::jacobian::{cell_dof_indices, consistent_mass_block, lumped_mass_diagonal};
use crate::material::Material;
use crate::mesh::Topology;
use crate::residual::{cell_residual, CellInput, MassMatrix};
use crate::scales::Nondimensional;
use crate::sparse::JacobianStore;
use crate::spatialdb::{SpatialDb, GRAVITY_NAMES};
use crate::types::{StrainTensor, Vec3};
use rayon::prelude::*;

/// Relative change in dt treated as a new time step.
const DT_TOLERANCE: f64 = 1.0e-10;

/// Geometry of one cell, computed before any constitutive evaluation.
#[derive(Debug, Clone, Copy)]
struct CellData {
    cone: [usize; NUM_BASIS],
    coords: CellVector,
    geometry: Tet4Geometry,
}

/// Map `f` over `items` in order, optionally in parallel.
fn map_indexed<T, R, F>(parallel: bool, items: &[T], f: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> Result<R> + Sync + Send,
{
    if parallel {
        items.par_iter().enumerate().map(|(i, item)| f(i, item)).collect()
    } else {
        items.iter().enumerate().map(|(i, item)| f(i, item)).collect()
    }
}

/// Integrator for explicit time stepping with Tet4 cells.
pub struct ElasticityExplicitTet4 {
    quadrature: Quadrature,
    material: Material,
    gravity: Option<Box<dyn SpatialDb>>,
    normalizer: Nondimensional,
    dt: Option<f64>,
    mass: MassMatrix,
    parallel: bool,
    initialized: bool,
    needs_new_jacobian: bool,
}

impl ElasticityExplicitTet4 {
    /// Create an integrator for one material.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if the quadrature is not the one-point Tet4
    /// rule in 3D.
    pub fn new(quadrature: Quadrature, material: Material) -> Result<Self> {
        quadrature.validate_tet4()?;
        log::info!(
            "Created explicit Tet4 integrator for material '{}' ({})",
            material.label(),
            material.rheology().name()
        );
        Ok(Self {
            quadrature,
            material,
            gravity: None,
            normalizer: Nondimensional::default(),
            dt: None,
            mass: MassMatrix::default(),
            parallel: true,
            initialized: false,
            needs_new_jacobian: true,
        })
    }

    pub fn quadrature(&self) -> &Quadrature {
        &self.quadrature
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    /// Use a gravity field for body forces.
    pub fn set_gravity_field(&mut self, gravity: Box<dyn SpatialDb>) {
        log::info!("Using gravity field from database '{}'", gravity.label());
        self.gravity = Some(gravity);
    }

    pub fn set_normalizer(&mut self, normalizer: Nondimensional) {
        self.normalizer = normalizer;
    }

    pub fn normalizer(&self) -> &Nondimensional {
        &self.normalizer
    }

    /// Mass representation used by [`Self::integrate_residual_configured`].
    pub fn set_mass_matrix(&mut self, mass: MassMatrix) {
        self.mass = mass;
    }

    pub fn mass_matrix(&self) -> MassMatrix {
        self.mass
    }

    /// Run cell kernels serially instead of on the Rayon pool.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Populate the material's point data from a property database.
    pub fn initialize<T: Topology + ?Sized>(&mut self, mesh: &T, property_db: &dyn SpatialDb) -> Result<()> {
        self.material.initialize(mesh, property_db, &self.normalizer)?;
        if let Some(dt) = self.dt {
            self.material.time_step(dt);
        }
        self.initialized = true;
        self.needs_new_jacobian = true;
        Ok(())
    }

    /// Set the (nondimensional) time step.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if `dt` is not positive or differs from a
    /// previously set value.
    pub fn time_step(&mut self, dt: f64) -> Result<()> {
        if !(dt > 0.0) {
            return Err(Error::Configuration(format!(
                "time step must be positive, got {}",
                dt
            )));
        }
        if let Some(current) = self.dt {
            if (current - dt).abs() > DT_TOLERANCE * current {
                return Err(Error::Configuration(format!(
                    "explicit time integration requires a constant time step \
                     (current {}, requested {})",
                    current, dt
                )));
            }
            return Ok(());
        }
        log::info!("Time step for material '{}' set to {}", self.material.label(), dt);
        self.dt = Some(dt);
        self.material.time_step(dt);
        self.needs_new_jacobian = true;
        Ok(())
    }

    pub fn dt(&self) -> Option<f64> {
        self.dt
    }

    /// Select incremental (`true`) or total solution mode.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for `false`; explicit integration solves for
    /// increments only.
    pub fn use_soln_incr(&mut self, flag: bool) -> Result<()> {
        if flag {
            Ok(())
        } else {
            Err(Error::Configuration(
                "explicit time integration supports only the incremental solution".into(),
            ))
        }
    }

    /// Whether the Jacobian must be reformed before the next solve.
    pub fn needs_new_jacobian(&self) -> bool {
        self.needs_new_jacobian || self.material.needs_new_jacobian()
    }

    /// Largest stable time step for this material's cells.
    pub fn stable_time_step<T: Topology + ?Sized>(&self, mesh: &T) -> Result<f64> {
        self.material.stable_time_step_explicit(mesh)
    }

    fn require_dt(&self) -> Result<f64> {
        self.dt.ok_or_else(|| {
            Error::Configuration(format!(
                "time step not set for material '{}'",
                self.material.label()
            ))
        })
    }

    /// The material must be initialized on a mesh with the same tagged cells.
    fn check_cells<T: Topology + ?Sized>(&self, mesh: &T) -> Result<()> {
        if !self.initialized {
            return Err(Error::Configuration(format!(
                "material '{}' has not been initialized",
                self.material.label()
            )));
        }
        let tagged = mesh.cells_with_material(self.material.id());
        if tagged != self.material.cells() {
            return Err(Error::Configuration(format!(
                "mesh has {} cells tagged {} but material '{}' was initialized on {}",
                tagged.len(),
                self.material.id(),
                self.material.label(),
                self.material.cells().len()
            )));
        }
        Ok(())
    }

    /// Restrict coordinates and compute geometry for every cell.
    ///
    /// Fails on the first degenerate cell, before any material call.
    fn cell_data<T: Topology + ?Sized>(&self, mesh: &T) -> Result<Vec<CellData>> {
        self.check_cells(mesh)?;
        map_indexed(self.parallel, self.material.cells(), |_, &cell| {
            let cone = *mesh.cone(cell)?;
            let mut coords = [0.0; CELL_DOFS];
            mesh.restrict_coordinates(cell, &mut coords)?;
            let geometry = Tet4Geometry::new(cell, &coords)?;
            Ok(CellData {
                cone,
                coords,
                geometry,
            })
        })
    }

    /// Nondimensional gravity at a cell centroid.
    fn gravity_at<T: Topology + ?Sized>(&self, mesh: &T, coords: &CellVector) -> Result<Option<Vec3>> {
        let Some(db) = &self.gravity else {
            return Ok(None);
        };
        let point = tet4::centroid(coords) * self.normalizer.length_scale;
        let values = db.query(&GRAVITY_NAMES, &point, mesh.coordsys())?;
        let scale = self.normalizer.gravity_scale();
        Ok(Some(Vec3::new(values[0], values[1], values[2]) / scale))
    }

    /// Add the residual with the given mass representation.
    pub fn integrate_residual_with<T: Topology + ?Sized>(
        &self,
        mass: MassMatrix,
        residual: &mut Field,
        mesh: &T,
        fields: &SolutionFields,
    ) -> Result<()> {
        let dt = self.require_dt()?;
        let disp_t = fields.get(DISP_T)?;
        let disp_t_minus_dt = fields.get(DISP_T_MINUS_DT)?;
        let cells = self.cell_data(mesh)?;

        let cell_vectors = map_indexed(self.parallel, &cells, |i, data| {
            let mut u_t = [0.0; CELL_DOFS];
            let mut u_prev = [0.0; CELL_DOFS];
            disp_t.restrict_closure(&data.cone, &mut u_t)?;
            disp_t_minus_dt.restrict_closure(&data.cone, &mut u_prev)?;

            let strain = data.geometry.strain(&u_t);
            let stress = self.material.calc_stress(i, &strain)?;
            let input = CellInput {
                geometry: &data.geometry,
                density: self.material.density(i)?,
                dt,
                disp_t: &u_t,
                disp_t_minus_dt: &u_prev,
                gravity: self.gravity_at(mesh, &data.coords)?,
            };
            Ok(cell_residual(&input, &stress, mass))
        })?;

        for (data, cell_vector) in cells.iter().zip(&cell_vectors) {
            residual.update_add_closure(&data.cone, cell_vector)?;
        }
        log::debug!(
            "Integrated {:?} residual over {} cells of material '{}'",
            mass,
            cells.len(),
            self.material.label()
        );
        Ok(())
    }

    /// Add the residual with the configured mass representation.
    pub fn integrate_residual_configured<T: Topology + ?Sized>(
        &self,
        residual: &mut Field,
        mesh: &T,
        fields: &SolutionFields,
    ) -> Result<()> {
        self.integrate_residual_with(self.mass, residual, mesh, fields)
    }

    /// Add the residual with the consistent mass matrix.
    ///
    /// Stress is evaluated from the committed state; nothing is committed.
    pub fn integrate_residual<T: Topology + ?Sized>(
        &self,
        residual: &mut Field,
        mesh: &T,
        fields: &SolutionFields,
    ) -> Result<()> {
        self.integrate_residual_with(MassMatrix::Consistent, residual, mesh, fields)
    }

    /// Add the residual with the lumped mass matrix.
    pub fn integrate_residual_lumped<T: Topology + ?Sized>(
        &self,
        residual: &mut Field,
        mesh: &T,
        fields: &SolutionFields,
    ) -> Result<()> {
        self.integrate_residual_with(MassMatrix::Lumped, residual, mesh, fields)
    }

    /// Add the consistent mass Jacobian blocks.
    pub fn integrate_jacobian<T: Topology + ?Sized>(
        &mut self,
        jacobian: &mut dyn JacobianStore,
        mesh: &T,
    ) -> Result<()> {
        let dt = self.require_dt()?;
        let cells = self.cell_data(mesh)?;
        let blocks = map_indexed(self.parallel, &cells, |i, data| {
            Ok(consistent_mass_block(
                self.material.density(i)?,
                data.geometry.volume(),
                dt,
            ))
        })?;

        for (data, block) in cells.iter().zip(&blocks) {
            jacobian.add_block(&cell_dof_indices(&data.cone), block)?;
        }
        log::debug!(
            "Integrated consistent Jacobian over {} cells of material '{}'",
            cells.len(),
            self.material.label()
        );
        self.jacobian_formed();
        Ok(())
    }

    /// Add the lumped mass Jacobian into a nodal field.
    pub fn integrate_jacobian_lumped<T: Topology + ?Sized>(
        &mut self,
        jacobian: &mut Field,
        mesh: &T,
    ) -> Result<()> {
        let dt = self.require_dt()?;
        let cells = self.cell_data(mesh)?;
        let diagonals = map_indexed(self.parallel, &cells, |i, data| {
            Ok(lumped_mass_diagonal(
                self.material.density(i)?,
                data.geometry.volume(),
                dt,
            ))
        })?;

        for (data, diagonal) in cells.iter().zip(&diagonals) {
            jacobian.update_add_closure(&data.cone, diagonal)?;
        }
        log::debug!(
            "Integrated lumped Jacobian over {} cells of material '{}'",
            cells.len(),
            self.material.label()
        );
        self.jacobian_formed();
        Ok(())
    }

    fn jacobian_formed(&mut self) {
        self.needs_new_jacobian = false;
        self.material.reset_needs_new_jacobian();
    }

    /// Total strain of every cell from disp(t), in point order.
    pub fn cell_strains<T: Topology + ?Sized>(
        &self,
        mesh: &T,
        fields: &SolutionFields,
    ) -> Result<Vec<StrainTensor>> {
        let disp_t = fields.get(DISP_T)?;
        let cells = self.cell_data(mesh)?;
        map_indexed(self.parallel, &cells, |_, data| {
            let mut u_t = [0.0; CELL_DOFS];
            disp_t.restrict_closure(&data.cone, &mut u_t)?;
            Ok(data.geometry.strain(&u_t))
        })
    }

    /// Commit the material history for the strain in disp(t).
    ///
    /// Returns the number of points that yielded.
    pub fn update_state_vars<T: Topology + ?Sized>(
        &mut self,
        mesh: &T,
        fields: &SolutionFields,
    ) -> Result<usize> {
        let strains = self.cell_strains(mesh, fields)?;
        let yielded = self.material.commit_states(&strains, self.parallel)?;
        log::debug!(
            "Updated state variables of material '{}' ({} yielded)",
            self.material.label(),
            yielded
        );
        Ok(yielded)
    }
}
