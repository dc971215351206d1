//! Cell strain and stress output.
//!
//! Output fields are recovered from disp(t) the same way the residual pass
//! sees them: total strain from the Tet4 gradients, stress from the
//! committed material state without committing anything.

use crate::assembly::ElasticityExplicitTet4;
use crate::error::Result;
use crate::field::SolutionFields;
use crate::mesh::Topology;
use crate::scales::Nondimensional;
use crate::types::{StrainTensor, StressTensor};
use rayon::prelude::*;

/// Strain and stress of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStress {
    /// Cell index in the mesh.
    pub cell: usize,
    pub strain: StrainTensor,
    pub stress: StressTensor,
}

/// Output fields for the cells of one material.
#[derive(Debug, Clone, PartialEq)]
pub struct StressField {
    pub cells: Vec<CellStress>,
}

impl StressField {
    /// Values for a mesh cell, if it belongs to the material.
    pub fn cell(&self, cell: usize) -> Option<&CellStress> {
        self.cells.iter().find(|c| c.cell == cell)
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// Maximum von Mises stress across all cells.
    pub fn max_von_mises(&self) -> f64 {
        self.cells
            .iter()
            .map(|c| c.stress.von_mises())
            .fold(0.0, f64::max)
    }

    /// von Mises stress per cell.
    pub fn von_mises_stresses(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.stress.von_mises()).collect()
    }

    /// Mean stress per cell.
    pub fn mean_stresses(&self) -> Vec<f64> {
        self.cells.iter().map(|c| c.stress.mean()).collect()
    }

    /// Stresses in physical units (strain is dimensionless).
    pub fn dimensionalize(&self, normalizer: &Nondimensional) -> Self {
        let cells = self
            .cells
            .iter()
            .map(|c| CellStress {
                stress: StressTensor(c.stress.0 * normalizer.pressure_scale),
                ..*c
            })
            .collect();
        Self { cells }
    }
}

/// Recover strain and stress for every cell of the integrator's material.
pub fn recover_stresses<T: Topology + ?Sized>(
    integrator: &ElasticityExplicitTet4,
    mesh: &T,
    fields: &SolutionFields,
) -> Result<StressField> {
    let strains = integrator.cell_strains(mesh, fields)?;
    let material = integrator.material();
    let cells = material
        .cells()
        .par_iter()
        .zip(strains.par_iter())
        .enumerate()
        .map(|(i, (&cell, strain))| {
            Ok(CellStress {
                cell,
                strain: *strain,
                stress: material.calc_stress(i, strain)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(StressField { cells })
}
