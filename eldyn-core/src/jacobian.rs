//! Cell Jacobian kernels.
//!
//! For explicit stepping the Jacobian is the mass matrix scaled by 1/dt².
//! Stiffness does not enter.

use crate::element::tet4::{CellVector, CELL_DOFS, NUM_BASIS, SPACE_DIM};
use nalgebra::DMatrix;

/// Consistent 12x12 block: ρV/(16 dt²) on every (node a, dim d) x
/// (node b, dim d) pair, zero across dimensions.
pub fn consistent_mass_block(density: f64, volume: f64, dt: f64) -> DMatrix<f64> {
    let weight = density * volume / (16.0 * dt * dt);
    let mut block = DMatrix::zeros(CELL_DOFS, CELL_DOFS);
    for a in 0..NUM_BASIS {
        for b in 0..NUM_BASIS {
            for d in 0..SPACE_DIM {
                block[(SPACE_DIM * a + d, SPACE_DIM * b + d)] = weight;
            }
        }
    }
    block
}

/// Lumped diagonal: ρV/(4 dt²) for each of the 12 cell DOFs.
pub fn lumped_mass_diagonal(density: f64, volume: f64, dt: f64) -> CellVector {
    [density * volume / (4.0 * dt * dt); CELL_DOFS]
}

/// Global indices of a cell's DOFs, interleaved per vertex.
pub fn cell_dof_indices(cone: &[usize; NUM_BASIS]) -> [usize; CELL_DOFS] {
    let mut indices = [0; CELL_DOFS];
    for (i, &v) in cone.iter().enumerate() {
        for d in 0..SPACE_DIM {
            indices[SPACE_DIM * i + d] = SPACE_DIM * v + d;
        }
    }
    indices
}
