//! 4-node tetrahedron (Tet4) geometry kernel.
//!
//! The Tet4 is the constant strain tetrahedron:
//! - 4 nodes at vertices, 3 displacement DOFs per node (12 total)
//! - Constant strain/stress within the element
//! - Single integration point at the centroid
//!
//! # Shape function gradients
//!
//! With vertices p0..p3 and signed volume V, the gradients of the linear
//! shape functions are the cofactors of the coordinate matrix scaled by 6V:
//!
//! ```text
//! ∇N1 = (p2 - p0) × (p3 - p0) / 6V
//! ∇N2 = (p3 - p0) × (p1 - p0) / 6V
//! ∇N3 = (p1 - p0) × (p2 - p0) / 6V
//! ∇N0 = -(∇N1 + ∇N2 + ∇N3)
//! ```
//!
//! The components of ∇N_i are the usual (b_i, c_i, d_i) coefficients. The
//! strain-displacement operator B is applied matrix-free; [`Tet4Geometry::b_matrix`]
//! materializes it for checks.

use crate::error::{Error, Result};
use crate::types::{Point3, StrainTensor, StressTensor, Vec3};
use nalgebra::SMatrix;

/// Number of vertices (basis functions) of the Tet4 cell.
pub const NUM_BASIS: usize = 4;

/// Spatial dimension.
pub const SPACE_DIM: usize = 3;

/// Length of a cell-local nodal buffer (4 nodes × 3 components).
pub const CELL_DOFS: usize = NUM_BASIS * SPACE_DIM;

/// Cell-local nodal buffer, interleaved per node: [x0, y0, z0, x1, ...].
pub type CellVector = [f64; CELL_DOFS];

fn vertex(coords: &CellVector, i: usize) -> Point3 {
    Point3::new(coords[3 * i], coords[3 * i + 1], coords[3 * i + 2])
}

/// Signed volume of the tetrahedron: (p1-p0)·((p2-p0)×(p3-p0)) / 6.
///
/// Positive for a right-handed vertex ordering.
pub fn signed_volume(coords: &CellVector) -> f64 {
    let p0 = vertex(coords, 0);
    let e1 = vertex(coords, 1) - p0;
    let e2 = vertex(coords, 2) - p0;
    let e3 = vertex(coords, 3) - p0;
    e1.dot(&e2.cross(&e3)) / 6.0
}

/// Centroid of the cell (location of the single quadrature point).
pub fn centroid(coords: &CellVector) -> Point3 {
    (0..NUM_BASIS).map(|i| vertex(coords, i)).sum::<Point3>() * 0.25
}

/// Length of the shortest of the six edges.
pub fn min_edge_length(coords: &CellVector) -> f64 {
    let mut min = f64::INFINITY;
    for i in 0..NUM_BASIS {
        for j in (i + 1)..NUM_BASIS {
            min = min.min((vertex(coords, j) - vertex(coords, i)).norm());
        }
    }
    min
}

/// Volume and shape-function gradients of one Tet4 cell.
#[derive(Debug, Clone, Copy)]
pub struct Tet4Geometry {
    volume: f64,
    /// ∇N_i = (b_i, c_i, d_i).
    grads: [Vec3; NUM_BASIS],
}

impl Tet4Geometry {
    /// Compute geometry for a cell.
    ///
    /// `cell` only labels the error.
    ///
    /// # Errors
    ///
    /// [`Error::DegenerateCell`] if the signed volume is not strictly positive.
    pub fn new(cell: usize, coords: &CellVector) -> Result<Self> {
        let volume = signed_volume(coords);
        if !(volume > 0.0) {
            return Err(Error::DegenerateCell { cell, volume });
        }

        let p0 = vertex(coords, 0);
        let e1 = vertex(coords, 1) - p0;
        let e2 = vertex(coords, 2) - p0;
        let e3 = vertex(coords, 3) - p0;

        let scale = 1.0 / (6.0 * volume);
        let g1 = e2.cross(&e3) * scale;
        let g2 = e3.cross(&e1) * scale;
        let g3 = e1.cross(&e2) * scale;
        let g0 = -(g1 + g2 + g3);

        Ok(Self {
            volume,
            grads: [g0, g1, g2, g3],
        })
    }

    /// Cell volume (strictly positive).
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Shape-function gradients (b_i, c_i, d_i) for the four nodes.
    pub fn gradients(&self) -> &[Vec3; NUM_BASIS] {
        &self.grads
    }

    /// Strain from nodal displacements, ε = B u, without forming B.
    pub fn strain(&self, disp: &CellVector) -> StrainTensor {
        let mut e = [0.0; 6];
        for (i, g) in self.grads.iter().enumerate() {
            let (ux, uy, uz) = (disp[3 * i], disp[3 * i + 1], disp[3 * i + 2]);
            e[0] += g.x * ux;
            e[1] += g.y * uy;
            e[2] += g.z * uz;
            e[3] += g.y * ux + g.x * uy;
            e[4] += g.z * uy + g.y * uz;
            e[5] += g.z * ux + g.x * uz;
        }
        e[3] *= 0.5;
        e[4] *= 0.5;
        e[5] *= 0.5;
        StrainTensor::new(e)
    }

    /// Subtract the internal force Bᵀσ V from a cell vector.
    pub fn subtract_internal_force(&self, stress: &StressTensor, cell_vector: &mut CellVector) {
        let s = &stress.0;
        let v = self.volume;
        for (i, g) in self.grads.iter().enumerate() {
            cell_vector[3 * i] -= (g.x * s[0] + g.y * s[3] + g.z * s[5]) * v;
            cell_vector[3 * i + 1] -= (g.x * s[3] + g.y * s[1] + g.z * s[4]) * v;
            cell_vector[3 * i + 2] -= (g.x * s[5] + g.y * s[4] + g.z * s[2]) * v;
        }
    }

    /// Materialized 6x12 strain-displacement matrix.
    ///
    /// Rows follow the tensor-shear convention of [`StrainTensor`], so the
    /// shear rows carry the factor ½.
    pub fn b_matrix(&self) -> SMatrix<f64, 6, CELL_DOFS> {
        let mut b = SMatrix::<f64, 6, CELL_DOFS>::zeros();
        for (i, g) in self.grads.iter().enumerate() {
            let (cx, cy, cz) = (3 * i, 3 * i + 1, 3 * i + 2);
            b[(0, cx)] = g.x;
            b[(1, cy)] = g.y;
            b[(2, cz)] = g.z;
            b[(3, cx)] = 0.5 * g.y;
            b[(3, cy)] = 0.5 * g.x;
            b[(4, cy)] = 0.5 * g.z;
            b[(4, cz)] = 0.5 * g.y;
            b[(5, cx)] = 0.5 * g.z;
            b[(5, cz)] = 0.5 * g.x;
        }
        b
    }
}
