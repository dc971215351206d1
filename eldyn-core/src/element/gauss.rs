//! Gauss quadrature for tetrahedral cells.
//!
//! A [`Quadrature`] bundles an integration rule with the dimensions of the
//! cell it integrates over. The explicit Tet4 integrator accepts only the
//! one-point rule on a 3D cell embedded in 3D space; any other combination is
//! rejected once, at setup.
//!
//! ```
//! use eldyn_core::element::gauss::Quadrature;
//!
//! let q = Quadrature::tet4();
//! assert_eq!(q.num_quad_pts(), 1);
//! assert!(q.validate_tet4().is_ok());
//! ```

use crate::element::tet4::{NUM_BASIS, SPACE_DIM};
use crate::error::{Error, Result};

/// A Gauss quadrature point with barycentric coordinates and weight.
#[derive(Debug, Clone, Copy)]
pub struct GaussPoint {
    /// Barycentric coordinates [L1, L2, L3, L4], ΣLi = 1.
    pub coords: [f64; 4],
    /// Integration weight on the unit tetrahedron.
    pub weight: f64,
}

impl GaussPoint {
    /// Create a new Gauss point.
    pub fn new(coords: [f64; 4], weight: f64) -> Self {
        Self { coords, weight }
    }
}

/// Tetrahedral Gauss quadrature points.
///
/// Weights are scaled for the unit tetrahedron (volume = 1/6), so
/// ∫f dV ≈ Σ w_i f(x_i).
///
/// - n=1: exact for linear polynomials (centroid rule)
/// - n=4: exact for quadratic polynomials
///
/// # Errors
///
/// Returns a configuration error if `n` is not 1 or 4.
pub fn gauss_tet(n: usize) -> Result<Vec<GaussPoint>> {
    match n {
        1 => Ok(vec![GaussPoint::new([0.25, 0.25, 0.25, 0.25], 1.0 / 6.0)]),
        4 => {
            // Points at (α, β, β, β) and permutations
            let sqrt5 = 5.0_f64.sqrt();
            let alpha = (5.0 + 3.0 * sqrt5) / 20.0;
            let beta = (5.0 - sqrt5) / 20.0;
            let w = 1.0 / 24.0;
            Ok(vec![
                GaussPoint::new([alpha, beta, beta, beta], w),
                GaussPoint::new([beta, alpha, beta, beta], w),
                GaussPoint::new([beta, beta, alpha, beta], w),
                GaussPoint::new([beta, beta, beta, alpha], w),
            ])
        }
        _ => Err(Error::Configuration(format!(
            "tetrahedral quadrature with {} points is not available",
            n
        ))),
    }
}

/// Quadrature rule together with the cell dimensions it applies to.
#[derive(Debug, Clone)]
pub struct Quadrature {
    points: Vec<GaussPoint>,
    num_basis: usize,
    space_dim: usize,
    cell_dim: usize,
}

impl Quadrature {
    /// Create a quadrature description.
    pub fn new(points: Vec<GaussPoint>, num_basis: usize, space_dim: usize, cell_dim: usize) -> Self {
        Self {
            points,
            num_basis,
            space_dim,
            cell_dim,
        }
    }

    /// One-point rule on a linear tetrahedron in 3D.
    pub fn tet4() -> Self {
        Self {
            points: vec![GaussPoint::new([0.25, 0.25, 0.25, 0.25], 1.0 / 6.0)],
            num_basis: NUM_BASIS,
            space_dim: SPACE_DIM,
            cell_dim: SPACE_DIM,
        }
    }

    pub fn points(&self) -> &[GaussPoint] {
        &self.points
    }

    pub fn num_quad_pts(&self) -> usize {
        self.points.len()
    }

    pub fn num_basis(&self) -> usize {
        self.num_basis
    }

    pub fn space_dim(&self) -> usize {
        self.space_dim
    }

    pub fn cell_dim(&self) -> usize {
        self.cell_dim
    }

    /// Check the fixed Tet4 assumptions: one quadrature point, four basis
    /// functions, and equal spatial and cell dimensions of 3.
    pub fn validate_tet4(&self) -> Result<()> {
        if self.cell_dim != self.space_dim {
            return Err(Error::Configuration(format!(
                "integration for cells of dimension {} in a {}D domain is not implemented",
                self.cell_dim, self.space_dim
            )));
        }
        if self.space_dim != SPACE_DIM {
            return Err(Error::Configuration(format!(
                "explicit Tet4 integration requires spatial dimension {}, got {}",
                SPACE_DIM, self.space_dim
            )));
        }
        if self.num_basis != NUM_BASIS {
            return Err(Error::Configuration(format!(
                "explicit Tet4 integration requires {} basis functions, got {}",
                NUM_BASIS, self.num_basis
            )));
        }
        if self.points.len() != 1 {
            return Err(Error::Configuration(format!(
                "explicit Tet4 integration requires 1 quadrature point, got {}",
                self.points.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gauss_tet_weights_sum() {
        for n in [1, 4] {
            let sum: f64 = gauss_tet(n).unwrap().iter().map(|gp| gp.weight).sum();
            assert_relative_eq!(sum, 1.0 / 6.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_gauss_tet_barycentric_sum() {
        for gp in gauss_tet(4).unwrap() {
            let sum: f64 = gp.coords.iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_gauss_tet_invalid_n() {
        assert!(matches!(gauss_tet(3), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_tet4_quadrature_is_valid() {
        let q = Quadrature::tet4();
        assert_eq!(q.num_quad_pts(), 1);
        assert_eq!(q.num_basis(), 4);
        assert!(q.validate_tet4().is_ok());
    }

    #[test]
    fn test_mismatched_quadrature_rejected() {
        let four_point = Quadrature::new(gauss_tet(4).unwrap(), 4, 3, 3);
        assert!(matches!(four_point.validate_tet4(), Err(Error::Configuration(_))));

        let surface = Quadrature::new(gauss_tet(1).unwrap(), 4, 3, 2);
        assert!(matches!(surface.validate_tet4(), Err(Error::Configuration(_))));

        let quadratic = Quadrature::new(gauss_tet(1).unwrap(), 10, 3, 3);
        assert!(matches!(quadratic.validate_tet4(), Err(Error::Configuration(_))));

        let planar = Quadrature::new(gauss_tet(1).unwrap(), 4, 2, 2);
        assert!(matches!(planar.validate_tet4(), Err(Error::Configuration(_))));
    }
}
