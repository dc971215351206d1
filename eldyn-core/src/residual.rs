//! Cell residual kernels for explicit time stepping.
//!
//! The residual of a Tet4 cell at time t is
//!
//! ```text
//! r = M (u(t) - u(t-dt)) / dt² + f_body - Bᵀσ V
//! ```
//!
//! with M either the consistent mass (all node pairs, ρV/16 per pair) or
//! its row-sum lumped form (ρV/4 per node).

use crate::element::tet4::{CellVector, Tet4Geometry, CELL_DOFS, NUM_BASIS, SPACE_DIM};
use crate::types::{StressTensor, Vec3};
use serde::{Deserialize, Serialize};

/// Mass matrix representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassMatrix {
    /// Diagonal (row-sum) mass.
    #[default]
    Lumped,
    /// Full Tet4 mass with uniform pair weights.
    Consistent,
}

/// Add the consistent-mass inertial term.
pub fn add_inertia_consistent(
    cell_vector: &mut CellVector,
    density: f64,
    volume: f64,
    dt: f64,
    disp_t: &CellVector,
    disp_t_minus_dt: &CellVector,
) {
    let weight = density * volume / (16.0 * dt * dt);
    // Every node couples to every node with the same weight, so the
    // contribution only depends on the sum of the increments over nodes.
    let mut sum = [0.0; SPACE_DIM];
    for j in 0..NUM_BASIS {
        for d in 0..SPACE_DIM {
            sum[d] += disp_t[SPACE_DIM * j + d] - disp_t_minus_dt[SPACE_DIM * j + d];
        }
    }
    for i in 0..NUM_BASIS {
        for d in 0..SPACE_DIM {
            cell_vector[SPACE_DIM * i + d] += weight * sum[d];
        }
    }
}

/// Add the lumped-mass inertial term.
pub fn add_inertia_lumped(
    cell_vector: &mut CellVector,
    density: f64,
    volume: f64,
    dt: f64,
    disp_t: &CellVector,
    disp_t_minus_dt: &CellVector,
) {
    let weight = density * volume / (4.0 * dt * dt);
    for k in 0..CELL_DOFS {
        cell_vector[k] += weight * (disp_t[k] - disp_t_minus_dt[k]);
    }
}

/// Add a body force ρg split evenly over the four nodes.
pub fn add_body_force(cell_vector: &mut CellVector, density: f64, volume: f64, gravity: &Vec3) {
    let weight = density * volume / 4.0;
    for i in 0..NUM_BASIS {
        for d in 0..SPACE_DIM {
            cell_vector[SPACE_DIM * i + d] += weight * gravity[d];
        }
    }
}

/// Everything one cell needs to evaluate its residual.
#[derive(Debug, Clone, Copy)]
pub struct CellInput<'a> {
    pub geometry: &'a Tet4Geometry,
    pub density: f64,
    pub dt: f64,
    pub disp_t: &'a CellVector,
    pub disp_t_minus_dt: &'a CellVector,
    /// Nondimensional gravity at the cell centroid, if gravity is on.
    pub gravity: Option<Vec3>,
}

/// Residual of one cell given the stress at its quadrature point.
pub fn cell_residual(input: &CellInput<'_>, stress: &StressTensor, mass: MassMatrix) -> CellVector {
    let volume = input.geometry.volume();
    let mut cell_vector = [0.0; CELL_DOFS];
    if let Some(g) = &input.gravity {
        add_body_force(&mut cell_vector, input.density, volume, g);
    }
    let add_inertia = match mass {
        MassMatrix::Consistent => add_inertia_consistent,
        MassMatrix::Lumped => add_inertia_lumped,
    };
    add_inertia(
        &mut cell_vector,
        input.density,
        volume,
        input.dt,
        input.disp_t,
        input.disp_t_minus_dt,
    );
    input.geometry.subtract_internal_force(stress, &mut cell_vector);
    cell_vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tet() -> Tet4Geometry {
        let coords = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        Tet4Geometry::new(0, &coords).unwrap()
    }

    #[test]
    fn test_consistent_uniform_offset() {
        let disp_t = [0.3, 0.0, 0.0, 0.3, 0.0, 0.0, 0.3, 0.0, 0.0, 0.3, 0.0, 0.0];
        let prev = [0.0; 12];
        let mut r = [0.0; 12];
        add_inertia_consistent(&mut r, 2.0, 0.5, 0.1, &disp_t, &prev);
        let expected = 2.0 * 0.5 / (16.0 * 0.01) * 0.3 * 4.0;
        for i in 0..4 {
            assert_relative_eq!(r[3 * i], expected, max_relative = 1e-12);
            assert_eq!(r[3 * i + 1], 0.0);
        }
    }

    #[test]
    fn test_lumped_is_node_local() {
        let mut disp_t = [0.0; 12];
        disp_t[4] = 1.0;
        let mut r = [0.0; 12];
        add_inertia_lumped(&mut r, 1.0, 1.0, 1.0, &disp_t, &[0.0; 12]);
        assert_relative_eq!(r[4], 0.25);
        assert_eq!(r.iter().filter(|&&v| v != 0.0).count(), 1);
    }

    #[test]
    fn test_lumped_and_consistent_agree_for_uniform_motion() {
        let disp_t = [0.1, -0.2, 0.05, 0.1, -0.2, 0.05, 0.1, -0.2, 0.05, 0.1, -0.2, 0.05];
        let mut lumped = [0.0; 12];
        let mut consistent = [0.0; 12];
        add_inertia_lumped(&mut lumped, 3.0, 0.2, 0.01, &disp_t, &[0.0; 12]);
        add_inertia_consistent(&mut consistent, 3.0, 0.2, 0.01, &disp_t, &[0.0; 12]);
        for k in 0..12 {
            assert_relative_eq!(lumped[k], consistent[k], max_relative = 1e-12);
        }
    }

    #[test]
    fn test_body_force_total() {
        let mut r = [0.0; 12];
        add_body_force(&mut r, 2.0, 3.0, &Vec3::new(0.0, 0.0, -1.0));
        let total_z: f64 = (0..4).map(|i| r[3 * i + 2]).sum();
        assert_relative_eq!(total_z, -6.0);
    }

    #[test]
    fn test_zero_history_zero_stress_gives_zero() {
        let geometry = unit_tet();
        let zero = [0.0; 12];
        let input = CellInput {
            geometry: &geometry,
            density: 1.0,
            dt: 0.1,
            disp_t: &zero,
            disp_t_minus_dt: &zero,
            gravity: None,
        };
        for mass in [MassMatrix::Lumped, MassMatrix::Consistent] {
            let r = cell_residual(&input, &StressTensor::zero(), mass);
            assert!(r.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_internal_force_sign() {
        // Uniaxial tension σ_xx pulls node 1 (at x = 1) back: r_x < 0 there.
        let geometry = unit_tet();
        let zero = [0.0; 12];
        let input = CellInput {
            geometry: &geometry,
            density: 1.0,
            dt: 1.0,
            disp_t: &zero,
            disp_t_minus_dt: &zero,
            gravity: None,
        };
        let stress = StressTensor::new([6.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let r = cell_residual(&input, &stress, MassMatrix::Lumped);
        // V = 1/6, ∇N1 = (1, 0, 0)
        assert_relative_eq!(r[3], -1.0, epsilon = 1e-14);
        assert_relative_eq!(r[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(r.iter().sum::<f64>(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_mass_from_json() {
        let m: MassMatrix = serde_json::from_str("\"consistent\"").unwrap();
        assert_eq!(m, MassMatrix::Consistent);
        assert_eq!(MassMatrix::default(), MassMatrix::Lumped);
    }
}
