//! Cell geometry and quadrature.
//!
//! Only the 4-node tetrahedron with a single quadrature point is supported.
//!
//! # Submodules
//!
//! - [`gauss`] - Quadrature rules and the Tet4 configuration check
//! - [`tet4`] - Volume, shape-function gradients and B operator

pub mod gauss;
pub mod tet4;

pub use gauss::{gauss_tet, GaussPoint, Quadrature};
pub use tet4::{CellVector, Tet4Geometry};
