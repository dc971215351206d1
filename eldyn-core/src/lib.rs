//! eldyn-core - explicit elastodynamics kernels for Tet4 meshes
//!
//! Cell-level residual and Jacobian contributions for explicit time stepping
//! of a deforming solid, with path-dependent material response:
//! - Tet4 geometry and matrix-free strain-displacement operator
//! - Isotropic elastic and Drucker-Prager elastoplastic materials
//! - Consistent and lumped mass, gravity body force, internal force
//! - Parallel cell loops using Rayon with deterministic scatter-add
//!
//! # Architecture
//!
//! - [`ElasticityExplicitTet4`]: global assembly loop for one material
//! - [`Material`]: per-point properties and history, plus a [`Rheology`]
//! - [`mesh::Topology`], [`Field`], [`sparse::JacobianStore`],
//!   [`spatialdb::SpatialDb`]: the narrow views of mesh, fields, matrix
//!   storage and spatial data the kernels work through
//!
//! All values inside the kernels are nondimensional; see [`Nondimensional`].

pub mod types;
pub mod element;
pub mod mesh;
pub mod material;
pub mod field;
pub mod sparse;
pub mod scales;
pub mod spatialdb;
pub mod residual;
pub mod jacobian;
pub mod assembly;
pub mod stress;
pub mod config;
pub mod error;

pub use types::{Point3, StressTensor, StrainTensor};
pub use element::{Quadrature, Tet4Geometry};
pub use mesh::Mesh;
pub use material::{Material, Rheology, RheologyKind};
pub use field::{Field, SolutionFields};
pub use sparse::{CsrMatrix, TripletMatrix};
pub use scales::Nondimensional;
pub use residual::MassMatrix;
pub use assembly::ElasticityExplicitTet4;
pub use config::Config;
pub use error::{Error, Result};
