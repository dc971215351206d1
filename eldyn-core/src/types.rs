//! Core data types for the explicit kernels.
//!
//! Tensors are symmetric 3x3 quantities stored as six components in the
//! order [xx, yy, zz, xy, yz, xz]. Shear components are *tensor* components
//! (ε_xy = ½(∂u/∂y + ∂v/∂x)), not engineering shear, so σ_xy = 2μ ε_xy in
//! the elastic range.

use nalgebra::{Matrix3, Matrix6, Vector3, Vector6};

/// A point in 3D space.
pub type Point3 = Vector3<f64>;

/// A 3D vector (displacement, force, gravity, etc.).
pub type Vec3 = Vector3<f64>;

/// Number of independent components of a symmetric 3D tensor.
pub const TENSOR_SIZE: usize = 6;

/// Kronecker delta in six-component form.
pub const KRONECKER: [f64; 6] = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0];

/// Weight of each component in a double contraction a:b.
const CONTRACTION_WEIGHT: [f64; 6] = [1.0, 1.0, 1.0, 2.0, 2.0, 2.0];

/// Double contraction a:b of two symmetric tensors in six-component form.
#[inline]
pub fn scalar_product(a: &Vector6<f64>, b: &Vector6<f64>) -> f64 {
    (0..6).map(|i| CONTRACTION_WEIGHT[i] * a[i] * b[i]).sum()
}

/// Split a tensor into its mean (trace/3) and deviatoric parts.
#[inline]
pub fn mean_and_deviator(t: &Vector6<f64>) -> (f64, Vector6<f64>) {
    let mean = (t[0] + t[1] + t[2]) / 3.0;
    let mut dev = *t;
    for i in 0..3 {
        dev[i] -= mean;
    }
    (mean, dev)
}

fn symmetric_matrix(t: &Vector6<f64>) -> Matrix3<f64> {
    Matrix3::new(
        t[0], t[3], t[5],
        t[3], t[1], t[4],
        t[5], t[4], t[2],
    )
}

/// Symmetric stress tensor.
///
/// Components are ordered as: [σ_xx, σ_yy, σ_zz, σ_xy, σ_yz, σ_xz]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressTensor(pub Vector6<f64>);

impl StressTensor {
    /// Create a new stress tensor from its components.
    pub fn new(components: [f64; 6]) -> Self {
        Self(Vector6::from_row_slice(&components))
    }

    /// Zero stress state.
    pub fn zero() -> Self {
        Self(Vector6::zeros())
    }

    /// Mean stress p = tr(σ)/3 (tension positive).
    pub fn mean(&self) -> f64 {
        (self.0[0] + self.0[1] + self.0[2]) / 3.0
    }

    /// Deviatoric part s = σ - p I.
    pub fn deviatoric(&self) -> Vector6<f64> {
        mean_and_deviator(&self.0).1
    }

    /// Second invariant of the deviatoric stress, J2 = ½ s:s.
    pub fn j2(&self) -> f64 {
        let s = self.deviatoric();
        0.5 * scalar_product(&s, &s)
    }

    /// von Mises equivalent stress √(3 J2).
    pub fn von_mises(&self) -> f64 {
        (3.0 * self.j2()).sqrt()
    }

    /// Extract the full 3x3 symmetric stress matrix.
    pub fn to_matrix(&self) -> Matrix3<f64> {
        symmetric_matrix(&self.0)
    }
}

impl Default for StressTensor {
    fn default() -> Self {
        Self::zero()
    }
}

/// Symmetric strain tensor.
///
/// Components are ordered as: [ε_xx, ε_yy, ε_zz, ε_xy, ε_yz, ε_xz]
/// with tensor (not engineering) shear components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrainTensor(pub Vector6<f64>);

impl StrainTensor {
    /// Create a new strain tensor from its components.
    pub fn new(components: [f64; 6]) -> Self {
        Self(Vector6::from_row_slice(&components))
    }

    /// Zero strain state.
    pub fn zero() -> Self {
        Self(Vector6::zeros())
    }

    /// Volumetric strain tr(ε).
    pub fn volumetric(&self) -> f64 {
        self.0[0] + self.0[1] + self.0[2]
    }

    /// Extract the full 3x3 symmetric strain matrix.
    pub fn to_matrix(&self) -> Matrix3<f64> {
        symmetric_matrix(&self.0)
    }
}

impl Default for StrainTensor {
    fn default() -> Self {
        Self::zero()
    }
}

/// Derivative of stress components with respect to strain components.
///
/// Maps a strain increment to a stress increment: dσ = D dε, both in the
/// six-component tensor form above (so the elastic shear entries are 2μ).
pub type ConstitutiveMatrix = Matrix6<f64>;
