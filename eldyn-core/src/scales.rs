//! Nondimensionalization scales.
//!
//! All quantities inside the kernels are nondimensional. Physical values
//! are divided by a scale on the way in and multiplied by it on the way out.

use serde::{Deserialize, Serialize};

/// Length, pressure, time and density scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nondimensional {
    /// Length scale (m).
    pub length_scale: f64,
    /// Pressure scale (Pa).
    pub pressure_scale: f64,
    /// Time scale (s).
    pub time_scale: f64,
    /// Density scale (kg/m³).
    pub density_scale: f64,
}

impl Default for Nondimensional {
    fn default() -> Self {
        Self {
            length_scale: 1.0,
            pressure_scale: 1.0,
            time_scale: 1.0,
            density_scale: 1.0,
        }
    }
}

impl Nondimensional {
    /// Create a scale set.
    pub fn new(length_scale: f64, pressure_scale: f64, time_scale: f64, density_scale: f64) -> Self {
        Self {
            length_scale,
            pressure_scale,
            time_scale,
            density_scale,
        }
    }

    /// Scale for accelerations such as gravity: pressure / (length · density).
    pub fn gravity_scale(&self) -> f64 {
        self.pressure_scale / (self.length_scale * self.density_scale)
    }

    /// Nondimensionalize a scalar.
    #[inline]
    pub fn nondimensionalize(&self, value: f64, scale: f64) -> f64 {
        value / scale
    }

    /// Dimensionalize a scalar.
    #[inline]
    pub fn dimensionalize(&self, value: f64, scale: f64) -> f64 {
        value * scale
    }

    /// Nondimensionalize an array in place.
    pub fn nondimensionalize_slice(&self, values: &mut [f64], scale: f64) {
        values.iter_mut().for_each(|v| *v /= scale);
    }

    /// Dimensionalize an array in place.
    pub fn dimensionalize_slice(&self, values: &mut [f64], scale: f64) {
        values.iter_mut().for_each(|v| *v *= scale);
    }
}
