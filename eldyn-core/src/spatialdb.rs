//! Spatial database interface.
//!
//! A spatial database answers "what are the values of these named quantities
//! at this point?" It seeds material properties and supplies the gravity
//! field. Queries are made with dimensional coordinates and return
//! dimensional values.

use crate::error::{Error, Result};
use crate::types::Point3;

/// Coordinate system of the points handed to a spatial database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordSys {
    /// Cartesian coordinates with the given spatial dimension.
    Cartesian { space_dim: usize },
}

impl Default for CoordSys {
    fn default() -> Self {
        CoordSys::Cartesian { space_dim: 3 }
    }
}

/// Source of spatially varying values.
pub trait SpatialDb: Send + Sync {
    /// Database label for diagnostics.
    fn label(&self) -> &str;

    /// Query the values of `names` at `point`.
    ///
    /// # Errors
    ///
    /// [`Error::SpatialQuery`] if a name is unknown or the point cannot be
    /// resolved.
    fn query(&self, names: &[&str], point: &Point3, cs: &CoordSys) -> Result<Vec<f64>>;
}

/// Database with the same values everywhere, optionally limited to a box.
#[derive(Debug, Clone)]
pub struct UniformDb {
    label: String,
    names: Vec<String>,
    values: Vec<f64>,
    bounds: Option<(Point3, Point3)>,
}

impl UniformDb {
    /// Create a uniform database from (name, value) pairs.
    pub fn new<S: Into<String>>(label: S, entries: &[(&str, f64)]) -> Self {
        Self {
            label: label.into(),
            names: entries.iter().map(|(n, _)| n.to_string()).collect(),
            values: entries.iter().map(|(_, v)| *v).collect(),
            bounds: None,
        }
    }

    /// Restrict the database to an axis-aligned box; points outside fail.
    pub fn with_bounds(mut self, min: Point3, max: Point3) -> Self {
        self.bounds = Some((min, max));
        self
    }

    /// Uniform gravity field with the given acceleration vector (m/s²).
    pub fn gravity(acceleration: [f64; 3]) -> Self {
        Self::new(
            "gravity",
            &[
                ("gravity-x", acceleration[0]),
                ("gravity-y", acceleration[1]),
                ("gravity-z", acceleration[2]),
            ],
        )
    }
}

/// Value names of a gravity field, in component order.
pub const GRAVITY_NAMES: [&str; 3] = ["gravity-x", "gravity-y", "gravity-z"];

impl SpatialDb for UniformDb {
    fn label(&self) -> &str {
        &self.label
    }

    fn query(&self, names: &[&str], point: &Point3, cs: &CoordSys) -> Result<Vec<f64>> {
        let CoordSys::Cartesian { space_dim } = *cs;
        if space_dim != 3 {
            return Err(Error::SpatialQuery(format!(
                "database '{}' cannot answer queries in {}D",
                self.label, space_dim
            )));
        }
        if let Some((min, max)) = &self.bounds {
            let inside = (0..3).all(|i| point[i] >= min[i] && point[i] <= max[i]);
            if !inside {
                return Err(Error::SpatialQuery(format!(
                    "point ({}, {}, {}) is outside database '{}'",
                    point.x, point.y, point.z, self.label
                )));
            }
        }
        names
            .iter()
            .map(|name| {
                self.names
                    .iter()
                    .position(|n| n == name)
                    .map(|i| self.values[i])
                    .ok_or_else(|| {
                        Error::SpatialQuery(format!(
                            "value '{}' not found in database '{}'",
                            name, self.label
                        ))
                    })
            })
            .collect()
    }
}
