//! Nodal fields and cell restriction.
//!
//! Global vectors (displacements, residual, lumped Jacobian) are owned by the
//! caller. The kernels touch them only through [`Field::restrict_closure`]
//! and [`Field::update_add_closure`].

use crate::element::tet4::{CellVector, NUM_BASIS, SPACE_DIM};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Name of the displacement field at time t.
pub const DISP_T: &str = "disp(t)";

/// Name of the displacement field at time t - dt.
pub const DISP_T_MINUS_DT: &str = "disp(t-dt)";

/// Vector field with one 3-component value per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    values: Vec<f64>,
}

impl Field {
    /// Zero field over `n_vertices` vertices.
    pub fn new<S: Into<String>>(name: S, n_vertices: usize) -> Self {
        Self {
            name: name.into(),
            values: vec![0.0; n_vertices * SPACE_DIM],
        }
    }

    /// Field from interleaved values [x0, y0, z0, x1, ...].
    pub fn from_values<S: Into<String>>(name: S, values: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if values.len() % SPACE_DIM != 0 {
            return Err(Error::Field(format!(
                "field '{}' has {} values, not a multiple of {}",
                name,
                values.len(),
                SPACE_DIM
            )));
        }
        Ok(Self { name, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of vertices covered by the field.
    pub fn n_vertices(&self) -> usize {
        self.values.len() / SPACE_DIM
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Value at a vertex.
    pub fn vertex(&self, v: usize) -> [f64; SPACE_DIM] {
        [
            self.values[SPACE_DIM * v],
            self.values[SPACE_DIM * v + 1],
            self.values[SPACE_DIM * v + 2],
        ]
    }

    /// Set every entry to zero.
    pub fn zero(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }

    fn check_cone(&self, cone: &[usize; NUM_BASIS]) -> Result<()> {
        match cone.iter().find(|&&v| v >= self.n_vertices()) {
            Some(v) => Err(Error::Field(format!(
                "vertex {} outside field '{}' ({} vertices)",
                v,
                self.name,
                self.n_vertices()
            ))),
            None => Ok(()),
        }
    }

    /// Copy the values at a cell's vertices into a local buffer.
    pub fn restrict_closure(&self, cone: &[usize; NUM_BASIS], local: &mut CellVector) -> Result<()> {
        self.check_cone(cone)?;
        for (i, &v) in cone.iter().enumerate() {
            local[SPACE_DIM * i..SPACE_DIM * (i + 1)]
                .copy_from_slice(&self.values[SPACE_DIM * v..SPACE_DIM * (v + 1)]);
        }
        Ok(())
    }

    /// Add a local buffer into the values at a cell's vertices.
    pub fn update_add_closure(&mut self, cone: &[usize; NUM_BASIS], local: &CellVector) -> Result<()> {
        self.check_cone(cone)?;
        for (i, &v) in cone.iter().enumerate() {
            for d in 0..SPACE_DIM {
                self.values[SPACE_DIM * v + d] += local[SPACE_DIM * i + d];
            }
        }
        Ok(())
    }
}

/// Named collection of solution fields.
#[derive(Debug, Clone, Default)]
pub struct SolutionFields {
    fields: HashMap<String, Field>,
}

impl SolutionFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a field under its own name.
    pub fn add(&mut self, field: Field) {
        self.fields.insert(field.name().to_string(), field);
    }

    pub fn get(&self, name: &str) -> Result<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::Field(format!("no field named '{}'", name)))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Field> {
        self.fields
            .get_mut(name)
            .ok_or_else(|| Error::Field(format!("no field named '{}'", name)))
    }

    /// Shift the history: disp(t-dt) ← disp(t), disp(t) ← `next`.
    pub fn advance(&mut self, next: Field) -> Result<()> {
        let current = self.get(DISP_T)?.clone();
        if current.n_vertices() != next.n_vertices() {
            return Err(Error::Field(format!(
                "cannot advance: new displacement has {} vertices, expected {}",
                next.n_vertices(),
                current.n_vertices()
            )));
        }
        let mut previous = current;
        previous.name = DISP_T_MINUS_DT.to_string();
        let mut next = next;
        next.name = DISP_T.to_string();
        self.add(previous);
        self.add(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restrict_and_update_add() {
        let mut field = Field::new("residual", 5);
        let cone = [4, 0, 2, 1];
        let local: CellVector = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        field.update_add_closure(&cone, &local).unwrap();
        field.update_add_closure(&cone, &local).unwrap();
        assert_eq!(field.vertex(4), [2.0, 4.0, 6.0]);
        assert_eq!(field.vertex(1), [20.0, 22.0, 24.0]);
        assert_eq!(field.vertex(3), [0.0, 0.0, 0.0]);

        let mut back = [0.0; 12];
        field.restrict_closure(&cone, &mut back).unwrap();
        assert_eq!(back, local.map(|x| 2.0 * x));
    }

    #[test]
    fn test_out_of_range_cone_fails() {
        let field = Field::new("disp(t)", 3);
        let mut local = [0.0; 12];
        assert!(matches!(
            field.restrict_closure(&[0, 1, 2, 3], &mut local),
            Err(Error::Field(_))
        ));
    }

    #[test]
    fn test_bad_length_rejected() {
        assert!(Field::from_values("x", vec![0.0; 7]).is_err());
    }

    #[test]
    fn test_advance_shifts_history() {
        let mut fields = SolutionFields::new();
        fields.add(Field::from_values(DISP_T, vec![1.0, 0.0, 0.0]).unwrap());
        fields.add(Field::new(DISP_T_MINUS_DT, 1));
        fields
            .advance(Field::from_values("next", vec![2.0, 0.0, 0.0]).unwrap())
            .unwrap();
        assert_eq!(fields.get(DISP_T).unwrap().vertex(0), [2.0, 0.0, 0.0]);
        assert_eq!(fields.get(DISP_T_MINUS_DT).unwrap().vertex(0), [1.0, 0.0, 0.0]);
        assert!(fields.get("velocity").is_err());
    }
}
