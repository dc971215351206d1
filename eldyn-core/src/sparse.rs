//! Global Jacobian storage.
//!
//! Cell blocks are accumulated as (row, col, value) triplets and converted
//! to CSR once assembly is complete. Duplicate entries from cells sharing a
//! vertex are summed in the conversion.

use crate::error::{Error, Result};
use nalgebra::DMatrix;
use nalgebra_sparse::coo::CooMatrix;
use nalgebra_sparse::csr::CsrMatrix as NalgebraCsr;

/// Compressed Sparse Row matrix.
pub type CsrMatrix = NalgebraCsr<f64>;

/// Sink for cell Jacobian blocks.
pub trait JacobianStore {
    /// Add a dense square block at the given global row/column indices.
    fn add_block(&mut self, indices: &[usize], block: &DMatrix<f64>) -> Result<()>;
}

/// Builder for assembling a sparse matrix from triplets (COO format).
pub struct TripletMatrix {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl TripletMatrix {
    /// Create a new triplet matrix builder.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Add a value at (row, col). Duplicates are summed during conversion.
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.n_rows || col >= self.n_cols {
            return Err(Error::Field(format!(
                "entry ({}, {}) outside {}x{} Jacobian",
                row, col, self.n_rows, self.n_cols
            )));
        }
        if value != 0.0 {
            self.rows.push(row);
            self.cols.push(col);
            self.values.push(value);
        }
        Ok(())
    }

    /// Number of stored triplets.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Convert to CSR format, summing duplicate entries.
    pub fn to_csr(self) -> Result<CsrMatrix> {
        let coo = CooMatrix::try_from_triplets(
            self.n_rows,
            self.n_cols,
            self.rows,
            self.cols,
            self.values,
        )
        .map_err(|e| Error::Field(format!("invalid Jacobian triplets: {}", e)))?;
        Ok(CsrMatrix::from(&coo))
    }
}

impl JacobianStore for TripletMatrix {
    fn add_block(&mut self, indices: &[usize], block: &DMatrix<f64>) -> Result<()> {
        let n = indices.len();
        if block.nrows() != n || block.ncols() != n {
            return Err(Error::Field(format!(
                "block of size {}x{} does not match {} indices",
                block.nrows(),
                block.ncols(),
                n
            )));
        }
        for i in 0..n {
            for j in 0..n {
                self.add(indices[i], indices[j], block[(i, j)])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplet_to_csr() {
        let mut triplet = TripletMatrix::new(3, 3);
        triplet.add(0, 0, 1.0).unwrap();
        triplet.add(1, 1, 2.0).unwrap();
        triplet.add(2, 2, 3.0).unwrap();
        triplet.add(0, 1, 0.5).unwrap();
        triplet.add(1, 0, 0.5).unwrap();

        let csr = triplet.to_csr().unwrap();
        assert_eq!(csr.nrows(), 3);
        assert_eq!(csr.ncols(), 3);
        assert_eq!(csr.nnz(), 5);
    }

    #[test]
    fn test_duplicate_summation() {
        let mut triplet = TripletMatrix::new(2, 2);
        triplet.add(0, 0, 1.0).unwrap();
        triplet.add(0, 0, 2.0).unwrap();
        triplet.add(0, 0, 3.0).unwrap();

        let dense = DMatrix::from(&triplet.to_csr().unwrap());
        assert!((dense[(0, 0)] - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_block_assembly() {
        let mut triplet = TripletMatrix::new(6, 6);
        let dofs = vec![0, 1, 3, 4];
        let ke = DMatrix::from_row_slice(4, 4, &[
            1.0, 0.5, 0.1, 0.0,
            0.5, 2.0, 0.0, 0.2,
            0.1, 0.0, 1.5, 0.3,
            0.0, 0.2, 0.3, 2.5,
        ]);
        triplet.add_block(&dofs, &ke).unwrap();

        let dense = DMatrix::from(&triplet.to_csr().unwrap());
        assert!((dense[(0, 0)] - 1.0).abs() < 1e-10);
        assert!((dense[(0, 3)] - 0.1).abs() < 1e-10);
        assert!((dense[(3, 4)] - 0.3).abs() < 1e-10);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut triplet = TripletMatrix::new(2, 2);
        assert!(triplet.add(2, 0, 1.0).is_err());
        let block = DMatrix::identity(3, 3);
        assert!(triplet.add_block(&[0, 1], &block).is_err());
    }
}
