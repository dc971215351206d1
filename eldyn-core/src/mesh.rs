//! Mesh topology for Tet4 cells.
//!
//! The kernels only need a narrow view of the mesh, expressed by the
//! [`Topology`] trait: which cells carry a material label, which vertices
//! form a cell, and where those vertices are. [`Mesh`] is a simple serial
//! implementation.

use crate::element::tet4::{CellVector, NUM_BASIS};
use crate::error::{Error, Result};
use crate::spatialdb::CoordSys;
use crate::types::Point3;

/// Narrow mesh interface consumed by the assembly loop.
pub trait Topology: Sync {
    /// Number of vertices (nodal points) in the mesh.
    fn n_vertices(&self) -> usize;

    /// Cells tagged with the given material identifier.
    fn cells_with_material(&self, material_id: i32) -> Vec<usize>;

    /// Vertices of a cell, in the cell's local ordering.
    fn cone(&self, cell: usize) -> Result<&[usize; NUM_BASIS]>;

    /// Restrict the (nondimensional) vertex coordinates of a cell.
    fn restrict_coordinates(&self, cell: usize, coords: &mut CellVector) -> Result<()>;

    /// Coordinate system of the vertex coordinates.
    fn coordsys(&self) -> &CoordSys;
}

/// Tetrahedral mesh with a material label per cell.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex coordinates.
    vertices: Vec<Point3>,
    /// Cell connectivity.
    cells: Vec<[usize; NUM_BASIS]>,
    /// "material-id" label of each cell.
    material_ids: Vec<i32>,
    coordsys: CoordSys,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            cells: Vec::new(),
            material_ids: Vec::new(),
            coordsys: CoordSys::default(),
        }
    }

    /// Add a vertex to the mesh, returning its index.
    pub fn add_vertex(&mut self, point: Point3) -> usize {
        let idx = self.vertices.len();
        self.vertices.push(point);
        idx
    }

    /// Add a Tet4 cell labelled with a material identifier.
    pub fn add_cell(&mut self, vertices: [usize; NUM_BASIS], material_id: i32) -> Result<usize> {
        for &v in &vertices {
            if v >= self.vertices.len() {
                return Err(Error::Mesh(format!(
                    "vertex index {} out of bounds (mesh has {} vertices)",
                    v,
                    self.vertices.len()
                )));
            }
        }
        let idx = self.cells.len();
        self.cells.push(vertices);
        self.material_ids.push(material_id);
        Ok(idx)
    }

    /// Number of cells in the mesh.
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// Vertex coordinates.
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Material identifier of a cell.
    pub fn material_id(&self, cell: usize) -> Option<i32> {
        self.material_ids.get(cell).copied()
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology for Mesh {
    fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    fn cells_with_material(&self, material_id: i32) -> Vec<usize> {
        self.material_ids
            .iter()
            .enumerate()
            .filter(|(_, &id)| id == material_id)
            .map(|(cell, _)| cell)
            .collect()
    }

    fn cone(&self, cell: usize) -> Result<&[usize; NUM_BASIS]> {
        self.cells
            .get(cell)
            .ok_or_else(|| Error::Mesh(format!("cell {} does not exist", cell)))
    }

    fn restrict_coordinates(&self, cell: usize, coords: &mut CellVector) -> Result<()> {
        let cone = self.cone(cell)?;
        for (i, &v) in cone.iter().enumerate() {
            let p = &self.vertices[v];
            coords[3 * i..3 * i + 3].copy_from_slice(p.as_slice());
        }
        Ok(())
    }

    fn coordsys(&self) -> &CoordSys {
        &self.coordsys
    }
}
