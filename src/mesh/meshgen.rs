//! In-memory meshes and a structured box generator.

use super::{Coordinates, MeshChunkReader, NODES_PER_TET};
use crate::mesh_error::MeshReorderError;

/// A whole tetrahedral mesh held in memory, usable as a [`MeshChunkReader`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InMemoryMesh {
    /// Connectivity, 4 node ids per element.
    pub inpoel: Vec<u64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl InMemoryMesh {
    /// Build a mesh, checking that every element references an existing node.
    pub fn new(
        inpoel: Vec<u64>,
        coords: [Vec<f64>; 3],
    ) -> Result<Self, MeshReorderError> {
        let [x, y, z] = coords;
        if x.len() != y.len() || x.len() != z.len() {
            return Err(MeshReorderError::MeshRead(format!(
                "coordinate arrays differ in length: {}, {}, {}",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        if inpoel.len() % NODES_PER_TET != 0 {
            return Err(MeshReorderError::MeshRead(format!(
                "connectivity length {} is not a multiple of {NODES_PER_TET}",
                inpoel.len()
            )));
        }
        if let Some(&bad) = inpoel.iter().find(|&&n| n as usize >= x.len()) {
            return Err(MeshReorderError::MeshRead(format!(
                "element references node {bad} but only {} nodes exist",
                x.len()
            )));
        }
        Ok(Self { inpoel, x, y, z })
    }

    pub fn nnode(&self) -> usize {
        self.x.len()
    }

    pub fn nelem_usize(&self) -> usize {
        self.inpoel.len() / NODES_PER_TET
    }
}

impl MeshChunkReader for InMemoryMesh {
    fn nelem(&self) -> Result<u64, MeshReorderError> {
        Ok(self.nelem_usize() as u64)
    }

    fn read_element_range(&self, lo: u64, hi: u64) -> Result<Vec<u64>, MeshReorderError> {
        let (lo, hi) = (lo as usize, hi as usize);
        if lo > hi || hi > self.nelem_usize() {
            return Err(MeshReorderError::MeshRead(format!(
                "element range [{lo}, {hi}) outside mesh of {} elements",
                self.nelem_usize()
            )));
        }
        Ok(self.inpoel[lo * NODES_PER_TET..hi * NODES_PER_TET].to_vec())
    }

    fn read_node_coordinates(&self, extent: (u64, u64)) -> Result<Coordinates, MeshReorderError> {
        let (lo, hi) = (extent.0 as usize, extent.1 as usize);
        if lo > hi || hi >= self.nnode() {
            return Err(MeshReorderError::MeshRead(format!(
                "node extent [{lo}, {hi}] outside mesh of {} nodes",
                self.nnode()
            )));
        }
        Ok(Coordinates {
            first: extent.0,
            x: self.x[lo..=hi].to_vec(),
            y: self.y[lo..=hi].to_vec(),
            z: self.z[lo..=hi].to_vec(),
        })
    }
}

/// Structured `nx × ny × nz` box of unit hexahedra, each split into 6
/// tetrahedra sharing the main diagonal (conforming across cells).
///
/// Node `(i, j, k)` has id `i + (nx+1)·(j + (ny+1)·k)` and coordinates
/// `(i, j, k)`.
pub fn box_mesh(nx: usize, ny: usize, nz: usize) -> InMemoryMesh {
    let (px, py, pz) = (nx + 1, ny + 1, nz + 1);
    let id = |i: usize, j: usize, k: usize| (i + px * (j + py * k)) as u64;

    let mut x = Vec::with_capacity(px * py * pz);
    let mut y = Vec::with_capacity(px * py * pz);
    let mut z = Vec::with_capacity(px * py * pz);
    for k in 0..pz {
        for j in 0..py {
            for i in 0..px {
                x.push(i as f64);
                y.push(j as f64);
                z.push(k as f64);
            }
        }
    }

    // Walks from corner 000 to 111, one axis at a time.
    const PATHS: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    let mut inpoel = Vec::with_capacity(nx * ny * nz * 6 * NODES_PER_TET);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                for path in PATHS {
                    let mut c = [i, j, k];
                    inpoel.push(id(c[0], c[1], c[2]));
                    for axis in path {
                        c[axis] += 1;
                        inpoel.push(id(c[0], c[1], c[2]));
                    }
                }
            }
        }
    }

    InMemoryMesh { inpoel, x, y, z }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn box_counts() {
        let m = box_mesh(2, 1, 1);
        assert_eq!(m.nnode(), 12);
        assert_eq!(m.nelem_usize(), 12);
        let used: BTreeSet<u64> = m.inpoel.iter().copied().collect();
        assert_eq!(used, (0..12).collect());
    }

    #[test]
    fn box_tets_are_nondegenerate() {
        let m = box_mesh(1, 1, 1);
        for e in m.inpoel.chunks(4) {
            let p = |n: u64| [m.x[n as usize], m.y[n as usize], m.z[n as usize]];
            let (a, b, c, d) = (p(e[0]), p(e[1]), p(e[2]), p(e[3]));
            let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let w = [d[0] - a[0], d[1] - a[1], d[2] - a[2]];
            let det = u[0] * (v[1] * w[2] - v[2] * w[1]) - u[1] * (v[0] * w[2] - v[2] * w[0])
                + u[2] * (v[0] * w[1] - v[1] * w[0]);
            assert!((det.abs() - 1.0).abs() < 1e-12, "volume*6 = {det}");
        }
    }

    #[test]
    fn reader_rejects_out_of_range() {
        let m = box_mesh(1, 1, 1);
        assert!(m.read_element_range(0, 7).is_err());
        assert!(m.read_node_coordinates((0, 8)).is_err());
        assert_eq!(m.read_element_range(1, 2).unwrap(), m.inpoel[4..8].to_vec());
        let block = m.read_node_coordinates((2, 5)).unwrap();
        assert!(!block.is_empty());
        assert_eq!(block.len(), 4);
        assert_eq!(block.get(5), Some([1.0, 0.0, 1.0]));
        assert_eq!(block.get(6), None);
    }

    #[test]
    fn new_rejects_dangling_node() {
        let err = InMemoryMesh::new(vec![0, 1, 2, 7], [vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]]);
        assert!(matches!(err, Err(MeshReorderError::MeshRead(_))));
    }
}
