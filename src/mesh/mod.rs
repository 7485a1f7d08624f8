//! Tetrahedral mesh chunks and the reader seam used to obtain them.
//!
//! The partitioner never opens mesh files itself. It asks a
//! [`MeshChunkReader`] for a contiguous range of elements and, when a
//! geometric strategy is selected, for the coordinates of the nodes those
//! elements touch.

pub mod meshgen;

use crate::mesh_error::MeshReorderError;
use std::ops::Range;

pub use meshgen::{InMemoryMesh, box_mesh};

/// Nodes per linear tetrahedron.
pub const NODES_PER_TET: usize = 4;

/// Node coordinates for a contiguous block of global node ids.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Coordinates {
    /// Global id of the first node in the block.
    pub first: u64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl Coordinates {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Coordinates of global node `id`, if it falls inside the block.
    pub fn get(&self, id: u64) -> Option<[f64; 3]> {
        let i = usize::try_from(id.checked_sub(self.first)?).ok()?;
        Some([*self.x.get(i)?, *self.y.get(i)?, *self.z.get(i)?])
    }
}

/// Source of mesh elements and node coordinates, addressed by global index.
pub trait MeshChunkReader {
    /// Total number of tetrahedra in the mesh.
    fn nelem(&self) -> Result<u64, MeshReorderError>;

    /// Flat connectivity (4 node ids per element) of elements `[lo, hi)`.
    fn read_element_range(&self, lo: u64, hi: u64) -> Result<Vec<u64>, MeshReorderError>;

    /// Coordinates of nodes `[extent.0, extent.1]` (inclusive).
    fn read_node_coordinates(&self, extent: (u64, u64)) -> Result<Coordinates, MeshReorderError>;
}

/// The contiguously numbered part of the mesh graph a PE reads first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshChunk {
    /// Element connectivity, 4 node ids per element.
    pub inpoel: Vec<u64>,
    /// Global ids of the elements, parallel to `inpoel` in groups of 4.
    pub gelemid: Vec<u64>,
}

impl MeshChunk {
    pub fn nelem(&self) -> usize {
        self.gelemid.len()
    }

    /// Node ids of element `e`.
    pub fn element(&self, e: usize) -> &[u64] {
        &self.inpoel[e * NODES_PER_TET..(e + 1) * NODES_PER_TET]
    }
}

/// Element range read by `pe`: equal chunks with the remainder on the last PE.
pub fn element_range(nelem: u64, pe: usize, npes: usize) -> Range<u64> {
    let npes = npes.max(1) as u64;
    let pe = pe as u64;
    let chunk = nelem / npes;
    let from = pe * chunk;
    let mut till = from + chunk;
    if pe == npes - 1 {
        till += nelem % npes;
    }
    from..till
}

/// Read this PE's chunk of the mesh graph.
pub fn read_chunk<R>(reader: &R, pe: usize, npes: usize) -> Result<MeshChunk, MeshReorderError>
where
    R: MeshChunkReader + ?Sized,
{
    let range = element_range(reader.nelem()?, pe, npes);
    let inpoel = if range.is_empty() {
        Vec::new()
    } else {
        reader.read_element_range(range.start, range.end)?
    };
    let expected = (range.end - range.start) as usize * NODES_PER_TET;
    if inpoel.len() != expected {
        return Err(MeshReorderError::MeshRead(format!(
            "elements {range:?}: expected {expected} connectivity entries, got {}",
            inpoel.len()
        )));
    }
    Ok(MeshChunk {
        inpoel,
        gelemid: range.collect(),
    })
}

/// Smallest and largest node id referenced by a connectivity array.
pub fn extents(inpoel: &[u64]) -> Option<(u64, u64)> {
    let lo = inpoel.iter().copied().min()?;
    let hi = inpoel.iter().copied().max()?;
    Some((lo, hi))
}

/// Element centroids of a chunk, as three coordinate arrays.
pub fn centroids(
    chunk: &MeshChunk,
    coords: &Coordinates,
) -> Result<[Vec<f64>; 3], MeshReorderError> {
    let centroid = |e: usize| -> Result<[f64; 3], MeshReorderError> {
        let mut c = [0.0; 3];
        for &n in chunk.element(e) {
            let p = coords.get(n).ok_or_else(|| {
                MeshReorderError::MeshRead(format!(
                    "element {} references node {n} outside the coordinate block",
                    chunk.gelemid[e]
                ))
            })?;
            for d in 0..3 {
                c[d] += p[d];
            }
        }
        Ok(c.map(|v| v / NODES_PER_TET as f64))
    };

    #[cfg(feature = "rayon")]
    let points: Vec<[f64; 3]> = {
        use rayon::prelude::*;
        (0..chunk.nelem())
            .into_par_iter()
            .map(centroid)
            .collect::<Result<_, _>>()?
    };
    #[cfg(not(feature = "rayon"))]
    let points: Vec<[f64; 3]> = (0..chunk.nelem())
        .map(centroid)
        .collect::<Result<_, _>>()?;

    let mut out = [
        Vec::with_capacity(points.len()),
        Vec::with_capacity(points.len()),
        Vec::with_capacity(points.len()),
    ];
    for p in points {
        for d in 0..3 {
            out[d].push(p[d]);
        }
    }
    Ok(out)
}
