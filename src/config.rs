//! Run configuration passed to every [`Partitioner`](crate::algs::partitioner::Partitioner).
//!
//! Nothing in the crate reads global state: the mesh path, the requested
//! decomposition and the partitioning strategy travel in a
//! [`PartitionConfig`] handed to each PE at construction.

use crate::mesh_error::MeshReorderError;
use crate::partitioning::{
    BlockPartitioner, CyclicPartitioner, ElementPartitioner, SlabPartitioner,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Coordinate axis used by geometric strategies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Element partitioning strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartitioningAlgorithm {
    /// Contiguous blocks of global element ids.
    Block,
    /// Global element id modulo the chare count.
    Cyclic,
    /// Centroid coordinate along `axis` bucketed into equal slabs of `[lo, hi]`.
    Slab { axis: Axis, lo: f64, hi: f64 },
}

impl PartitioningAlgorithm {
    /// Geometric strategies need element centroids, and thus node coordinates.
    pub fn is_geometric(&self) -> bool {
        matches!(self, PartitioningAlgorithm::Slab { .. })
    }

    /// Instantiate the strategy for a mesh with `total_elems` elements.
    pub fn build(&self, total_elems: u64) -> Box<dyn ElementPartitioner + Send + Sync> {
        match *self {
            PartitioningAlgorithm::Block => Box::new(BlockPartitioner::new(total_elems)),
            PartitioningAlgorithm::Cyclic => Box::new(CyclicPartitioner),
            PartitioningAlgorithm::Slab { axis, lo, hi } => {
                Box::new(SlabPartitioner::new(axis, lo, hi))
            }
        }
    }
}

/// How many chares (work units) the mesh is split into.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChareCount {
    /// Exactly this many chares.
    Fixed(usize),
    /// Degree of virtualization in `[0, 1]`: 0 gives about one chare per PE,
    /// 1 gives one chare per element.
    Virtualization(f64),
}

impl ChareCount {
    /// Resolve to a concrete chare count once the global element count is known.
    pub fn resolve(&self, total_elems: u64, npes: usize) -> Result<usize, MeshReorderError> {
        let nchare = match *self {
            ChareCount::Fixed(n) => n,
            ChareCount::Virtualization(v) => {
                if !(0.0..=1.0).contains(&v) {
                    return Err(MeshReorderError::InvalidConfig(format!(
                        "virtualization must lie in [0, 1], got {v}"
                    )));
                }
                let load = total_elems as f64;
                let chunk = ((1.0 - v) * load / npes as f64 + v).floor().max(1.0) as u64;
                (total_elems / chunk).max(1) as usize
            }
        };
        if nchare == 0 {
            return Err(MeshReorderError::InvalidConfig(
                "number of chares must be positive".into(),
            ));
        }
        if nchare < npes {
            return Err(MeshReorderError::InvalidConfig(format!(
                "{nchare} chares cannot be distributed over {npes} PEs; need at least one per PE"
            )));
        }
        Ok(nchare)
    }
}

/// Configuration of one partition + reorder pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Mesh file the chunk reader was opened on (informational).
    pub input_mesh: PathBuf,
    pub chares: ChareCount,
    pub algorithm: PartitioningAlgorithm,
    /// Send per-stage progress events to the host.
    pub feedback: bool,
    /// Reject inbound frames larger than this many bytes.
    #[serde(default)]
    pub wire_limit: Option<usize>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            input_mesh: PathBuf::new(),
            chares: ChareCount::Virtualization(0.0),
            algorithm: PartitioningAlgorithm::Block,
            feedback: false,
            wire_limit: None,
        }
    }
}

impl PartitionConfig {
    /// Shorthand for a fixed chare count with block partitioning.
    pub fn with_chares(nchare: usize) -> Self {
        Self {
            chares: ChareCount::Fixed(nchare),
            ..Default::default()
        }
    }

    /// Check values that do not depend on the mesh.
    pub fn validate(&self, npes: usize) -> Result<(), MeshReorderError> {
        if npes == 0 {
            return Err(MeshReorderError::InvalidConfig(
                "at least one PE is required".into(),
            ));
        }
        if let ChareCount::Fixed(n) = self.chares {
            if n < npes {
                return Err(MeshReorderError::InvalidConfig(format!(
                    "{n} chares cannot be distributed over {npes} PEs; need at least one per PE"
                )));
            }
        }
        if let PartitioningAlgorithm::Slab { lo, hi, .. } = self.algorithm {
            if !(lo < hi) {
                return Err(MeshReorderError::InvalidConfig(format!(
                    "slab extent [{lo}, {hi}] is empty"
                )));
            }
        }
        Ok(())
    }
}
