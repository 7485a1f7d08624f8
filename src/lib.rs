#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-reorder
//!
//! mesh-reorder partitions a tetrahedral mesh into work units ("chares")
//! across P processing elements (PEs) and computes a globally consistent,
//! contiguous renumbering of the mesh nodes, so that a downstream linear
//! system can be assembled over simple contiguous row ranges per PE.
//!
//! ## Features
//! - Asynchronous peer-to-peer protocol with no central coordinator
//! - Deterministic, bijective node renumbering regardless of message order
//! - Chare adjacency (`msum`) and per-PE row bounds for downstream workers
//! - Pluggable element partitioning strategies (block, cyclic, geometric slabs)
//! - In-process (threads) and MPI communication backends
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-reorder = "0.1"
//! # Optional features:
//! # features = ["mpi-support", "rayon"]
//! ```
//!
//! ```
//! use mesh_reorder::prelude::*;
//!
//! let mesh = box_mesh(2, 1, 1);
//! let run = run_local(2, &PartitionConfig::with_chares(4), &mesh);
//! let outcomes = run.outcomes().unwrap();
//! assert_eq!(outcomes[1].bounds.upper, 12);
//! ```
//!
//! ## Determinism
//!
//! A node shared by several PEs is numbered by the lowest of them, and each
//! PE numbers its own nodes in ascending old-id order, so the result depends
//! only on the mesh, the partition and the PE count.

pub mod algs;
pub mod config;
pub mod host;
pub mod mesh;
pub mod mesh_error;
pub mod partitioning;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::bounds::{Bounds, CostStatistics};
    pub use crate::algs::communicator::{Communicator, LocalComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::local::{LocalRun, run_local, run_local_with, run_pes};
    pub use crate::algs::partitioner::{PeOutcome, Partitioner, Phase, Strategy};
    pub use crate::config::{Axis, ChareCount, PartitionConfig, PartitioningAlgorithm};
    pub use crate::host::{ChareSetup, Host, LinearSystemMerger, Progress, WorkerFactory};
    pub use crate::mesh::{InMemoryMesh, MeshChunkReader, box_mesh};
    pub use crate::mesh_error::MeshReorderError;
    pub use crate::partitioning::{ElementPartitioner, ProvidedPartition};
}
