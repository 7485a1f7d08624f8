//! Distributed partition + reorder protocol.

pub mod bounds;
pub mod chare_distribution;
pub mod chare_nodes;
pub mod comm_map;
pub mod communicator;
pub mod local;
pub mod node_index;
pub mod partitioner;
pub mod quorum;
pub mod reorder;
pub mod wire;

pub use local::{run_local, run_local_with, run_pes};
pub use partitioner::{PeOutcome, Partitioner, Phase};
