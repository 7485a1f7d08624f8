//! MeshReorderError: Unified error type for mesh-reorder public APIs
//!
//! Every failure in this crate is fatal for the run: there are no transient
//! or retriable conditions. Variants fall into three groups: configuration
//! errors (the requested decomposition does not fit the mesh), protocol
//! invariant violations (a message that cannot occur under correct
//! delivery), and substrate errors (encoding or transport).

use thiserror::Error;

/// Unified error type for mesh-reorder operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshReorderError {
    // --- configuration ---
    /// A chare owned by `pe` ended up with no mesh elements.
    #[error(
        "Overdecomposition: chare {chare} on PE {pe} has no mesh elements. \
         Decrease the virtualization or the number of PEs so that every work \
         unit receives at least one element"
    )]
    OverDecomposition { pe: usize, chare: usize },
    /// Configuration values are inconsistent with the run.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The element partitioner returned the wrong number of assignments.
    #[error("Partitioner returned {got} chare assignments for {expected} elements")]
    PartitionSizeMismatch { expected: usize, got: usize },
    /// The element partitioner returned a chare id outside `[0, nchare)`.
    #[error("Partitioner assigned nonexistent chare {chare} (nchare = {nchare})")]
    InvalidChareId { chare: usize, nchare: usize },
    /// An element references a node that is missing from the coordinate block.
    #[error("Mesh read error: {0}")]
    MeshRead(String),
    /// Failure reported by an element partitioner strategy.
    #[error("Partitioner error: {0}")]
    Partitioner(String),

    // --- protocol invariants ---
    /// Mask replies collected does not equal the number of PEs.
    #[error("PE {pe} resolved its communication map with {got} masks, expected {expected}")]
    MaskCountMismatch {
        pe: usize,
        expected: usize,
        got: usize,
    },
    /// A peer asked for a new id this PE does not assign.
    #[error("PE {pe} received a request from PE {from} for node {node} it does not own")]
    UnownedRequest { pe: usize, from: usize, node: u64 },
    /// A peer answered with an id this PE never requested.
    #[error("PE {pe} received an unrequested new id for node {node}")]
    UnexpectedNewId { pe: usize, node: u64 },
    /// A mask answered for a node this PE never asked about.
    #[error("PE {pe} received a mask from PE {from} naming node {node} it does not hold")]
    UnknownNode { pe: usize, from: usize, node: u64 },
    /// Reordering finished without a new id for a node this PE holds.
    #[error("PE {pe} has no new id for node {node} after reordering")]
    IncompleteReorder { pe: usize, node: u64 },
    /// Node ids were shipped for a chare the receiving PE does not own.
    #[error("PE {pe} received nodes of chare {chare} it does not own")]
    ForeignChare { pe: usize, chare: usize },
    /// A message arrived in a phase that can never accept it.
    #[error("PE {pe} received unexpected `{kind}` message in phase {phase}")]
    UnexpectedMessage {
        pe: usize,
        kind: &'static str,
        phase: &'static str,
    },
    /// The same peer contributed twice to a quorum.
    #[error("PE {pe} received a duplicate `{kind}` contribution from PE {from}")]
    DuplicateContribution {
        pe: usize,
        from: usize,
        kind: &'static str,
    },

    // --- substrate ---
    /// Encoding or decoding a wire frame failed.
    #[error("Wire error: {0}")]
    Wire(String),
    /// Point-to-point communication with a neighbor failed.
    #[error("Communication error with PE {neighbor}: {reason}")]
    CommError { neighbor: usize, reason: String },
    /// The inbound channel of `pe` has no remaining senders.
    #[error("Inbox of PE {pe} closed before the protocol completed")]
    ChannelClosed { pe: usize },
    /// Another PE failed and broadcast an abort.
    #[error("PE {pe} aborted the run: {reason}")]
    PeerAborted { pe: usize, reason: String },
}

impl MeshReorderError {
    /// True for errors that originate on another PE.
    pub fn is_remote(&self) -> bool {
        matches!(self, MeshReorderError::PeerAborted { .. })
    }
}

impl From<bincode::Error> for MeshReorderError {
    fn from(e: bincode::Error) -> Self {
        MeshReorderError::Wire(e.to_string())
    }
}
