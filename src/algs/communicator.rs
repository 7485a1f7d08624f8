//! Thin façade over intra-process (threads) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte frames* produced by [`wire`](crate::algs::wire).
//! Delivery is reliable and FIFO per (sender, receiver) pair; frames from
//! different senders interleave arbitrarily. `recv` blocks: the protocol has
//! no timeouts, so a hang means a protocol bug rather than a slow peer.

use crate::mesh_error::MeshReorderError;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Point-to-point messaging between PEs.
pub trait Communicator {
    /// Index of this PE.
    fn rank(&self) -> usize;
    /// Number of PEs.
    fn size(&self) -> usize;
    /// Queue `frame` for delivery to `peer` (which may be ourselves).
    fn send(&self, peer: usize, frame: Bytes) -> Result<(), MeshReorderError>;
    /// Block until a frame arrives; returns `(sender, frame)`.
    fn recv(&self) -> Result<(usize, Bytes), MeshReorderError>;
    /// Return a frame if one is already waiting.
    fn try_recv(&self) -> Result<Option<(usize, Bytes)>, MeshReorderError> {
        Ok(None)
    }
    /// Terminate the whole run after a fatal error on this PE.
    fn abort(&self, _reason: &str) {}
}

impl<C: Communicator + ?Sized> Communicator for &C {
    fn rank(&self) -> usize {
        (**self).rank()
    }
    fn size(&self) -> usize {
        (**self).size()
    }
    fn send(&self, peer: usize, frame: Bytes) -> Result<(), MeshReorderError> {
        (**self).send(peer, frame)
    }
    fn recv(&self) -> Result<(usize, Bytes), MeshReorderError> {
        (**self).recv()
    }
    fn try_recv(&self) -> Result<Option<(usize, Bytes)>, MeshReorderError> {
        (**self).try_recv()
    }
    fn abort(&self, reason: &str) {
        (**self).abort(reason)
    }
}

// --- LocalComm: intra-process / one thread per PE ---

#[derive(Debug)]
struct Envelope {
    from: usize,
    frame: Bytes,
}

/// In-process endpoint: one `mpsc` inbox per PE, senders shared by all.
#[derive(Debug)]
pub struct LocalComm {
    rank: usize,
    outboxes: Arc<Vec<Sender<Envelope>>>,
    inbox: Receiver<Envelope>,
}

impl LocalComm {
    /// Build the endpoints of an `n`-PE universe, indexed by rank.
    pub fn universe(n: usize) -> Vec<LocalComm> {
        let (txs, rxs): (Vec<_>, Vec<_>) = (0..n).map(|_| mpsc::channel()).unzip();
        let outboxes = Arc::new(txs);
        rxs.into_iter()
            .enumerate()
            .map(|(rank, inbox)| LocalComm {
                rank,
                outboxes: Arc::clone(&outboxes),
                inbox,
            })
            .collect()
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.outboxes.len()
    }

    fn send(&self, peer: usize, frame: Bytes) -> Result<(), MeshReorderError> {
        let tx = self.outboxes.get(peer).ok_or_else(|| MeshReorderError::CommError {
            neighbor: peer,
            reason: format!("no such PE in a universe of {}", self.outboxes.len()),
        })?;
        tx.send(Envelope {
            from: self.rank,
            frame,
        })
        .map_err(|_| MeshReorderError::CommError {
            neighbor: peer,
            reason: "peer inbox closed".into(),
        })
    }

    fn recv(&self) -> Result<(usize, Bytes), MeshReorderError> {
        self.inbox
            .recv()
            .map(|env| (env.from, env.frame))
            .map_err(|_| MeshReorderError::ChannelClosed { pe: self.rank })
    }

    fn try_recv(&self) -> Result<Option<(usize, Bytes)>, MeshReorderError> {
        match self.inbox.try_recv() {
            Ok(env) => Ok(Some((env.from, env.frame))),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(MeshReorderError::ChannelClosed { pe: self.rank })
            }
        }
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    const FRAME_TAG: mpi::Tag = 0x4d52;

    /// One MPI process per PE. Sends are buffered so that all-to-all
    /// broadcasts cannot deadlock on unmatched blocking sends.
    pub struct MpiComm {
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        /// Initialize MPI and attach a send buffer of `buffer_bytes`.
        pub fn new(buffer_bytes: usize) -> Result<Self, MeshReorderError> {
            let mut universe = mpi::initialize().ok_or_else(|| MeshReorderError::CommError {
                neighbor: 0,
                reason: "MPI was already initialized".into(),
            })?;
            universe.set_buffer_size(buffer_bytes);
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn send(&self, peer: usize, frame: Bytes) -> Result<(), MeshReorderError> {
            if peer >= self.size {
                return Err(MeshReorderError::CommError {
                    neighbor: peer,
                    reason: format!("no such rank in a world of {}", self.size),
                });
            }
            self.world
                .process_at_rank(peer as mpi::Rank)
                .buffered_send_with_tag(&frame[..], FRAME_TAG);
            Ok(())
        }

        fn recv(&self) -> Result<(usize, Bytes), MeshReorderError> {
            let (data, status) = self
                .world
                .any_process()
                .receive_vec_with_tag::<u8>(FRAME_TAG);
            Ok((status.source_rank() as usize, Bytes::from(data)))
        }

        fn abort(&self, reason: &str) {
            log::error!("[pe {}] aborting: {reason}", self.rank);
            self.world.abort(1)
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
