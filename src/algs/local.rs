//! In-process runs: one thread per PE, recording collaborators.
//!
//! Used by the integration tests, the benches and the demo. Each PE's
//! communicator is handed back when its thread finishes and kept until every
//! thread has been joined, so a PE that fails early cannot make its peers'
//! sends fail.

use super::bounds::Bounds;
use super::communicator::{Communicator, LocalComm};
use super::partitioner::{PeOutcome, Partitioner, Strategy};
use crate::config::PartitionConfig;
use crate::host::{RecordingHost, RecordingMerger, RecordingWorkers};
use crate::mesh::MeshChunkReader;
use crate::mesh_error::MeshReorderError;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::thread;

/// Result and collaborator records of one PE.
#[derive(Debug)]
pub struct PeRun {
    pub outcome: Result<PeOutcome, MeshReorderError>,
    pub host: RecordingHost,
    pub workers: RecordingWorkers,
    pub merger: RecordingMerger,
}

/// Every PE of one in-process run, indexed by rank.
#[derive(Debug)]
pub struct LocalRun {
    pub pes: Vec<PeRun>,
}

impl LocalRun {
    pub fn is_ok(&self) -> bool {
        self.pes.iter().all(|p| p.outcome.is_ok())
    }

    /// Outcomes of all PEs, or the first error that did not come from a peer.
    pub fn outcomes(&self) -> Result<Vec<PeOutcome>, MeshReorderError> {
        if let Some(e) = self.root_cause() {
            return Err(e.clone());
        }
        self.pes.iter().map(|p| p.outcome.clone()).collect()
    }

    /// The first locally raised error, ignoring peers that only saw the abort.
    pub fn root_cause(&self) -> Option<&MeshReorderError> {
        self.pes
            .iter()
            .filter_map(|p| p.outcome.as_ref().err())
            .find(|e| !e.is_remote())
    }

    pub fn bounds(&self) -> Vec<Option<Bounds>> {
        self.pes
            .iter()
            .map(|p| p.outcome.as_ref().ok().map(|o| o.bounds))
            .collect()
    }

    /// True if every PE finished and the row ranges chain from 0 without
    /// gaps or overlaps.
    pub fn is_contiguous(&self) -> bool {
        let Some(bounds) = self.bounds().into_iter().collect::<Option<Vec<_>>>() else {
            return false;
        };
        bounds.first().is_none_or(|b| b.lower == 0)
            && bounds.iter().tuple_windows().all(|(a, b)| a.upper == b.lower)
    }

    /// Old → new id over all workers of all PEs; `None` if some old id
    /// was given two different new ids.
    pub fn new_ids(&self) -> Option<BTreeMap<u64, u64>> {
        let mut all = BTreeMap::new();
        for setup in self.pes.iter().flat_map(|p| &p.workers.created) {
            for (&old, &new) in &setup.old_to_new {
                if *all.entry(old).or_insert(new) != new {
                    return None;
                }
            }
        }
        Some(all)
    }
}

/// Run one PE per communicator, each on its own thread.
pub fn run_pes<C, R>(
    comms: Vec<C>,
    config: &PartitionConfig,
    reader: &R,
    strategy: Option<Strategy>,
) -> LocalRun
where
    C: Communicator + Send,
    R: MeshChunkReader + Sync + ?Sized,
{
    let finished: Vec<(PeRun, C)> = thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let config = config.clone();
                let strategy = strategy.clone();
                s.spawn(move || {
                    let mut p = Partitioner::new(
                        comm,
                        config,
                        RecordingHost::default(),
                        RecordingWorkers::default(),
                        RecordingMerger::default(),
                    );
                    if let Some(strategy) = strategy {
                        p = p.with_strategy(strategy);
                    }
                    let outcome = p.run(reader);
                    let (comm, host, workers, merger) = p.into_parts();
                    let run = PeRun {
                        outcome,
                        host,
                        workers,
                        merger,
                    };
                    (run, comm)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });
    LocalRun {
        pes: finished.into_iter().map(|(run, _)| run).collect(),
    }
}

/// Run `npes` PEs over a fresh [`LocalComm`] universe.
pub fn run_local<R>(npes: usize, config: &PartitionConfig, reader: &R) -> LocalRun
where
    R: MeshChunkReader + Sync + ?Sized,
{
    run_pes(LocalComm::universe(npes), config, reader, None)
}

/// [`run_local`] with a custom partitioning strategy.
pub fn run_local_with<R>(
    npes: usize,
    config: &PartitionConfig,
    reader: &R,
    strategy: Strategy,
) -> LocalRun
where
    R: MeshChunkReader + Sync + ?Sized,
{
    run_pes(LocalComm::universe(npes), config, reader, Some(strategy))
}
