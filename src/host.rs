//! Collaborators driven by the partitioner once a PE has its results.
//!
//! The host orchestrates setup and receives progress reports, the worker
//! factory instantiates one worker per owned chare, and the linear-system
//! merger learns the row range each PE assembles. All three are injected
//! into [`Partitioner`](crate::algs::partitioner::Partitioner) so tests and
//! drivers can observe or replace them.

use crate::algs::bounds::CostStatistics;
use std::collections::{BTreeMap, BTreeSet};

/// Stages reported to the host when feedback is enabled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Progress {
    GraphRead,
    Partitioned,
    Distributed,
    Flattened,
    Masked,
    Reordered,
    Bounds,
}

/// Everything a worker needs about the chare it operates on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChareSetup {
    pub chare: usize,
    pub pe: usize,
    pub nchare: usize,
    /// Element connectivity in new node ids, 4 per tetrahedron.
    pub nodes: Vec<u64>,
    pub old_to_new: BTreeMap<u64, u64>,
    /// Surrounding chare → shared nodes (new ids).
    pub msum: BTreeMap<usize, BTreeSet<u64>>,
}

pub trait Host {
    fn progress(&mut self, _pe: usize, _stage: Progress) {}
    fn graph_loaded(&mut self, _pe: usize, _total_elems: u64) {}
    /// Workers of `pe` have been created.
    fn setup_complete(&mut self, _pe: usize) {}
    fn cost_statistics(&mut self, _pe: usize, _stats: CostStatistics) {}
    fn finished(&mut self, _pe: usize) {}
}

pub trait WorkerFactory {
    fn create_worker(&mut self, setup: ChareSetup);
    fn done_inserting(&mut self, _pe: usize) {}
}

pub trait LinearSystemMerger {
    fn bounds(&mut self, pe: usize, lower: u64, upper: u64);
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NullHost;

impl Host for NullHost {}

#[derive(Copy, Clone, Debug, Default)]
pub struct NullWorkers;

impl WorkerFactory for NullWorkers {
    fn create_worker(&mut self, _setup: ChareSetup) {}
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NullMerger;

impl LinearSystemMerger for NullMerger {
    fn bounds(&mut self, _pe: usize, _lower: u64, _upper: u64) {}
}

/// Host that remembers every call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingHost {
    pub stages: Vec<Progress>,
    pub total_elems: Option<u64>,
    pub setup_complete: bool,
    pub stats: Option<CostStatistics>,
    pub finished: bool,
}

impl Host for RecordingHost {
    fn progress(&mut self, _pe: usize, stage: Progress) {
        self.stages.push(stage);
    }
    fn graph_loaded(&mut self, _pe: usize, total_elems: u64) {
        self.total_elems = Some(total_elems);
    }
    fn setup_complete(&mut self, _pe: usize) {
        self.setup_complete = true;
    }
    fn cost_statistics(&mut self, _pe: usize, stats: CostStatistics) {
        self.stats = Some(stats);
    }
    fn finished(&mut self, _pe: usize) {
        self.finished = true;
    }
}

/// Worker factory that keeps the setup of every chare.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingWorkers {
    pub created: Vec<ChareSetup>,
    pub done: bool,
}

impl WorkerFactory for RecordingWorkers {
    fn create_worker(&mut self, setup: ChareSetup) {
        self.created.push(setup);
    }
    fn done_inserting(&mut self, _pe: usize) {
        self.done = true;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingMerger {
    pub bounds: Option<(usize, u64, u64)>,
}

impl LinearSystemMerger for RecordingMerger {
    fn bounds(&mut self, pe: usize, lower: u64, upper: u64) {
        self.bounds = Some((pe, lower, upper));
    }
}
