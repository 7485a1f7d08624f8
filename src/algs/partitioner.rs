//! The per-PE actor running one partition + reorder pass.
//!
//! A [`Partitioner`] owns all state of its PE and advances through
//! [`Phase`]s as messages from its peers arrive:
//!
//! 1. **Setup**: read this PE's chunk of the mesh and announce its size.
//! 2. **Distributing**: once every size is known, partition the chunk into
//!    chares and ship node lists to the PEs owning them.
//! 3. **Indexed**: once every PE has shipped everything, index the held
//!    nodes and ask every PE which of them it holds.
//! 4. **Reordering**: resolve the answers into a communication map, agree
//!    on offsets, number own nodes and fetch the rest.
//! 5. **Bounds**: wait for the lower bound from the previous PE, then hand
//!    chares to the worker factory and the bounds to the merger.
//! 6. **Costing**: reduce the communication cost over all PEs.
//!
//! Handlers run one at a time. A message that arrives before its handler's
//! state exists is parked and replayed after the next phase change.

use super::bounds::{self, Bounds, CostReduction, CostStatistics};
use super::chare_distribution::ChareDistribution;
use super::chare_nodes::{self, ChareNodeDistributor, ChareNodes};
use super::comm_map::{CommunicationMapBuilder, Msum};
use super::communicator::Communicator;
use super::node_index::GlobalNodeIndex;
use super::quorum::Quorum;
use super::reorder::{self, DistributedReorderer, OffsetTally, Renumbering};
use super::wire::{self, PeMessage};
use crate::config::PartitionConfig;
use crate::host::{
    ChareSetup, Host, LinearSystemMerger, NullHost, NullMerger, NullWorkers, Progress,
    WorkerFactory,
};
use crate::mesh::{self, MeshChunk, MeshChunkReader};
use crate::mesh_error::MeshReorderError;
use crate::partitioning::{self, ElementPartitioner};
use std::collections::VecDeque;
use std::sync::Arc;

/// A shareable element partitioning strategy.
pub type Strategy = Arc<dyn ElementPartitioner + Send + Sync>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Setup,
    Distributing,
    Indexed,
    Reordering,
    Bounds,
    Costing,
    Done,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Distributing => "distributing",
            Phase::Indexed => "indexed",
            Phase::Reordering => "reordering",
            Phase::Bounds => "bounds",
            Phase::Costing => "costing",
            Phase::Done => "done",
        }
    }
}

/// What one PE ends up with.
#[derive(Clone, Debug, PartialEq)]
pub struct PeOutcome {
    pub pe: usize,
    pub nchare: usize,
    /// First new id this PE assigned.
    pub start: u64,
    /// Number of new ids this PE assigned.
    pub unique: u64,
    /// Number of nodes in the whole mesh.
    pub total_nodes: u64,
    pub bounds: Bounds,
    pub cost: f64,
    pub stats: CostStatistics,
}

fn out_of_order(pe: usize, phase: Phase, kind: &'static str) -> MeshReorderError {
    MeshReorderError::UnexpectedMessage {
        pe,
        kind,
        phase: phase.name(),
    }
}

pub struct Partitioner<C, H = NullHost, W = NullWorkers, L = NullMerger> {
    comm: C,
    pe: usize,
    npes: usize,
    config: PartitionConfig,
    host: H,
    workers: W,
    merger: L,
    strategy: Option<Strategy>,
    phase: Phase,
    started: bool,
    backlog: VecDeque<PeMessage>,

    chunk: Option<MeshChunk>,
    centroids: [Vec<f64>; 3],
    loads: Quorum<u64>,
    dist: Option<ChareDistribution>,
    distributor: Option<ChareNodeDistributor>,
    announced: bool,
    distributed: Quorum<()>,
    nodes: ChareNodes,
    index: Option<GlobalNodeIndex>,
    queries: Quorum<()>,
    masks: Option<CommunicationMapBuilder>,
    msum: Msum,
    unique: u64,
    offsets: OffsetTally,
    start: u64,
    reorderer: Option<DistributedReorderer>,
    renumbering: Option<Renumbering>,
    lower: Option<u64>,
    upper: Option<u64>,
    cost: Option<f64>,
    costs: CostReduction,
    variance_sent: bool,
    stats: Option<CostStatistics>,
}

impl<C: Communicator> Partitioner<C> {
    /// A partitioner whose collaborators ignore everything.
    pub fn headless(comm: C, config: PartitionConfig) -> Self {
        Self::new(comm, config, NullHost, NullWorkers, NullMerger)
    }
}

impl<C, H, W, L> Partitioner<C, H, W, L>
where
    C: Communicator,
    H: Host,
    W: WorkerFactory,
    L: LinearSystemMerger,
{
    pub fn new(comm: C, config: PartitionConfig, host: H, workers: W, merger: L) -> Self {
        let pe = comm.rank();
        let npes = comm.size();
        Self {
            comm,
            pe,
            npes,
            config,
            host,
            workers,
            merger,
            strategy: None,
            phase: Phase::Setup,
            started: false,
            backlog: VecDeque::new(),
            chunk: None,
            centroids: Default::default(),
            loads: Quorum::new("load", npes),
            dist: None,
            distributor: None,
            announced: false,
            distributed: Quorum::new("distributed", npes),
            nodes: ChareNodes::new(),
            index: None,
            queries: Quorum::new("query", npes),
            masks: None,
            msum: Msum::new(),
            unique: 0,
            offsets: OffsetTally::new(pe, npes),
            start: 0,
            reorderer: None,
            renumbering: None,
            lower: None,
            upper: None,
            cost: None,
            costs: CostReduction::new(pe, npes),
            variance_sent: false,
            stats: None,
        }
    }

    /// Partition with `strategy` instead of the one named in the configuration.
    ///
    /// Centroids are still computed only if the configured algorithm is geometric.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn pe(&self) -> usize {
        self.pe
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Give back the communicator and collaborators.
    pub fn into_parts(self) -> (C, H, W, L) {
        (self.comm, self.host, self.workers, self.merger)
    }

    /// Run the whole pass on this PE. On a local failure every peer is told
    /// to abort before the error is returned.
    pub fn run<R>(&mut self, reader: &R) -> Result<PeOutcome, MeshReorderError>
    where
        R: MeshChunkReader + ?Sized,
    {
        let result = self.drive(reader);
        if let Err(e) = &result {
            if !e.is_remote() {
                self.abort_all(e);
            }
        }
        result
    }

    fn drive<R>(&mut self, reader: &R) -> Result<PeOutcome, MeshReorderError>
    where
        R: MeshChunkReader + ?Sized,
    {
        if self.started {
            return Err(MeshReorderError::InvalidConfig(format!(
                "partitioner on PE {} already ran",
                self.pe
            )));
        }
        self.started = true;
        self.setup(reader)?;
        while self.phase != Phase::Done {
            let (from, frame) = self.comm.recv()?;
            let msg = wire::decode(&frame, self.config.wire_limit)?;
            if msg.sender() != from {
                return Err(MeshReorderError::Wire(format!(
                    "`{}` from PE {from} claims to come from PE {}",
                    msg.name(),
                    msg.sender()
                )));
            }
            self.step(msg)?;
        }
        self.outcome()
    }

    fn abort_all(&self, e: &MeshReorderError) {
        log::error!("[pe {}] {e}", self.pe);
        let abort = PeMessage::Abort {
            pe: self.pe,
            reason: e.to_string(),
        };
        match wire::encode(&abort) {
            Ok(frame) => {
                for peer in (0..self.npes).filter(|&p| p != self.pe) {
                    if let Err(err) = self.comm.send(peer, frame.clone()) {
                        log::warn!("[pe {}] could not notify PE {peer}: {err}", self.pe);
                    }
                }
            }
            Err(err) => log::warn!("[pe {}] could not encode abort: {err}", self.pe),
        }
        self.comm.abort(&e.to_string());
    }

    fn send(&self, peer: usize, msg: &PeMessage) -> Result<(), MeshReorderError> {
        self.comm.send(peer, wire::encode(msg)?)
    }

    fn broadcast(&self, msg: &PeMessage) -> Result<(), MeshReorderError> {
        let frame = wire::encode(msg)?;
        for peer in 0..self.npes {
            self.comm.send(peer, frame.clone())?;
        }
        Ok(())
    }

    fn feedback(&mut self, stage: Progress) {
        log::debug!("[pe {}] {stage:?}", self.pe);
        if self.config.feedback {
            self.host.progress(self.pe, stage);
        }
    }

    // --- message handling ---

    fn step(&mut self, msg: PeMessage) -> Result<(), MeshReorderError> {
        self.dispatch(msg)?;
        loop {
            let before = self.phase;
            self.advance()?;
            if self.phase == before {
                return Ok(());
            }
            log::trace!("[pe {}] {} -> {}", self.pe, before.name(), self.phase.name());
            for msg in std::mem::take(&mut self.backlog) {
                self.dispatch(msg)?;
            }
        }
    }

    fn dispatch(&mut self, msg: PeMessage) -> Result<(), MeshReorderError> {
        let (pe, phase) = (self.pe, self.phase);
        let (ready, deferrable) = match &msg {
            PeMessage::Add { .. } => (self.distributor.is_some(), phase == Phase::Setup),
            PeMessage::Query { .. } => (self.index.is_some(), phase < Phase::Indexed),
            PeMessage::Mask { .. } => (self.masks.is_some(), phase < Phase::Indexed),
            PeMessage::Request { .. } | PeMessage::NewOrder { .. } => {
                (self.reorderer.is_some(), phase < Phase::Reordering)
            }
            _ => (true, false),
        };
        if !ready {
            if deferrable {
                self.backlog.push_back(msg);
                return Ok(());
            }
            return Err(out_of_order(pe, phase, msg.name()));
        }

        match msg {
            PeMessage::Load { pe: from, nelem } => {
                self.loads.insert(pe, from, nelem)?;
            }
            PeMessage::Add { from, chares } => {
                let d = self
                    .distributor
                    .as_mut()
                    .ok_or(out_of_order(pe, phase, "add"))?;
                d.receive(from, chares)?;
                self.send(from, &PeMessage::Ack { from: pe })?;
            }
            PeMessage::Ack { from } => {
                let d = self
                    .distributor
                    .as_mut()
                    .ok_or(out_of_order(pe, phase, "ack"))?;
                d.acknowledge(from)?;
            }
            PeMessage::Distributed { pe: from } => {
                self.distributed.insert(pe, from, ())?;
            }
            PeMessage::Query { pe: from, nodes } => {
                let index = self.index.as_ref().ok_or(out_of_order(pe, phase, "query"))?;
                let mask = index.answer(&nodes);
                self.queries.insert(pe, from, ())?;
                self.send(from, &PeMessage::Mask { pe, nodes: mask })?;
            }
            PeMessage::Mask { pe: from, nodes } => {
                let b = self.masks.as_mut().ok_or(out_of_order(pe, phase, "mask"))?;
                b.add_mask(from, nodes)?;
            }
            PeMessage::Offset { pe: from, count } => {
                self.offsets.add(from, count)?;
            }
            PeMessage::Request { pe: from, nodes } => {
                let r = self
                    .reorderer
                    .as_mut()
                    .ok_or(out_of_order(pe, phase, "request"))?;
                if let Some(ids) = r.request(from, nodes)? {
                    self.send(from, &PeMessage::NewOrder { pe, ids })?;
                }
            }
            PeMessage::NewOrder { pe: from, ids } => {
                let r = self
                    .reorderer
                    .as_mut()
                    .ok_or(out_of_order(pe, phase, "neworder"))?;
                r.receive(from, ids)?;
            }
            PeMessage::Lower { pe: from, lower } => {
                if from + 1 != pe {
                    return Err(out_of_order(pe, phase, "lower"));
                }
                if self.lower.replace(lower).is_some() {
                    return Err(MeshReorderError::DuplicateContribution {
                        pe,
                        from,
                        kind: "lower",
                    });
                }
            }
            PeMessage::Cost { pe: from, cost } => {
                self.costs.add_cost(from, cost)?;
            }
            PeMessage::CostVariance { pe: from, var } => {
                self.costs.add_variance(from, var)?;
            }
            PeMessage::Abort { pe: from, reason } => {
                return Err(MeshReorderError::PeerAborted { pe: from, reason });
            }
        }
        Ok(())
    }

    /// Fire whatever the current state allows; moves at most one phase ahead.
    fn advance(&mut self) -> Result<(), MeshReorderError> {
        match self.phase {
            Phase::Setup => {
                if self.loads.is_complete() {
                    self.partition()?;
                    self.phase = Phase::Distributing;
                }
            }
            Phase::Distributing => {
                if !self.announced && self.distributor.as_ref().is_some_and(|d| d.is_acked()) {
                    self.announced = true;
                    self.broadcast(&PeMessage::Distributed { pe: self.pe })?;
                }
                if self.announced && self.distributed.is_complete() {
                    self.flatten()?;
                    self.phase = Phase::Indexed;
                }
            }
            Phase::Indexed => {
                if self.masks.as_ref().is_some_and(|m| m.is_complete()) {
                    self.resolve()?;
                    self.phase = Phase::Reordering;
                }
            }
            Phase::Reordering => {
                self.assign()?;
                if self.reorderer.as_ref().is_some_and(|r| r.is_complete()) {
                    self.finish_reorder()?;
                    self.phase = Phase::Bounds;
                }
            }
            Phase::Bounds => {
                if self.lower.is_some() {
                    self.hand_off()?;
                    self.phase = Phase::Costing;
                }
            }
            Phase::Costing => {
                if self.reduce_cost()? {
                    self.phase = Phase::Done;
                }
            }
            Phase::Done => {}
        }
        // every peer has its mask
        if self.index.is_some() && self.phase > Phase::Indexed && self.queries.is_complete() {
            self.index = None;
        }
        Ok(())
    }

    // --- phase work ---

    fn setup<R>(&mut self, reader: &R) -> Result<(), MeshReorderError>
    where
        R: MeshChunkReader + ?Sized,
    {
        self.config.validate(self.npes)?;
        let chunk = mesh::read_chunk(reader, self.pe, self.npes)?;
        if self.config.algorithm.is_geometric() {
            if let Some(extent) = mesh::extents(&chunk.inpoel) {
                let coords = reader.read_node_coordinates(extent)?;
                self.centroids = mesh::centroids(&chunk, &coords)?;
            }
        }
        log::debug!("[pe {}] read {} elements", self.pe, chunk.nelem());
        self.feedback(Progress::GraphRead);
        self.broadcast(&PeMessage::Load {
            pe: self.pe,
            nelem: chunk.nelem() as u64,
        })?;
        self.chunk = Some(chunk);
        Ok(())
    }

    fn partition(&mut self) -> Result<(), MeshReorderError> {
        let total: u64 = self.loads.iter().map(|(_, &n)| n).sum();
        let nchare = self.config.chares.resolve(total, self.npes)?;
        let dist = ChareDistribution::new(nchare, self.npes)?;
        self.host.graph_loaded(self.pe, total);

        let chunk = self.chunk.take().unwrap_or_default();
        let strategy: Strategy = match &self.strategy {
            Some(s) => Arc::clone(s),
            None => Arc::from(self.config.algorithm.build(total)),
        };
        let centroids = std::mem::take(&mut self.centroids);
        let che = strategy.partition(&centroids, &chunk.gelemid, chunk.nelem(), nchare)?;
        partitioning::check_assignment(&che, chunk.nelem(), nchare)?;
        log::debug!(
            "[pe {}] partitioned {} of {total} elements into {nchare} chares",
            self.pe,
            chunk.nelem()
        );
        self.feedback(Progress::Partitioned);

        let mut distributor = ChareNodeDistributor::new(self.pe, dist);
        let outgoing = distributor.export(chare_nodes::chare_nodes(&che, &chunk.inpoel));
        for (dest, chares) in outgoing {
            self.send(dest, &PeMessage::Add { from: self.pe, chares })?;
        }
        self.distributor = Some(distributor);
        self.dist = Some(dist);
        Ok(())
    }

    fn flatten(&mut self) -> Result<(), MeshReorderError> {
        let (pe, phase) = (self.pe, self.phase);
        let distributor = self
            .distributor
            .take()
            .ok_or(out_of_order(pe, phase, "distributed"))?;
        let dist = self.dist.ok_or(out_of_order(pe, phase, "distributed"))?;
        self.feedback(Progress::Distributed);

        let nodes = distributor.finish();
        let index = GlobalNodeIndex::build(pe, &dist, &nodes)?;
        log::debug!(
            "[pe {pe}] holds {} nodes in {} chares",
            index.owned_nodes().len(),
            nodes.len()
        );
        self.feedback(Progress::Flattened);

        let query = index.owned_nodes().iter().copied().collect();
        self.nodes = nodes;
        self.index = Some(index);
        self.masks = Some(CommunicationMapBuilder::new(pe, self.npes));
        self.broadcast(&PeMessage::Query { pe, nodes: query })
    }

    fn resolve(&mut self) -> Result<(), MeshReorderError> {
        let (pe, phase) = (self.pe, self.phase);
        let builder = self.masks.take().ok_or(out_of_order(pe, phase, "mask"))?;
        let index = self.index.as_ref().ok_or(out_of_order(pe, phase, "mask"))?;
        let resolved = builder.resolve(index)?;
        log::debug!(
            "[pe {pe}] numbers {} nodes, receives {} from {} lower PEs",
            resolved.unique_count,
            resolved.communication.received(),
            resolved.communication.peers.len()
        );
        self.reorderer = Some(DistributedReorderer::new(
            pe,
            index.owned_nodes(),
            resolved.communication,
        ));
        self.msum = resolved.msum;
        self.unique = resolved.unique_count;
        self.feedback(Progress::Masked);
        self.broadcast(&PeMessage::Offset {
            pe,
            count: self.unique,
        })
    }

    /// Number own nodes once the offsets are in, then serve and send requests.
    fn assign(&mut self) -> Result<(), MeshReorderError> {
        let (pe, phase) = (self.pe, self.phase);
        let Some(start) = self.offsets.start() else {
            return Ok(());
        };
        let Some(r) = self.reorderer.as_mut() else {
            return Err(out_of_order(pe, phase, "offset"));
        };
        if r.is_assigned() {
            return Ok(());
        }
        let answers = r.assign_own(start)?;
        let requests = r.requests();
        self.start = start;
        for (peer, ids) in answers {
            self.send(peer, &PeMessage::NewOrder { pe, ids })?;
        }
        for (peer, nodes) in requests {
            self.send(peer, &PeMessage::Request { pe, nodes })?;
        }
        Ok(())
    }

    fn finish_reorder(&mut self) -> Result<(), MeshReorderError> {
        let (pe, phase) = (self.pe, self.phase);
        let r = self
            .reorderer
            .as_ref()
            .ok_or(out_of_order(pe, phase, "neworder"))?;
        let renumbering = reorder::renumber(pe, &self.nodes, &self.msum, r.new_ids())?;
        self.nodes = ChareNodes::new();
        self.msum = Msum::new();

        let last = pe + 1 == self.npes;
        let upper = bounds::upper_bound(&renumbering.touched, self.start, last);
        log::debug!(
            "[pe {pe}] reordered {} nodes, upper bound {upper}",
            renumbering.touched.len()
        );
        self.upper = Some(upper);
        self.renumbering = Some(renumbering);
        self.feedback(Progress::Reordered);

        if pe == 0 {
            self.lower = Some(0);
        }
        if pe + 1 < self.npes {
            self.send(pe + 1, &PeMessage::Lower { pe, lower: upper })?;
        }
        Ok(())
    }

    fn hand_off(&mut self) -> Result<(), MeshReorderError> {
        let (pe, phase) = (self.pe, self.phase);
        let missing = || out_of_order(pe, phase, "lower");
        let lower = self.lower.ok_or_else(missing)?;
        let upper = self.upper.ok_or_else(missing)?;
        let dist = self.dist.ok_or_else(missing)?;
        let renumbering = self.renumbering.take().ok_or_else(missing)?;
        let bounds = Bounds { lower, upper };
        let cost = bounds::cost(&renumbering.touched, bounds);
        self.feedback(Progress::Bounds);

        let Renumbering {
            nodes,
            mut old_to_new,
            mut msum,
            ..
        } = renumbering;
        for (chare, list) in nodes {
            self.workers.create_worker(ChareSetup {
                chare,
                pe,
                nchare: dist.nchare(),
                nodes: list,
                old_to_new: old_to_new.remove(&chare).unwrap_or_default(),
                msum: msum.remove(&chare).unwrap_or_default(),
            });
        }
        self.workers.done_inserting(pe);
        self.merger.bounds(pe, lower, upper);
        self.host.setup_complete(pe);

        self.cost = Some(cost);
        self.broadcast(&PeMessage::Cost { pe, cost })
    }

    /// Returns `true` once the cost statistics are final.
    fn reduce_cost(&mut self) -> Result<bool, MeshReorderError> {
        let pe = self.pe;
        if !self.variance_sent {
            if let (Some(mean), Some(cost)) = (self.costs.mean(), self.cost) {
                self.variance_sent = true;
                let var = (cost - mean) * (cost - mean);
                self.broadcast(&PeMessage::CostVariance { pe, var })?;
            }
        }
        let Some(stats) = self.costs.statistics() else {
            return Ok(false);
        };
        self.stats = Some(stats);
        self.reorderer = None;
        self.host.cost_statistics(pe, stats);
        self.host.finished(pe);
        log::info!(
            "[pe {pe}] rows [{}, {}), cost {:.3} (mean {:.3}, stddev {:.3})",
            self.lower.unwrap_or_default(),
            self.upper.unwrap_or_default(),
            self.cost.unwrap_or_default(),
            stats.mean,
            stats.stddev
        );
        Ok(true)
    }

    fn outcome(&self) -> Result<PeOutcome, MeshReorderError> {
        let (pe, phase) = (self.pe, self.phase);
        let missing = || out_of_order(pe, phase, "costvariance");
        Ok(PeOutcome {
            pe,
            nchare: self.dist.ok_or_else(missing)?.nchare(),
            start: self.start,
            unique: self.unique,
            total_nodes: self.offsets.total().ok_or_else(missing)?,
            bounds: Bounds {
                lower: self.lower.ok_or_else(missing)?,
                upper: self.upper.ok_or_else(missing)?,
            },
            cost: self.cost.ok_or_else(missing)?,
            stats: self.stats.ok_or_else(missing)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::LocalComm;
    use crate::host::{RecordingHost, RecordingMerger, RecordingWorkers};
    use crate::mesh::InMemoryMesh;
    use std::collections::BTreeSet;

    fn two_tets() -> InMemoryMesh {
        InMemoryMesh::new(
            vec![0, 1, 2, 3, 1, 2, 3, 4],
            [
                vec![0.0, 1.0, 0.0, 0.0, 1.0],
                vec![0.0, 0.0, 1.0, 0.0, 1.0],
                vec![0.0, 0.0, 0.0, 1.0, 1.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn single_pe_owns_everything() {
        let comm = LocalComm::universe(1).pop().unwrap();
        let config = PartitionConfig {
            feedback: true,
            ..PartitionConfig::with_chares(2)
        };
        let mut p = Partitioner::new(
            comm,
            config,
            RecordingHost::default(),
            RecordingWorkers::default(),
            RecordingMerger::default(),
        );
        let out = p.run(&two_tets()).unwrap();
        assert_eq!(p.phase(), Phase::Done);
        assert_eq!(out.bounds, Bounds { lower: 0, upper: 5 });
        assert_eq!(out.total_nodes, 5);
        assert_eq!(out.unique, 5);
        assert_eq!(out.cost, 0.0);

        let (_, host, workers, merger) = p.into_parts();
        assert_eq!(merger.bounds, Some((0, 0, 5)));
        assert_eq!(workers.created.len(), 2);
        assert!(workers.done);
        assert!(host.finished);
        assert_eq!(host.total_elems, Some(2));
        assert_eq!(host.stages.first(), Some(&Progress::GraphRead));
        assert_eq!(host.stages.last(), Some(&Progress::Bounds));
        // chare 0 = element 0, chare 1 = element 1; shared face 1, 2, 3
        let w0 = &workers.created[0];
        assert_eq!(w0.nodes, vec![0, 1, 2, 3]);
        assert_eq!(w0.msum[&1], BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn running_twice_is_rejected() {
        let comm = LocalComm::universe(1).pop().unwrap();
        let mut p = Partitioner::headless(comm, PartitionConfig::with_chares(1));
        p.run(&two_tets()).unwrap();
        assert!(matches!(
            p.run(&two_tets()),
            Err(MeshReorderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn too_few_chares_fails_before_any_exchange() {
        let mut comms = LocalComm::universe(2);
        let comm = comms.remove(0);
        let mut p = Partitioner::headless(comm, PartitionConfig::with_chares(1));
        assert!(matches!(
            p.run(&two_tets()),
            Err(MeshReorderError::InvalidConfig(_))
        ));
        // the peer was told
        let (from, frame) = comms[0].try_recv().unwrap().unwrap();
        assert_eq!(from, 0);
        assert!(matches!(
            wire::decode(&frame, None).unwrap(),
            PeMessage::Abort { pe: 0, .. }
        ));
    }
}
