//! Distributed assignment of contiguous new node ids.
//!
//! Each PE numbers the nodes it owns, in ascending old-id order, starting at
//! the prefix sum of the counts of all lower PEs. Nodes numbered by a lower
//! PE are requested from it; a request that arrives before the answering PE
//! has numbered its own nodes is queued and served right after.

use super::chare_nodes::ChareNodes;
use super::comm_map::{CommunicationMap, Msum};
use super::quorum::Quorum;
use crate::mesh_error::MeshReorderError;
use std::collections::{BTreeMap, BTreeSet};

/// Prefix sum of the per-PE unique counts.
#[derive(Debug)]
pub struct OffsetTally {
    pe: usize,
    counts: Quorum<u64>,
}

impl OffsetTally {
    pub fn new(pe: usize, npes: usize) -> Self {
        Self {
            pe,
            counts: Quorum::new("offset", npes),
        }
    }

    pub fn add(&mut self, from: usize, count: u64) -> Result<bool, MeshReorderError> {
        self.counts.insert(self.pe, from, count)
    }

    pub fn is_complete(&self) -> bool {
        self.counts.is_complete()
    }

    /// First new id of this PE; `None` until every count has arrived.
    pub fn start(&self) -> Option<u64> {
        self.is_complete().then(|| {
            self.counts
                .iter()
                .take_while(|&(p, _)| p < self.pe)
                .map(|(_, &c)| c)
                .sum()
        })
    }

    /// Total number of nodes in the mesh; `None` until every count has arrived.
    pub fn total(&self) -> Option<u64> {
        self.is_complete()
            .then(|| self.counts.iter().map(|(_, &c)| c).sum())
    }
}

/// Reordering state of one PE.
#[derive(Debug)]
pub struct DistributedReorderer {
    pe: usize,
    held: usize,
    /// Nodes this PE numbers itself.
    own: BTreeSet<u64>,
    communication: CommunicationMap,
    newid: BTreeMap<u64, u64>,
    assigned: bool,
    queued: Vec<(usize, Vec<u64>)>,
}

impl DistributedReorderer {
    pub fn new(pe: usize, held: &BTreeSet<u64>, communication: CommunicationMap) -> Self {
        let own = held
            .iter()
            .copied()
            .filter(|&n| communication.owner_of(n).is_none())
            .collect();
        Self {
            pe,
            held: held.len(),
            own,
            communication,
            newid: BTreeMap::new(),
            assigned: false,
            queued: Vec::new(),
        }
    }

    /// One request per lower peer that numbers some of our nodes.
    pub fn requests(&self) -> Vec<(usize, Vec<u64>)> {
        self.communication
            .peers
            .iter()
            .map(|(&p, nodes)| (p, nodes.iter().copied().collect()))
            .collect()
    }

    /// Number our own nodes from `start` and answer any queued requests.
    pub fn assign_own(
        &mut self,
        start: u64,
    ) -> Result<Vec<(usize, BTreeMap<u64, u64>)>, MeshReorderError> {
        for (id, &n) in (start..).zip(self.own.iter()) {
            self.newid.insert(n, id);
        }
        self.assigned = true;
        log::debug!(
            "[pe {}] numbered {} nodes from {start}",
            self.pe,
            self.own.len()
        );
        std::mem::take(&mut self.queued)
            .into_iter()
            .map(|(from, nodes)| Ok((from, self.lookup(from, &nodes)?)))
            .collect()
    }

    /// Serve a request from PE `from`; `None` if it has to wait for
    /// [`assign_own`](Self::assign_own).
    pub fn request(
        &mut self,
        from: usize,
        nodes: Vec<u64>,
    ) -> Result<Option<BTreeMap<u64, u64>>, MeshReorderError> {
        if let Some(&node) = nodes.iter().find(|n| !self.own.contains(n)) {
            return Err(MeshReorderError::UnownedRequest {
                pe: self.pe,
                from,
                node,
            });
        }
        if !self.assigned {
            self.queued.push((from, nodes));
            return Ok(None);
        }
        self.lookup(from, &nodes).map(Some)
    }

    fn lookup(&self, from: usize, nodes: &[u64]) -> Result<BTreeMap<u64, u64>, MeshReorderError> {
        nodes
            .iter()
            .map(|&n| {
                self.newid
                    .get(&n)
                    .map(|&id| (n, id))
                    .ok_or(MeshReorderError::UnownedRequest {
                        pe: self.pe,
                        from,
                        node: n,
                    })
            })
            .collect()
    }

    /// Store ids numbered by PE `from`. Returns `true` once every held node has a new id.
    pub fn receive(
        &mut self,
        from: usize,
        ids: BTreeMap<u64, u64>,
    ) -> Result<bool, MeshReorderError> {
        for (old, new) in ids {
            if self.communication.owner_of(old) != Some(from) {
                return Err(MeshReorderError::UnexpectedNewId { pe: self.pe, node: old });
            }
            match self.newid.insert(old, new) {
                Some(prev) if prev != new => {
                    return Err(MeshReorderError::UnexpectedNewId { pe: self.pe, node: old });
                }
                _ => {}
            }
        }
        Ok(self.is_complete())
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    pub fn is_complete(&self) -> bool {
        self.assigned && self.newid.len() == self.held
    }

    /// Old → new ids of every held node.
    pub fn new_ids(&self) -> &BTreeMap<u64, u64> {
        &self.newid
    }
}

/// Chare data rewritten in new ids.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Renumbering {
    /// Chare → node list (4 per element) in new ids.
    pub nodes: ChareNodes,
    /// Chare → old id → new id of the nodes it references.
    pub old_to_new: BTreeMap<usize, BTreeMap<u64, u64>>,
    /// Chare adjacency in new ids.
    pub msum: Msum,
    /// Every new id referenced by a chare on this PE.
    pub touched: BTreeSet<u64>,
}

/// Rewrite chare node lists and adjacency through `newid`.
pub fn renumber(
    pe: usize,
    nodes: &ChareNodes,
    msum: &Msum,
    newid: &BTreeMap<u64, u64>,
) -> Result<Renumbering, MeshReorderError> {
    let map = |n: u64| {
        newid
            .get(&n)
            .copied()
            .ok_or(MeshReorderError::IncompleteReorder { pe, node: n })
    };

    let mut out = Renumbering::default();
    for (&chare, list) in nodes {
        let mut o2n = BTreeMap::new();
        let mut renumbered = Vec::with_capacity(list.len());
        for &n in list {
            let id = map(n)?;
            o2n.insert(n, id);
            renumbered.push(id);
            out.touched.insert(id);
        }
        out.nodes.insert(chare, renumbered);
        out.old_to_new.insert(chare, o2n);
    }
    for (&chare, around) in msum {
        let entry = out.msum.entry(chare).or_default();
        for (&s, shared) in around {
            let ids = shared.iter().map(|&n| map(n)).collect::<Result<_, _>>()?;
            entry.insert(s, ids);
        }
    }
    Ok(out)
}
