//! Who numbers which node: the communication map.
//!
//! Every PE asks every PE (itself included) which of its nodes they hold.
//! The answers ("masks") are buffered until all `npes` have arrived and then
//! resolved in increasing PE order, so that a node shared by several PEs is
//! always numbered by the lowest of them no matter how the answers were
//! delivered. Masks also reveal which chares touch each node, from which the
//! chare adjacency (`msum`) is built.

use super::node_index::GlobalNodeIndex;
use super::quorum::Quorum;
use crate::mesh_error::MeshReorderError;
use std::collections::{BTreeMap, BTreeSet};

/// Chare → surrounding chare → nodes the two share.
pub type Msum = BTreeMap<usize, BTreeMap<usize, BTreeSet<u64>>>;

/// Node → chares referencing it on the answering PE.
pub type Mask = BTreeMap<u64, Vec<usize>>;

/// Lower peer PE → nodes that peer numbers and this PE must request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommunicationMap {
    pub peers: BTreeMap<usize, BTreeSet<u64>>,
}

impl CommunicationMap {
    /// Number of node ids received from peers.
    pub fn received(&self) -> usize {
        self.peers.values().map(BTreeSet::len).sum()
    }

    /// PE that numbers `node`, if it is not this one.
    pub fn owner_of(&self, node: u64) -> Option<usize> {
        self.peers
            .iter()
            .find_map(|(&p, nodes)| nodes.contains(&node).then_some(p))
    }
}

/// Outcome of resolving all masks on one PE.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedMap {
    pub msum: Msum,
    pub communication: CommunicationMap,
    /// Nodes this PE numbers itself.
    pub unique_count: u64,
}

#[derive(Debug)]
pub struct CommunicationMapBuilder {
    pe: usize,
    masks: Quorum<Mask>,
}

impl CommunicationMapBuilder {
    pub fn new(pe: usize, npes: usize) -> Self {
        Self {
            pe,
            masks: Quorum::new("mask", npes),
        }
    }

    /// Buffer the mask of PE `from`. Returns `true` once every PE has answered.
    pub fn add_mask(&mut self, from: usize, mask: Mask) -> Result<bool, MeshReorderError> {
        self.masks.insert(self.pe, from, mask)
    }

    pub fn is_complete(&self) -> bool {
        self.masks.is_complete()
    }

    /// Build chare adjacency and the communication map from all masks.
    pub fn resolve(self, index: &GlobalNodeIndex) -> Result<ResolvedMap, MeshReorderError> {
        let pe = self.pe;
        if !self.masks.is_complete() {
            return Err(MeshReorderError::MaskCountMismatch {
                pe,
                expected: self.masks.expected(),
                got: self.masks.len(),
            });
        }

        let mut msum = Msum::new();
        let mut claims: BTreeMap<usize, BTreeSet<u64>> = BTreeMap::new();
        for (from, mask) in self.masks.iter() {
            for (&node, surrounding) in mask {
                let chares = index.chares_of(node).ok_or(MeshReorderError::UnknownNode {
                    pe,
                    from,
                    node,
                })?;
                for &c in chares {
                    for &s in surrounding.iter().filter(|&&s| s != c) {
                        msum.entry(c).or_default().entry(s).or_default().insert(node);
                    }
                }
            }
            if from < pe {
                claims.insert(from, mask.keys().copied().collect());
            }
        }

        // lowest claimant wins
        let mut claimed = BTreeSet::new();
        let mut communication = CommunicationMap::default();
        for (p, nodes) in claims {
            let mine: BTreeSet<u64> = nodes.difference(&claimed).copied().collect();
            if !mine.is_empty() {
                claimed.extend(mine.iter().copied());
                communication.peers.insert(p, mine);
            }
        }

        let unique_count = (index.owned_nodes().len() - communication.received()) as u64;
        Ok(ResolvedMap {
            msum,
            communication,
            unique_count,
        })
    }
}
