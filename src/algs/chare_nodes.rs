//! Shipping per-chare node lists to the PEs that own the chares.
//!
//! After partitioning, each PE holds element connectivity for chares that
//! may live anywhere. [`ChareNodeDistributor::export`] keeps the node lists
//! of chares this PE owns and batches the rest into one `Add` per
//! destination PE. Receivers acknowledge every batch; the sender is done
//! once each destination has answered.
//!
//! Node lists are stored per source PE and concatenated in increasing PE
//! order by [`ChareNodeDistributor::finish`], so their content does not
//! depend on the order batches arrived in.

use super::chare_distribution::ChareDistribution;
use crate::mesh::NODES_PER_TET;
use crate::mesh_error::MeshReorderError;
use std::collections::{BTreeMap, BTreeSet};

pub use super::wire::ChareNodes;

/// Expand per-element chare ids to per-chare node lists (4 ids per element,
/// in element order).
pub fn chare_nodes(che: &[usize], inpoel: &[u64]) -> ChareNodes {
    let mut out = ChareNodes::new();
    for (&chare, elem) in che.iter().zip(inpoel.chunks_exact(NODES_PER_TET)) {
        out.entry(chare).or_default().extend_from_slice(elem);
    }
    out
}

#[derive(Debug)]
pub struct ChareNodeDistributor {
    pe: usize,
    dist: ChareDistribution,
    /// Source PE → chare → nodes, including our own kept chares.
    received: BTreeMap<usize, ChareNodes>,
    /// Destinations that have not acknowledged their batch yet.
    awaiting: BTreeSet<usize>,
    exported: bool,
}

impl ChareNodeDistributor {
    pub fn new(pe: usize, dist: ChareDistribution) -> Self {
        Self {
            pe,
            dist,
            received: BTreeMap::new(),
            awaiting: BTreeSet::new(),
            exported: false,
        }
    }

    /// Keep owned chares, return the rest batched by destination PE.
    pub fn export(&mut self, chares: ChareNodes) -> BTreeMap<usize, ChareNodes> {
        let mut outgoing: BTreeMap<usize, ChareNodes> = BTreeMap::new();
        let mut kept = ChareNodes::new();
        for (chare, nodes) in chares {
            let dest = self.dist.pe_of(chare);
            if dest == self.pe {
                kept.insert(chare, nodes);
            } else {
                outgoing.entry(dest).or_default().insert(chare, nodes);
            }
        }
        if !kept.is_empty() {
            self.received.insert(self.pe, kept);
        }
        self.awaiting = outgoing.keys().copied().collect();
        self.exported = true;
        outgoing
    }

    /// Store a batch sent by PE `from`. Every chare in it must be ours.
    pub fn receive(&mut self, from: usize, chares: ChareNodes) -> Result<(), MeshReorderError> {
        if let Some(&chare) = chares.keys().find(|&&c| !self.dist.owns(self.pe, c)) {
            return Err(MeshReorderError::ForeignChare { pe: self.pe, chare });
        }
        if from == self.pe || self.received.contains_key(&from) {
            return Err(MeshReorderError::DuplicateContribution {
                pe: self.pe,
                from,
                kind: "add",
            });
        }
        self.received.insert(from, chares);
        Ok(())
    }

    /// Record the acknowledgment of PE `from`. Returns `true` once all batches are acknowledged.
    pub fn acknowledge(&mut self, from: usize) -> Result<bool, MeshReorderError> {
        if !self.awaiting.remove(&from) {
            return Err(MeshReorderError::DuplicateContribution {
                pe: self.pe,
                from,
                kind: "ack",
            });
        }
        Ok(self.is_acked())
    }

    pub fn is_acked(&self) -> bool {
        self.exported && self.awaiting.is_empty()
    }

    /// Node lists of the chares we own, concatenated in source-PE order.
    pub fn finish(self) -> ChareNodes {
        let mut out = ChareNodes::new();
        for (_, chares) in self.received {
            for (chare, nodes) in chares {
                out.entry(chare).or_default().extend(nodes);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_elements_to_chare_lists() {
        let inpoel = [0, 1, 2, 3, 1, 2, 3, 4, 5, 6, 7, 8];
        let nodes = chare_nodes(&[1, 0, 1], &inpoel);
        assert_eq!(nodes[&0], vec![1, 2, 3, 4]);
        assert_eq!(nodes[&1], vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn export_batches_by_owner_and_waits_for_acks() {
        let dist = ChareDistribution::new(4, 2).unwrap();
        let mut d = ChareNodeDistributor::new(0, dist);
        let mut chares = ChareNodes::new();
        chares.insert(0, vec![0, 1, 2, 3]);
        chares.insert(2, vec![4, 5, 6, 7]);
        chares.insert(3, vec![8, 9, 10, 11]);
        let out = d.export(chares);
        assert_eq!(out.len(), 1);
        assert_eq!(out[&1].keys().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert!(!d.is_acked());
        assert!(d.acknowledge(1).unwrap());
        assert!(d.acknowledge(1).is_err());
    }

    #[test]
    fn nothing_to_export_is_immediately_acked() {
        let dist = ChareDistribution::new(2, 2).unwrap();
        let mut d = ChareNodeDistributor::new(1, dist);
        assert!(!d.is_acked());
        let out = d.export(ChareNodes::new());
        assert!(out.is_empty());
        assert!(d.is_acked());
    }

    #[test]
    fn finish_is_independent_of_arrival_order() {
        let dist = ChareDistribution::new(3, 3).unwrap();
        let batch = |n: u64| {
            let mut c = ChareNodes::new();
            c.insert(0, vec![n; 4]);
            c
        };
        let mut a = ChareNodeDistributor::new(0, dist);
        a.export(batch(0));
        a.receive(2, batch(2)).unwrap();
        a.receive(1, batch(1)).unwrap();
        let mut b = ChareNodeDistributor::new(0, dist);
        b.receive(1, batch(1)).unwrap();
        b.export(batch(0));
        b.receive(2, batch(2)).unwrap();
        let fa = a.finish();
        assert_eq!(fa, b.finish());
        assert_eq!(fa[&0], vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn rejects_foreign_chares() {
        let dist = ChareDistribution::new(4, 2).unwrap();
        let mut d = ChareNodeDistributor::new(1, dist);
        let mut c = ChareNodes::new();
        c.insert(1, vec![0, 1, 2, 3]);
        assert_eq!(
            d.receive(0, c),
            Err(MeshReorderError::ForeignChare { pe: 1, chare: 1 })
        );
    }
}
