//! Per-PE index of the nodes referenced by the chares it owns.

use super::chare_distribution::ChareDistribution;
use super::chare_nodes::ChareNodes;
use crate::mesh_error::MeshReorderError;
use std::collections::{BTreeMap, BTreeSet};

/// Unique node ids of this PE's chares and, per node, the chares using it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlobalNodeIndex {
    owned: BTreeSet<u64>,
    node_to_chares: BTreeMap<u64, Vec<usize>>,
}

impl GlobalNodeIndex {
    /// Index the flattened chare → node lists of PE `pe`.
    ///
    /// Fails with [`MeshReorderError::OverDecomposition`] if a chare `pe` owns
    /// received no elements.
    pub fn build(
        pe: usize,
        dist: &ChareDistribution,
        nodes: &ChareNodes,
    ) -> Result<Self, MeshReorderError> {
        if let Some(&chare) = nodes.keys().find(|&&c| !dist.owns(pe, c)) {
            return Err(MeshReorderError::ForeignChare { pe, chare });
        }
        for chare in dist.owned(pe) {
            if nodes.get(&chare).is_none_or(|n| n.is_empty()) {
                return Err(MeshReorderError::OverDecomposition { pe, chare });
            }
        }

        let mut node_to_chares: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (&chare, list) in nodes {
            for &n in list {
                let chares = node_to_chares.entry(n).or_default();
                // chares are visited in increasing order
                if chares.last() != Some(&chare) {
                    chares.push(chare);
                }
            }
        }
        let owned = node_to_chares.keys().copied().collect();
        Ok(Self {
            owned,
            node_to_chares,
        })
    }

    pub fn owned_nodes(&self) -> &BTreeSet<u64> {
        &self.owned
    }

    /// Sorted chares referencing `node`, if this PE holds it.
    pub fn chares_of(&self, node: u64) -> Option<&[usize]> {
        self.node_to_chares.get(&node).map(Vec::as_slice)
    }

    /// Which of `queried` this PE holds, with the chares referencing each.
    pub fn answer(&self, queried: &[u64]) -> BTreeMap<u64, Vec<usize>> {
        queried
            .iter()
            .filter_map(|&n| self.node_to_chares.get(&n).map(|c| (n, c.clone())))
            .collect()
    }
}
