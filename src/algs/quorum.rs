//! Per-PE contribution counting for the protocol's synchronization points.
//!
//! Every barrier in the reordering pass waits for one message from each of
//! a known set of PEs. A [`Quorum`] keys contributions by sender so that a
//! duplicate is detected instead of silently completing the barrier early,
//! and hands values back in increasing PE order regardless of arrival order.

use crate::mesh_error::MeshReorderError;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct Quorum<T> {
    expected: usize,
    kind: &'static str,
    received: BTreeMap<usize, T>,
}

impl<T> Quorum<T> {
    /// Wait for `expected` distinct contributions of message `kind`.
    pub fn new(kind: &'static str, expected: usize) -> Self {
        Self {
            expected,
            kind,
            received: BTreeMap::new(),
        }
    }

    /// Record the contribution of PE `from`. Returns `true` once the quorum is complete.
    pub fn insert(&mut self, me: usize, from: usize, value: T) -> Result<bool, MeshReorderError> {
        if self.received.contains_key(&from) {
            return Err(MeshReorderError::DuplicateContribution {
                pe: me,
                from,
                kind: self.kind,
            });
        }
        self.received.insert(from, value);
        Ok(self.is_complete())
    }

    pub fn is_complete(&self) -> bool {
        self.received.len() == self.expected
    }

    pub fn len(&self) -> usize {
        self.received.len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.is_empty()
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Contributions in increasing PE order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.received.iter().map(|(&pe, v)| (pe, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_after_expected_distinct_senders() {
        let mut q = Quorum::new("offset", 3);
        assert!(q.is_empty());
        assert!(!q.insert(0, 2, 20u64).unwrap());
        assert!(!q.insert(0, 0, 0).unwrap());
        assert!(q.insert(0, 1, 10).unwrap());
        let order: Vec<usize> = q.iter().map(|(pe, _)| pe).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn duplicate_sender_is_rejected() {
        let mut q = Quorum::new("mask", 2);
        q.insert(4, 1, ()).unwrap();
        assert_eq!(
            q.insert(4, 1, ()),
            Err(MeshReorderError::DuplicateContribution {
                pe: 4,
                from: 1,
                kind: "mask"
            })
        );
        assert_eq!(q.len(), 1);
    }
}
