//! Linear assignment of chares to PEs.
//!
//! Chares are dealt out in contiguous runs of `chunk = nchare / npes`; the
//! last PE also takes the `nchare % npes` leftovers.

use crate::mesh_error::MeshReorderError;
use std::ops::Range;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChareDistribution {
    nchare: usize,
    npes: usize,
    chunk: usize,
}

impl ChareDistribution {
    pub fn new(nchare: usize, npes: usize) -> Result<Self, MeshReorderError> {
        if npes == 0 || nchare < npes {
            return Err(MeshReorderError::InvalidConfig(format!(
                "cannot distribute {nchare} chares over {npes} PEs"
            )));
        }
        Ok(Self {
            nchare,
            npes,
            chunk: nchare / npes,
        })
    }

    pub fn nchare(&self) -> usize {
        self.nchare
    }

    /// Chares per PE on every PE but the last.
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// PE owning `chare`.
    pub fn pe_of(&self, chare: usize) -> usize {
        (chare / self.chunk).min(self.npes - 1)
    }

    /// Chares owned by `pe`.
    pub fn owned(&self, pe: usize) -> Range<usize> {
        let lo = pe * self.chunk;
        if pe + 1 == self.npes {
            lo..self.nchare
        } else {
            lo..lo + self.chunk
        }
    }

    pub fn count_on(&self, pe: usize) -> usize {
        self.owned(pe).len()
    }

    pub fn owns(&self, pe: usize, chare: usize) -> bool {
        chare < self.nchare && self.pe_of(chare) == pe
    }
}
