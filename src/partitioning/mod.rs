//! Element partitioning strategies.
//!
//! An [`ElementPartitioner`] maps each locally read element to the chare
//! (work unit) that will own it. The reordering protocol treats it as a
//! black box: only the length and range of the returned assignment are
//! checked.

use crate::config::Axis;
use crate::mesh_error::MeshReorderError;

/// Assigns mesh elements to chares.
pub trait ElementPartitioner {
    /// Return one chare id in `[0, nchare)` per element.
    ///
    /// `centroids` is empty unless the strategy is geometric.
    fn partition(
        &self,
        centroids: &[Vec<f64>; 3],
        gelemid: &[u64],
        nelem: usize,
        nchare: usize,
    ) -> Result<Vec<usize>, MeshReorderError>;
}

impl<P: ElementPartitioner + ?Sized> ElementPartitioner for Box<P> {
    fn partition(
        &self,
        centroids: &[Vec<f64>; 3],
        gelemid: &[u64],
        nelem: usize,
        nchare: usize,
    ) -> Result<Vec<usize>, MeshReorderError> {
        (**self).partition(centroids, gelemid, nelem, nchare)
    }
}

/// Validate a partitioner result against the element count and chare range.
pub fn check_assignment(
    che: &[usize],
    nelem: usize,
    nchare: usize,
) -> Result<(), MeshReorderError> {
    if che.len() != nelem {
        return Err(MeshReorderError::PartitionSizeMismatch {
            expected: nelem,
            got: che.len(),
        });
    }
    if let Some(&chare) = che.iter().find(|&&c| c >= nchare) {
        return Err(MeshReorderError::InvalidChareId { chare, nchare });
    }
    Ok(())
}

/// Contiguous blocks of global element ids: `chare = gid · nchare / total`.
#[derive(Clone, Copy, Debug)]
pub struct BlockPartitioner {
    total: u64,
}

impl BlockPartitioner {
    pub fn new(total: u64) -> Self {
        Self { total }
    }
}

impl ElementPartitioner for BlockPartitioner {
    fn partition(
        &self,
        _centroids: &[Vec<f64>; 3],
        gelemid: &[u64],
        _nelem: usize,
        nchare: usize,
    ) -> Result<Vec<usize>, MeshReorderError> {
        if self.total == 0 {
            return Ok(Vec::new());
        }
        Ok(gelemid
            .iter()
            .map(|&g| ((g as u128 * nchare as u128) / self.total as u128) as usize)
            .collect())
    }
}

/// Round-robin over global element ids.
#[derive(Clone, Copy, Debug, Default)]
pub struct CyclicPartitioner;

impl ElementPartitioner for CyclicPartitioner {
    fn partition(
        &self,
        _centroids: &[Vec<f64>; 3],
        gelemid: &[u64],
        _nelem: usize,
        nchare: usize,
    ) -> Result<Vec<usize>, MeshReorderError> {
        Ok(gelemid.iter().map(|&g| (g % nchare as u64) as usize).collect())
    }
}

/// Geometric slabs: the centroid coordinate along `axis` is bucketed into
/// `nchare` equal intervals of `[lo, hi]`. Centroids outside are clamped.
#[derive(Clone, Copy, Debug)]
pub struct SlabPartitioner {
    axis: Axis,
    lo: f64,
    hi: f64,
}

impl SlabPartitioner {
    pub fn new(axis: Axis, lo: f64, hi: f64) -> Self {
        Self { axis, lo, hi }
    }
}

impl ElementPartitioner for SlabPartitioner {
    fn partition(
        &self,
        centroids: &[Vec<f64>; 3],
        _gelemid: &[u64],
        nelem: usize,
        nchare: usize,
    ) -> Result<Vec<usize>, MeshReorderError> {
        let coord = &centroids[self.axis.index()];
        if coord.len() != nelem {
            return Err(MeshReorderError::Partitioner(format!(
                "slab partitioner needs {nelem} centroids, got {}",
                coord.len()
            )));
        }
        let width = self.hi - self.lo;
        Ok(coord
            .iter()
            .map(|&c| {
                let t = ((c - self.lo) / width).clamp(0.0, 1.0);
                ((t * nchare as f64) as usize).min(nchare - 1)
            })
            .collect())
    }
}

/// A precomputed assignment indexed by global element id.
#[derive(Clone, Debug)]
pub struct ProvidedPartition {
    pub parts: Vec<usize>,
}

impl ElementPartitioner for ProvidedPartition {
    fn partition(
        &self,
        _centroids: &[Vec<f64>; 3],
        gelemid: &[u64],
        _nelem: usize,
        _nchare: usize,
    ) -> Result<Vec<usize>, MeshReorderError> {
        gelemid
            .iter()
            .map(|&g| {
                self.parts.get(g as usize).copied().ok_or_else(|| {
                    MeshReorderError::Partitioner(format!("no chare provided for element {g}"))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_centroids() -> [Vec<f64>; 3] {
        [Vec::new(), Vec::new(), Vec::new()]
    }

    #[test]
    fn block_fills_every_chare() {
        let gids: Vec<u64> = (0..10).collect();
        let che = BlockPartitioner::new(10)
            .partition(&no_centroids(), &gids, 10, 4)
            .unwrap();
        assert_eq!(che, vec![0, 0, 0, 1, 1, 2, 2, 2, 3, 3]);
        check_assignment(&che, 10, 4).unwrap();
    }

    #[test]
    fn cyclic_wraps() {
        let che = CyclicPartitioner
            .partition(&no_centroids(), &[3, 4, 5], 3, 2)
            .unwrap();
        assert_eq!(che, vec![1, 0, 1]);
    }

    #[test]
    fn slab_buckets_and_clamps() {
        let c = [vec![-1.0, 0.1, 0.6, 1.0, 7.0], Vec::new(), Vec::new()];
        let che = SlabPartitioner::new(Axis::X, 0.0, 1.0)
            .partition(&c, &[0, 1, 2, 3, 4], 5, 2)
            .unwrap();
        assert_eq!(che, vec![0, 0, 1, 1, 1]);
    }

    #[test]
    fn slab_without_centroids_fails() {
        let err = SlabPartitioner::new(Axis::Y, 0.0, 1.0)
            .partition(&no_centroids(), &[0], 1, 1)
            .unwrap_err();
        assert!(matches!(err, MeshReorderError::Partitioner(_)));
    }

    #[test]
    fn assignment_checks() {
        assert!(matches!(
            check_assignment(&[0, 1], 3, 2),
            Err(MeshReorderError::PartitionSizeMismatch { expected: 3, got: 2 })
        ));
        assert!(matches!(
            check_assignment(&[0, 2], 2, 2),
            Err(MeshReorderError::InvalidChareId { chare: 2, nchare: 2 })
        ));
    }

    #[test]
    fn provided_partition_indexes_by_global_id() {
        let p = ProvidedPartition {
            parts: vec![3, 2, 1, 0],
        };
        let che = p.partition(&no_centroids(), &[2, 3], 2, 4).unwrap();
        assert_eq!(che, vec![1, 0]);
        assert!(p.partition(&no_centroids(), &[9], 1, 4).is_err());
    }
}
