//! Row bounds of each PE in the downstream linear system, and the cost of
//! assembling it.
//!
//! A PE's `upper` bound is the largest new id its chares touch; only the
//! last PE adds one, so that its range ends at the node count. The lower
//! bound of a PE is the upper bound of the previous one, which chains the
//! ranges `[0, u0) [u0, u1) ...` without gaps. The cost of a PE is the
//! fraction of touched ids outside its bounds, i.e. rows it contributes to
//! but another PE assembles.

use super::quorum::Quorum;
use crate::mesh_error::MeshReorderError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `[lower, upper)` rows owned by a PE.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: u64,
    pub upper: u64,
}

impl Bounds {
    pub fn contains(&self, id: u64) -> bool {
        id >= self.lower && id < self.upper
    }

    pub fn len(&self) -> u64 {
        self.upper - self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.upper == self.lower
    }
}

/// Upper bound of a PE whose own ids start at `start`: the largest touched
/// id, plus one on the `last` PE.
///
/// Never below `start`. Every id a PE touches is numbered by it or a lower
/// PE, so the previous PE's bound cannot exceed `start` and the range stays
/// non-inverted even for a PE that numbers nothing.
pub fn upper_bound(touched: &BTreeSet<u64>, start: u64, last: bool) -> u64 {
    let Some(&max) = touched.last() else {
        return start;
    };
    let upper = if last { max + 1 } else { max };
    upper.max(start)
}

/// Fraction of `touched` falling outside `bounds`; 0 when nothing is touched.
pub fn cost(touched: &BTreeSet<u64>, bounds: Bounds) -> f64 {
    if touched.is_empty() {
        return 0.0;
    }
    let foreign = touched.iter().filter(|&&id| !bounds.contains(id)).count();
    foreign as f64 / touched.len() as f64
}

/// Mean, standard deviation and extremes of the per-PE costs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CostStatistics {
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

/// Two-phase all-to-all reduction of the costs: the mean first, then the
/// squared deviations from it.
#[derive(Debug)]
pub struct CostReduction {
    pe: usize,
    costs: Quorum<f64>,
    deviations: Quorum<f64>,
}

impl CostReduction {
    pub fn new(pe: usize, npes: usize) -> Self {
        Self {
            pe,
            costs: Quorum::new("cost", npes),
            deviations: Quorum::new("costvariance", npes),
        }
    }

    pub fn add_cost(&mut self, from: usize, cost: f64) -> Result<bool, MeshReorderError> {
        self.costs.insert(self.pe, from, cost)
    }

    pub fn add_variance(&mut self, from: usize, var: f64) -> Result<bool, MeshReorderError> {
        self.deviations.insert(self.pe, from, var)
    }

    /// Mean cost, once every PE has reported.
    pub fn mean(&self) -> Option<f64> {
        self.costs.is_complete().then(|| {
            let n = self.costs.len() as f64;
            self.costs.iter().map(|(_, &c)| c).sum::<f64>() / n
        })
    }

    /// Final statistics, once every PE has reported its deviation.
    pub fn statistics(&self) -> Option<CostStatistics> {
        let mean = self.mean()?;
        if !self.deviations.is_complete() {
            return None;
        }
        let n = self.deviations.len() as f64;
        let var = self.deviations.iter().map(|(_, &v)| v).sum::<f64>() / n;
        let (min, max) = self
            .costs
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, &c)| {
                (lo.min(c), hi.max(c))
            });
        Some(CostStatistics {
            mean,
            stddev: var.sqrt(),
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_is_largest_touched() {
        let touched = BTreeSet::from([0, 3, 7]);
        assert_eq!(upper_bound(&touched, 0, false), 7);
        assert_eq!(upper_bound(&touched, 0, true), 8);
    }

    #[test]
    fn upper_never_falls_below_start() {
        // numbers nothing, touches only ids of lower PEs
        assert_eq!(upper_bound(&BTreeSet::from([1, 3]), 8, false), 8);
        assert_eq!(upper_bound(&BTreeSet::from([1, 3]), 8, true), 8);
        assert_eq!(upper_bound(&BTreeSet::new(), 5, false), 5);
        assert_eq!(upper_bound(&BTreeSet::from([8, 9]), 8, false), 9);
        assert!(Bounds { lower: 8, upper: 8 }.is_empty());
    }

    #[test]
    fn cost_counts_foreign_rows() {
        let touched: BTreeSet<u64> = [1, 3, 5, 7, 8, 9, 10, 11].into();
        let c = cost(&touched, Bounds { lower: 7, upper: 12 });
        assert!((c - 0.375).abs() < 1e-12);
        assert_eq!(cost(&BTreeSet::new(), Bounds::default()), 0.0);
        assert_eq!(cost(&touched, Bounds { lower: 0, upper: 12 }), 0.0);
    }

    #[test]
    fn two_phase_reduction() {
        let costs = [0.0, 0.5, 1.0];
        let mut r = CostReduction::new(1, 3);
        for (pe, &c) in costs.iter().enumerate().rev() {
            assert!(r.mean().is_none());
            r.add_cost(pe, c).unwrap();
        }
        let mean = r.mean().unwrap();
        assert!((mean - 0.5).abs() < 1e-12);
        for (pe, &c) in costs.iter().enumerate() {
            assert!(r.statistics().is_none());
            r.add_variance(pe, (c - mean) * (c - mean)).unwrap();
        }
        let s = r.statistics().unwrap();
        assert!((s.stddev - (1.0f64 / 6.0).sqrt()).abs() < 1e-12);
        assert_eq!((s.min, s.max), (0.0, 1.0));
    }
}
