#![allow(dead_code)]

use bytes::Bytes;
use mesh_reorder::algs::communicator::{Communicator, LocalComm};
use mesh_reorder::algs::local::LocalRun;
use mesh_reorder::mesh::InMemoryMesh;
use mesh_reorder::mesh_error::MeshReorderError;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Two tetrahedra sharing the face {1, 2, 3}.
pub fn two_tets() -> InMemoryMesh {
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

/// 2×1×1 box of 12 nodes, node (i, j, k) = i + 3(j + 2k), with the four
/// corner tetrahedra of each unit cell. Cells meet in the face {1, 4, 7, 10}.
pub fn corner_box() -> InMemoryMesh {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut z = Vec::new();
    for k in 0..2 {
        for j in 0..2 {
            for i in 0..3 {
                x.push(i as f64);
                y.push(j as f64);
                z.push(k as f64);
            }
        }
    }
    let cell = [[0, 1, 3, 6], [4, 1, 3, 10], [7, 1, 6, 10], [9, 3, 6, 10]];
    let mut inpoel = Vec::new();
    for shift in 0..2u64 {
        for tet in cell {
            inpoel.extend(tet.iter().map(|&n| n + shift));
        }
    }
    InMemoryMesh::new(inpoel, [x, y, z]).unwrap()
}

/// Node ids referenced by the mesh connectivity.
pub fn referenced(mesh: &InMemoryMesh) -> BTreeSet<u64> {
    mesh.inpoel.iter().copied().collect()
}

/// Assert the union of all workers' maps is a bijection onto `[0, n)`.
pub fn assert_bijection(run: &LocalRun, mesh: &InMemoryMesh) -> BTreeMap<u64, u64> {
    let ids = run.new_ids().expect("an old id received two new ids");
    let old: BTreeSet<u64> = ids.keys().copied().collect();
    assert_eq!(old, referenced(mesh));
    let mut new: Vec<u64> = ids.values().copied().collect();
    new.sort_unstable();
    assert_eq!(new, (0..ids.len() as u64).collect::<Vec<_>>());
    ids
}

/// Wraps a [`LocalComm`] and delivers waiting frames in random sender order.
/// Frames from one sender keep their order.
pub struct ShufflingComm {
    inner: LocalComm,
    state: RefCell<(SmallRng, BTreeMap<usize, VecDeque<Bytes>>)>,
}

impl ShufflingComm {
    pub fn universe(n: usize, seed: u64) -> Vec<Self> {
        LocalComm::universe(n)
            .into_iter()
            .enumerate()
            .map(|(rank, inner)| ShufflingComm {
                inner,
                state: RefCell::new((
                    SmallRng::seed_from_u64(seed.wrapping_mul(31).wrapping_add(rank as u64)),
                    BTreeMap::new(),
                )),
            })
            .collect()
    }
}

impl Communicator for ShufflingComm {
    fn rank(&self) -> usize {
        self.inner.rank()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn send(&self, peer: usize, frame: Bytes) -> Result<(), MeshReorderError> {
        self.inner.send(peer, frame)
    }

    fn recv(&self) -> Result<(usize, Bytes), MeshReorderError> {
        let mut state = self.state.borrow_mut();
        let (rng, queues) = &mut *state;
        while let Some((from, frame)) = self.inner.try_recv()? {
            queues.entry(from).or_default().push_back(frame);
        }
        if queues.values().all(VecDeque::is_empty) {
            let (from, frame) = self.inner.recv()?;
            queues.entry(from).or_default().push_back(frame);
        }
        let ready: Vec<usize> = queues
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(&p, _)| p)
            .collect();
        let from = *ready.choose(rng).unwrap();
        let frame = queues.get_mut(&from).and_then(VecDeque::pop_front).unwrap();
        Ok((from, frame))
    }
}
