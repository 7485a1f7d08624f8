mod common;

use common::{assert_bijection, corner_box, two_tets};
use mesh_reorder::algs::local::{run_local, run_local_with};
use mesh_reorder::algs::partitioner::Strategy as PartitionStrategy;
use mesh_reorder::config::{ChareCount, PartitionConfig};
use mesh_reorder::mesh::{InMemoryMesh, box_mesh};
use mesh_reorder::mesh_error::MeshReorderError;
use mesh_reorder::partitioning::ProvidedPartition;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

#[test]
fn two_tets_on_one_and_two_pes() {
    let mesh = two_tets();
    for npes in [1, 2] {
        for nchare in [npes, 2] {
            let run = run_local(npes, &PartitionConfig::with_chares(nchare), &mesh);
            let outcomes = run.outcomes().unwrap();
            let ids = assert_bijection(&run, &mesh);
            assert_eq!(ids.len(), 5);
            assert!(outcomes.iter().all(|o| o.total_nodes == 5));
            assert_eq!(outcomes.iter().map(|o| o.unique).sum::<u64>(), 5);
        }
    }
}

#[test]
fn two_tets_on_two_pes_numbers_shared_face_on_pe0() {
    let mesh = two_tets();
    let run = run_local(2, &PartitionConfig::with_chares(2), &mesh);
    let ids = assert_bijection(&run, &mesh);
    // PE 0 holds 0..=3 and numbers them first; PE 1 only numbers node 4
    assert_eq!(ids, BTreeMap::from([(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]));
    let outcomes = run.outcomes().unwrap();
    assert_eq!(outcomes[0].unique, 4);
    assert_eq!(outcomes[1].unique, 1);
    assert_eq!(outcomes[1].start, 4);
}

#[test]
fn five_pes_on_a_larger_box() {
    let mesh = box_mesh(5, 2, 1);
    for chares in [ChareCount::Fixed(5), ChareCount::Fixed(13), ChareCount::Virtualization(0.5)] {
        let config = PartitionConfig {
            chares,
            ..Default::default()
        };
        let run = run_local(5, &config, &mesh);
        run.outcomes().unwrap();
        let ids = assert_bijection(&run, &mesh);
        assert_eq!(ids.len(), mesh.nnode());
    }
}

#[test]
fn five_pes_on_two_tets_is_overdecomposed() {
    let run = run_local(5, &PartitionConfig::with_chares(5), &two_tets());
    assert!(!run.is_ok());
    assert!(matches!(
        run.root_cause(),
        Some(MeshReorderError::OverDecomposition { .. })
    ));
    for result in &run.pes {
        match &result.outcome {
            Err(MeshReorderError::OverDecomposition { pe, chare }) => assert_eq!(pe, chare),
            Err(MeshReorderError::PeerAborted { .. }) => {}
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}

#[test]
fn virtualization_zero_on_two_tets_leaves_one_chare_per_pe() {
    let config = PartitionConfig::default();
    let run = run_local(2, &config, &two_tets());
    let outcomes = run.outcomes().unwrap();
    assert!(outcomes.iter().all(|o| o.nchare == 2));
}

#[test]
fn provided_partition_interleaving_pes() {
    // chares alternate between the two cells of the box
    let mesh = corner_box();
    let parts = vec![0, 2, 1, 3, 0, 2, 1, 3];
    let strategy: PartitionStrategy = Arc::new(ProvidedPartition { parts });
    let run = run_local_with(2, &PartitionConfig::with_chares(4), &mesh, strategy);
    run.outcomes().unwrap();
    assert_bijection(&run, &mesh);
}

fn scenario() -> impl Strategy<Value = (InMemoryMesh, usize, usize, Vec<usize>)> {
    (1usize..=12, 4u64..=16)
        .prop_flat_map(|(nelem, nnode)| {
            (
                Just(nelem),
                Just(nnode),
                prop::collection::vec(0..nnode, nelem * 4),
                1usize..=nelem.min(4),
            )
        })
        .prop_flat_map(|(nelem, nnode, inpoel, npes)| {
            (Just(nnode), Just(inpoel), Just(npes), npes..=nelem).prop_flat_map(
                move |(nnode, inpoel, npes, nchare)| {
                    let parts: Vec<usize> = (0..nelem).map(|g| g % nchare).collect();
                    (
                        Just(nnode),
                        Just(inpoel),
                        Just(npes),
                        Just(nchare),
                        Just(parts).prop_shuffle(),
                    )
                },
            )
        })
        .prop_map(|(nnode, inpoel, npes, nchare, parts)| {
            let n = nnode as usize;
            let mesh = InMemoryMesh::new(inpoel, [vec![0.0; n], vec![0.0; n], vec![0.0; n]])
                .unwrap();
            (mesh, npes, nchare, parts)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn renumbering_is_a_bijection((mesh, npes, nchare, parts) in scenario()) {
        let strategy: PartitionStrategy = Arc::new(ProvidedPartition { parts });
        let run = run_local_with(npes, &PartitionConfig::with_chares(nchare), &mesh, strategy);
        let outcomes = run.outcomes().unwrap();
        let ids = assert_bijection(&run, &mesh);
        let total = ids.len() as u64;
        prop_assert_eq!(outcomes.iter().map(|o| o.unique).sum::<u64>(), total);
        prop_assert_eq!(outcomes[0].bounds.lower, 0);
        prop_assert_eq!(outcomes[npes - 1].bounds.upper, total);
        for w in outcomes.windows(2) {
            prop_assert_eq!(w[0].bounds.upper, w[1].bounds.lower);
        }
    }
}
