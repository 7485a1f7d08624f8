mod common;

use common::{ShufflingComm, assert_bijection, corner_box};
use mesh_reorder::algs::local::{run_local, run_pes};
use mesh_reorder::config::PartitionConfig;
use mesh_reorder::mesh::box_mesh;

#[test]
fn shuffled_delivery_gives_identical_results() {
    let mesh = box_mesh(4, 3, 2);
    let config = PartitionConfig::with_chares(9);
    let reference = run_local(4, &config, &mesh);
    let expected_ids = assert_bijection(&reference, &mesh);
    let expected = reference.outcomes().unwrap();

    for seed in 0..8 {
        let run = run_pes(ShufflingComm::universe(4, seed), &config, &mesh, None);
        assert_eq!(run.outcomes().unwrap(), expected, "seed {seed}");
        assert_eq!(run.new_ids().unwrap(), expected_ids, "seed {seed}");
        for (a, b) in run.pes.iter().zip(&reference.pes) {
            assert_eq!(a.workers, b.workers, "seed {seed}");
        }
    }
}

#[test]
fn node_shared_by_many_pes_is_numbered_by_the_lowest() {
    // node 2 is in every element; the other corners are private
    let inpoel = vec![
        2, 10, 11, 12, //
        2, 20, 21, 22, //
        2, 30, 31, 32, //
        2, 40, 41, 42, //
        2, 50, 51, 52,
    ];
    let n = 53;
    let mesh = mesh_reorder::mesh::InMemoryMesh::new(
        inpoel,
        [vec![0.0; n], vec![0.0; n], vec![0.0; n]],
    )
    .unwrap();
    let config = PartitionConfig::with_chares(5);
    for seed in 0..4 {
        let run = run_pes(ShufflingComm::universe(5, seed), &config, &mesh, None);
        let outcomes = run.outcomes().unwrap();
        let ids = assert_bijection(&run, &mesh);
        // PE 0 numbers node 2 and its own three corners; everybody else three
        assert_eq!(outcomes[0].unique, 4);
        assert!(outcomes[1..].iter().all(|o| o.unique == 3));
        assert!(ids[&2] < 4);
    }
}

#[test]
fn corner_box_is_order_independent() {
    let mesh = corner_box();
    let config = PartitionConfig::with_chares(4);
    let reference = run_local(2, &config, &mesh).outcomes().unwrap();
    for seed in 0..8 {
        let run = run_pes(ShufflingComm::universe(2, seed), &config, &mesh, None);
        assert_eq!(run.outcomes().unwrap(), reference);
    }
}
