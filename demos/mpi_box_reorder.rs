// Runs the partition + reorder pass with one PE per MPI rank:
//
//     mpirun -n 4 cargo run --features mpi-support --example mpi_box_reorder
//
// Every rank generates the same box and reads its own element chunk of it.
use mesh_reorder::algs::communicator::{Communicator, MpiComm};
use mesh_reorder::prelude::*;

fn main() {
    let comm = MpiComm::new(64 << 20).unwrap();
    let npes = comm.size();
    let mesh = box_mesh(16, 8, 8);
    let mut p = Partitioner::headless(comm, PartitionConfig::with_chares(4 * npes));
    match p.run(&mesh) {
        Ok(o) => println!(
            "rank {}: rows [{}, {}) of {}, cost {:.3} (mean {:.3})",
            o.pe, o.bounds.lower, o.bounds.upper, o.total_nodes, o.cost, o.stats.mean
        ),
        Err(e) => eprintln!("rank {}: {e}", p.pe()),
    }
}
