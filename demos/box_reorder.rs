// Partitions a structured box of tetrahedra over a handful of in-process PEs
// and prints the row range, the number of nodes numbered and the
// communication cost of each PE.
//
//     cargo run --example box_reorder -- [nx ny nz] [npes] [nchare]
use itertools::Itertools;
use mesh_reorder::prelude::*;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<usize> = std::env::args().skip(1).filter_map(|a| a.parse().ok()).collect();
    let arg = |i: usize, default: usize| args.get(i).copied().unwrap_or(default);
    let (nx, ny, nz) = (arg(0, 8), arg(1, 4), arg(2, 4));
    let npes = arg(3, 4);
    let nchare = arg(4, 2 * npes);

    let mesh = box_mesh(nx, ny, nz);
    println!(
        "{nx}x{ny}x{nz} box: {} nodes, {} tetrahedra, {npes} PEs, {nchare} chares",
        mesh.nnode(),
        mesh.nelem_usize()
    );
    let run = run_local(npes, &PartitionConfig::with_chares(nchare), &mesh);
    let outcomes = match run.outcomes() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("reordering failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    for o in &outcomes {
        println!(
            "PE {}: rows [{}, {}), numbered {} from {}, cost {:.3}",
            o.pe, o.bounds.lower, o.bounds.upper, o.unique, o.start, o.cost
        );
    }
    let stats = outcomes[0].stats;
    println!(
        "cost mean {:.3} stddev {:.3} range [{:.3}, {:.3}]",
        stats.mean, stats.stddev, stats.min, stats.max
    );
    println!(
        "row splits: {}",
        outcomes.iter().map(|o| o.bounds.upper).join(" | ")
    );
    ExitCode::SUCCESS
}
