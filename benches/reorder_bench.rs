use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mesh_reorder::algs::local::run_local;
use mesh_reorder::config::PartitionConfig;
use mesh_reorder::mesh::box_mesh;

fn bench_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder");
    group.sample_size(20);

    for &(n, npes) in &[(8, 2), (8, 4), (16, 4), (16, 8)] {
        let mesh = box_mesh(n, n, n);
        let config = PartitionConfig::with_chares(4 * npes);
        group.bench_with_input(
            BenchmarkId::new(format!("box{n}"), npes),
            &(mesh, config),
            |b, (mesh, config)| {
                b.iter(|| {
                    let run = run_local(npes, config, mesh);
                    assert!(run.is_ok());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_reorder);
criterion_main!(benches);
