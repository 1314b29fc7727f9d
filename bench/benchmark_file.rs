use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use bmssp::{gen, ClassicDijkstra, Solver};

fn benchmark_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("SSSP Algorithms");

    let sizes = [
        (1_000, 3_000),
        (5_000, 15_000),
        (10_000, 30_000),
    ];

    for (n, m) in sizes {
        let graph = gen::random_graph(n, m, 100, 42);
        let transformed = graph.to_constant_degree();

        group.bench_with_input(
            BenchmarkId::new("BMSSP", format!("n={}_m={}", n, m)),
            &transformed,
            |b, tg| {
                b.iter(|| {
                    let mut solver = Solver::new(&tg.graph);
                    let dist = solver.run(tg.start[0]).expect("solver run");
                    black_box(dist[0])
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("Dijkstra", format!("n={}_m={}", n, m)),
            &graph,
            |b, g| {
                b.iter(|| {
                    let dijkstra = ClassicDijkstra::new(g.clone());
                    black_box(dijkstra.solve(0).expect("dijkstra run"))
                })
            },
        );
    }

    group.finish();
}

fn benchmark_transform(c: &mut Criterion) {
    let graph = gen::random_graph(10_000, 30_000, 100, 7);
    c.bench_function("constant_degree_transform", |b| {
        b.iter(|| black_box(graph.to_constant_degree().graph.n))
    });
}

criterion_group!(benches, benchmark_solvers, benchmark_transform);
criterion_main!(benches);
