use std::time::Instant;

use bmssp::{gen, ClassicDijkstra, Solver, UNREACHED};

fn main() -> bmssp::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("Bounded Multi-Source Shortest Path (Duan et al., 2025)");
    println!("======================================================");

    let n = 10_000;
    let m = 3 * n;
    println!("Generating sparse digraph: {} vertices, {} edges", n, m);
    let graph = gen::random_graph(n, m, 100, 42);

    let started = Instant::now();
    let transformed = graph.to_constant_degree();
    println!(
        "Constant-degree expansion: {} vertices in {:?}",
        transformed.graph.n,
        started.elapsed()
    );

    let mut solver = Solver::new(&transformed.graph);
    let started = Instant::now();
    let dist = solver.run(transformed.start[0])?.to_vec();
    let solver_time = started.elapsed();
    let mapped = transformed.map_distances(&dist);
    println!("Recursion finished in {:?}", solver_time);

    let started = Instant::now();
    let reference = ClassicDijkstra::new(graph).solve(0)?;
    let dijkstra_time = started.elapsed();
    println!("Classic Dijkstra finished in {:?}", dijkstra_time);

    let reached = mapped.iter().filter(|&&d| d != UNREACHED).count();
    let agree = mapped
        .iter()
        .zip(reference.iter())
        .all(|(a, b)| (a - b).abs() < 1e-9 || a == b);
    println!(
        "Reached {} of {} vertices; agreement with Dijkstra: {}",
        reached, n, agree
    );

    Ok(())
}
