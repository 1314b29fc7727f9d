//! Seeded graph generation for tests, benchmarks and the demo binary.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::graph::Graph;

/// Generates a sparse random digraph with `m` distinct directed edges,
/// distinct endpoints, and integral weights in `1..=max_weight`.
///
/// Integral weights keep path sums exact in `f64`, so runs can be
/// compared bit-for-bit against a reference solver.
pub fn random_graph(n: usize, m: usize, max_weight: u32, seed: u64) -> Graph {
    assert!(n >= 2, "need at least two vertices to place an edge");
    assert!(
        m <= n.saturating_mul(n - 1),
        "more edges requested than distinct vertex pairs"
    );

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut graph = Graph::new(n);
    let mut used: HashSet<(usize, usize)> = HashSet::with_capacity(m);

    while used.len() < m {
        let from = rng.gen_range(0..n);
        let to = rng.gen_range(0..n);
        if from == to || !used.insert((from, to)) {
            continue;
        }
        let weight = rng.gen_range(1..=max_weight) as f64;
        graph
            .add_edge(from, to, weight)
            .expect("generated endpoints are always in range");
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = random_graph(50, 120, 10, 99);
        let b = random_graph(50, 120, 10, 99);
        for v in 0..a.n {
            assert_eq!(a.adj[v].len(), b.adj[v].len());
            for (x, y) in a.adj[v].iter().zip(b.adj[v].iter()) {
                assert_eq!(x.to, y.to);
                assert_eq!(x.weight, y.weight);
            }
        }
    }

    #[test]
    fn respects_edge_count_and_weight_range() {
        let g = random_graph(30, 100, 7, 1);
        assert_eq!(g.edge_count(), 100);
        for list in &g.adj {
            for edge in list {
                assert!(edge.weight >= 1.0 && edge.weight <= 7.0);
                assert_eq!(edge.weight.fract(), 0.0);
            }
        }
    }
}
