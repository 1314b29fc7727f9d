use std::cmp::Reverse;
use std::collections::BinaryHeap;

use wide::f64x4;

use crate::error::{Result, SsspError};
use crate::graph::{Edge, Graph};
use crate::{saturating_add, OrderedFloat, UNREACHED};

/// Classic binary-heap Dijkstra over the same graph type, used as the
/// correctness oracle and benchmark baseline.
pub struct ClassicDijkstra {
    graph: Graph,
}

impl ClassicDijkstra {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    pub fn solve(&self, source: usize) -> Result<Vec<f64>> {
        if self.graph.n == 0 {
            return Err(SsspError::EmptyGraph);
        }
        if source >= self.graph.n {
            return Err(SsspError::SourceOutOfRange {
                src_vertex: source,
                vertices: self.graph.n,
            });
        }

        let mut dist = vec![UNREACHED; self.graph.n];
        let mut visited = vec![false; self.graph.n];
        let mut heap = BinaryHeap::with_capacity(self.graph.n / 2 + 1);

        dist[source] = 0.0;
        heap.push(Reverse((OrderedFloat(0.0), source)));

        while let Some(Reverse((OrderedFloat(from_dist), u))) = heap.pop() {
            if visited[u] {
                continue;
            }
            visited[u] = true;
            Self::relax_adjacent(&self.graph.adj[u], from_dist, &mut dist, &mut heap);
        }

        Ok(dist)
    }

    /// Relaxes one adjacency list in SIMD chunks of four with a scalar
    /// tail.
    fn relax_adjacent(
        edges: &[Edge],
        from_dist: f64,
        dist: &mut [f64],
        heap: &mut BinaryHeap<Reverse<(OrderedFloat, usize)>>,
    ) {
        let chunks = edges.chunks_exact(4);
        let remainder = chunks.remainder();

        for chunk in chunks {
            let weights = f64x4::new([
                chunk[0].weight,
                chunk[1].weight,
                chunk[2].weight,
                chunk[3].weight,
            ]);
            let candidates = (f64x4::splat(from_dist) + weights).to_array();
            for (edge, &candidate) in chunk.iter().zip(candidates.iter()) {
                if candidate < dist[edge.to] {
                    dist[edge.to] = candidate;
                    heap.push(Reverse((OrderedFloat(candidate), edge.to)));
                }
            }
        }

        for edge in remainder {
            let candidate = saturating_add(from_dist, edge.weight);
            if candidate < dist[edge.to] {
                dist[edge.to] = candidate;
                heap.push(Reverse((OrderedFloat(candidate), edge.to)));
            }
        }
    }
}
