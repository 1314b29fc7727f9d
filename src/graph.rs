use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SsspError};

/// Directed edge: destination vertex and non-negative weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub to: usize,
    pub weight: f64,
}

/// Directed weighted graph over vertices `0..n`, stored as adjacency
/// lists. Self-loops and parallel edges are kept as given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub n: usize,
    pub adj: Vec<Vec<Edge>>,
}

impl Graph {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            adj: vec![Vec::new(); n],
        }
    }

    /// Adds the edge `from -> to` with the given weight.
    ///
    /// Rejects endpoints outside `0..n` and weights that are negative,
    /// NaN or infinite.
    pub fn add_edge(&mut self, from: usize, to: usize, weight: f64) -> Result<()> {
        if from >= self.n {
            return Err(SsspError::VertexOutOfRange {
                vertex: from,
                vertices: self.n,
            });
        }
        if to >= self.n {
            return Err(SsspError::VertexOutOfRange {
                vertex: to,
                vertices: self.n,
            });
        }
        if !weight.is_finite() {
            return Err(SsspError::NonFiniteWeight { from, to });
        }
        if weight < 0.0 {
            return Err(SsspError::NegativeWeight { from, to, weight });
        }
        self.adj[from].push(Edge { to, weight });
        Ok(())
    }

    pub fn edge_count(&self) -> usize {
        self.adj.iter().map(|list| list.len()).sum()
    }

    /// Expands the graph into a bounded-degree equivalent.
    ///
    /// Every vertex v becomes a zero-weight directed cycle of
    /// `max(1, indeg(v) + outdeg(v))` slots, and every original edge is
    /// realized between one unused slot of each endpoint's cycle. The
    /// transformed in- and out-degrees never exceed two, and shortest
    /// distances between cycle entry slots match the original graph.
    pub fn to_constant_degree(&self) -> TransformedGraph {
        let mut in_degree = vec![0usize; self.n];
        for list in &self.adj {
            for edge in list {
                in_degree[edge.to] += 1;
            }
        }

        let mut start = vec![0usize; self.n];
        let mut size = vec![0usize; self.n];
        let mut total = 0usize;
        for v in 0..self.n {
            start[v] = total;
            size[v] = (self.adj[v].len() + in_degree[v]).max(1);
            total += size[v];
        }

        let mut graph = Graph::new(total);
        let mut origin_of = vec![0usize; total];
        for v in 0..self.n {
            for i in 0..size[v] {
                let slot = start[v] + i;
                let next = start[v] + (i + 1) % size[v];
                graph.adj[slot].push(Edge {
                    to: next,
                    weight: 0.0,
                });
                origin_of[slot] = v;
            }
        }

        // Each real edge consumes the next free slot at both endpoints;
        // the counters cover outgoing and incoming consumption together.
        let mut cursor = vec![0usize; self.n];
        for u in 0..self.n {
            for edge in &self.adj[u] {
                let from_slot = start[u] + cursor[u];
                cursor[u] += 1;
                let to_slot = start[edge.to] + cursor[edge.to];
                cursor[edge.to] += 1;
                graph.adj[from_slot].push(Edge {
                    to: to_slot,
                    weight: edge.weight,
                });
            }
        }

        debug!(
            original = self.n,
            transformed = total,
            "expanded graph to bounded degree"
        );

        TransformedGraph {
            graph,
            start,
            origin_of,
        }
    }
}

/// Bounded-degree expansion of a [`Graph`] plus the id mappings between
/// the two vertex spaces.
#[derive(Debug, Clone)]
pub struct TransformedGraph {
    /// The expanded graph; in- and out-degree are at most two everywhere.
    pub graph: Graph,
    /// First cycle slot owned by each original vertex.
    pub start: Vec<usize>,
    /// Owning original vertex of each transformed slot.
    pub origin_of: Vec<usize>,
}

impl TransformedGraph {
    /// Projects distances over transformed slots back onto the original
    /// vertices. Cycle edges are free, so the entry slot carries the
    /// vertex distance.
    pub fn map_distances(&self, dist: &[f64]) -> Vec<f64> {
        self.start.iter().map(|&slot| dist[slot]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassicDijkstra, UNREACHED};

    #[test]
    fn add_edge_validates_input() {
        let mut g = Graph::new(2);
        assert!(g.add_edge(0, 1, 1.5).is_ok());
        assert_eq!(
            g.add_edge(0, 2, 1.0),
            Err(SsspError::VertexOutOfRange {
                vertex: 2,
                vertices: 2
            })
        );
        assert_eq!(
            g.add_edge(2, 0, 1.0),
            Err(SsspError::VertexOutOfRange {
                vertex: 2,
                vertices: 2
            })
        );
        assert!(matches!(
            g.add_edge(0, 1, -1.0),
            Err(SsspError::NegativeWeight { .. })
        ));
        assert!(matches!(
            g.add_edge(0, 1, f64::NAN),
            Err(SsspError::NonFiniteWeight { .. })
        ));
        assert!(matches!(
            g.add_edge(0, 1, f64::INFINITY),
            Err(SsspError::NonFiniteWeight { .. })
        ));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn transform_bounds_degrees() {
        let mut g = Graph::new(6);
        for v in 1..=4 {
            g.add_edge(0, v, v as f64).unwrap();
        }
        g.add_edge(5, 0, 1.0).unwrap();

        let tg = g.to_constant_degree();
        // hub: 4 out + 1 in = 5 slots; leaves 1..=4: one slot each; 5: one.
        assert_eq!(tg.graph.n, 10);

        let mut in_degree = vec![0usize; tg.graph.n];
        for u in 0..tg.graph.n {
            assert!(tg.graph.adj[u].len() <= 2, "out-degree of slot {}", u);
            for edge in &tg.graph.adj[u] {
                in_degree[edge.to] += 1;
            }
        }
        assert!(in_degree.iter().all(|&d| d <= 2));

        for v in 0..g.n {
            assert_eq!(tg.origin_of[tg.start[v]], v);
        }
    }

    #[test]
    fn transform_counts_self_loops_and_parallel_edges() {
        let mut g = Graph::new(2);
        g.add_edge(0, 0, 1.0).unwrap();
        g.add_edge(0, 1, 2.0).unwrap();
        g.add_edge(0, 1, 3.0).unwrap();

        let tg = g.to_constant_degree();
        // vertex 0: 3 out + 1 in (its own loop) = 4 slots; vertex 1: 2.
        assert_eq!(tg.graph.n, 6);
        // one cycle edge per slot plus one edge per original edge
        assert_eq!(tg.graph.edge_count(), 6 + 3);
    }

    #[test]
    fn transform_preserves_shortest_distances() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1, 1.0).unwrap();
        g.add_edge(1, 2, 2.0).unwrap();
        g.add_edge(0, 2, 5.0).unwrap();
        g.add_edge(2, 3, 0.5).unwrap();

        let reference = ClassicDijkstra::new(g.clone()).solve(0).unwrap();
        let tg = g.to_constant_degree();
        let expanded = ClassicDijkstra::new(tg.graph.clone())
            .solve(tg.start[0])
            .unwrap();
        let mapped = tg.map_distances(&expanded);

        assert_eq!(mapped, reference);
    }

    #[test]
    fn map_distances_reads_cycle_entries() {
        let mut g = Graph::new(3);
        g.add_edge(0, 1, 1.0).unwrap();
        let tg = g.to_constant_degree();

        let mut dist = vec![UNREACHED; tg.graph.n];
        dist[tg.start[0]] = 0.0;
        dist[tg.start[1]] = 1.0;

        let mapped = tg.map_distances(&dist);
        assert_eq!(mapped, vec![0.0, 1.0, UNREACHED]);
    }
}
