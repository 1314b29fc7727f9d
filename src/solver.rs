//! Bounded multi-source shortest-path recursion.
//!
//! `run` seeds a single source and hands it to `bmssp`, which partitions
//! the frontier into distance bands. Each level pulls a band out of a
//! [`BlockSequence`], recurses one level down on it, relaxes the edges
//! of whatever the recursion settled, and routes every improved estimate
//! either back into the sequence (values still inside the level's band)
//! or into a batch prepend (values that fell below it). Level zero is a
//! bounded multi-source Dijkstra.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use tracing::{debug, trace};

use crate::blocks::{BlockSequence, Item};
use crate::error::{Result, SsspError};
use crate::graph::Graph;
use crate::{saturating_add, OrderedFloat, UNREACHED};

/// Tolerance when matching an edge against the shortest-path forest.
const FOREST_EPSILON: f64 = 1e-9;

/// Subtree-size marker for a vertex currently on the traversal stack.
const ON_STACK: isize = -1;

/// Exponent cap for the level-derived block capacity and budget.
const MAX_SHIFT: usize = 60;

/// Recursion driver. Borrows the graph, owns the distance vector.
pub struct Solver<'g> {
    graph: &'g Graph,
    dist: Vec<f64>,
    k: usize,
    t: usize,
    max_level: usize,
}

impl<'g> Solver<'g> {
    /// Derives the recursion parameters from the vertex count:
    /// k = max(2, ⌊(ln n)^(1/3)⌋), t = max(2, ⌊(ln n)^(2/3)⌋), and
    /// ⌈ln n / t⌉ recursion levels.
    pub fn new(graph: &'g Graph) -> Self {
        let log_n = (graph.n.max(1) as f64).ln();
        let k = (log_n.powf(1.0 / 3.0).floor() as usize).max(2);
        let t = (log_n.powf(2.0 / 3.0).floor() as usize).max(2);
        let max_level = (log_n / t as f64).ceil() as usize;

        Self {
            graph,
            dist: vec![UNREACHED; graph.n],
            k,
            t,
            max_level,
        }
    }

    /// Computes shortest distances from `source` to every vertex and
    /// returns a view of them. Unreached vertices read [`UNREACHED`].
    pub fn run(&mut self, source: usize) -> Result<&[f64]> {
        if self.graph.n == 0 {
            return Err(SsspError::EmptyGraph);
        }
        if source >= self.graph.n {
            return Err(SsspError::SourceOutOfRange {
                src_vertex: source,
                vertices: self.graph.n,
            });
        }

        debug!(
            vertices = self.graph.n,
            k = self.k,
            t = self.t,
            levels = self.max_level,
            "running bounded multi-source recursion"
        );

        self.dist.fill(UNREACHED);
        self.dist[source] = 0.0;
        self.bmssp(self.max_level, UNREACHED, vec![source]);
        self.verify_closure();
        Ok(&self.dist)
    }

    /// Distances computed by the last `run`, indexed by vertex id.
    pub fn distances(&self) -> &[f64] {
        &self.dist
    }

    /// One recursion level: returns the bound the level actually settled
    /// up to, and the vertices it settled.
    fn bmssp(&mut self, level: usize, bound: f64, sources: Vec<usize>) -> (f64, Vec<usize>) {
        if level == 0 {
            return self.base_case(bound, sources);
        }

        let (pivots, witnesses) = self.find_pivots(bound, &sources);
        if pivots.is_empty() {
            let settled = witnesses
                .iter()
                .copied()
                .filter(|&w| self.dist[w] < bound)
                .collect();
            return (bound, settled);
        }

        let m = 1usize << ((level - 1) * self.t).min(MAX_SHIFT);
        let budget = self
            .k
            .saturating_mul(1usize << (level * self.t).min(MAX_SHIFT));

        let mut queue = BlockSequence::new(m, bound);
        for &pivot in &pivots {
            queue.insert(pivot, self.dist[pivot]);
        }

        let graph = self.graph;
        let mut settled: HashSet<usize> = HashSet::new();
        while settled.len() < budget && !queue.is_empty() {
            let (pulled, band_bound) = queue.pull();
            let band_sources: Vec<usize> = pulled.iter().map(|item| item.key).collect();
            let (inner_bound, inner_settled) = self.bmssp(level - 1, band_bound, band_sources);

            settled.extend(inner_settled.iter().copied());

            // Route each improved estimate: values still inside this
            // level's band re-enter the sequence, values that fell below
            // the sub-band go into the batch. Vertices this frame has
            // already settled had their edges relaxed when they entered
            // the settled set; re-queueing them would only replay the
            // equal-value ties that zero-weight cycles produce.
            let mut batch: Vec<Item> = Vec::new();
            for &u in &inner_settled {
                for edge in &graph.adj[u] {
                    let candidate = saturating_add(self.dist[u], edge.weight);
                    if candidate > self.dist[edge.to] {
                        continue;
                    }
                    self.dist[edge.to] = candidate;
                    if settled.contains(&edge.to) {
                        continue;
                    }
                    if candidate >= band_bound && candidate < bound {
                        queue.insert(edge.to, candidate);
                    } else if candidate >= inner_bound && candidate < band_bound {
                        batch.push(Item {
                            key: edge.to,
                            value: candidate,
                        });
                    }
                }
            }
            for item in &pulled {
                let x = item.key;
                if !settled.contains(&x) && self.dist[x] >= inner_bound && self.dist[x] < band_bound
                {
                    batch.push(Item {
                        key: x,
                        value: self.dist[x],
                    });
                }
            }
            queue.batch_prepend(batch);

            if settled.len() > budget {
                let mut out: Vec<usize> = settled.iter().copied().collect();
                for &w in &witnesses {
                    if self.dist[w] < inner_bound && !settled.contains(&w) {
                        out.push(w);
                    }
                }
                return (inner_bound, out);
            }
        }

        let mut out: Vec<usize> = settled.iter().copied().collect();
        for &w in &witnesses {
            if self.dist[w] < bound && !settled.contains(&w) {
                out.push(w);
            }
        }
        (bound, out)
    }

    /// Level zero: bounded multi-source Dijkstra, settling at most k+1
    /// vertices below `bound`.
    fn base_case(&mut self, bound: f64, sources: Vec<usize>) -> (f64, Vec<usize>) {
        let graph = self.graph;
        let mut heap: BinaryHeap<Reverse<(OrderedFloat, usize)>> = BinaryHeap::new();
        let mut settled: HashSet<usize> = HashSet::new();
        let mut visited: HashSet<usize> = HashSet::new();
        for &x in &sources {
            settled.insert(x);
            heap.push(Reverse((OrderedFloat(self.dist[x]), x)));
        }

        let budget = self.k + 1;
        while settled.len() < budget {
            let Some(Reverse((OrderedFloat(key), u))) = heap.pop() else {
                break;
            };
            // Keys pop in non-decreasing order, so a vertex processed
            // once can only come back at an equal key; skipping the
            // re-pop drops no improvement and keeps zero-weight
            // self-cycles from replaying forever.
            if key > self.dist[u] || visited.contains(&u) {
                continue;
            }
            visited.insert(u);
            settled.insert(u);

            for edge in &graph.adj[u] {
                let candidate = saturating_add(self.dist[u], edge.weight);
                if candidate <= self.dist[edge.to] && candidate < bound {
                    self.dist[edge.to] = candidate;
                    heap.push(Reverse((OrderedFloat(candidate), edge.to)));
                }
            }
        }

        let vertices: Vec<usize> = settled.iter().copied().collect();
        if vertices.len() <= self.k {
            return (bound, vertices);
        }

        let cutoff = vertices.iter().map(|&u| self.dist[u]).fold(0.0f64, f64::max);
        let kept: Vec<usize> = vertices
            .iter()
            .copied()
            .filter(|&u| self.dist[u] < cutoff)
            .collect();
        if kept.is_empty() {
            // Uniform band: every settled vertex sits exactly at the cutoff.
            return (cutoff, vertices);
        }
        (cutoff, kept)
    }

    /// Runs k relaxation rounds from `sources`, collecting the witness
    /// set W, then keeps as pivots the sources whose shortest-path-forest
    /// subtree within W holds at least k vertices. Bails out early,
    /// promoting every source, once W outgrows k·|S|.
    fn find_pivots(&mut self, bound: f64, sources: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let graph = self.graph;
        let mut in_witness = vec![false; graph.n];
        for &x in sources {
            in_witness[x] = true;
        }
        let mut witnesses: Vec<usize> = sources.to_vec();
        let mut layer: Vec<usize> = sources.to_vec();

        for _ in 0..self.k {
            let mut next_layer = Vec::new();
            for &u in &layer {
                for edge in &graph.adj[u] {
                    let candidate = saturating_add(self.dist[u], edge.weight);
                    if candidate < self.dist[edge.to] {
                        self.dist[edge.to] = candidate;
                        if candidate < bound && !in_witness[edge.to] {
                            in_witness[edge.to] = true;
                            next_layer.push(edge.to);
                            witnesses.push(edge.to);
                        }
                    }
                }
            }
            if witnesses.len() > self.k * sources.len() {
                trace!(
                    witnesses = witnesses.len(),
                    sources = sources.len(),
                    "witness set outgrew the pivot budget, promoting every source"
                );
                return (sources.to_vec(), witnesses);
            }
            if next_layer.is_empty() {
                break;
            }
            layer = next_layer;
        }

        let mut sizes: Vec<isize> = vec![0; graph.n];
        let pivots = sources
            .iter()
            .copied()
            .filter(|&s| self.subtree_size(s, &in_witness, &mut sizes) >= self.k)
            .collect();
        (pivots, witnesses)
    }

    /// Size of the shortest-path-forest subtree rooted at `root` within
    /// the witness set. Each vertex moves through three states
    /// (unvisited, on-stack, computed); re-entering an on-stack vertex
    /// counts as one, so equality cycles produced by zero-weight edges
    /// terminate. Traversal uses an explicit stack.
    fn subtree_size(&self, root: usize, in_witness: &[bool], sizes: &mut [isize]) -> usize {
        if sizes[root] > 0 {
            return sizes[root] as usize;
        }
        if sizes[root] == ON_STACK {
            return 1;
        }

        struct Frame {
            vertex: usize,
            cursor: usize,
            acc: usize,
        }

        let graph = self.graph;
        sizes[root] = ON_STACK;
        let mut stack = vec![Frame {
            vertex: root,
            cursor: 0,
            acc: 1,
        }];

        loop {
            let Some(top) = stack.last_mut() else {
                break;
            };
            let u = top.vertex;
            if top.cursor < graph.adj[u].len() {
                let to = graph.adj[u][top.cursor].to;
                let weight = graph.adj[u][top.cursor].weight;
                top.cursor += 1;

                let in_forest = in_witness[to]
                    && (self.dist[to] - saturating_add(self.dist[u], weight)).abs()
                        < FOREST_EPSILON;
                if !in_forest {
                    continue;
                }
                if sizes[to] > 0 {
                    top.acc += sizes[to] as usize;
                } else if sizes[to] == ON_STACK {
                    top.acc += 1;
                } else {
                    sizes[to] = ON_STACK;
                    stack.push(Frame {
                        vertex: to,
                        cursor: 0,
                        acc: 1,
                    });
                }
                continue;
            }

            let finished = top.acc;
            let vertex = top.vertex;
            stack.pop();
            sizes[vertex] = finished as isize;
            if let Some(parent) = stack.last_mut() {
                parent.acc += finished;
            }
        }

        sizes[root].max(1) as usize
    }

    /// Read-only check, debug builds only: after the recursion returns,
    /// no edge may still admit an improving relaxation. Fails loudly
    /// instead of repairing anything.
    fn verify_closure(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        for u in 0..self.graph.n {
            if self.dist[u] == UNREACHED {
                continue;
            }
            for edge in &self.graph.adj[u] {
                let candidate = saturating_add(self.dist[u], edge.weight);
                assert!(
                    candidate >= self.dist[edge.to],
                    "edge {} -> {} still relaxes: {} + {} < {}",
                    u,
                    edge.to,
                    self.dist[u],
                    edge.weight,
                    self.dist[edge.to]
                );
            }
        }
    }
}
