//! Contig extraction: maximal non-branching walks ("unitigs") over the
//! `k-1`-overlap subgraph.

use rustc_hash::FxHashSet;

use crate::graph::{NodeId, OverlapGraph};

/// A contig produced by walking a non-branching path in the overlap graph.
#[derive(Debug, Clone)]
pub struct Contig {
    pub sequence: String,
    pub nodes: Vec<NodeId>,
    pub circular: bool,
}

impl Contig {
    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Extract every contig from `graph`. Each node appears in exactly one
/// contig. Output is sorted by length descending,
/// then lexicographically.
pub fn extract(graph: &OverlapGraph) -> Vec<Contig> {
    let n = graph.len();
    let mut visited = vec![false; n];
    let mut contigs = Vec::new();

    // Linear walks: start at any node whose in-degree != 1.
    let mut starts: Vec<NodeId> = (0..n).filter(|&u| graph.in_degree(u) != 1).collect();
    starts.sort_unstable();

    for start in starts {
        if visited[start] {
            continue;
        }
        let path = walk_forward(graph, start, &mut visited);
        contigs.push(build_contig(graph, path, false));
    }

    // Whatever remains is interior-degree-1 everywhere: pure cycles.
    let mut cycle_nodes: FxHashSet<NodeId> = (0..n).filter(|&u| !visited[u]).collect();
    while let Some(&seed) = cycle_nodes.iter().min() {
        let cycle = collect_cycle(graph, seed, &mut visited);
        for &node in &cycle {
            cycle_nodes.remove(&node);
        }
        contigs.push(build_contig(graph, cycle, true));
    }

    contigs.sort_by(|a, b| b.len().cmp(&a.len()).then(a.sequence.cmp(&b.sequence)));
    contigs
}

/// Walk forward from `start` while the current node has out-degree 1 and
/// its successor has in-degree 1; marks every visited node along the way.
fn walk_forward(graph: &OverlapGraph, start: NodeId, visited: &mut [bool]) -> Vec<NodeId> {
    let mut path = vec![start];
    visited[start] = true;
    let mut current = start;
    let w = graph.k().saturating_sub(1);

    loop {
        if graph.out_degree(current) != 1 {
            break;
        }
        let (next, _) = graph.successors(current, w)[0];
        if visited[next] || graph.in_degree(next) != 1 {
            break;
        }
        path.push(next);
        visited[next] = true;
        current = next;
    }
    path
}

/// Walk a pure cycle (every node has in-degree 1 and out-degree 1), opened
/// at its lexicographically minimal node and truncated back at that node.
fn collect_cycle(graph: &OverlapGraph, seed: NodeId, visited: &mut [bool]) -> Vec<NodeId> {
    let w = graph.k().saturating_sub(1);
    let mut path = vec![seed];
    visited[seed] = true;
    let mut current = seed;
    loop {
        let (next, _) = graph.successors(current, w)[0];
        if next == seed {
            break;
        }
        path.push(next);
        visited[next] = true;
        current = next;
    }
    path
}

fn build_contig(graph: &OverlapGraph, nodes: Vec<NodeId>, circular: bool) -> Contig {
    let mut sequence = graph.node(nodes[0]).as_str().to_string();
    for &node in &nodes[1..] {
        let kmer = graph.node(node);
        sequence.push_str(kmer.suffix(1).iter().map(|&b| b as char).collect::<String>().as_str());
    }
    Contig {
        sequence,
        nodes,
        circular,
    }
}
