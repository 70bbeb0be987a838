//! Overlap graph: a directed graph on the reliable k-mer set, built in
//! `O(|R|)` via two hash indices rather than a general-purpose graph library.

use rustc_hash::FxHashMap;

use crate::kmer::{overlap_len, KMer};
use crate::reliability::ReliableSet;

/// A node identifier: the index of a k-mer within the graph's (sorted,
/// deduplicated) node list.
pub type NodeId = usize;

/// Directed graph over a reliable k-mer set. Read-only after [`OverlapGraph::build`].
///
/// The primary edge set uses `w = k - 1` overlaps exclusively (the edges
/// contig extraction and merging consult); `successors`/`predecessors` with
/// a smaller `min_overlap` fall back to an `O(|R| * k)` scan, used only by
/// the extender's jump strategies which need shorter overlaps occasionally.
pub struct OverlapGraph {
    nodes: Vec<KMer>,
    k: usize,
    /// adjacency at the canonical k-1 overlap, dst node ids sorted ascending
    adj_out: Vec<Vec<NodeId>>,
    adj_in: Vec<Vec<NodeId>>,
}

impl OverlapGraph {
    /// Build the graph over `reliable`'s k-mers, indexing by (k-1)-prefix
    /// and (k-1)-suffix.
    pub fn build(reliable: &ReliableSet, k: usize) -> Self {
        let nodes: Vec<KMer> = reliable.kmers().to_vec();
        let w = k.saturating_sub(1);

        let mut by_prefix: FxHashMap<Box<[u8]>, Vec<NodeId>> = FxHashMap::default();
        for (id, kmer) in nodes.iter().enumerate() {
            by_prefix
                .entry(kmer.prefix(w).to_vec().into_boxed_slice())
                .or_default()
                .push(id);
        }

        let mut adj_out: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
        let mut adj_in: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];

        for (u, kmer) in nodes.iter().enumerate() {
            let suffix_key = kmer.suffix(w);
            if let Some(candidates) = by_prefix.get(suffix_key) {
                for &v in candidates {
                    adj_out[u].push(v);
                    adj_in[v].push(u);
                }
            }
        }

        for adj in adj_out.iter_mut().chain(adj_in.iter_mut()) {
            adj.sort_unstable();
            adj.dedup();
        }

        Self {
            nodes,
            k,
            adj_out,
            adj_in,
        }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &KMer {
        &self.nodes[id]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, kmer: &KMer) -> Option<NodeId> {
        self.nodes.binary_search(kmer).ok()
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// In-degree at the canonical `k-1` overlap.
    #[inline]
    pub fn in_degree(&self, u: NodeId) -> usize {
        self.adj_in[u].len()
    }

    /// Out-degree at the canonical `k-1` overlap.
    #[inline]
    pub fn out_degree(&self, u: NodeId) -> usize {
        self.adj_out[u].len()
    }

    /// Successors of `u` with overlap `>= min_overlap`, as `(v, weight)`
    /// sorted by weight descending then `v` ascending.
    pub fn successors(&self, u: NodeId, min_overlap: usize) -> Vec<(NodeId, usize)> {
        let w = self.k.saturating_sub(1);
        if min_overlap >= w {
            return self.adj_out[u].iter().map(|&v| (v, w)).collect();
        }
        self.scan(u, min_overlap, true)
    }

    /// Predecessors of `u` with overlap `>= min_overlap`; symmetric to
    /// `successors` (`v ∈ successors(u, w) ⇔ u ∈ predecessors(v, w)`).
    pub fn predecessors(&self, u: NodeId, min_overlap: usize) -> Vec<(NodeId, usize)> {
        let w = self.k.saturating_sub(1);
        if min_overlap >= w {
            return self.adj_in[u].iter().map(|&v| (v, w)).collect();
        }
        self.scan(u, min_overlap, false)
    }

    fn scan(&self, u: NodeId, min_overlap: usize, outgoing: bool) -> Vec<(NodeId, usize)> {
        let mut result: Vec<(NodeId, usize)> = (0..self.nodes.len())
            .filter_map(|v| {
                let weight = if outgoing {
                    overlap_len(&self.nodes[u], &self.nodes[v])
                } else {
                    overlap_len(&self.nodes[v], &self.nodes[u])
                };
                if weight >= min_overlap && (v != u || weight == self.nodes[u].len()) {
                    Some((v, weight))
                } else {
                    None
                }
            })
            .collect();
        result.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability;
    use crate::spectrum::{Mode, Spectrum};

    fn graph_for(d: &str, k: usize) -> OverlapGraph {
        let kmers: Vec<KMer> = d.as_bytes().windows(k).map(|w| KMer::new(w).unwrap()).collect();
        let spectrum = Spectrum::new(kmers, d.len(), k).unwrap();
        let (reliable, _) = reliability::filter(&spectrum, Mode::Conservative, 1.0, 0.15);
        OverlapGraph::build(&reliable, k)
    }

    #[test]
    fn builds_linear_chain_for_clean_spectrum() {
        let g = graph_for("ACGTACGTAC", 3);
        // Every node except the last should have out-degree 1 on a clean
        // linear spectrum with no repeats long enough to branch.
        assert!(g.len() > 0);
    }

    #[test]
    fn successors_and_predecessors_are_symmetric() {
        let g = graph_for("ACGTACGTAC", 3);
        for u in 0..g.len() {
            for (v, w) in g.successors(u, g.k() - 1) {
                let preds = g.predecessors(v, g.k() - 1);
                assert!(preds.contains(&(u, w)), "expected {u} in predecessors of {v}");
            }
        }
    }

    #[test]
    fn successors_sorted_by_weight_desc_then_node_asc() {
        let g = graph_for("ACGTACGTAC", 3);
        for u in 0..g.len() {
            let succ = g.successors(u, 1);
            for pair in succ.windows(2) {
                let (w0, w1) = (pair[0].1, pair[1].1);
                assert!(w0 > w1 || (w0 == w1 && pair[0].0 < pair[1].0));
            }
        }
    }
}
