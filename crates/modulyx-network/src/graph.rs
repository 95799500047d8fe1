//! Weighted undirected protein interaction graph.

use std::collections::HashMap;

use modulyx_common::entities::Edge;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::debug;

/// Undirected graph keyed by protein identifier.
///
/// Node indices follow first appearance in the edge list, so the same edges in
/// the same order always produce the same adjacency matrix.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    graph: UnGraph<String, f64>,
    index: HashMap<String, NodeIndex>,
}

impl InteractionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from retained edges.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Self {
        let mut g = Self::new();
        for edge in edges {
            g.add_edge(&edge.protein_a, &edge.protein_b, edge.combined_score);
        }
        g
    }

    fn node(&mut self, protein: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(protein) {
            return idx;
        }
        let idx = self.graph.add_node(protein.to_string());
        self.index.insert(protein.to_string(), idx);
        idx
    }

    /// Insert or overwrite the edge between `a` and `b`. Self-loops are ignored.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: f64) {
        if a == b {
            debug!(protein = a, "Ignoring self-loop");
            return;
        }
        let ia = self.node(a);
        let ib = self.node(b);
        // Repeated pairs keep the last weight
        self.graph.update_edge(ia, ib, weight);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Protein identifiers in node-index order.
    pub fn nodes(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|i| self.graph[i].as_str())
            .collect()
    }

    pub fn node_name(&self, index: usize) -> Option<&str> {
        self.graph
            .node_weight(NodeIndex::new(index))
            .map(String::as_str)
    }

    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        let ia = *self.index.get(a)?;
        let ib = *self.index.get(b)?;
        self.graph
            .find_edge(ia, ib)
            .and_then(|e| self.graph.edge_weight(e))
            .copied()
    }

    /// Dense symmetric weight matrix in node-index order.
    pub fn adjacency_matrix(&self) -> Vec<Vec<f64>> {
        let n = self.graph.node_count();
        let mut matrix = vec![vec![0.0; n]; n];
        for edge in self.graph.edge_references() {
            let (i, j) = (edge.source().index(), edge.target().index());
            matrix[i][j] = *edge.weight();
            matrix[j][i] = *edge.weight();
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: &str, b: &str, s: f64) -> Edge {
        Edge { protein_a: a.into(), protein_b: b.into(), combined_score: s }
    }

    #[test]
    fn test_node_order_is_first_appearance() {
        let g = InteractionGraph::from_edges(&[edge("c", "a", 0.5), edge("a", "b", 0.7)]);
        assert_eq!(g.nodes(), vec!["c", "a", "b"]);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn test_duplicate_pair_keeps_last_weight() {
        let g = InteractionGraph::from_edges(&[edge("a", "b", 0.5), edge("b", "a", 0.9)]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.weight("a", "b"), Some(0.9));
    }

    #[test]
    fn test_self_loops_dropped() {
        let g = InteractionGraph::from_edges(&[edge("a", "a", 0.9)]);
        assert!(g.is_empty());
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let g = InteractionGraph::from_edges(&[edge("a", "b", 0.5), edge("b", "c", 0.7)]);
        let m = g.adjacency_matrix();
        assert_eq!(m[0][1], 0.5);
        assert_eq!(m[1][0], 0.5);
        assert_eq!(m[2][1], 0.7);
        assert_eq!(m[0][2], 0.0);
    }
}
