// src/graph/adjacency.rs
//! Valued adjacency maps.
//!
//! A small graph container covering what the cohesion pipeline needs: add
//! nodes and edges, look up an edge value (with a default), iterate
//! neighbours, and transpose. Nodes keep insertion order; each node's
//! neighbours are kept ordered by node index so iteration is deterministic.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::error::{PrankError, Result};

/// Whether edges have a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Directed,
    Undirected,
}

/// Graph over nodes `N` whose edges carry values `W`.
#[derive(Debug, Clone)]
pub struct AdjacencyMap<N, W> {
    orientation: Orientation,
    allows_loops: bool,
    index: HashMap<N, usize>,
    nodes: Vec<N>,
    out: Vec<BTreeMap<usize, W>>,
    edge_count: usize,
}

/// Directed graph with valued arcs.
pub type DiGraph<N, W = ()> = AdjacencyMap<N, W>;
/// Undirected graph with valued edges.
pub type UnGraph<N, W = ()> = AdjacencyMap<N, W>;

impl<N, W> AdjacencyMap<N, W>
where
    N: Eq + Hash + Clone,
{
    #[must_use]
    pub fn directed(allows_loops: bool) -> Self {
        Self::with_orientation(Orientation::Directed, allows_loops)
    }

    #[must_use]
    pub fn undirected(allows_loops: bool) -> Self {
        Self::with_orientation(Orientation::Undirected, allows_loops)
    }

    fn with_orientation(orientation: Orientation, allows_loops: bool) -> Self {
        Self {
            orientation,
            allows_loops,
            index: HashMap::new(),
            nodes: Vec::new(),
            out: Vec::new(),
            edge_count: 0,
        }
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[must_use]
    pub fn is_directed(&self) -> bool {
        self.orientation == Orientation::Directed
    }

    #[must_use]
    pub fn allows_loops(&self) -> bool {
        self.allows_loops
    }

    /// Adds a node if absent and returns its index.
    pub fn add_node(&mut self, node: N) -> usize {
        if let Some(&i) = self.index.get(&node) {
            return i;
        }
        let i = self.nodes.len();
        self.index.insert(node.clone(), i);
        self.nodes.push(node);
        self.out.push(BTreeMap::new());
        i
    }

    /// Inserts or replaces the edge `from -> to`, adding missing endpoints.
    /// Returns the previous value, if any.
    ///
    /// # Errors
    /// Returns `SelfLoop` when `from == to` and the graph forbids loops.
    pub fn put_edge(&mut self, from: N, to: N, value: W) -> Result<Option<W>>
    where
        W: Clone,
    {
        if !self.allows_loops && from == to {
            return Err(PrankError::SelfLoop);
        }
        let a = self.add_node(from);
        let b = self.add_node(to);
        Ok(self.put_edge_by_index(a, b, value))
    }

    #[allow(clippy::indexing_slicing)] // Guarded: indices come from add_node
    fn put_edge_by_index(&mut self, a: usize, b: usize, value: W) -> Option<W>
    where
        W: Clone,
    {
        if self.orientation == Orientation::Undirected && a != b {
            self.out[b].insert(a, value.clone());
        }
        let previous = self.out[a].insert(b, value);
        if previous.is_none() {
            self.edge_count += 1;
        }
        previous
    }

    #[must_use]
    pub fn contains(&self, node: &N) -> bool {
        self.index.contains_key(node)
    }

    #[must_use]
    pub fn node_index(&self, node: &N) -> Option<usize> {
        self.index.get(node).copied()
    }

    #[must_use]
    pub fn node_at(&self, index: usize) -> Option<&N> {
        self.nodes.get(index)
    }

    /// Nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges; an undirected edge counts once.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn edge_value(&self, from: &N, to: &N) -> Option<&W> {
        let a = self.node_index(from)?;
        let b = self.node_index(to)?;
        self.out.get(a)?.get(&b)
    }

    /// Edge value, or `default` when the edge is absent.
    #[must_use]
    pub fn edge_value_or(&self, from: &N, to: &N, default: W) -> W
    where
        W: Copy,
    {
        self.edge_value(from, to).copied().unwrap_or(default)
    }

    #[must_use]
    pub fn has_edge(&self, from: &N, to: &N) -> bool {
        self.edge_value(from, to).is_some()
    }

    /// Out-neighbours (or neighbours, if undirected) with edge values.
    pub fn successors<'a>(&'a self, node: &N) -> impl Iterator<Item = (&'a N, &'a W)> + 'a {
        let row = self.node_index(node).and_then(|i| self.out.get(i));
        row.into_iter()
            .flat_map(|r| r.iter())
            .filter_map(move |(&j, w)| self.nodes.get(j).map(|n| (n, w)))
    }

    /// Number of incident edges at `node` (out-degree when directed).
    #[must_use]
    pub fn degree(&self, node: &N) -> usize {
        self.node_index(node)
            .and_then(|i| self.out.get(i))
            .map_or(0, BTreeMap::len)
    }

    /// Neighbour indices of the node at `index`.
    pub fn successor_indices(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.out.get(index).into_iter().flat_map(|r| r.keys().copied())
    }

    /// Every edge once as `(source, target, value)`.
    /// Undirected edges are reported with the lower node index first.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N, &W)> + '_ {
        let undirected = self.orientation == Orientation::Undirected;
        self.out.iter().enumerate().flat_map(move |(a, row)| {
            row.iter()
                .filter(move |&(&b, _)| !undirected || a <= b)
                .filter_map(move |(&b, w)| {
                    let from = self.nodes.get(a)?;
                    let to = self.nodes.get(b)?;
                    Some((from, to, w))
                })
        })
    }

    /// Graph with every arc reversed. An undirected graph is its own transpose.
    #[must_use]
    pub fn transpose(&self) -> Self
    where
        W: Clone,
    {
        if self.orientation == Orientation::Undirected {
            return self.clone();
        }
        let mut out: Vec<BTreeMap<usize, W>> = vec![BTreeMap::new(); self.nodes.len()];
        for (a, row) in self.out.iter().enumerate() {
            for (&b, w) in row {
                if let Some(target) = out.get_mut(b) {
                    target.insert(a, w.clone());
                }
            }
        }
        Self {
            orientation: self.orientation,
            allows_loops: self.allows_loops,
            index: self.index.clone(),
            nodes: self.nodes.clone(),
            out,
            edge_count: self.edge_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directed_edges_are_one_way() {
        let mut g: DiGraph<&str, f64> = DiGraph::directed(false);
        g.put_edge("a", "b", 1.5).unwrap();
        assert!(g.has_edge(&"a", &"b"));
        assert!(!g.has_edge(&"b", &"a"));
        assert_eq!(g.edge_value_or(&"b", &"a", 0.0), 0.0);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_undirected_edges_count_once() {
        let mut g: UnGraph<u32, u32> = UnGraph::undirected(false);
        g.put_edge(1, 2, 7).unwrap();
        assert_eq!(g.put_edge(2, 1, 7).unwrap(), Some(7));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edges().count(), 1);
        assert_eq!(g.degree(&1), 1);
        assert_eq!(g.degree(&2), 1);
    }

    #[test]
    fn test_loops_rejected_unless_allowed() {
        let mut strict: DiGraph<u8> = DiGraph::directed(false);
        assert!(matches!(strict.put_edge(1, 1, ()), Err(PrankError::SelfLoop)));

        let mut loose: DiGraph<u8, f64> = DiGraph::directed(true);
        loose.put_edge(1, 1, 2.0).unwrap();
        assert_eq!(loose.edge_value(&1, &1), Some(&2.0));
    }

    #[test]
    fn test_transpose_reverses_arcs() {
        let mut g: DiGraph<char> = DiGraph::directed(false);
        g.put_edge('a', 'b', ()).unwrap();
        g.put_edge('b', 'c', ()).unwrap();
        let t = g.transpose();
        assert!(t.has_edge(&'b', &'a'));
        assert!(t.has_edge(&'c', &'b'));
        assert!(!t.has_edge(&'a', &'b'));
        assert_eq!(t.edge_count(), 2);
    }

    #[test]
    fn test_isolated_nodes_keep_insertion_order() {
        let mut g: DiGraph<u32> = DiGraph::directed(false);
        g.add_node(30);
        g.add_node(10);
        g.add_node(30);
        assert_eq!(g.nodes(), &[30, 10]);
        assert_eq!(g.successors(&10).count(), 0);
    }
}
