// src/graph/components.rs
//! Strongly connected components via Kosaraju's algorithm.
//!
//! Both depth-first passes use an explicit stack, so deep graphs don't
//! overflow the call stack.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use super::adjacency::{AdjacencyMap, DiGraph};
use crate::error::{PrankError, Result};

/// The condensation of a directed graph: one node per strong component,
/// with an arc between two components whenever some member of the first has
/// an arc to some member of the second.
#[derive(Debug, Clone)]
pub struct Condensation<N> {
    components: Vec<Vec<N>>,
    membership: HashMap<N, usize>,
    graph: DiGraph<usize>,
}

impl<N> Condensation<N>
where
    N: Eq + Hash + Clone,
{
    /// Components in discovery order. Members keep the input graph's node order.
    #[must_use]
    pub fn components(&self) -> &[Vec<N>] {
        &self.components
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Index of the component holding `node`.
    #[must_use]
    pub fn component_of(&self, node: &N) -> Option<usize> {
        self.membership.get(node).copied()
    }

    #[must_use]
    pub fn members(&self, component: usize) -> Option<&[N]> {
        self.components.get(component).map(Vec::as_slice)
    }

    #[must_use]
    pub fn same_component(&self, a: &N, b: &N) -> bool {
        match (self.component_of(a), self.component_of(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Reachability between components, keyed by component index.
    #[must_use]
    pub fn graph(&self) -> &DiGraph<usize> {
        &self.graph
    }

    /// Number of components holding exactly one node.
    #[must_use]
    pub fn singleton_count(&self) -> usize {
        self.components.iter().filter(|c| c.len() == 1).count()
    }

    /// Component size -> number of components of that size.
    #[must_use]
    pub fn size_tally(&self) -> BTreeMap<usize, usize> {
        let mut tally = BTreeMap::new();
        for c in &self.components {
            *tally.entry(c.len()).or_insert(0) += 1;
        }
        tally
    }
}

/// Computes the strong components of `graph` and their condensation.
///
/// Undirected graphs are treated as symmetric digraphs, which yields their
/// connected components.
///
/// # Errors
/// Returns `EmptyGraph` when the graph has no nodes. A graph with nodes but
/// no edges is valid and yields one singleton component per node.
pub fn strongly_connected_components<N, W>(graph: &AdjacencyMap<N, W>) -> Result<Condensation<N>>
where
    N: Eq + Hash + Clone,
{
    if graph.is_empty() {
        return Err(PrankError::EmptyGraph);
    }

    let forward = index_adjacency(graph);
    let order = reverse_postorder(&forward);
    let backward = transpose_adjacency(&forward);

    let mut assigned: Vec<Option<usize>> = vec![None; forward.len()];
    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut condensation: DiGraph<usize> = DiGraph::directed(false);

    for root in order {
        if assigned.get(root).copied().flatten().is_some() {
            continue;
        }
        let id = components.len();
        condensation.add_node(id);
        let (members, hits) = collect_component(root, id, &backward, &mut assigned);
        for earlier in hits {
            // Transposed arc member -> v means v -> member in the original graph.
            condensation.put_edge(earlier, id, ())?;
        }
        components.push(members);
    }

    Ok(materialize(graph, components, condensation))
}

/// Neighbour lists by node index.
fn index_adjacency<N, W>(graph: &AdjacencyMap<N, W>) -> Vec<Vec<usize>>
where
    N: Eq + Hash + Clone,
{
    (0..graph.node_count())
        .map(|i| graph.successor_indices(i).collect())
        .collect()
}

fn transpose_adjacency(forward: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut backward = vec![Vec::new(); forward.len()];
    for (a, targets) in forward.iter().enumerate() {
        for &b in targets {
            if let Some(row) = backward.get_mut(b) {
                row.push(a);
            }
        }
    }
    backward
}

/// Finish order of an iterative depth-first search, reversed.
fn reverse_postorder(adjacency: &[Vec<usize>]) -> Vec<usize> {
    let n = adjacency.len();
    let mut visited = vec![false; n];
    let mut finished = Vec::with_capacity(n);
    // (node, position of the next neighbour to examine)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start in 0..n {
        if visited.get(start).copied().unwrap_or(true) {
            continue;
        }
        mark(&mut visited, start);
        stack.push((start, 0));

        while let Some(top) = stack.last_mut() {
            let (node, cursor) = *top;
            let next = adjacency.get(node).and_then(|row| row.get(cursor)).copied();
            match next {
                Some(neighbor) => {
                    top.1 += 1;
                    if !visited.get(neighbor).copied().unwrap_or(true) {
                        mark(&mut visited, neighbor);
                        stack.push((neighbor, 0));
                    }
                }
                None => {
                    finished.push(node);
                    stack.pop();
                }
            }
        }
    }

    finished.reverse();
    finished
}

fn mark(visited: &mut [bool], node: usize) {
    if let Some(v) = visited.get_mut(node) {
        *v = true;
    }
}

/// Collects every unassigned node reachable from `root` in the transposed
/// graph, tagging them with `id`. Also returns the ids of earlier components
/// touched along the way.
fn collect_component(
    root: usize,
    id: usize,
    backward: &[Vec<usize>],
    assigned: &mut [Option<usize>],
) -> (Vec<usize>, Vec<usize>) {
    let mut members = Vec::new();
    let mut hits = Vec::new();
    let mut stack = vec![root];
    if let Some(slot) = assigned.get_mut(root) {
        *slot = Some(id);
    }

    while let Some(node) = stack.pop() {
        members.push(node);
        for &pred in backward.get(node).map_or(&[][..], Vec::as_slice) {
            match assigned.get(pred).copied().flatten() {
                None => {
                    if let Some(slot) = assigned.get_mut(pred) {
                        *slot = Some(id);
                    }
                    stack.push(pred);
                }
                Some(other) if other != id => hits.push(other),
                Some(_) => {}
            }
        }
    }

    members.sort_unstable();
    hits.sort_unstable();
    hits.dedup();
    (members, hits)
}

fn materialize<N, W>(
    graph: &AdjacencyMap<N, W>,
    components: Vec<Vec<usize>>,
    condensation: DiGraph<usize>,
) -> Condensation<N>
where
    N: Eq + Hash + Clone,
{
    let mut membership = HashMap::with_capacity(graph.node_count());
    let components: Vec<Vec<N>> = components
        .into_iter()
        .enumerate()
        .map(|(id, indices)| {
            indices
                .into_iter()
                .filter_map(|i| graph.node_at(i).cloned())
                .inspect(|node| {
                    membership.insert(node.clone(), id);
                })
                .collect()
        })
        .collect();

    Condensation {
        components,
        membership,
        graph: condensation,
    }
}
