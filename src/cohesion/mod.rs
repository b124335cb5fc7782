// src/cohesion/mod.rs
//! Cohesion between points, derived from a frozen friend graph.
//!
//! [`FocusStatistics`] counts K-focus sizes per friend edge. From those,
//! every point scores its friends and itself, giving a directed cohesion
//! graph with self-loops. An arc survives into the cluster graph when both
//! directions score above the empirical mean cohesion; its strong components
//! are the clusters.
//!
//! Scores are on the unnormalised `(n - 1) * cohesion` scale.

pub mod focus;
mod score;

pub use focus::FocusStatistics;

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::descent::KnnDescent;
use crate::error::{PrankError, Result};
use crate::graph::{strongly_connected_components, Condensation, DiGraph, UnGraph};
use crate::ranking::RankingSystem;

/// Cohesion and cluster graphs over one frozen friend graph.
#[derive(Debug, Clone)]
pub struct CohesionGraph<V> {
    focus: FocusStatistics<V>,
    cohesion: DiGraph<V, f64>,
    cluster: DiGraph<V>,
    empirical_mean_cohesion: f64,
    theoretical_mean_cohesion: f64,
}

impl<V> CohesionGraph<V>
where
    V: Eq + Hash + Clone + Send + Sync,
{
    /// Builds every derived graph from `(point, friends)` pairs, friends
    /// best first. Points keep the order given.
    ///
    /// # Errors
    /// Returns `EmptyGraph` for no points, `UnknownPoint` if a friend is not
    /// itself listed, `SelfLoop` if a point lists itself, and `DuplicatePoint`
    /// if a point or a friend within one list repeats.
    pub fn build<I>(lists: I) -> Result<Self>
    where
        I: IntoIterator<Item = (V, Vec<V>)>,
    {
        let focus = FocusStatistics::new(lists)?;
        Self::from_focus(focus)
    }

    /// Builds from the current friend sets of a descent.
    ///
    /// # Errors
    /// See [`Self::build`]; a descent always yields valid input.
    pub fn from_descent<R>(descent: &KnnDescent<V, R>) -> Result<Self>
    where
        R: RankingSystem<V>,
    {
        Self::build(descent.friend_lists())
    }

    /// Scores every point against its friends and itself, then thresholds.
    ///
    /// # Errors
    /// Propagates graph insertion failures, which indicate malformed input.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_focus(focus: FocusStatistics<V>) -> Result<Self> {
        let start = Instant::now();
        let n = focus.point_count();

        let rows: Vec<Vec<(usize, f64)>> = (0..n)
            .into_par_iter()
            .map(|x| score::point_scores(&focus, x))
            .collect();

        let mut cohesion = DiGraph::directed(true);
        for p in focus.points() {
            cohesion.add_node(p.clone());
        }
        let mut diagonal_sum = 0.0;
        for (x, row) in rows.into_iter().enumerate() {
            let Some(px) = focus.points().get(x) else { continue };
            for (y, score) in row {
                let Some(py) = focus.points().get(y) else { continue };
                if x == y {
                    diagonal_sum += score;
                }
                cohesion.put_edge(px.clone(), py.clone(), score)?;
            }
        }
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            arcs = cohesion.edge_count(),
            "cohesion graph built"
        );

        let n_f = n as f64;
        let empirical_mean_cohesion = 0.5 * diagonal_sum / n_f;
        let theoretical_mean_cohesion = theoretical_threshold(
            n,
            focus.mutual_reciprocal_sum(),
            focus.mutual_pair_count(),
        );
        info!(
            empirical = empirical_mean_cohesion,
            theoretical = theoretical_mean_cohesion,
            "mean cohesion"
        );

        let cluster = cluster_graph(&cohesion, empirical_mean_cohesion)?;

        Ok(Self {
            focus,
            cohesion,
            cluster,
            empirical_mean_cohesion,
            theoretical_mean_cohesion,
        })
    }

    #[must_use]
    pub fn focus_statistics(&self) -> &FocusStatistics<V> {
        &self.focus
    }

    #[must_use]
    pub fn focus_graph(&self) -> &UnGraph<V, usize> {
        self.focus.focus_graph()
    }

    #[must_use]
    pub fn mutual_friend_graph(&self) -> &UnGraph<V> {
        self.focus.mutual_friend_graph()
    }

    /// Directed, with self-loops: `x -> y` for each friend `y` of `x`, and `x -> x`.
    #[must_use]
    pub fn cohesion_graph(&self) -> &DiGraph<V, f64> {
        &self.cohesion
    }

    /// Unnormalised cohesion `D(x, y)`, if the arc exists.
    #[must_use]
    pub fn cohesion(&self, x: &V, y: &V) -> Option<f64> {
        self.cohesion.edge_value(x, y).copied()
    }

    /// `D(x, y) / (n - 1)`, a value in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn normalized_cohesion(&self, x: &V, y: &V) -> Option<f64> {
        let scale = self.point_count().saturating_sub(1).max(1) as f64;
        self.cohesion(x, y).map(|d| d / scale)
    }

    /// Half the mean self-cohesion; the cluster threshold.
    #[must_use]
    pub fn empirical_mean_cohesion(&self) -> f64 {
        self.empirical_mean_cohesion
    }

    /// `0.5 + (S - 0.5) / n - M / n^2`, with `S` the reciprocal focus sum over
    /// the `M` mutual-friend pairs. Reported for comparison only.
    #[must_use]
    pub fn theoretical_mean_cohesion(&self) -> f64 {
        self.theoretical_mean_cohesion
    }

    /// Directed, no loops, every point present as a node.
    #[must_use]
    pub fn cluster_graph(&self) -> &DiGraph<V> {
        &self.cluster
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.focus.point_count()
    }

    /// Strong components of the cluster graph.
    ///
    /// # Errors
    /// Returns `EmptyGraph` only if there are no points, which `build` rejects.
    pub fn components(&self) -> Result<Condensation<V>> {
        strongly_connected_components(&self.cluster)
    }

    /// Sub-graph of the cohesion graph reachable from `x` in at most `depth`
    /// steps, keeping the cohesion weights.
    ///
    /// # Errors
    /// Returns `UnknownPoint` if `x` is not a point of this graph.
    pub fn neighborhood(&self, x: &V, depth: usize) -> Result<DiGraph<V, f64>> {
        if !self.cohesion.contains(x) {
            return Err(PrankError::UnknownPoint);
        }
        let mut out = DiGraph::directed(true);
        out.add_node(x.clone());
        let mut seen: HashSet<&V> = HashSet::from([x]);
        let mut queue: VecDeque<(&V, usize)> = VecDeque::from([(x, 0)]);

        while let Some((node, hops)) = queue.pop_front() {
            if hops == depth {
                continue;
            }
            for (next, &weight) in self.cohesion.successors(node) {
                out.put_edge(node.clone(), next.clone(), weight)?;
                if seen.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }
        Ok(out)
    }
}

/// `tau = 0.5 + (S - 0.5) / n - M / n^2`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn theoretical_threshold(n: usize, reciprocal_sum: f64, mutual_pairs: usize) -> f64 {
    if n == 0 {
        return 0.5;
    }
    let n = n as f64;
    0.5 + (reciprocal_sum - 0.5) / n - mutual_pairs as f64 / (n * n)
}

/// Keeps `x -> y` (`x != y`) when both `D(x, y)` and `D(y, x)` exceed
/// `threshold`. A missing reverse arc scores 0.
fn cluster_graph<V>(cohesion: &DiGraph<V, f64>, threshold: f64) -> Result<DiGraph<V>>
where
    V: Eq + Hash + Clone,
{
    let start = Instant::now();
    let mut cluster = DiGraph::directed(false);
    for p in cohesion.nodes() {
        cluster.add_node(p.clone());
    }
    for (x, y, &forward) in cohesion.edges() {
        if x == y {
            continue;
        }
        let backward = cohesion.edge_value_or(y, x, 0.0);
        if forward.min(backward) > threshold {
            cluster.put_edge(x.clone(), y.clone(), ())?;
        }
    }

    if cluster.edge_count() == 0 {
        info!("cluster graph has no edges; every point is its own cluster");
    }
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        edges = cluster.edge_count(),
        "cluster graph built"
    );
    Ok(cluster)
}
