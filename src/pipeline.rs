// src/pipeline.rs
//! End-to-end clustering: descent, cohesion, then strong components.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::cohesion::CohesionGraph;
use crate::config::DescentConfig;
use crate::descent::{DescentReport, KnnDescent, SummaryStats};
use crate::error::Result;
use crate::graph::Condensation;
use crate::random::RandomContext;
use crate::ranking::RankingSystem;

/// Runs the three stages with one descent configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: DescentConfig,
}

impl Pipeline {
    /// # Errors
    /// Returns the configuration's validation error.
    pub fn new(config: DescentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &DescentConfig {
        &self.config
    }

    /// Clusters `points` under `ranking`.
    ///
    /// # Errors
    /// Returns `InvalidNeighborCount` or `TooFewPoints` from descent setup.
    pub fn run<V, R>(&self, points: Vec<V>, ranking: R) -> Result<ClusterRun<V>>
    where
        V: Eq + Hash + Clone + Send + Sync,
        R: RankingSystem<V>,
    {
        let start = Instant::now();
        let mut descent = KnnDescent::from_config(points, ranking, &self.config)?;
        let report = descent.run_with(&self.config);
        let quality = (self.config.quality_sample > 0)
            .then(|| descent.quality_assessment(self.config.quality_sample));

        let cohesion = CohesionGraph::from_descent(&descent)?;
        let components = cohesion.components()?;
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            components = components.len(),
            "clustering finished"
        );

        Ok(ClusterRun {
            k: descent.k(),
            descent: report,
            friend_stats: descent.friend_stats(),
            co_friend_stats: descent.co_friend_stats(),
            quality,
            cohesion,
            components,
        })
    }
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct ClusterRun<V> {
    pub k: usize,
    pub descent: DescentReport,
    pub friend_stats: SummaryStats,
    pub co_friend_stats: SummaryStats,
    /// Recovered share of the exact top-k, when a quality sample was requested.
    pub quality: Option<SummaryStats>,
    pub cohesion: CohesionGraph<V>,
    pub components: Condensation<V>,
}

impl<V> ClusterRun<V>
where
    V: Eq + Hash + Clone + Send + Sync,
{
    /// Distinct points clustered, in descent order.
    #[must_use]
    pub fn points(&self) -> &[V] {
        self.cohesion.focus_statistics().points()
    }

    /// Component size -> number of components of that size.
    #[must_use]
    pub fn size_tally(&self) -> BTreeMap<usize, usize> {
        self.components.size_tally()
    }

    /// Components with more than one member.
    #[must_use]
    pub fn non_trivial_component_count(&self) -> usize {
        self.components.len() - self.components.singleton_count()
    }

    /// Average share of friends that are also co-friends: `2 |MF| / (k n)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mutual_friend_proportion(&self) -> f64 {
        let slots = self.k * self.points().len();
        if slots == 0 {
            return 0.0;
        }
        2.0 * self.cohesion.focus_statistics().mutual_pair_count() as f64 / slots as f64
    }

    #[must_use]
    pub fn summary(&self) -> ClusterSummary {
        ClusterSummary {
            points: self.points().len(),
            k: self.k,
            rounds: self.descent.rounds,
            max_rounds: self.descent.max_rounds,
            expander_round_count: self.descent.expander_round_count,
            clustering_rates: self.descent.clustering_rates.clone(),
            friend_stats: self.friend_stats,
            co_friend_stats: self.co_friend_stats,
            quality: self.quality,
            focus_edges: self.cohesion.focus_graph().edge_count(),
            mutual_pairs: self.cohesion.mutual_friend_graph().edge_count(),
            mutual_friend_proportion: self.mutual_friend_proportion(),
            cohesion_arcs: self.cohesion.cohesion_graph().edge_count(),
            empirical_mean_cohesion: self.cohesion.empirical_mean_cohesion(),
            theoretical_mean_cohesion: self.cohesion.theoretical_mean_cohesion(),
            cluster_edges: self.cohesion.cluster_graph().edge_count(),
            components: self.components.len(),
            non_trivial_components: self.non_trivial_component_count(),
            size_tally: self.size_tally(),
        }
    }
}

/// Serializable digest of a [`ClusterRun`].
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub points: usize,
    pub k: usize,
    pub rounds: usize,
    pub max_rounds: usize,
    pub expander_round_count: usize,
    pub clustering_rates: Vec<f64>,
    pub friend_stats: SummaryStats,
    pub co_friend_stats: SummaryStats,
    pub quality: Option<SummaryStats>,
    pub focus_edges: usize,
    pub mutual_pairs: usize,
    pub mutual_friend_proportion: f64,
    pub cohesion_arcs: usize,
    pub empirical_mean_cohesion: f64,
    pub theoretical_mean_cohesion: f64,
    pub cluster_edges: usize,
    pub components: usize,
    pub non_trivial_components: usize,
    pub size_tally: BTreeMap<usize, usize>,
}

/// Pair outcomes when true labels are known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// Same label, same component.
    pub true_positive: usize,
    /// Same label, different components.
    pub false_negative: usize,
    /// Different labels, same component.
    pub false_positive: usize,
    /// Different labels, different components.
    pub true_negative: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, same_label: bool, same_component: bool) {
        match (same_label, same_component) {
            (true, true) => self.true_positive += 1,
            (true, false) => self.false_negative += 1,
            (false, true) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
        }
    }

    #[must_use]
    pub fn pairs(&self) -> usize {
        self.true_positive + self.false_negative + self.false_positive + self.true_negative
    }

    /// Share of same-label pairs split across components.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn false_negative_rate(&self) -> Option<f64> {
        let same = self.true_positive + self.false_negative;
        (same > 0).then(|| self.false_negative as f64 / same as f64)
    }

    /// Share of different-label pairs merged into one component.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn false_positive_rate(&self) -> Option<f64> {
        let different = self.false_positive + self.true_negative;
        (different > 0).then(|| self.false_positive as f64 / different as f64)
    }
}

/// Samples `pair_samples` uniform pairs of distinct points (at most
/// `n (n - 1) / 2`) and compares labels with component membership.
pub fn cluster_quality<V, L, F>(
    components: &Condensation<V>,
    points: &[V],
    label: F,
    pair_samples: usize,
    rng: &mut RandomContext,
) -> ConfusionMatrix
where
    V: Eq + Hash + Clone,
    L: PartialEq,
    F: Fn(&V) -> L,
{
    let n = points.len();
    let mut matrix = ConfusionMatrix::default();
    if n < 2 {
        return matrix;
    }
    let samples = pair_samples.min(n * (n - 1) / 2);
    for _ in 0..samples {
        let a = rng.index(n);
        let mut b = rng.index(n - 1);
        if b >= a {
            b += 1;
        }
        let (Some(x), Some(y)) = (points.get(a), points.get(b)) else {
            continue;
        };
        matrix.record(label(x) == label(y), components.same_component(x, y));
    }
    matrix
}
