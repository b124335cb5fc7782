// src/descent/mod.rs
//! Approximate k-nearest-neighbour graphs by friend-of-a-friend descent.
//!
//! Every point keeps a bounded set of its most preferred other points
//! (friends) and the reverse relation (co-friends). Each round, a point pools
//! the friends of its friends, its co-friends and their friends, and keeps
//! the best `k` of those together with its current friends.
//!
//! Rounds read an immutable [`Snapshot`] and publish a complete new one, so a
//! reader holding a snapshot never sees a half-updated friend graph.
//!
//! References: Baron & Darling, *K-nearest neighbor approximation via the
//! friend-of-a-friend principle* (arXiv:1908.07645); Dong, Charikar & Li,
//! *Efficient k-nearest neighbor graph construction for generic similarity
//! measures* (WWW 2011).

pub mod friends;
pub mod sampling;
pub mod stats;

pub use friends::FriendSet;
pub use stats::SummaryStats;

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DescentConfig;
use crate::error::{PrankError, Result};
use crate::random::RandomContext;
use crate::ranking::RankingSystem;

/// One complete generation of the friend graph.
#[derive(Debug, Clone)]
pub struct Snapshot {
    friends: Vec<FriendSet>,
    co_friends: Vec<Vec<usize>>,
}

impl Snapshot {
    /// Builds a snapshot, deriving co-friends by transposition.
    fn from_friends(friends: Vec<FriendSet>) -> Self {
        let co_friends = transpose(&friends);
        Self {
            friends,
            co_friends,
        }
    }

    #[must_use]
    pub fn friends(&self, point: usize) -> Option<&FriendSet> {
        self.friends.get(point)
    }

    #[must_use]
    pub fn co_friends(&self, point: usize) -> Option<&[usize]> {
        self.co_friends.get(point).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.friends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.friends.is_empty()
    }

    /// True if `a` has `b` as a friend or `b` has `a` as a friend.
    #[must_use]
    pub fn linked(&self, a: usize, b: usize) -> bool {
        let has = |x: usize, y: usize| self.friends.get(x).is_some_and(|f| f.contains(y));
        has(a, b) || has(b, a)
    }
}

/// Co-friend lists: `x` is listed under `y` whenever `y` is a friend of `x`.
/// Built as a parallel fold, then sorted so the result is deterministic.
fn transpose(friends: &[FriendSet]) -> Vec<Vec<usize>> {
    let n = friends.len();
    let mut co_friends = friends
        .par_iter()
        .enumerate()
        .fold(
            || vec![Vec::new(); n],
            |mut acc: Vec<Vec<usize>>, (x, set)| {
                for &y in set.members() {
                    if let Some(row) = acc.get_mut(y) {
                        row.push(x);
                    }
                }
                acc
            },
        )
        .reduce(
            || vec![Vec::new(); n],
            |mut left, right| {
                for (l, r) in left.iter_mut().zip(right) {
                    l.extend(r);
                }
                left
            },
        );
    co_friends.par_iter_mut().for_each(|row| row.sort_unstable());
    co_friends
}

/// What a call to [`KnnDescent::run`] did.
#[derive(Debug, Clone, Serialize)]
pub struct DescentReport {
    pub rounds: usize,
    pub max_rounds: usize,
    pub expander_round_count: usize,
    /// Friend-clustering rate measured after each round.
    pub clustering_rates: Vec<f64>,
}

/// Friend graph over `points`, refined by k-NN descent under `ranking`.
pub struct KnnDescent<V, R> {
    points: Vec<V>,
    /// Point -> position in `points`.
    index: HashMap<V, usize>,
    ranking: R,
    k: usize,
    expander_round_count: usize,
    snapshot: Arc<Snapshot>,
    rng: RandomContext,
}

impl<V, R> KnnDescent<V, R>
where
    V: Eq + Hash + Clone + Send + Sync,
    R: RankingSystem<V>,
{
    /// Deduplicates `points` and draws random initial friend sets.
    ///
    /// # Errors
    /// Returns `InvalidNeighborCount` when `k == 0` and `TooFewPoints` when
    /// there are fewer than `k + 1` distinct points.
    pub fn new(points: Vec<V>, ranking: R, k: usize, rng: RandomContext) -> Result<Self> {
        if k == 0 {
            return Err(PrankError::InvalidNeighborCount(k));
        }
        let points = distinct(points);
        if points.len() < k + 1 {
            return Err(PrankError::TooFewPoints {
                points: points.len(),
                k,
            });
        }
        let index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        let mut descent = Self {
            expander_round_count: expander_round_count(points.len(), k),
            points,
            index,
            ranking,
            k,
            snapshot: Arc::new(Snapshot {
                friends: Vec::new(),
                co_friends: Vec::new(),
            }),
            rng,
        };
        descent.initialize_friend_sets();
        Ok(descent)
    }

    /// Builds from a validated [`DescentConfig`], seeding from `config.seed`.
    ///
    /// # Errors
    /// Returns the configuration's validation error, or the errors of [`Self::new`].
    pub fn from_config(points: Vec<V>, ranking: R, config: &DescentConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            points,
            ranking,
            config.k,
            RandomContext::from_option(config.seed),
        )
    }

    /// Gives every point `k` distinct random friends (never itself), in
    /// parallel, each point drawing from its own random substream.
    pub fn initialize_friend_sets(&mut self) {
        let start = Instant::now();
        let n = self.points.len();
        let rng = &self.rng;
        let friends: Vec<FriendSet> = (0..n)
            .into_par_iter()
            .map(|x| {
                let mut stream = rng.substream(x);
                let mut set = FriendSet::with_capacity(self.k);
                while !set.is_full() {
                    let y = stream.gen_range(0..n);
                    set.offer(x, y, |a, b| self.rank(x, a, b));
                }
                set
            })
            .collect();
        self.rng.advance();
        self.publish(friends);

        let co = self.co_friend_stats();
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            points = n,
            k = self.k,
            "initial friend sets chosen"
        );
        debug!(min = co.min, max = co.max, mean = co.mean, "co-friend set sizes");
    }

    /// One descent round over every point, published as a single new snapshot.
    pub fn refresh_friend_sets(&mut self) {
        let snapshot = Arc::clone(&self.snapshot);
        let friends: Vec<FriendSet> = (0..self.points.len())
            .into_par_iter()
            .map(|x| self.propose_friend_set(&snapshot, x))
            .collect();
        self.publish(friends);
    }

    /// Best `k` among the current friends of `x` and its candidate pool.
    #[allow(clippy::indexing_slicing)] // Guarded: every snapshot row covers all points
    fn propose_friend_set(&self, snapshot: &Snapshot, x: usize) -> FriendSet {
        let current = &snapshot.friends[x];
        let mut pool: Vec<usize> = Vec::new();
        for &y in current.members() {
            pool.extend_from_slice(snapshot.friends[y].members());
        }
        for &z in &snapshot.co_friends[x] {
            pool.push(z);
            pool.extend_from_slice(snapshot.friends[z].members());
        }
        pool.sort_unstable();
        pool.dedup();

        let mut running = current.clone();
        for p in pool {
            running.offer(x, p, |a, b| self.rank(x, a, b));
        }
        running
    }

    fn publish(&mut self, friends: Vec<FriendSet>) {
        self.snapshot = Arc::new(Snapshot::from_friends(friends));
    }

    #[allow(clippy::indexing_slicing)] // Guarded: indices are < points.len()
    fn rank(&self, x: usize, a: usize, b: usize) -> std::cmp::Ordering {
        self.ranking
            .compare(&self.points[x], &self.points[a], &self.points[b])
    }

    /// Runs descent rounds until `max_rounds` is reached or the
    /// friend-clustering rate stops increasing.
    pub fn run(&mut self, max_rounds: usize, sample_rate: f64) -> DescentReport {
        info!(max_rounds, "starting k-NN descent");
        let mut old_rate = f64::NEG_INFINITY;
        let mut new_rate = 0.0;
        let mut rounds = 0;
        let mut clustering_rates = Vec::new();

        while rounds < max_rounds && new_rate > old_rate {
            let start = Instant::now();
            self.refresh_friend_sets();
            rounds += 1;
            old_rate = new_rate;
            new_rate = self.estimate_friend_clustering(sample_rate);
            clustering_rates.push(new_rate);

            let friends = self.friend_stats();
            let co = self.co_friend_stats();
            info!(
                round = rounds,
                elapsed_ms = start.elapsed().as_millis() as u64,
                clustering = new_rate,
                "descent round finished"
            );
            debug!(min = friends.min, max = friends.max, mean = friends.mean, "friend set sizes");
            debug!(min = co.min, max = co.max, mean = co.mean, "co-friend set sizes");
        }

        info!(rounds, "k-NN descent terminated");
        DescentReport {
            rounds,
            max_rounds,
            expander_round_count: self.expander_round_count,
            clustering_rates,
        }
    }

    /// Runs with the round cap and sample rate from `config`.
    pub fn run_with(&mut self, config: &DescentConfig) -> DescentReport {
        let max_rounds = config.resolved_max_rounds(self.expander_round_count);
        self.run(max_rounds, config.sample_rate)
    }

    /// Fraction of sampled friend pairs that are themselves linked.
    pub fn estimate_friend_clustering(&mut self, sample_rate: f64) -> f64 {
        sampling::friend_clustering_rate(&self.snapshot, sample_rate, &mut self.rng)
    }

    /// Mean share of the exact top-k recovered, over `sample_size` points
    /// checked by brute force. Costs O(n) comparisons per sampled point.
    pub fn quality_assessment(&mut self, sample_size: usize) -> SummaryStats {
        let sample = sampling::distinct_sample(self.points.len(), sample_size, &mut self.rng);
        let fractions: Vec<f64> = sample
            .into_par_iter()
            .filter_map(|x| self.recovered_fraction(x))
            .collect();
        SummaryStats::from_values(fractions)
    }

    #[allow(clippy::cast_precision_loss)]
    fn recovered_fraction(&self, x: usize) -> Option<f64> {
        let approximate = self.snapshot.friends(x)?;
        let mut exact = approximate.clone();
        for p in 0..self.points.len() {
            exact.offer(x, p, |a, b| self.rank(x, a, b));
        }
        if exact.len() != self.k {
            return None;
        }
        let captured = exact
            .members()
            .iter()
            .filter(|&&p| approximate.contains(p))
            .count();
        Some(captured as f64 / self.k as f64)
    }

    /// The current generation of the friend graph.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    #[must_use]
    pub fn points(&self) -> &[V] {
        &self.points
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// `ceil(log_k n)`: rounds needed for information to cross the graph.
    #[must_use]
    pub fn expander_round_count(&self) -> usize {
        self.expander_round_count
    }

    #[must_use]
    pub fn ranking(&self) -> &R {
        &self.ranking
    }

    /// Friends of `point`, best first.
    #[must_use]
    pub fn friends_of(&self, point: &V) -> Option<Vec<&V>> {
        let &x = self.index.get(point)?;
        let set = self.snapshot.friends(x)?;
        Some(set.members().iter().filter_map(|&i| self.points.get(i)).collect())
    }

    /// Point -> friends, best first.
    #[must_use]
    pub fn friend_map(&self) -> HashMap<V, Vec<V>> {
        self.friend_lists().into_iter().collect()
    }

    /// `(point, friends)` pairs in point order, friends best first.
    #[must_use]
    pub fn friend_lists(&self) -> Vec<(V, Vec<V>)> {
        self.points
            .iter()
            .enumerate()
            .map(|(x, p)| {
                let members = self
                    .snapshot
                    .friends(x)
                    .map(|set| self.resolve(set.members()))
                    .unwrap_or_default();
                (p.clone(), members)
            })
            .collect()
    }

    /// Point -> co-friends.
    #[must_use]
    pub fn co_friend_map(&self) -> HashMap<V, Vec<V>> {
        self.points
            .iter()
            .enumerate()
            .map(|(y, p)| {
                let members = self
                    .snapshot
                    .co_friends(y)
                    .map(|row| self.resolve(row))
                    .unwrap_or_default();
                (p.clone(), members)
            })
            .collect()
    }

    fn resolve(&self, indices: &[usize]) -> Vec<V> {
        indices
            .iter()
            .filter_map(|&i| self.points.get(i).cloned())
            .collect()
    }

    #[must_use]
    pub fn friend_stats(&self) -> SummaryStats {
        SummaryStats::from_sizes(self.snapshot.friends.iter().map(FriendSet::len))
    }

    #[must_use]
    pub fn co_friend_stats(&self) -> SummaryStats {
        SummaryStats::from_sizes(self.snapshot.co_friends.iter().map(Vec::len))
    }
}

/// `ceil(ln n / ln k)`, or 1 when `k < 2`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn expander_round_count(n: usize, k: usize) -> usize {
    if k < 2 || n < 2 {
        return 1;
    }
    let rounds = ((n as f64).ln() / (k as f64).ln()).ceil();
    (rounds as usize).max(1)
}

fn distinct<V: Eq + Hash + Clone>(points: Vec<V>) -> Vec<V> {
    let mut seen = HashSet::with_capacity(points.len());
    points.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expander_round_count() {
        assert_eq!(expander_round_count(10_000, 16), 4);
        assert_eq!(expander_round_count(65, 8), 3);
        assert_eq!(expander_round_count(9, 2), 4);
        assert_eq!(expander_round_count(100, 1), 1);
    }

    #[test]
    fn test_transpose_lists_every_friend_edge() {
        let mut a = FriendSet::with_capacity(2);
        a.offer(0, 1, |p, q| p.cmp(&q));
        a.offer(0, 2, |p, q| p.cmp(&q));
        let mut b = FriendSet::with_capacity(2);
        b.offer(1, 2, |p, q| p.cmp(&q));
        let c = FriendSet::with_capacity(2);

        let co = transpose(&[a, b, c]);
        assert_eq!(co, vec![vec![], vec![0], vec![0, 1]]);
    }

    #[test]
    fn test_distinct_keeps_first_occurrence() {
        assert_eq!(distinct(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
