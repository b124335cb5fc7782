// src/cohesion/focus.rs
//! K-focus counts between related points.
//!
//! For `y` a friend of `x`, the K-focus `|V_{x,y}|` counts the points that
//! sit between `x` and `y` in either one's ranking, treating every
//! non-friend as tied at rank `k + 1`. Only the sorted friend sets are
//! needed; the ranking system itself is not consulted again.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::error::{PrankError, Result};
use crate::graph::UnGraph;

/// Frozen friend sets, by point index.
#[derive(Debug, Clone)]
pub(crate) struct FriendTable<V> {
    pub(crate) points: Vec<V>,
    pub(crate) friends: Vec<Vec<usize>>,
    /// 0-based position of each friend in its owner's list.
    positions: Vec<HashMap<usize, usize>>,
}

impl<V> FriendTable<V>
where
    V: Eq + Hash + Clone + Send + Sync,
{
    /// Indexes `lists` in the order given. Every friend must itself be one of
    /// the listed points, no point may list itself, and neither points nor
    /// the friends within one list may repeat.
    pub(crate) fn new<I>(lists: I) -> Result<Self>
    where
        I: IntoIterator<Item = (V, Vec<V>)>,
    {
        let lists: Vec<(V, Vec<V>)> = lists.into_iter().collect();
        if lists.is_empty() {
            return Err(PrankError::EmptyGraph);
        }
        let mut index: HashMap<V, usize> = HashMap::with_capacity(lists.len());
        for (i, (p, _)) in lists.iter().enumerate() {
            if index.insert(p.clone(), i).is_some() {
                return Err(PrankError::DuplicatePoint);
            }
        }

        let mut points = Vec::with_capacity(lists.len());
        let mut friends = Vec::with_capacity(lists.len());
        for (x, (point, list)) in lists.into_iter().enumerate() {
            let row = list
                .iter()
                .map(|f| index.get(f).copied().ok_or(PrankError::UnknownPoint))
                .collect::<Result<Vec<usize>>>()?;
            if row.contains(&x) {
                return Err(PrankError::SelfLoop);
            }
            let mut seen = HashSet::with_capacity(row.len());
            if !row.iter().all(|f| seen.insert(*f)) {
                return Err(PrankError::DuplicatePoint);
            }
            points.push(point);
            friends.push(row);
        }

        let positions = friends
            .par_iter()
            .map(|row| {
                let mut map = HashMap::with_capacity(row.len());
                for (pos, &f) in row.iter().enumerate() {
                    map.insert(f, pos);
                }
                map
            })
            .collect();

        Ok(Self {
            points,
            friends,
            positions,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    /// 0-based rank of `y` among the friends of `x`.
    pub(crate) fn position(&self, x: usize, y: usize) -> Option<usize> {
        self.positions.get(x)?.get(&y).copied()
    }

    pub(crate) fn row(&self, x: usize) -> &[usize] {
        self.friends.get(x).map_or(&[][..], Vec::as_slice)
    }

    pub(crate) fn point(&self, x: usize) -> Option<&V> {
        self.points.get(x)
    }

    /// `|V_{x,y}|` seen from `x`.
    ///
    /// With `r_x` the 1-based friend rank (non-friends at `|F(x)| + 1`):
    /// if `x` is not a friend of `y`, `r_x(y) + |F(y)| + 1 - c` where `c`
    /// counts friends of `y` that `x` ranks before `y`; otherwise
    /// `r_x(y) + r_y(x) - c'` where `c'` counts points ranked before `y` by
    /// `x` and before `x` by `y`. Always at least 1.
    pub(crate) fn k_focus(&self, x: usize, y: usize) -> usize {
        let fx = self.row(x);
        let pos_y = self.position(x, y).unwrap_or(fx.len());
        let ahead_of_y = fx.get(..pos_y).unwrap_or(fx);
        let x_ranks_y = pos_y + 1;

        let count = match self.position(y, x) {
            None => {
                let shared = ahead_of_y
                    .iter()
                    .filter(|&&z| self.position(y, z).is_some())
                    .count();
                x_ranks_y + self.row(y).len() + 1 - shared
            }
            Some(pos_x) => {
                let shared = ahead_of_y
                    .iter()
                    .filter(|&&z| self.position(y, z).is_some_and(|p| p < pos_x))
                    .count();
                x_ranks_y + pos_x + 1 - shared
            }
        };
        debug_assert!(count >= 1, "K-focus counts are positive");
        count
    }

    pub(crate) fn is_mutual(&self, x: usize, y: usize) -> bool {
        self.position(x, y).is_some() && self.position(y, x).is_some()
    }
}

/// K-focus counts and mutual friendships over a frozen friend graph.
#[derive(Debug, Clone)]
pub struct FocusStatistics<V> {
    pub(crate) table: FriendTable<V>,
    /// Focus count for `(x, friends[x][i])`, aligned with the friend rows.
    pub(crate) counts: Vec<Vec<usize>>,
    /// Whether `(x, friends[x][i])` is reciprocated.
    pub(crate) mutual: Vec<Vec<bool>>,
    focus_graph: UnGraph<V, usize>,
    mutual_friend_graph: UnGraph<V>,
}

impl<V> FocusStatistics<V>
where
    V: Eq + Hash + Clone + Send + Sync,
{
    /// Computes focus counts for every friend edge, in parallel by point.
    ///
    /// `lists` maps each point to its friends, best first.
    ///
    /// # Errors
    /// Returns `EmptyGraph` for no points, `UnknownPoint` if a friend is not
    /// itself listed, `SelfLoop` if a point lists itself, and `DuplicatePoint`
    /// if a point or a friend within one list repeats.
    pub fn new<I>(lists: I) -> Result<Self>
    where
        I: IntoIterator<Item = (V, Vec<V>)>,
    {
        let table = FriendTable::new(lists)?;
        Self::from_table(table)
    }

    pub(crate) fn from_table(table: FriendTable<V>) -> Result<Self> {
        let start = Instant::now();
        let n = table.len();

        let rows: Vec<(Vec<usize>, Vec<bool>)> = (0..n)
            .into_par_iter()
            .map(|x| {
                table
                    .row(x)
                    .iter()
                    .map(|&y| (table.k_focus(x, y), table.is_mutual(x, y)))
                    .unzip()
            })
            .collect();
        let (counts, mutual): (Vec<Vec<usize>>, Vec<Vec<bool>>) = rows.into_iter().unzip();

        let mut focus_graph = UnGraph::undirected(false);
        let mut mutual_friend_graph = UnGraph::undirected(false);
        for p in &table.points {
            focus_graph.add_node(p.clone());
            mutual_friend_graph.add_node(p.clone());
        }
        for x in 0..n {
            let Some(px) = table.point(x) else { continue };
            for (i, &y) in table.row(x).iter().enumerate() {
                let Some(py) = table.point(y) else { continue };
                if !focus_graph.has_edge(px, py) {
                    let count = counts.get(x).and_then(|r| r.get(i)).copied().unwrap_or(1);
                    focus_graph.put_edge(px.clone(), py.clone(), count)?;
                }
                if mutual.get(x).and_then(|r| r.get(i)).copied().unwrap_or(false) {
                    mutual_friend_graph.put_edge(px.clone(), py.clone(), ())?;
                }
            }
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            focus_edges = focus_graph.edge_count(),
            mutual_pairs = mutual_friend_graph.edge_count(),
            "focus graph and mutual friend graph built"
        );

        Ok(Self {
            table,
            counts,
            mutual,
            focus_graph,
            mutual_friend_graph,
        })
    }

    /// `|V_{x,y}|` computed from `x`'s side. Defined when `y` is a friend of `x`.
    #[must_use]
    pub fn focus_count(&self, x: &V, y: &V) -> Option<usize> {
        let (xi, yi) = self.indices(x, y)?;
        self.table.position(xi, yi)?;
        Some(self.table.k_focus(xi, yi))
    }

    /// True if `x` and `y` are friends of each other.
    #[must_use]
    pub fn is_mutual(&self, x: &V, y: &V) -> bool {
        self.mutual_friend_graph.has_edge(x, y)
    }

    /// Undirected; edge `{x, y}` whenever either is a friend of the other,
    /// weighted by its K-focus count.
    #[must_use]
    pub fn focus_graph(&self) -> &UnGraph<V, usize> {
        &self.focus_graph
    }

    /// Undirected; edge `{x, y}` exactly when the friendship is reciprocated.
    #[must_use]
    pub fn mutual_friend_graph(&self) -> &UnGraph<V> {
        &self.mutual_friend_graph
    }

    /// Number of mutual-friend pairs.
    #[must_use]
    pub fn mutual_pair_count(&self) -> usize {
        self.mutual_friend_graph.edge_count()
    }

    /// Sum of `1 / |V_{x,y}|` over mutual-friend pairs.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mutual_reciprocal_sum(&self) -> f64 {
        self.mutual_friend_graph
            .edges()
            .filter_map(|(x, y, _)| self.focus_graph.edge_value(x, y))
            .map(|&count| 1.0 / count as f64)
            .sum()
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.table.len()
    }

    /// Points in table order.
    #[must_use]
    pub fn points(&self) -> &[V] {
        &self.table.points
    }

    fn indices(&self, x: &V, y: &V) -> Option<(usize, usize)> {
        Some((
            self.focus_graph.node_index(x)?,
            self.focus_graph.node_index(y)?,
        ))
    }
}
