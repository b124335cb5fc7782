// src/ranking.rs
//! Concordant ranking systems.
//!
//! A ranking system gives every point `x` a strict total order over all
//! other points: `compare(x, y, z) == Less` means `x` prefers `y` to `z`.
//! This is the only notion of distance the descent and cohesion stages use.
//!
//! The order must be stable for the lifetime of a run and must be a strict
//! total order over points other than `x`. Neither property is checked; an
//! inconsistent comparator gives undefined (but memory-safe) results.

use std::cmp::Ordering;

/// Compares two points from the perspective of a third.
pub trait RankingSystem<V>: Sync {
    /// How `x` ranks `y` relative to `z`.
    fn compare(&self, x: &V, y: &V, z: &V) -> Ordering;

    /// True if `x` ranks `y` strictly before `z`.
    fn prefers(&self, x: &V, y: &V, z: &V) -> bool {
        self.compare(x, y, z) == Ordering::Less
    }
}

impl<V, F> RankingSystem<V> for F
where
    F: Fn(&V, &V, &V) -> Ordering + Sync,
{
    fn compare(&self, x: &V, y: &V, z: &V) -> Ordering {
        self(x, y, z)
    }
}

/// Ranks points by a real-valued dissimilarity measured from `x`.
///
/// Ties on the score are broken by `Ord` on the point so the order stays
/// strict when two distinct points are equidistant.
pub struct ByScore<F> {
    score: F,
}

impl<F> ByScore<F> {
    #[must_use]
    pub fn new(score: F) -> Self {
        Self { score }
    }
}

impl<V, F> RankingSystem<V> for ByScore<F>
where
    V: Ord,
    F: Fn(&V, &V) -> f64 + Sync,
{
    fn compare(&self, x: &V, y: &V, z: &V) -> Ordering {
        (self.score)(x, y)
            .total_cmp(&(self.score)(x, z))
            .then_with(|| y.cmp(z))
    }
}
