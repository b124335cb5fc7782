// src/descent/sampling.rs
//! Random sampling used by the stopping rule and the quality check.

use rand::seq::index;
use rand::Rng;
use tracing::debug;

use super::Snapshot;
use crate::random::RandomContext;

/// `size` distinct indices drawn uniformly from `0..n` (clamped to `n`).
pub fn distinct_sample(n: usize, size: usize, rng: &mut RandomContext) -> Vec<usize> {
    let size = size.min(n);
    index::sample(rng.master(), n, size).into_vec()
}

/// Number of points sampled for a given rate: `ceil(rate * n)`, within `1..=n`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn sample_size(n: usize, rate: f64) -> usize {
    if n == 0 {
        return 0;
    }
    let wanted = (rate.max(0.0) * n as f64).ceil() as usize;
    wanted.clamp(1, n)
}

/// Estimates the friend-clustering rate: sample points `x`, pick two
/// distinct friends `y`, `z` of `x` uniformly, and count how often `y` and
/// `z` are friends or co-friends of each other.
///
/// Near zero for random friend sets, it rises as descent converges. Points
/// with fewer than two friends count as unclustered.
#[allow(clippy::cast_precision_loss)]
pub fn friend_clustering_rate(snapshot: &Snapshot, rate: f64, rng: &mut RandomContext) -> f64 {
    let n = snapshot.len();
    let size = sample_size(n, rate);
    if size == 0 {
        return 0.0;
    }
    let sample = distinct_sample(n, size, rng);

    let mut linked = 0usize;
    for x in sample {
        let Some(friends) = snapshot.friends(x) else {
            continue;
        };
        let Some((y, z)) = random_pair(friends.members(), rng) else {
            continue;
        };
        if snapshot.linked(y, z) {
            linked += 1;
        }
    }

    debug!(sampled = size, linked, "friend clustering sample");
    linked as f64 / size as f64
}

/// Two distinct entries of `items`, uniformly over unordered pairs.
fn random_pair(items: &[usize], rng: &mut RandomContext) -> Option<(usize, usize)> {
    let len = items.len();
    if len < 2 {
        return None;
    }
    let first = rng.master().gen_range(0..len);
    let mut second = rng.master().gen_range(0..len - 1);
    if second >= first {
        second += 1;
    }
    Some((*items.get(first)?, *items.get(second)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_size_bounds() {
        assert_eq!(sample_size(100, 0.1), 10);
        assert_eq!(sample_size(100, 0.001), 1);
        assert_eq!(sample_size(100, 1.0), 100);
        assert_eq!(sample_size(0, 0.5), 0);
    }

    #[test]
    fn test_distinct_sample_has_no_repeats() {
        let mut rng = RandomContext::seeded(11);
        let mut s = distinct_sample(50, 80, &mut rng);
        assert_eq!(s.len(), 50);
        s.sort_unstable();
        s.dedup();
        assert_eq!(s.len(), 50);
    }

    #[test]
    fn test_random_pair_is_distinct() {
        let mut rng = RandomContext::seeded(5);
        for _ in 0..200 {
            let (a, b) = random_pair(&[4, 8, 15], &mut rng).unwrap();
            assert_ne!(a, b);
        }
        assert!(random_pair(&[1], &mut rng).is_none());
    }
}
