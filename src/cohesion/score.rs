// src/cohesion/score.rs
//! Per-point cohesion scores.
//!
//! A point `x` spreads one unit of support over every point. Each mutual
//! friend `y` weighs `1 / |V_{x,y}|`, every other point `1 / n`. Walking the
//! friends from worst to best, the score of a friend is the weight of all
//! points ranked below it plus half its own weight; `x` itself receives the
//! total.

use super::focus::FocusStatistics;

/// Cohesion of `x` toward each of its friends and itself.
///
/// Entries come worst friend first, with `(x, D(x, x))` last.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn point_scores<V>(stats: &FocusStatistics<V>, x: usize) -> Vec<(usize, f64)> {
    let n = stats.table.points.len();
    let row = stats.table.friends.get(x).map_or(&[][..], Vec::as_slice);
    let counts = stats.counts.get(x).map_or(&[][..], Vec::as_slice);
    let mutual = stats.mutual.get(x).map_or(&[][..], Vec::as_slice);
    let n_f = n as f64;

    let strangers = n.saturating_sub(row.len() + 1) as f64 / n_f;
    let mut running = strangers;
    let mut scores = Vec::with_capacity(row.len() + 1);

    for (i, &y) in row.iter().enumerate().rev() {
        let reciprocal = mutual.get(i).copied().unwrap_or(false);
        let summand = match counts.get(i) {
            Some(&count) if reciprocal => 1.0 / count as f64,
            _ => 1.0 / n_f,
        };
        running += summand;
        scores.push((y, running - 0.5 * summand));
    }
    scores.push((x, running));
    scores
}
