// src/descent/stats.rs
//! Summary statistics for descent diagnostics.

use serde::Serialize;

/// Count, range, and mean of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl SummaryStats {
    /// Summarizes `values`. An empty sample reports zeros.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if count == 0 {
            return Self::default();
        }
        Self {
            count,
            min,
            max,
            mean: sum / count as f64,
        }
    }

    /// Summarizes set sizes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_sizes<I>(sizes: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        Self::from_values(sizes.into_iter().map(|s| s as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_summary() {
        let s = SummaryStats::from_sizes([3, 5, 4]);
        assert_eq!(s.count, 3);
        assert_eq!(s.min, 3.0);
        assert_eq!(s.max, 5.0);
        assert!((s.mean - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_summary_is_zero() {
        assert_eq!(SummaryStats::from_values(Vec::new()), SummaryStats::default());
    }
}
