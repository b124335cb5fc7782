// src/simplex.rs
//! Probability vectors as points, ranked by Kullback-Leibler divergence,
//! and Dirichlet sampling to generate labelled test clouds.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use rand::Rng;
use rand_distr::{Distribution, Exp1, Gamma, Uniform};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{PrankError, Result};
use crate::random::RandomContext;
use crate::ranking::RankingSystem;

/// Smallest component a sampled probability vector may have.
pub const EPS: f64 = 1.0e-6;

/// A point in the interior of the probability simplex.
///
/// Logs of the components are computed once, since divergences are taken
/// many times per point. Equality and hashing use the exact bits of the
/// probabilities.
#[derive(Debug, Clone, Serialize)]
pub struct PointInSimplex {
    p: Vec<f64>,
    #[serde(skip)]
    log_p: Vec<f64>,
    /// Group that generated the point, if known.
    template: Option<usize>,
}

impl PointInSimplex {
    /// # Errors
    /// Returns `InvalidConfig` for an empty vector or a component that is not
    /// a positive finite number.
    pub fn new(p: Vec<f64>, template: Option<usize>) -> Result<Self> {
        if p.is_empty() {
            return Err(PrankError::InvalidConfig(
                "a simplex point needs at least one component".to_string(),
            ));
        }
        if let Some(bad) = p.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(PrankError::InvalidConfig(format!(
                "simplex components must be positive, got {bad}"
            )));
        }
        let log_p = p.iter().map(|v| v.ln()).collect();
        Ok(Self { p, log_p, template })
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.p.len()
    }

    #[must_use]
    pub fn probabilities(&self) -> &[f64] {
        &self.p
    }

    #[must_use]
    pub fn template(&self) -> Option<usize> {
        self.template
    }

    /// `D(self || other) = sum p_i (ln p_i - ln q_i)`; NaN if dimensions differ.
    #[must_use]
    pub fn divergence(&self, other: &Self) -> f64 {
        if self.p.len() != other.p.len() {
            return f64::NAN;
        }
        self.p
            .iter()
            .zip(&self.log_p)
            .zip(&other.log_p)
            .map(|((p, lp), lq)| p * (lp - lq))
            .sum()
    }

    fn bits(&self) -> impl Iterator<Item = u64> + '_ {
        self.p.iter().map(|v| v.to_bits())
    }
}

impl PartialEq for PointInSimplex {
    fn eq(&self, other: &Self) -> bool {
        self.bits().eq(other.bits())
    }
}

impl Eq for PointInSimplex {}

impl Hash for PointInSimplex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.bits() {
            b.hash(state);
        }
    }
}

/// `x` prefers `y` to `z` when `D(x || y) < D(x || z)`. Ties fall back to
/// the component bits, so the order is strict over distinct points.
#[derive(Debug, Clone, Copy, Default)]
pub struct KlRanking;

impl RankingSystem<PointInSimplex> for KlRanking {
    fn compare(&self, x: &PointInSimplex, y: &PointInSimplex, z: &PointInSimplex) -> Ordering {
        x.divergence(y)
            .total_cmp(&x.divergence(z))
            .then_with(|| y.bits().cmp(z.bits()))
    }
}

/// Dirichlet random vectors.
pub struct DirichletSampler {
    rng: RandomContext,
}

impl DirichletSampler {
    #[must_use]
    pub fn new(rng: RandomContext) -> Self {
        Self { rng }
    }

    /// Flat Dirichlet: `d` exponential variates divided by their sum.
    pub fn flat(&mut self, d: usize) -> Vec<f64> {
        let x: Vec<f64> = (0..d)
            .map(|_| Distribution::<f64>::sample(&Exp1, self.rng.master()))
            .collect();
        normalize(x)
    }

    /// `d` i.i.d. values `1 / U` with `U ~ Uniform(EPS, 1)`. Used as one
    /// shared parameter vector for a whole group.
    pub fn inverse_uniform(&mut self, d: usize) -> Vec<f64> {
        let u = Uniform::new(EPS, 1.0);
        (0..d).map(|_| 1.0 / u.sample(self.rng.master())).collect()
    }

    /// One Dirichlet(`alpha`) vector; every component is at least [`EPS`].
    ///
    /// # Errors
    /// Returns `InvalidConfig` if some parameter is not a valid Gamma shape.
    pub fn sample(&mut self, alpha: &[f64]) -> Result<Vec<f64>> {
        let gammas = gamma_family(alpha)?;
        Ok(draw(&gammas, self.rng.master()))
    }

    /// `count` vectors sharing `alpha`, drawn in parallel.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if some parameter is not a valid Gamma shape.
    pub fn sample_many(&mut self, alpha: &[f64], count: usize) -> Result<Vec<Vec<f64>>> {
        let gammas = gamma_family(alpha)?;
        let rng = &self.rng;
        let rows = (0..count)
            .into_par_iter()
            .map(|i| draw(&gammas, &mut rng.substream(i)))
            .collect();
        self.rng.advance();
        Ok(rows)
    }

    /// `groups` clusters of labelled points in `dimension` dimensions, about
    /// `points` in total. Group sizes follow a flat Dirichlet draw scaled by
    /// `points` and rounded, so the total may be off by a few. Each group
    /// shares one random parameter vector.
    ///
    /// # Errors
    /// Returns `InvalidConfig` for `dimension < 2` or `groups == 0`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn simulate_groups(
        &mut self,
        dimension: usize,
        groups: usize,
        points: usize,
    ) -> Result<Vec<PointInSimplex>> {
        if dimension < 2 || groups == 0 {
            return Err(PrankError::InvalidConfig(format!(
                "need dimension >= 2 and groups >= 1, got {dimension} and {groups}"
            )));
        }
        let sizes: Vec<usize> = self
            .flat(groups)
            .into_iter()
            .map(|share| (share * points as f64).round() as usize)
            .collect();
        debug!(?sizes, "simulated group sizes");

        let mut cloud = Vec::with_capacity(sizes.iter().sum());
        for (group, &size) in sizes.iter().enumerate() {
            let alpha = self.inverse_uniform(dimension);
            for p in self.sample_many(&alpha, size)? {
                cloud.push(PointInSimplex::new(p, Some(group))?);
            }
        }
        Ok(cloud)
    }
}

fn gamma_family(alpha: &[f64]) -> Result<Vec<Gamma<f64>>> {
    alpha
        .iter()
        .map(|&a| {
            Gamma::new(a, 1.0).map_err(|e| {
                PrankError::InvalidConfig(format!("bad Dirichlet parameter {a}: {e}"))
            })
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn draw<R: Rng + ?Sized>(gammas: &[Gamma<f64>], rng: &mut R) -> Vec<f64> {
    let x: Vec<f64> = gammas.iter().map(|g| g.sample(&mut *rng)).collect();
    let d = x.len() as f64;
    let scale = 1.0 - EPS * d;
    normalize(x).into_iter().map(|v| EPS + scale * v).collect()
}

/// Divides by the sum; a degenerate sum gives the uniform vector.
#[allow(clippy::cast_precision_loss)]
fn normalize(x: Vec<f64>) -> Vec<f64> {
    let sum: f64 = x.iter().sum();
    if !(sum.is_finite() && sum > 0.0) {
        let d = x.len() as f64;
        return vec![1.0 / d; x.len()];
    }
    x.into_iter().map(|v| v / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(p: &[f64]) -> PointInSimplex {
        PointInSimplex::new(p.to_vec(), None).unwrap()
    }

    #[test]
    fn test_divergence_is_zero_on_self() {
        let x = point(&[0.2, 0.3, 0.5]);
        assert!(x.divergence(&x).abs() < 1e-15);
        assert!(x.divergence(&point(&[0.5, 0.3, 0.2])) > 0.0);
        assert!(x.divergence(&point(&[0.5, 0.5])).is_nan());
    }

    #[test]
    fn test_kl_ranking_prefers_closer() {
        let x = point(&[0.2, 0.3, 0.5]);
        let near = point(&[0.25, 0.3, 0.45]);
        let far = point(&[0.6, 0.3, 0.1]);
        assert!(KlRanking.prefers(&x, &near, &far));
        assert_eq!(KlRanking.compare(&x, &near, &near), Ordering::Equal);
    }

    #[test]
    fn test_rejects_non_positive_components() {
        assert!(PointInSimplex::new(vec![0.0, 1.0], None).is_err());
        assert!(PointInSimplex::new(vec![], None).is_err());
    }

    #[test]
    fn test_dirichlet_sample_respects_floor() {
        let mut sampler = DirichletSampler::new(RandomContext::seeded(3));
        let alpha = vec![0.01, 0.01, 50.0];
        for _ in 0..50 {
            let v = sampler.sample(&alpha).unwrap();
            assert!((v.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(v.iter().all(|&c| c >= EPS));
        }
    }

    #[test]
    fn test_inverse_uniform_bounds() {
        let mut sampler = DirichletSampler::new(RandomContext::seeded(9));
        let v = sampler.inverse_uniform(100);
        assert!(v.iter().all(|&a| a > 1.0 && a <= 1.0 / EPS));
    }

    #[test]
    fn test_bad_parameter_is_an_error() {
        let mut sampler = DirichletSampler::new(RandomContext::seeded(1));
        assert!(sampler.sample(&[1.0, -2.0]).is_err());
    }
}
