use serde::{Deserialize, Serialize};

/// Parameters of one k-NN descent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescentConfig {
    /// Neighbours kept per point.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Round cap. 0 means twice the expander round count.
    #[serde(default)]
    pub max_rounds: usize,
    /// Fraction of points sampled when estimating the friend-clustering rate.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Points checked against a brute-force scan after descent. 0 skips the check.
    #[serde(default)]
    pub quality_sample: usize,
    /// Fixed seed for reproducible runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for DescentConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            max_rounds: 0,
            sample_rate: default_sample_rate(),
            quality_sample: 0,
            seed: None,
        }
    }
}

impl DescentConfig {
    /// Effective round cap for `expander_rounds = ceil(log_k n)`.
    #[must_use]
    pub fn resolved_max_rounds(&self, expander_rounds: usize) -> usize {
        if self.max_rounds == 0 {
            2 * expander_rounds
        } else {
            self.max_rounds
        }
    }
}

/// Shape of the simulated point cloud used by `prank simulate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of probabilities per point.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Number of Dirichlet templates (true clusters).
    #[serde(default = "default_groups")]
    pub groups: usize,
    /// Approximate total number of points.
    #[serde(default = "default_points")]
    pub points: usize,
    /// Point pairs sampled for the confusion matrix.
    #[serde(default = "default_pair_samples")]
    pub pair_samples: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            groups: default_groups(),
            points: default_points(),
            pair_samples: default_pair_samples(),
        }
    }
}

const fn default_k() -> usize { 8 }
const fn default_sample_rate() -> f64 { 0.5 }
const fn default_dimension() -> usize { 6 }
const fn default_groups() -> usize { 3 }
const fn default_points() -> usize { 300 }
const fn default_pair_samples() -> usize { 20_000 }

/// Contents of `prank.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrankConfig {
    #[serde(default)]
    pub descent: DescentConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}
