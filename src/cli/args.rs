// src/cli/args.rs
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::PrankConfig;

#[derive(Parser)]
#[command(
    name = "prank",
    version,
    about = "Cluster points by k-NN descent and local cohesion"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Log progress to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Configuration file
    #[arg(long, global = true, value_name = "FILE", default_value = "prank.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cluster simulated Dirichlet groups and report how well groups were recovered
    Simulate(SimulateArgs),
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

/// Overrides for the `[descent]` and `[simulation]` tables.
#[derive(Args, Debug, Clone, Default)]
pub struct SimulateArgs {
    /// Components per probability vector
    #[arg(long, short)]
    pub dimension: Option<usize>,
    /// Number of generating groups
    #[arg(long, short)]
    pub groups: Option<usize>,
    /// Approximate number of points
    #[arg(long, short = 'n')]
    pub points: Option<usize>,
    /// Friends per point
    #[arg(short)]
    pub k: Option<usize>,
    #[arg(long, short)]
    pub seed: Option<u64>,
    /// Round cap (0 = twice the expander bound)
    #[arg(long)]
    pub rounds: Option<usize>,
    /// Fraction of points sampled for the clustering rate
    #[arg(long)]
    pub sample_rate: Option<f64>,
    /// Points checked against brute force after descent
    #[arg(long)]
    pub quality_sample: Option<usize>,
    /// Point pairs sampled for the confusion matrix
    #[arg(long)]
    pub pairs: Option<usize>,
    /// Print JSON instead of the report
    #[arg(long)]
    pub json: bool,
}

impl SimulateArgs {
    /// Writes every given flag over the loaded configuration.
    pub fn apply(&self, config: &mut PrankConfig) {
        let descent = &mut config.descent;
        let simulation = &mut config.simulation;
        if let Some(v) = self.dimension {
            simulation.dimension = v;
        }
        if let Some(v) = self.groups {
            simulation.groups = v;
        }
        if let Some(v) = self.points {
            simulation.points = v;
        }
        if let Some(v) = self.pairs {
            simulation.pair_samples = v;
        }
        if let Some(v) = self.k {
            descent.k = v;
        }
        if let Some(v) = self.rounds {
            descent.max_rounds = v;
        }
        if let Some(v) = self.sample_rate {
            descent.sample_rate = v;
        }
        if let Some(v) = self.quality_sample {
            descent.quality_sample = v;
        }
        if self.seed.is_some() {
            descent.seed = self.seed;
        }
    }
}
