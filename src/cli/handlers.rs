// src/cli/handlers.rs
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use rand::RngCore;
use serde::Serialize;

use crate::cli::args::SimulateArgs;
use crate::config::PrankConfig;
use crate::error::PrankError;
use crate::exit::PrankExit;
use crate::pipeline::{self, ClusterSummary, ConfusionMatrix, Pipeline};
use crate::random::RandomContext;
use crate::report;
use crate::simplex::{DirichletSampler, KlRanking, PointInSimplex};

#[derive(Serialize)]
struct SimulationOutput {
    summary: ClusterSummary,
    quality: ConfusionMatrix,
}

/// Handles the simulate command.
///
/// # Errors
/// Returns error if the configuration can't be loaded or the run fails
/// for reasons other than bad input.
pub fn handle_simulate(config_path: &Path, args: &SimulateArgs) -> Result<PrankExit> {
    let mut config = PrankConfig::load(config_path)?;
    args.apply(&mut config);
    if let Err(e) = config.validate() {
        eprintln!("{} {e}", "Error:".red());
        return Ok(PrankExit::InvalidInput);
    }

    let mut rng = RandomContext::from_option(config.descent.seed);
    let mut sampler = DirichletSampler::new(RandomContext::seeded(rng.master().next_u64()));
    let sim = &config.simulation;
    let points = sampler
        .simulate_groups(sim.dimension, sim.groups, sim.points)
        .context("Failed to simulate points")?;

    let pipeline = Pipeline::new(config.descent.clone())?;
    let run = match pipeline.run(points, KlRanking) {
        Ok(run) => run,
        Err(e @ (PrankError::TooFewPoints { .. } | PrankError::InvalidNeighborCount(_))) => {
            eprintln!("{} {e}", "Error:".red());
            return Ok(PrankExit::InvalidInput);
        }
        Err(e) => return Err(e).context("Clustering failed"),
    };

    let quality = pipeline::cluster_quality(
        &run.components,
        run.points(),
        PointInSimplex::template,
        sim.pair_samples,
        &mut rng,
    );
    let summary = run.summary();

    if args.json {
        report::print_json(&SimulationOutput { summary, quality })?;
    } else {
        print!("{}", report::format_summary(&summary));
        print!("{}", report::format_confusion(&quality));
    }
    Ok(PrankExit::Success)
}

/// Handles the init command.
///
/// # Errors
/// Returns error if the file can't be written.
pub fn handle_init(config_path: &Path, force: bool) -> Result<PrankExit> {
    if config_path.exists() && !force {
        println!(
            "{} {} already exists; use --force to overwrite.",
            "~".yellow().bold(),
            config_path.display()
        );
        return Ok(PrankExit::Success);
    }
    PrankConfig::default().save(config_path)?;
    println!("{} Wrote {}", "OK".green().bold(), config_path.display());
    Ok(PrankExit::Success)
}
