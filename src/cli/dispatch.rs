//! Command dispatch logic extracted from binary to reduce main function size.

use std::path::Path;

use anyhow::Result;

use super::args::Commands;
use super::handlers::{handle_init, handle_simulate};
use crate::exit::PrankExit;

/// Executes the parsed command.
///
/// # Errors
/// Returns error if the command handler fails.
pub fn execute(command: Commands, config_path: &Path) -> Result<PrankExit> {
    match command {
        Commands::Simulate(args) => handle_simulate(config_path, &args),
        Commands::Init { force } => handle_init(config_path, force),
    }
}
