use clap::Parser;
use colored::Colorize;
use prank_core::cli::{self, Cli};
use prank_core::exit::PrankExit;
use tracing_subscriber::EnvFilter;

fn main() -> PrankExit {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "info" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = if let Some(cmd) = cli.command {
        cli::dispatch::execute(cmd, &cli.config)
    } else {
        use clap::CommandFactory;
        let _ = Cli::command().print_help();
        Ok(PrankExit::Success)
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            PrankExit::Error
        }
    }
}
