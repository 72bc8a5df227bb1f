//! Command implementations for the MMW batch runner.
//!
//! Provides subcommands for running GWLF-E over a set of HUC-12/HUC-10
//! watersheds and for inspecting the location set on its own.

use clap::Subcommand;
use std::path::PathBuf;

pub mod config;
pub mod locations;
pub mod orchestrator;
pub mod run;
pub mod runner;
pub mod weather;

#[cfg(test)]
mod fake;

#[derive(Subcommand)]
pub enum Command {
    /// Run whole-HUC and sub-basin GWLF-E for every unit and export CSVs
    Run(run::RunArgs),

    /// Build the location set and write it as CSV without running anything
    Locations {
        #[command(flatten)]
        locations: locations::LocationArgs,

        /// Output path for the location CSV
        #[arg(short = 'o', long)]
        output: PathBuf,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run(args) => run::run_batch(&args).await,
        Command::Locations { locations, output } => {
            locations::run_locations(&locations, &output).await
        }
    }
}
