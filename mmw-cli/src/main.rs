//! MMW CLI - batch GWLF-E modeling of HUC watersheds on Model My Watershed.

use clap::Parser;
use std::path::PathBuf;

mod logging;

#[derive(Parser)]
#[command(
    name = "mmw-cli",
    version,
    about = "Batch GWLF-E runs over HUC-12/HUC-10 watersheds"
)]
struct Cli {
    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: mmw_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref())?;
    mmw_cmd::run(cli.command).await
}
