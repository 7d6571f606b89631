//! ExpertDesk CLI: browse and filter the expert network from the terminal.
//!
//! Fetches experts, career history, and project memberships from the
//! operations backend, joins them, and lists the experts matching the
//! given filters.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
