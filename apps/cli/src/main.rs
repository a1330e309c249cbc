//! pageguide CLI: Panviva guidance for the Salesforce page you are on.
//!
//! Resolves the overview artefact and its linked quick answers for a page,
//! and drives the live Panviva window through the SDK bridge.

mod browse;
mod commands;
mod console;

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
