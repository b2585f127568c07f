mod auth;
mod cli;
mod config;
mod error;
mod git;
mod output;
mod providers;
mod signal;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting cci");
    cli.execute().await?;

    Ok(())
}
