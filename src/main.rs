mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use spectrabrainz::config::Config;
use spectrabrainz::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    observability::init_tracing();

    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    commands::run(config, cli.command).await
}
