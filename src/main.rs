use anyhow::Result;
use clap::Parser;

use aoai_cli::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    aoai_cli::logging::init();
    aoai_cli::run(cli).await
}
