pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod providers;
pub mod selector;
pub mod tools;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use reqwest::Client;
use std::env;
use std::time::Duration;
use tracing::{info, warn};

use cli::Cli;
use config::Config;

pub async fn run(cli: Cli) -> Result<()> {
    let env_file = config::env_file_path(env::var("AOAI_ENV_FILE").ok().as_deref());
    let cfg = Config::load(&env_file).inspect_err(|err| {
        warn!(env_file = %env_file.display(), error = %err, "failed to load env file");
    })?;
    info!(
        env_file = %env_file.display(),
        api_version = %cfg.azure_api_version,
        ollama_base_url = %cfg.ollama_base_url,
        model_timeout_secs = ?cfg.model_timeout_secs,
        "loaded runtime configuration"
    );

    let mut builder = Client::builder();
    if let Some(secs) = cfg.model_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder
        .build()
        .context("Failed to initialize HTTP client")?;

    commands::dispatch(cli.command, &cfg, &client).await
}
