pub mod image;
pub mod question;
pub mod translate;
pub mod weather;

use anyhow::Result;
use reqwest::Client;
use std::io::Write;
use tracing::info;

use crate::cli::Command;
use crate::config::{Config, Deployment};
use crate::console::Console;
use crate::model::{ChatResponse, ContentFilterResults};
use crate::providers::azure_openai::AzureOpenAiClient;
use crate::providers::ollama::OllamaClient;
use crate::selector::select_local_model;

/// Runs one subcommand to completion. Remote commands check their required
/// configuration before a client exists, so a missing variable never
/// reaches the network.
pub async fn dispatch(command: Command, cfg: &Config, http: &Client) -> Result<()> {
    info!(command = command.name(), "running command");
    let mut console = Console::stdio();

    match command {
        Command::Question { local: true } => {
            let model = select_local_model(&mut console)?;
            let ollama = OllamaClient::new(http, cfg, model);
            question::ask_local(&mut console, &ollama).await
        }
        Command::Question { local: false } => {
            let azure = remote_client(cfg, http, Deployment::Completions)?;
            question::ask_remote(&mut console, &azure).await
        }
        Command::Translate { local: true } => {
            let model = select_local_model(&mut console)?;
            let ollama = OllamaClient::new(http, cfg, model);
            translate::translate_local(&mut console, &ollama).await
        }
        Command::Translate { local: false } => {
            let azure = remote_client(cfg, http, Deployment::Chat)?;
            translate::translate_remote(&mut console, &azure).await
        }
        Command::GetWeather => {
            let azure = remote_client(cfg, http, Deployment::Chat)?;
            weather::run(console.out(), &azure).await.map(|_| ())
        }
        Command::Image { download } => {
            let azure = remote_client(cfg, http, Deployment::Image)?;
            let download_dir = download.then_some(cfg.image_download_dir.as_path());
            image::run(&mut console, &azure, http, download_dir).await
        }
    }
}

fn remote_client<'a>(
    cfg: &Config,
    http: &'a Client,
    deployment: Deployment,
) -> Result<AzureOpenAiClient<'a>> {
    let target = cfg.azure_target(deployment)?;
    Ok(AzureOpenAiClient::new(http, target, cfg.model_timeout_secs))
}

pub(crate) fn write_content_filter<W: Write>(
    out: &mut W,
    filters: &ContentFilterResults,
) -> Result<()> {
    writeln!(out, "Content filter results")?;
    if let Some(error) = &filters.error {
        writeln!(
            out,
            "  Error: {}: {}",
            error.code.as_deref().unwrap_or("unknown"),
            error.message.as_deref().unwrap_or("")
        )?;
    }
    for (category, verdict) in filters.categories() {
        if let Some(verdict) = verdict {
            writeln!(
                out,
                "  {}: sev: {}, filtered: {}",
                category,
                verdict.severity.as_deref().unwrap_or("unknown"),
                verdict.filtered
            )?;
        }
    }
    Ok(())
}

pub(crate) fn write_chat_choices<W: Write>(out: &mut W, response: &ChatResponse) -> Result<()> {
    for choice in &response.choices {
        if let Some(filters) = &choice.content_filter_results {
            write_content_filter(out, filters)?;
        }
        if let Some(content) = choice
            .message
            .as_ref()
            .and_then(|message| message.content.as_deref())
        {
            writeln!(out, "Content[{}]: {}", choice.index, content)?;
        }
        if let Some(reason) = &choice.finish_reason {
            writeln!(out, "Finish reason[{}]: {}", choice.index, reason)?;
        }
    }

    if !response.choices.is_empty() {
        writeln!(out, "Received chat completions reply")?;
    }
    Ok(())
}
