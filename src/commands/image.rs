use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::console::Console;
use crate::gateway::RemoteGateway;
use crate::model::ImageRequest;

const IMAGE_PROMPT: &str = "What image do you want to create? ";

pub async fn probe_image(http: &Client, url: &str) -> Result<StatusCode> {
    let response = http
        .head(url)
        .send()
        .await
        .with_context(|| format!("HEAD request to '{url}' failed"))?;
    Ok(response.status())
}

/// Fetches `url` into a new `*.jpg` file under `dir` and returns its path.
/// The file only survives once every byte has been written.
pub async fn download_image(http: &Client, url: &str, dir: &Path) -> Result<PathBuf> {
    let response = http
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download image from '{url}'"))?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!(
            "Image download from '{}' failed with status {}",
            url,
            status
        ));
    }
    let bytes = response
        .bytes()
        .await
        .context("Failed to read image bytes")?;

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create download directory '{}'", dir.display()))?;
    let prefix = format!("image-{}-", Utc::now().format("%Y%m%dT%H%M%SZ"));
    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".jpg")
        .tempfile_in(dir)
        .with_context(|| format!("Error creating file in '{}'", dir.display()))?;
    file.write_all(&bytes).context("Failed to write image file")?;
    file.flush().context("Failed to write image file")?;

    let (_file, path) = file.keep().context("Failed to keep downloaded image")?;
    debug!(path = %path.display(), bytes = bytes.len(), "image downloaded");
    Ok(path)
}

/// Generates images for a prompt, checks each URL, and downloads them into
/// `download_dir` when one is given.
pub async fn run<R, W, G>(
    console: &mut Console<R, W>,
    gateway: &G,
    http: &Client,
    download_dir: Option<&Path>,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    G: RemoteGateway,
{
    let prompt = console.ask(IMAGE_PROMPT)?;
    if prompt.trim().is_empty() {
        bail!("No image prompt entered");
    }
    writeln!(console.out(), "Creating image based on your prompt... {prompt}")?;

    let response = gateway
        .image_generations(ImageRequest {
            deployment: gateway.deployment().to_string(),
            prompt,
            count: 1,
        })
        .await?;
    if response.data.is_empty() {
        bail!("The service returned no images");
    }

    for image in &response.data {
        let url = image
            .url
            .as_deref()
            .context("Image generation response is missing a URL")?;
        let status = probe_image(http, url).await?;

        let out = console.out();
        writeln!(
            out,
            "Image generated, HEAD request on URL returned {}",
            status.as_u16()
        )?;
        writeln!(out, "Image URL: {url}")?;
        if let Some(revised) = &image.revised_prompt {
            writeln!(out, "Revised prompt: {revised}")?;
        }

        if let Some(dir) = download_dir {
            writeln!(out, "Downloading image...")?;
            let path = download_image(http, url, dir).await?;
            info!(path = %path.display(), "stored generated image");
            writeln!(
                console.out(),
                "Success! Your image has been downloaded to {}",
                path.display()
            )?;
        }
    }
    Ok(())
}
