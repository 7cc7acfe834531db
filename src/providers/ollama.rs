use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Config, OLLAMA_BASE_URL_VAR};
use crate::gateway::{GatewayFuture, LocalGateway};
use crate::providers::http_errors::{request_error, status_error};
use crate::selector::LocalModel;

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

fn generate_url(base_url: &str) -> String {
    format!("{}/api/generate", base_url.trim_end_matches('/'))
}

/// Single-prompt completions against a local Ollama runtime.
pub struct OllamaClient<'a> {
    http: &'a Client,
    base_url: String,
    model: LocalModel,
    timeout_secs: Option<u64>,
}

impl<'a> OllamaClient<'a> {
    pub fn new(http: &'a Client, cfg: &Config, model: LocalModel) -> Self {
        Self {
            http,
            base_url: cfg.ollama_base_url.clone(),
            model,
            timeout_secs: cfg.model_timeout_secs,
        }
    }

    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let api_url = generate_url(&self.base_url);
        let body = OllamaGenerateRequest {
            model: self.model.as_str(),
            prompt,
            stream: false,
        };
        debug!(
            api_url = %api_url,
            model = %self.model,
            prompt_len = prompt.len(),
            "sending ollama generate request"
        );

        let response = self
            .http
            .post(&api_url)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    api_url = %api_url,
                    model = %self.model,
                    error = %err,
                    "ollama request failed"
                );
                request_error(err, &api_url, self.timeout_secs, OLLAMA_BASE_URL_VAR)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let response_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response body>".to_string());
            warn!(
                api_url = %api_url,
                model = %self.model,
                status = %status,
                response_body_len = response_body.len(),
                "ollama returned non-success status"
            );
            return Err(status_error(status, &response_body));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .context("Failed to parse local model response")?;
        debug!(
            model = %self.model,
            response_len = parsed.response.len(),
            "received ollama generate response"
        );
        Ok(parsed.response)
    }
}

impl LocalGateway for OllamaClient<'_> {
    fn model_name(&self) -> &str {
        self.model.as_str()
    }

    fn generate<'b>(&'b self, prompt: String) -> GatewayFuture<'b, String> {
        Box::pin(async move { self.complete(&prompt).await })
    }
}
