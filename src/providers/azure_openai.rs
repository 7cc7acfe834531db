//! Azure OpenAI REST client for text completions, chat completions and
//! image generation.
//!
//! Every call targets `{endpoint}/openai/deployments/{deployment}/...` with the
//! configured `api-version` and authenticates with the `api-key` header.

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{AzureTarget, ENDPOINT_VAR};
use crate::gateway::{GatewayFuture, RemoteGateway};
use crate::model::{
    ChatRequest, ChatResponse, CompletionRequest, CompletionResponse, ImageRequest, ImageResponse,
    Message,
};
use crate::providers::http_errors::{request_error, status_error};
use crate::tools::FunctionDefinition;

#[derive(Debug, Serialize)]
struct CompletionsBody<'a> {
    prompt: [&'a str; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ToolBody<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a FunctionDefinition,
}

#[derive(Debug, Serialize)]
struct ChatCompletionsBody<'a> {
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolBody<'a>>,
}

#[derive(Debug, Serialize)]
struct ImageGenerationsBody<'a> {
    prompt: &'a str,
    n: u32,
    response_format: &'static str,
}

fn operation_url(
    endpoint: &str,
    deployment: &str,
    api_version: &str,
    operation: &str,
) -> Result<Url> {
    let invalid = || format!("Invalid {} '{}'", ENDPOINT_VAR, endpoint);
    let mut url = Url::parse(endpoint).with_context(invalid)?;
    url.path_segments_mut()
        .map_err(|()| anyhow!(invalid()))?
        .pop_if_empty()
        .extend(["openai", "deployments", deployment])
        .extend(operation.split('/'));
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url)
}

/// Authenticated client bound to one endpoint/key pair for the process lifetime.
pub struct AzureOpenAiClient<'a> {
    http: &'a Client,
    target: AzureTarget,
    timeout_secs: Option<u64>,
}

impl<'a> AzureOpenAiClient<'a> {
    pub fn new(http: &'a Client, target: AzureTarget, timeout_secs: Option<u64>) -> Self {
        Self {
            http,
            target,
            timeout_secs,
        }
    }

    async fn post<B, T>(&self, deployment: &str, operation: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = operation_url(
            &self.target.endpoint,
            deployment,
            &self.target.api_version,
            operation,
        )?;
        debug!(
            api_url = %url,
            deployment = %deployment,
            operation,
            "sending azure openai request"
        );

        let response = self
            .http
            .post(url.clone())
            .header("api-key", &self.target.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                warn!(
                    api_url = %url,
                    deployment = %deployment,
                    error = %err,
                    "azure openai request failed"
                );
                request_error(err, url.as_str(), self.timeout_secs, ENDPOINT_VAR)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let response_body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read response body>".to_string());
            warn!(
                api_url = %url,
                deployment = %deployment,
                status = %status,
                response_body_len = response_body.len(),
                "azure openai returned non-success status"
            );
            return Err(status_error(status, &response_body));
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {operation} response"))
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        request.validate()?;
        let body = CompletionsBody {
            prompt: [request.prompt.as_str()],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        let parsed: CompletionResponse = self
            .post(&request.deployment, "completions", &body)
            .await?;
        debug!(choice_count = parsed.choices.len(), "received completions");
        Ok(parsed)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        request.validate()?;
        let tools = request
            .tool
            .iter()
            .map(|function| ToolBody {
                kind: "function",
                function,
            })
            .collect();
        let body = ChatCompletionsBody {
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools,
        };
        let parsed: ChatResponse = self
            .post(&request.deployment, "chat/completions", &body)
            .await?;
        debug!(choice_count = parsed.choices.len(), "received chat completions");
        Ok(parsed)
    }

    pub async fn generate_images(&self, request: &ImageRequest) -> Result<ImageResponse> {
        request.validate()?;
        let body = ImageGenerationsBody {
            prompt: &request.prompt,
            n: request.count,
            response_format: "url",
        };
        let parsed: ImageResponse = self
            .post(&request.deployment, "images/generations", &body)
            .await?;
        debug!(image_count = parsed.data.len(), "received image generations");
        Ok(parsed)
    }
}

impl RemoteGateway for AzureOpenAiClient<'_> {
    fn deployment(&self) -> &str {
        &self.target.deployment
    }

    fn completions<'b>(
        &'b self,
        request: CompletionRequest,
    ) -> GatewayFuture<'b, CompletionResponse> {
        Box::pin(async move { self.complete(&request).await })
    }

    fn chat_completions<'b>(&'b self, request: ChatRequest) -> GatewayFuture<'b, ChatResponse> {
        Box::pin(async move { self.chat(&request).await })
    }

    fn image_generations<'b>(&'b self, request: ImageRequest) -> GatewayFuture<'b, ImageResponse> {
        Box::pin(async move { self.generate_images(&request).await })
    }
}
