use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer, Serialize};

use crate::tools::FunctionDefinition;

pub const MAX_TOKENS_LIMIT: u32 = 16_384;
const MIN_TEMPERATURE: f32 = 0.0;
const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A text-completion call against one deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub deployment: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn validate(&self) -> Result<()> {
        check_deployment(&self.deployment)?;
        check_max_tokens(self.max_tokens)?;
        check_temperature(self.temperature)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub deployment: String,
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub tool: Option<FunctionDefinition>,
}

impl ChatRequest {
    pub fn new(deployment: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            deployment: deployment.into(),
            messages,
            max_tokens: None,
            temperature: None,
            tool: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_deployment(&self.deployment)?;
        if self.messages.is_empty() {
            bail!("chat request needs at least one message");
        }
        if let Some(max_tokens) = self.max_tokens {
            check_max_tokens(max_tokens)?;
        }
        if let Some(temperature) = self.temperature {
            check_temperature(temperature)?;
        }
        if let Some(tool) = &self.tool {
            tool.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub deployment: String,
    pub prompt: String,
    pub count: u32,
}

impl ImageRequest {
    pub fn validate(&self) -> Result<()> {
        check_deployment(&self.deployment)?;
        if self.prompt.trim().is_empty() {
            bail!("image prompt must not be empty");
        }
        if self.count == 0 {
            bail!("image count must be at least 1");
        }
        Ok(())
    }
}

fn check_deployment(deployment: &str) -> Result<()> {
    if deployment.trim().is_empty() {
        bail!("deployment name must not be empty");
    }
    Ok(())
}

fn check_max_tokens(max_tokens: u32) -> Result<()> {
    if max_tokens == 0 || max_tokens > MAX_TOKENS_LIMIT {
        bail!(
            "max_tokens must be between 1 and {}, got {}",
            MAX_TOKENS_LIMIT,
            max_tokens
        );
    }
    Ok(())
}

fn check_temperature(temperature: f32) -> Result<()> {
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        bail!(
            "temperature must be between {} and {}, got {}",
            MIN_TEMPERATURE,
            MAX_TEMPERATURE,
            temperature
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterVerdict {
    #[serde(default)]
    pub filtered: bool,
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FilterError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Safety classification the service attaches to each generated choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContentFilterResults {
    pub hate: Option<FilterVerdict>,
    pub self_harm: Option<FilterVerdict>,
    pub sexual: Option<FilterVerdict>,
    pub violence: Option<FilterVerdict>,
    pub error: Option<FilterError>,
}

impl ContentFilterResults {
    pub fn categories(&self) -> [(&'static str, Option<&FilterVerdict>); 4] {
        [
            ("Hate", self.hate.as_ref()),
            ("SelfHarm", self.self_harm.as_ref()),
            ("Sexual", self.sexual.as_ref()),
            ("Violence", self.violence.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub content_filter_results: Option<ContentFilterResults>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tool_calls: Vec<ToolCall>,
}

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub message: Option<ResponseMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub content_filter_results: Option<ContentFilterResults>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

impl ChatResponse {
    pub fn first_tool_call(&self) -> Option<&ToolCall> {
        self.choices
            .iter()
            .filter_map(|choice| choice.message.as_ref())
            .flat_map(|message| message.tool_calls.iter())
            .next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub data: Vec<GeneratedImage>,
}
