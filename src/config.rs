use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_ENV_FILE: &str = ".env";
const DEFAULT_API_VERSION: &str = "2024-02-01";
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
pub const OLLAMA_BASE_URL_VAR: &str = "OLLAMA_BASE_URL";

/// Which Azure OpenAI deployment a command talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    Completions,
    Chat,
    Image,
}

impl Deployment {
    pub fn env_key(&self) -> &'static str {
        match self {
            Self::Completions => "AZURE_OPENAI_COMPLETIONS_DEPLOYMENT",
            Self::Chat => "AZURE_OPENAI_CHAT_DEPLOYMENT",
            Self::Image => "AZURE_OPENAI_IMAGE_DEPLOYMENT",
        }
    }
}

/// Everything needed to address one deployment of an Azure OpenAI resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureTarget {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub deployment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingConfig {
    keys: Vec<&'static str>,
}

impl MissingConfig {
    pub fn keys(&self) -> &[&'static str] {
        &self.keys
    }
}

impl fmt::Display for MissingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unable to continue, environment variables missing: {}",
            self.keys.join(", ")
        )
    }
}

impl Error for MissingConfig {}

#[derive(Debug, Clone)]
pub struct Config {
    pub azure_endpoint: String,
    pub azure_api_key: String,
    pub azure_api_version: String,
    pub completions_deployment: String,
    pub chat_deployment: String,
    pub image_deployment: String,
    pub ollama_base_url: String,
    /// Request timeout; `None` lets requests run as long as the service takes.
    pub model_timeout_secs: Option<u64>,
    pub image_download_dir: PathBuf,
}

impl Config {
    /// Builds the configuration from the process environment layered over
    /// the given env file. Process variables win over file values.
    pub fn load(env_file: &Path) -> Result<Self> {
        let file_vars = read_env_file(env_file)
            .with_context(|| format!("Error loading env file '{}'", env_file.display()))?;
        Ok(Self::from_env_with(|key| {
            env::var(key).ok().or_else(|| file_vars.get(key).cloned())
        }))
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let mut get_trimmed = |key: &str| {
            get_var(key)
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        let azure_endpoint = get_trimmed(ENDPOINT_VAR);
        let azure_api_key = get_trimmed(API_KEY_VAR);
        let azure_api_version = non_empty_or(
            get_trimmed("AZURE_OPENAI_API_VERSION"),
            DEFAULT_API_VERSION,
        );
        let completions_deployment = get_trimmed(Deployment::Completions.env_key());
        let chat_deployment = get_trimmed(Deployment::Chat.env_key());
        let image_deployment = get_trimmed(Deployment::Image.env_key());
        let ollama_base_url =
            non_empty_or(get_trimmed(OLLAMA_BASE_URL_VAR), DEFAULT_OLLAMA_BASE_URL);
        let model_timeout_secs =
            parse_model_timeout_secs(Some(get_trimmed("MODEL_TIMEOUT_SECS").as_str()));
        let image_download_dir =
            parse_image_download_dir(Some(get_trimmed("IMAGE_DOWNLOAD_DIR").as_str()));

        Self {
            azure_endpoint,
            azure_api_key,
            azure_api_version,
            completions_deployment,
            chat_deployment,
            image_deployment,
            ollama_base_url,
            model_timeout_secs,
            image_download_dir,
        }
    }

    /// Resolves the endpoint, key and deployment a remote command needs.
    /// Every empty value is reported, not just the first.
    pub fn azure_target(&self, deployment: Deployment) -> Result<AzureTarget, MissingConfig> {
        let deployment_name = match deployment {
            Deployment::Completions => &self.completions_deployment,
            Deployment::Chat => &self.chat_deployment,
            Deployment::Image => &self.image_deployment,
        };

        let keys: Vec<&'static str> = [
            (API_KEY_VAR, &self.azure_api_key),
            (deployment.env_key(), deployment_name),
            (ENDPOINT_VAR, &self.azure_endpoint),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| key)
        .collect();

        if !keys.is_empty() {
            return Err(MissingConfig { keys });
        }

        Ok(AzureTarget {
            endpoint: self.azure_endpoint.clone(),
            api_key: self.azure_api_key.clone(),
            api_version: self.azure_api_version.clone(),
            deployment: deployment_name.clone(),
        })
    }
}

/// Env file location: `AOAI_ENV_FILE` when set, otherwise `.env`.
pub fn env_file_path(raw: Option<&str>) -> PathBuf {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE))
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn parse_model_timeout_secs(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

fn parse_image_download_dir(raw: Option<&str>) -> PathBuf {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir)
}
