use std::path::PathBuf;

use crate::config::Config;

pub(crate) fn test_config() -> Config {
    Config {
        azure_endpoint: "https://example.openai.azure.com".to_string(),
        azure_api_key: "test-key".to_string(),
        azure_api_version: "2024-02-01".to_string(),
        completions_deployment: "text-dep".to_string(),
        chat_deployment: "chat-dep".to_string(),
        image_deployment: "dalle-dep".to_string(),
        ollama_base_url: "http://localhost:11434".to_string(),
        model_timeout_secs: Some(5),
        image_download_dir: PathBuf::from("images"),
    }
}

pub(crate) fn config_with(edit: impl FnOnce(&mut Config)) -> Config {
    let mut cfg = test_config();
    edit(&mut cfg);
    cfg
}
