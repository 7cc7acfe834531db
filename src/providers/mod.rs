pub mod azure_openai;
pub(crate) mod http_errors;
pub mod ollama;
