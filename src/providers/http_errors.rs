use anyhow::anyhow;
use reqwest::StatusCode;
use serde::Deserialize;
use std::error::Error as StdError;
use std::io::ErrorKind;

fn error_chain_has_kind(
    err: &(dyn StdError + 'static),
    kind: ErrorKind,
    needle: &str,
) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has_kind(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has_kind(err, ErrorKind::TimedOut, "timed out")
}

/// Turns a transport failure into a message that names the variable to fix.
pub(crate) fn request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: Option<u64>,
    base_url_var: &str,
) -> anyhow::Error {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        let after = timeout_secs
            .map(|secs| format!(" after {secs}s"))
            .unwrap_or_default();
        return anyhow!(
            "Request timed out{} while calling '{}'. \
             Increase MODEL_TIMEOUT_SECS or check service responsiveness.",
            after,
            api_url
        );
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return anyhow!(
                "Connection refused by '{}'. \
                 Ensure the service is running and {} is correct.",
                api_url,
                base_url_var
            );
        }

        return anyhow!(
            "Failed to connect to '{}'. Check {} and network connectivity.",
            api_url,
            base_url_var
        );
    }

    anyhow!("Failed to call '{}': {}", api_url, err)
}

#[derive(Debug, Deserialize)]
struct ServiceErrorEnvelope {
    error: ServiceError,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Builds the error for a non-success response, preferring the service's
/// own `error.message` over the raw body.
pub(crate) fn status_error(status: StatusCode, body: &str) -> anyhow::Error {
    match serde_json::from_str::<ServiceErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.code {
            Some(code) => anyhow!(
                "Request failed with status {} ({}): {}",
                status,
                code,
                envelope.error.message
            ),
            None => anyhow!(
                "Request failed with status {}: {}",
                status,
                envelope.error.message
            ),
        },
        Err(_) => anyhow!("Request failed with status {}: {}", status, body),
    }
}
