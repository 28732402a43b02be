//! Shared plumbing for the hosted-API clients

use std::time::Duration;

use reqwest::Client;
use reqwest::Response;

use crate::errors::ExplorerError;
use crate::errors::Result;

/// Build the HTTP client used for outbound API calls
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| ExplorerError::HttpError(e.to_string()))
}

/// Turn a non-2xx response into an [`ExplorerError::Upstream`] carrying the body
pub async fn check_status(service: &'static str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ExplorerError::Upstream {
        service,
        status,
        message,
    })
}

/// Fail fast with a configuration error when an API key is missing
pub fn require_key<'a>(key: &'a str, env_name: &str) -> Result<&'a str> {
    if key.trim().is_empty() {
        return Err(ExplorerError::ConfigError(format!(
            "{env_name} is not set"
        )));
    }
    Ok(key)
}
