use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("crypto-tracker/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by every request of one provider.
///
/// `timeout` bounds the whole request, connect through body.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Reads a JSON body, failing on any non-success status or on a payload that does not
/// parse as `T`. `label` names the request in error messages.
pub async fn read_json<T>(response: reqwest::Response, label: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("HTTP error: {} for {}", status, label));
    }

    // Request URLs may carry credentials in the path.
    let text = response.text().await.map_err(|e| {
        anyhow!(
            "Failed to read response body for {}: {}",
            label,
            e.without_url()
        )
    })?;
    debug!(bytes = text.len(), "Received response for {}", label);

    serde_json::from_str(&text)
        .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", label, e))
}
