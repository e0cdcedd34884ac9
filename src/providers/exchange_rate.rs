use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::ExchangeRateProvider;
use crate::providers::util::{build_client, read_json};

// ExchangeRateApiProvider implementation for ExchangeRateProvider
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.filter(|k| !k.is_empty());
        if api_key.is_none() {
            warn!("No exchange rate API key configured, derived currencies will be unavailable");
        }
        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: build_client(timeout)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
    #[serde(alias = "rates", default)]
    conversion_rates: Option<HashMap<String, f64>>,
}

#[async_trait]
impl ExchangeRateProvider for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRatesFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>> {
        let base = base.to_uppercase();
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(anyhow!("No API key configured for exchange rates: {}", base));
        };
        let url = format!("{}/{}/latest/{}", self.base_url, api_key, base);
        debug!(base = %base, "Requesting exchange rates");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for exchange rates: {}", e.without_url(), base))?;

        let label = format!("exchange rates: {base}");
        let data: LatestRatesResponse = read_json(response, &label).await?;

        if data.result.as_deref() == Some("error") {
            return Err(anyhow!(
                "Provider error: {} for {}",
                data.error_type.as_deref().unwrap_or("unknown"),
                label
            ));
        }

        data.conversion_rates
            .ok_or_else(|| anyhow!("No rate data found for {}", label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test-key/latest/USD"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider(server: &MockServer) -> ExchangeRateApiProvider {
        ExchangeRateApiProvider::new(
            &server.uri(),
            Some("test-key".to_string()),
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let body = r#"{
            "result": "success",
            "base_code": "USD",
            "conversion_rates": {"USD": 1, "EUR": 0.92, "KZT": 450.5}
        }"#;
        let mock_server = create_mock_server(200, body).await;

        let rates = provider(&mock_server).fetch_rates("usd").await.unwrap();
        assert_eq!(rates.len(), 3);
        assert_eq!(rates["KZT"], 450.5);
        assert_eq!(rates["EUR"], 0.92);
    }

    #[tokio::test]
    async fn test_rates_alias_is_accepted() {
        let mock_server = create_mock_server(200, r#"{"rates": {"KZT": 470}}"#).await;

        let rates = provider(&mock_server).fetch_rates("USD").await.unwrap();
        assert_eq!(rates["KZT"], 470.0);
    }

    #[tokio::test]
    async fn test_provider_error_payload() {
        let body = r#"{"result": "error", "error-type": "invalid-key"}"#;
        let mock_server = create_mock_server(200, body).await;

        let result = provider(&mock_server).fetch_rates("USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Provider error: invalid-key for exchange rates: USD"
        );
    }

    #[tokio::test]
    async fn test_rates_api_error_response() {
        let mock_server = create_mock_server(503, "").await;

        let result = provider(&mock_server).fetch_rates("USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 503 Service Unavailable for exchange rates: USD"
        );
    }

    #[tokio::test]
    async fn test_missing_rates_map() {
        let mock_server = create_mock_server(200, r#"{"result": "success"}"#).await;

        let result = provider(&mock_server).fetch_rates("USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rate data found for exchange rates: USD"
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(0)
            .mount(&mock_server)
            .await;

        let provider =
            ExchangeRateApiProvider::new(&mock_server.uri(), Some(String::new()), Duration::from_secs(10))
                .unwrap();
        let result = provider.fetch_rates("USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No API key configured for exchange rates: USD"
        );
    }

    #[tokio::test]
    async fn test_truncated_body_error_omits_api_key() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 500\r\n\r\n{\"rates\": {",
                )
                .await
                .unwrap();
            socket.flush().await.unwrap();
            // Dropping the socket ends the body early.
        });

        let provider = ExchangeRateApiProvider::new(
            &format!("http://{addr}"),
            Some("secret-rate-key".to_string()),
            Duration::from_secs(10),
        )
        .unwrap();
        let err = provider.fetch_rates("USD").await.unwrap_err();
        let message = format!("{err:#}");

        assert!(
            message.starts_with("Failed to read response body for exchange rates: USD"),
            "unexpected error: {message}"
        );
        assert!(!message.contains("secret-rate-key"), "key leaked: {message}");
    }
}
