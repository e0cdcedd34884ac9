use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::{AssetRecord, MarketDataProvider};
use crate::providers::util::{build_client, read_json};

pub const API_KEY_HEADER: &str = "x-cg-pro-api-key";

// CoinGeckoProvider implementation for MarketDataProvider
pub struct CoinGeckoProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    #[instrument(
        name = "CoinGeckoMarketsFetch",
        skip(self),
        fields(vs_currency = %vs_currency)
    )]
    async fn fetch_markets(&self, vs_currency: &str) -> Result<Vec<AssetRecord>> {
        let url = format!("{}/coins/markets?vs_currency={}", self.base_url, vs_currency);
        debug!("Requesting market data from {}", url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for currency: {}", e, vs_currency))?;

        read_json(response, &format!("currency: {vs_currency}")).await
    }
}
