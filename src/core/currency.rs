//! Exchange rate abstractions

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// Fetches the full rate table quoted against `base`, keyed by uppercase ISO code.
    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>>;
}
