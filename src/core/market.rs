//! Market data abstractions

use crate::core::snapshot::AssetRecord;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches the asset list priced in `vs_currency`.
    async fn fetch_markets(&self, vs_currency: &str) -> Result<Vec<AssetRecord>>;
}
