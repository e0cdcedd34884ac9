//! Fetchers that pull from upstream providers and write through to the stores.
//!
//! A failed fetch performs no store write, so whatever was cached before stays
//! authoritative.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::core::{
    CacheEntry, CurrencyError, CurrencyResult, ExchangeRateProvider, MarketDataProvider, Snapshot,
};
use crate::store::{RateStore, SnapshotStore};

pub struct MarketFetcher {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<SnapshotStore>,
}

impl MarketFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: Arc<SnapshotStore>) -> Self {
        Self { provider, cache }
    }

    /// Fetches a fresh snapshot for a direct currency and stores it.
    pub async fn refresh(&self, code: &str) -> CurrencyResult<Snapshot> {
        let records = self
            .provider
            .fetch_markets(code)
            .await
            .map_err(CurrencyError::upstream)?;

        let snapshot: Snapshot = records.into();
        self.cache
            .put(CacheEntry::new(code, Arc::clone(&snapshot)))
            .await;
        info!(currency = code, assets = snapshot.len(), "Updated cache");
        Ok(snapshot)
    }
}

pub struct RateFetcher {
    provider: Arc<dyn ExchangeRateProvider>,
    rates: Arc<RateStore>,
    base: String,
    tracked: Vec<String>,
}

impl RateFetcher {
    pub fn new(
        provider: Arc<dyn ExchangeRateProvider>,
        rates: Arc<RateStore>,
        base: &str,
        tracked: &[String],
    ) -> Self {
        Self {
            provider,
            rates,
            base: base.to_string(),
            tracked: tracked.to_vec(),
        }
    }

    /// Fetches the full table for the base currency and merges the tracked subset.
    ///
    /// Returns the merged keys. Tracked keys missing from the response keep their
    /// previous values.
    pub async fn refresh(&self) -> CurrencyResult<Vec<String>> {
        let table = self
            .provider
            .fetch_rates(&self.base)
            .await
            .map_err(CurrencyError::upstream)?;

        let subset: HashMap<String, f64> = self
            .tracked
            .iter()
            .filter_map(|key| table.get(key).map(|rate| (key.clone(), *rate)))
            .collect();
        let mut merged: Vec<String> = subset.keys().cloned().collect();
        merged.sort();

        self.rates.merge(subset, Utc::now()).await;
        info!(base = %self.base, rates = ?merged, "Exchange rates updated");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{StaticMarketProvider, StaticRateProvider, asset};

    #[tokio::test]
    async fn test_market_refresh_writes_once() {
        let provider = Arc::new(StaticMarketProvider::new());
        provider.set("usd", vec![asset("bitcoin", 50000.0, 1_000_000_000, 2.5)]);
        let cache = Arc::new(SnapshotStore::new());
        let fetcher = MarketFetcher::new(provider.clone(), Arc::clone(&cache));

        let snapshot = fetcher.refresh("usd").await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(provider.calls("usd"), 1);
        let entry = cache.get("usd").await.unwrap();
        assert_eq!(entry.snapshot, snapshot);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_failed_market_refresh_keeps_stale_entry() {
        let provider = Arc::new(StaticMarketProvider::new());
        provider.set("usd", vec![asset("bitcoin", 50000.0, 1_000_000_000, 2.5)]);
        let cache = Arc::new(SnapshotStore::new());
        let fetcher = MarketFetcher::new(provider.clone(), Arc::clone(&cache));
        fetcher.refresh("usd").await.unwrap();
        let before = cache.get("usd").await.unwrap();

        provider.fail("usd");
        let err = fetcher.refresh("usd").await.unwrap_err();

        assert!(matches!(err, CurrencyError::UpstreamUnavailable(_)));
        let after = cache.get("usd").await.unwrap();
        assert_eq!(after.captured_at, before.captured_at);
        assert_eq!(after.snapshot, before.snapshot);
    }

    #[tokio::test]
    async fn test_rate_refresh_merges_tracked_subset() {
        let provider = Arc::new(StaticRateProvider::new(HashMap::from([
            ("KZT".to_string(), 450.0),
            ("EUR".to_string(), 0.92),
            ("GBP".to_string(), 0.79),
        ])));
        let rates = Arc::new(RateStore::new());
        let tracked = vec!["EUR".to_string(), "KZT".to_string(), "UAH".to_string()];
        let fetcher = RateFetcher::new(provider.clone(), Arc::clone(&rates), "usd", &tracked);

        let merged = fetcher.refresh().await.unwrap();

        assert_eq!(merged, vec!["EUR", "KZT"]);
        assert_eq!(provider.calls(), 1);
        assert_eq!(rates.get("KZT").await.unwrap().rate, 450.0);
        assert!(rates.get("GBP").await.is_none());
        assert!(rates.get("UAH").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_rate_refresh_is_a_noop() {
        let provider = Arc::new(StaticRateProvider::new(HashMap::from([(
            "KZT".to_string(),
            450.0,
        )])));
        let rates = Arc::new(RateStore::new());
        let tracked = vec!["KZT".to_string()];
        let fetcher = RateFetcher::new(provider.clone(), Arc::clone(&rates), "usd", &tracked);
        fetcher.refresh().await.unwrap();
        let before = rates.table().await;

        provider.fail();
        assert!(fetcher.refresh().await.is_err());
        assert_eq!(rates.table().await, before);
    }
}
