//! Read path for currency data.
//!
//! A read either serves a fresh cache entry or does the minimal synchronous work to
//! produce one: a single fetch for a direct currency, or a base refresh (only when the
//! base is stale) followed by a derivation for a derived currency.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::{CurrencyCatalog, CurrencyError, CurrencyKind, CurrencyResult, Snapshot};
use crate::engine::derive::Deriver;
use crate::engine::fetcher::MarketFetcher;
use crate::store::SnapshotStore;

pub struct CurrencyService {
    catalog: Arc<CurrencyCatalog>,
    cache: Arc<SnapshotStore>,
    market: Arc<MarketFetcher>,
    deriver: Arc<Deriver>,
    ttl: Duration,
}

impl CurrencyService {
    pub fn new(
        catalog: Arc<CurrencyCatalog>,
        cache: Arc<SnapshotStore>,
        market: Arc<MarketFetcher>,
        deriver: Arc<Deriver>,
        ttl: Duration,
    ) -> Self {
        Self {
            catalog,
            cache,
            market,
            deriver,
            ttl,
        }
    }

    #[instrument(name = "GetCurrencyData", skip(self), fields(currency = %code))]
    pub async fn get_currency_data(&self, code: &str) -> CurrencyResult<Snapshot> {
        let kind = self
            .catalog
            .kind(code)
            .ok_or_else(|| CurrencyError::Unsupported(code.to_string()))?;

        if let Some(snapshot) = self.fresh_snapshot(code).await {
            debug!("Serving {} from cache", code);
            return Ok(snapshot);
        }

        match kind {
            CurrencyKind::Direct => self.market.refresh(code).await,
            CurrencyKind::Derived(derived) => {
                if self.fresh_snapshot(&derived.base).await.is_none() {
                    debug!(base = %derived.base, "Refreshing base currency for {} conversion", code);
                    self.market.refresh(&derived.base).await?;
                }
                self.deriver.usable_rate(&derived.rate_key).await?;
                self.deriver.derive(code).await
            }
        }
    }

    /// Latest stored rate for `rate_key`, regardless of age.
    pub async fn exchange_rate(&self, rate_key: &str) -> CurrencyResult<f64> {
        self.deriver
            .rates()
            .get(&rate_key.to_uppercase())
            .await
            .map(|quote| quote.rate)
            .ok_or_else(|| {
                CurrencyError::PrerequisiteMissing(format!(
                    "exchange rate for {rate_key} not available"
                ))
            })
    }

    pub fn supported_currencies(&self) -> Vec<String> {
        self.catalog.all()
    }

    pub fn catalog(&self) -> &CurrencyCatalog {
        &self.catalog
    }

    async fn fresh_snapshot(&self, code: &str) -> Option<Snapshot> {
        self.cache
            .get(code)
            .await
            .filter(|entry| entry.is_fresh(self.ttl, Utc::now()))
            .map(|entry| entry.snapshot)
    }
}
