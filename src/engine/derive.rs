//! Derivation of snapshots for currencies the market-data provider does not quote.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;

use crate::core::{
    AssetRecord, CacheEntry, CurrencyCatalog, CurrencyError, CurrencyKind, CurrencyResult, Snapshot,
};
use crate::store::{RateStore, SnapshotStore};

/// Scales every record of `base` by `rate`. Pure: same inputs, same output.
pub fn scale_snapshot(base: &[AssetRecord], rate: f64) -> Snapshot {
    base.iter().map(|record| record.scaled(rate)).collect()
}

pub struct Deriver {
    catalog: Arc<CurrencyCatalog>,
    cache: Arc<SnapshotStore>,
    rates: Arc<RateStore>,
    ttl: Duration,
    max_rate_age: Duration,
}

impl Deriver {
    pub fn new(
        catalog: Arc<CurrencyCatalog>,
        cache: Arc<SnapshotStore>,
        rates: Arc<RateStore>,
        ttl: Duration,
        max_rate_age: Duration,
    ) -> Self {
        Self {
            catalog,
            cache,
            rates,
            ttl,
            max_rate_age,
        }
    }

    pub fn rates(&self) -> &RateStore {
        &self.rates
    }

    /// Returns the usable rate for `rate_key`, or why there is none.
    pub async fn usable_rate(&self, rate_key: &str) -> CurrencyResult<f64> {
        let quote = self.rates.get(rate_key).await.ok_or_else(|| {
            CurrencyError::PrerequisiteMissing(format!("{rate_key} exchange rate is not available"))
        })?;

        if quote.age(Utc::now()) > self.max_rate_age {
            return Err(CurrencyError::PrerequisiteMissing(format!(
                "{rate_key} exchange rate is expired (updated at {})",
                quote.updated_at
            )));
        }
        Ok(quote.rate)
    }

    /// Computes and stores the snapshot for a derived currency.
    ///
    /// Requires a fresh base snapshot and a rate no older than the maximum rate age;
    /// otherwise nothing is written.
    pub async fn derive(&self, code: &str) -> CurrencyResult<Snapshot> {
        let derived = match self.catalog.kind(code) {
            Some(CurrencyKind::Derived(derived)) => derived,
            Some(CurrencyKind::Direct) => {
                return Err(CurrencyError::Unsupported(format!(
                    "{code} is a direct currency and cannot be derived"
                )));
            }
            None => return Err(CurrencyError::Unsupported(code.to_string())),
        };

        let base = self
            .cache
            .get(&derived.base)
            .await
            .filter(|entry| entry.is_fresh(self.ttl, Utc::now()))
            .ok_or_else(|| {
                CurrencyError::PrerequisiteMissing(format!(
                    "{} data is not available for {code} conversion",
                    derived.base
                ))
            })?;
        let rate = self.usable_rate(&derived.rate_key).await?;

        let snapshot = scale_snapshot(&base.snapshot, rate);
        self.cache
            .put(CacheEntry::new(code, Arc::clone(&snapshot)))
            .await;
        info!(currency = code, base = %derived.base, rate, "Updated derived cache");
        Ok(snapshot)
    }
}
