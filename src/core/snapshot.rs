//! Market snapshot types shared by the stores, providers and engine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// One asset as reported by the market-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(rename = "image", default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_cap: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_change_24h: f64,
}

impl AssetRecord {
    /// Returns a copy of this record expressed in another currency.
    ///
    /// Market cap is truncated toward zero after scaling.
    pub fn scaled(&self, rate: f64) -> Self {
        Self {
            current_price: self.current_price * rate,
            price_change_24h: self.price_change_24h * rate,
            market_cap: (self.market_cap as f64 * rate) as i64,
            ..self.clone()
        }
    }
}

// The provider reports `null` for assets it has no figure for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ordered, immutable set of asset records for one currency.
pub type Snapshot = Arc<[AssetRecord]>;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub currency_code: String,
    pub snapshot: Snapshot,
    pub captured_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(currency_code: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            currency_code: currency_code.into(),
            snapshot,
            captured_at: Utc::now(),
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.captured_at)
    }

    /// An entry is fresh while strictly younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }
}
