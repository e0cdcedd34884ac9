use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Exchange rates quoted as units of the target per one unit of the base currency.
///
/// `updated_at` covers the whole table, not individual rates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    pub rates: HashMap<String, f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateQuote {
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
}

impl RateQuote {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.updated_at)
    }
}

#[derive(Debug, Default)]
pub struct RateStore {
    inner: RwLock<RateTable>,
}

impl RateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, code: &str) -> Option<RateQuote> {
        let table = self.inner.read().await;
        let rate = *table.rates.get(code)?;
        let updated_at = table.updated_at?;
        Some(RateQuote { rate, updated_at })
    }

    /// Overwrites only the keys present in `new_rates` and stamps the table with
    /// `observed_at`. Applied under one write lock.
    pub async fn merge(&self, new_rates: HashMap<String, f64>, observed_at: DateTime<Utc>) {
        let mut table = self.inner.write().await;
        debug!(count = new_rates.len(), "Rate table MERGE");
        table.rates.extend(new_rates);
        table.updated_at = Some(observed_at);
    }

    #[cfg(test)]
    pub(crate) async fn table(&self) -> RateTable {
        self.inner.read().await.clone()
    }
}
