//! In-memory provider doubles for engine tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::{AssetRecord, ExchangeRateProvider, MarketDataProvider};

pub fn asset(id: &str, price: f64, market_cap: i64, change: f64) -> AssetRecord {
    AssetRecord {
        id: id.to_string(),
        symbol: id.chars().take(3).collect(),
        name: id.to_string(),
        image_url: format!("https://example.com/{id}.png"),
        current_price: price,
        market_cap,
        price_change_24h: change,
    }
}

#[derive(Default)]
pub struct StaticMarketProvider {
    markets: Mutex<HashMap<String, Vec<AssetRecord>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Mutex<Option<Duration>>,
}

impl StaticMarketProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, code: &str, records: Vec<AssetRecord>) {
        self.markets
            .lock()
            .unwrap()
            .insert(code.to_string(), records);
        self.failing.lock().unwrap().remove(code);
    }

    pub fn fail(&self, code: &str) {
        self.failing.lock().unwrap().insert(code.to_string());
    }

    pub fn calls(&self, code: &str) -> usize {
        self.calls.lock().unwrap().get(code).copied().unwrap_or(0)
    }

    /// Makes every fetch take `delay` on the tokio clock.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarketProvider {
    async fn fetch_markets(&self, vs_currency: &str) -> Result<Vec<AssetRecord>> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(vs_currency.to_string())
            .or_default() += 1;

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().unwrap().contains(vs_currency) {
            return Err(anyhow!("HTTP error: 500 Internal Server Error for currency: {vs_currency}"));
        }
        self.markets
            .lock()
            .unwrap()
            .get(vs_currency)
            .cloned()
            .ok_or_else(|| anyhow!("No market data for currency: {vs_currency}"))
    }
}

pub struct StaticRateProvider {
    rates: Mutex<HashMap<String, f64>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticRateProvider {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self {
            rates: Mutex::new(rates),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeRateProvider for StaticRateProvider {
    async fn fetch_rates(&self, base: &str) -> Result<HashMap<String, f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("HTTP error: 503 Service Unavailable for exchange rates: {base}"));
        }
        Ok(self.rates.lock().unwrap().clone())
    }
}
