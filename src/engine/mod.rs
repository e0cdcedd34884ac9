//! Currency data caching and refresh engine.

pub mod derive;
pub mod fetcher;
pub mod refresher;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use derive::{Deriver, scale_snapshot};
pub use fetcher::{MarketFetcher, RateFetcher};
pub use refresher::{Refresher, RoundSummary};
pub use service::CurrencyService;

use anyhow::Result;
use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::{CurrencyCatalog, ExchangeRateProvider, MarketDataProvider};
use crate::providers::{CoinGeckoProvider, ExchangeRateApiProvider};
use crate::store::{RateStore, SnapshotStore};

/// The read-path service and the background refresher, sharing one pair of stores.
pub struct Engine {
    pub service: Arc<CurrencyService>,
    pub refresher: Arc<Refresher>,
}

impl Engine {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let timeout = config.cache.request_timeout();
        let markets = Arc::new(CoinGeckoProvider::new(
            &config.providers.coingecko.base_url,
            config.providers.coingecko.api_key.clone(),
            timeout,
        )?);
        let rates = Arc::new(ExchangeRateApiProvider::new(
            &config.providers.exchange_rate.base_url,
            config.providers.exchange_rate.api_key.clone(),
            timeout,
        )?);
        Self::with_providers(config, markets, rates)
    }

    pub fn with_providers(
        config: &AppConfig,
        markets: Arc<dyn MarketDataProvider>,
        rates: Arc<dyn ExchangeRateProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let catalog: Arc<CurrencyCatalog> = Arc::new(config.catalog()?);
        let cache = Arc::new(SnapshotStore::new());
        let rate_store = Arc::new(RateStore::new());

        let market = Arc::new(MarketFetcher::new(markets, Arc::clone(&cache)));
        let rate_fetcher = Arc::new(RateFetcher::new(
            rates,
            Arc::clone(&rate_store),
            catalog.base(),
            catalog.tracked_rates(),
        ));
        let deriver = Arc::new(Deriver::new(
            Arc::clone(&catalog),
            Arc::clone(&cache),
            rate_store,
            config.cache.ttl(),
            config.cache.max_rate_age(),
        ));

        let service = Arc::new(CurrencyService::new(
            Arc::clone(&catalog),
            cache,
            Arc::clone(&market),
            Arc::clone(&deriver),
            config.cache.ttl(),
        ));
        let refresher = Arc::new(Refresher::new(
            catalog,
            market,
            rate_fetcher,
            deriver,
            config.refresh.market_interval(),
            config.refresh.rate_interval(),
        ));

        Ok(Self { service, refresher })
    }
}
