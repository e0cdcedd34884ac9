//! Background loop that keeps the stores warm independently of request traffic.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::CurrencyCatalog;
use crate::engine::derive::Deriver;
use crate::engine::fetcher::{MarketFetcher, RateFetcher};

/// Outcome of one refresh round, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub updated: usize,
    pub failed: usize,
}

pub struct Refresher {
    catalog: Arc<CurrencyCatalog>,
    market: Arc<MarketFetcher>,
    rates: Arc<RateFetcher>,
    deriver: Arc<Deriver>,
    market_interval: Duration,
    rate_interval: Duration,
}

impl Refresher {
    pub fn new(
        catalog: Arc<CurrencyCatalog>,
        market: Arc<MarketFetcher>,
        rates: Arc<RateFetcher>,
        deriver: Arc<Deriver>,
        market_interval: Duration,
        rate_interval: Duration,
    ) -> Self {
        Self {
            catalog,
            market,
            rates,
            deriver,
            market_interval,
            rate_interval,
        }
    }

    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Runs until `cancel` fires.
    ///
    /// Rounds execute as detached tasks, so cancellation returns immediately and leaves
    /// in-flight upstream calls to finish or time out on their own. A round is skipped
    /// while the previous round of the same kind is still running.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            market_interval = ?self.market_interval,
            rate_interval = ?self.rate_interval,
            "Background refresher started"
        );

        let start = Instant::now();
        let mut market_tick = interval_at(start + self.market_interval, self.market_interval);
        market_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut rate_tick = interval_at(start + self.rate_interval, self.rate_interval);
        rate_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Warm up eagerly: rates first so derived currencies can be computed right away.
        let warmup = Arc::clone(&self);
        let mut market_round = Some(tokio::spawn(async move {
            warmup.refresh_rates().await;
            warmup.refresh_markets().await;
        }));
        let mut rate_round: Option<JoinHandle<()>> = None;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = market_tick.tick() => {
                    if round_in_flight(&mut market_round, "market").await {
                        continue;
                    }
                    let this = Arc::clone(&self);
                    market_round = Some(tokio::spawn(async move {
                        this.refresh_markets().await;
                    }));
                }
                _ = rate_tick.tick() => {
                    if round_in_flight(&mut rate_round, "rate").await {
                        continue;
                    }
                    let this = Arc::clone(&self);
                    rate_round = Some(tokio::spawn(async move {
                        this.refresh_rates().await;
                    }));
                }
            }
        }

        info!("Background refresher stopped");
    }

    /// Refreshes every direct currency, then derives every derived currency.
    pub async fn refresh_markets(&self) -> RoundSummary {
        let mut summary = RoundSummary::default();

        let direct = self.catalog.direct();
        let results = join_all(direct.iter().map(|code| self.market.refresh(code))).await;
        for (code, result) in direct.iter().zip(results) {
            match result {
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(currency = %code, error = %e, "Error fetching currency data");
                }
            }
        }

        for (code, _) in self.catalog.derived() {
            match self.deriver.derive(code).await {
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    summary.failed += 1;
                    warn!(currency = %code, error = %e, "Skipping derived currency");
                }
            }
        }

        debug!(
            updated = summary.updated,
            failed = summary.failed,
            "Market refresh round finished"
        );
        summary
    }

    pub async fn refresh_rates(&self) -> RoundSummary {
        match self.rates.refresh().await {
            Ok(_) => RoundSummary {
                updated: 1,
                failed: 0,
            },
            Err(e) => {
                warn!(error = %e, "Error fetching exchange rates");
                RoundSummary {
                    updated: 0,
                    failed: 1,
                }
            }
        }
    }
}

/// Reports whether the previous round in `slot` is still running. A finished round is
/// reaped, logging it if it panicked.
async fn round_in_flight(slot: &mut Option<JoinHandle<()>>, kind: &str) -> bool {
    match slot.take() {
        Some(handle) if !handle.is_finished() => {
            warn!(round = kind, "Previous refresh round still running, skipping tick");
            *slot = Some(handle);
            true
        }
        Some(handle) => {
            if let Err(e) = handle.await {
                error!(round = kind, error = %e, "Refresh round aborted");
            }
            false
        }
        None => false,
    }
}
