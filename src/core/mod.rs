//! Core business logic abstractions

pub mod catalog;
pub mod config;
pub mod currency;
pub mod error;
pub mod log;
pub mod market;
pub mod snapshot;

// Re-export main types for cleaner imports
pub use catalog::{CurrencyCatalog, CurrencyKind, DerivedCurrency};
pub use currency::ExchangeRateProvider;
pub use error::{CurrencyError, CurrencyResult};
pub use market::MarketDataProvider;
pub use snapshot::{AssetRecord, CacheEntry, Snapshot};
