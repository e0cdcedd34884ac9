use crate::core::catalog::{CurrencyCatalog, DerivedCurrency};
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const COIN_GECKO_KEY_ENV: &str = "COIN_GECKO_KEY";
pub const EXCHANGE_RATE_KEY_ENV: &str = "EXCHANGE_RATE_KEY";
pub const PORT_ENV: &str = "PORT";

/// Upper bound for every duration setting: ten years.
const MAX_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub coingecko: CoinGeckoProviderConfig,
    pub exchange_rate: ExchangeRateProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            coingecko: CoinGeckoProviderConfig {
                base_url: "https://api.coingecko.com/api/v3".to_string(),
                api_key: None,
            },
            exchange_rate: ExchangeRateProviderConfig {
                base_url: "https://v6.exchangerate-api.com/v6".to_string(),
                api_key: None,
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CurrenciesConfig {
    pub base: String,
    pub direct: Vec<String>,
    #[serde(default)]
    pub derived: BTreeMap<String, DerivedCurrency>,
    #[serde(default)]
    pub tracked_rates: Vec<String>,
}

impl Default for CurrenciesConfig {
    fn default() -> Self {
        CurrenciesConfig {
            base: "usd".to_string(),
            direct: vec!["usd".to_string(), "eur".to_string()],
            derived: BTreeMap::from([(
                "kzt".to_string(),
                DerivedCurrency {
                    base: "usd".to_string(),
                    rate_key: "KZT".to_string(),
                },
            )]),
            tracked_rates: vec!["EUR".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_rate_age_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: 63,
            max_rate_age_secs: 24 * 60 * 60,
            request_timeout_secs: 10,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs as i64)
    }

    pub fn max_rate_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_rate_age_secs as i64)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RefreshConfig {
    pub market_interval_secs: u64,
    pub rate_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            market_interval_secs: 60,
            rate_interval_secs: 60 * 60,
        }
    }
}

impl RefreshConfig {
    pub fn market_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.market_interval_secs)
    }

    pub fn rate_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.rate_interval_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub currencies: CurrenciesConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in defaults when
    /// no file exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let mut config = if config_path.exists() {
            Self::read_from_path(&config_path)?
        } else {
            debug!(path = %config_path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "crypto-tracker", "crypto-tracker")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let mut config = Self::read_from_path(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Reads a `.env` file if present, then applies process environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded environment file");
        }
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(COIN_GECKO_KEY_ENV).filter(|k| !k.is_empty()) {
            self.providers.coingecko.api_key = Some(key);
        }
        if let Some(key) = lookup(EXCHANGE_RATE_KEY_ENV).filter(|k| !k.is_empty()) {
            self.providers.exchange_rate.api_key = Some(key);
        }
        if let Some(port) = lookup(PORT_ENV).filter(|p| !p.is_empty()) {
            let host = self
                .server
                .bind
                .rsplit_once(':')
                .map_or("0.0.0.0", |(host, _)| host);
            self.server.bind = format!("{host}:{port}");
        }
    }

    /// Rejects zero or out-of-range duration settings.
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("cache.ttl_secs", self.cache.ttl_secs),
            ("cache.max_rate_age_secs", self.cache.max_rate_age_secs),
            ("cache.request_timeout_secs", self.cache.request_timeout_secs),
            ("refresh.market_interval_secs", self.refresh.market_interval_secs),
            ("refresh.rate_interval_secs", self.refresh.rate_interval_secs),
        ];
        for (name, secs) in durations {
            if secs == 0 {
                bail!("{name} must be greater than zero");
            }
            if secs > MAX_DURATION_SECS {
                bail!("{name} must be at most {MAX_DURATION_SECS} seconds, got {secs}");
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> Result<CurrencyCatalog> {
        CurrencyCatalog::new(
            &self.currencies.base,
            &self.currencies.direct,
            &self.currencies.derived,
            &self.currencies.tracked_rates,
        )
        .context("Invalid currency configuration")
    }
}
