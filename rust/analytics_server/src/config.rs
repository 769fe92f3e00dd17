// src/config.rs

use market_data::client::DEFAULT_BASE_URL;
use market_data::{
    AlphaVantageClient, CachedSource, CsvDirectorySource, CsvInflationSource, MarketDataError, MarketDataSource,
};
use portfolio_analytics::{AnalyticsError, AnalyticsPolicy, PortfolioCatalog, WeightingPolicy, DEFAULT_CATALOG};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::service::AnalyticsService;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to load catalog: {0}")]
    Catalog(#[from] AnalyticsError),

    #[error("Failed to build market data client: {0}")]
    MarketData(#[from] MarketDataError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataProvider {
    AlphaVantage,
    Csv,
}

impl FromStr for DataProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alphavantage" | "alpha-vantage" => Ok(DataProvider::AlphaVantage),
            "csv" => Ok(DataProvider::Csv),
            other => Err(format!("expected alphavantage or csv, got {other}")),
        }
    }
}

/// Startup configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub provider: DataProvider,
    pub alphavantage_base_url: String,
    pub alphavantage_api_key: String,
    pub data_dir: PathBuf,
    // Holds spy_inflation.csv and bank_values.csv; defaults to `data_dir`
    pub inflation_dir: Option<PathBuf>,
    pub cache_ttl: Duration,
    pub catalog_path: Option<PathBuf>,
    pub policy: AnalyticsPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            provider: DataProvider::AlphaVantage,
            alphavantage_base_url: DEFAULT_BASE_URL.to_string(),
            alphavantage_api_key: "demo".to_string(),
            data_dir: PathBuf::from("./data"),
            inflation_dir: None,
            cache_ttl: Duration::from_secs(300),
            catalog_path: None,
            policy: AnalyticsPolicy::default(),
        }
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
        value,
    })
}

fn positive(key: &'static str, value: String) -> Result<u64, ConfigError> {
    let parsed: u64 = parse(key, value.clone())?;
    if parsed == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(parsed)
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServerConfig::default();

        if let Some(host) = lookup("ANALYTICS_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("ANALYTICS_PORT") {
            config.port = parse("ANALYTICS_PORT", port)?;
        }
        if let Some(provider) = lookup("MARKET_DATA_PROVIDER") {
            config.provider = parse("MARKET_DATA_PROVIDER", provider)?;
        }
        if let Some(url) = lookup("ALPHAVANTAGE_BASE_URL") {
            config.alphavantage_base_url = url;
        }
        if let Some(key) = lookup("ALPHAVANTAGE_API_KEY") {
            config.alphavantage_api_key = key;
        }
        if let Some(dir) = lookup("MARKET_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(ttl) = lookup("CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(parse("CACHE_TTL_SECS", ttl)?);
        }
        config.catalog_path = lookup("CATALOG_PATH").map(PathBuf::from);
        config.inflation_dir = lookup("INFLATION_DATA_DIR").map(PathBuf::from);

        if let Some(secs) = lookup("FETCH_TIMEOUT_SECS") {
            let secs = positive("FETCH_TIMEOUT_SECS", secs)?;
            config.policy = config.policy.with_fetch_timeout(Duration::from_secs(secs));
        }
        if let Some(days) = lookup("SHORT_TERM_DAYS") {
            let days = positive("SHORT_TERM_DAYS", days)?;
            config.policy = config.policy.with_short_term_days(days as usize);
        }
        if let Some(days) = lookup("LONG_TERM_DAYS") {
            let days = positive("LONG_TERM_DAYS", days)?;
            config.policy = config.policy.with_long_term_days(days as usize);
        }
        if let Some(weighting) = lookup("WEIGHTING_POLICY") {
            let weighting: WeightingPolicy = parse("WEIGHTING_POLICY", weighting)?;
            config.policy = config.policy.with_weighting(weighting);
        }
        if let Some(limit) = lookup("PERFORMER_LIMIT") {
            let limit = positive("PERFORMER_LIMIT", limit)?;
            config.policy = config.policy.with_performer_limit(limit as usize);
        }
        if let Some(every) = lookup("INFLATION_SAMPLE_EVERY") {
            let every = positive("INFLATION_SAMPLE_EVERY", every)?;
            config.policy = config.policy.with_inflation_sample_every(every as usize);
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn load_catalog(&self) -> Result<PortfolioCatalog, ConfigError> {
        match &self.catalog_path {
            Some(path) => {
                info!(path = %path.display(), "loading portfolio catalog");
                Ok(PortfolioCatalog::from_path(path)?)
            }
            None => Ok(DEFAULT_CATALOG.clone()),
        }
    }

    // Every provider sits behind the shared price cache
    pub fn build_source(&self) -> Result<Arc<dyn MarketDataSource>, ConfigError> {
        let source: Arc<dyn MarketDataSource> = match self.provider {
            DataProvider::AlphaVantage => {
                info!(base_url = %self.alphavantage_base_url, "using Alpha Vantage market data");
                let client = AlphaVantageClient::new(
                    self.alphavantage_base_url.clone(),
                    self.alphavantage_api_key.clone(),
                    self.policy.fetch_timeout,
                )?;
                Arc::new(CachedSource::new(client, self.cache_ttl))
            }
            DataProvider::Csv => {
                info!(dir = %self.data_dir.display(), "using CSV market data");
                Arc::new(CachedSource::new(CsvDirectorySource::new(self.data_dir.clone()), self.cache_ttl))
            }
        };
        Ok(source)
    }

    pub fn inflation_dir(&self) -> &Path {
        self.inflation_dir.as_deref().unwrap_or(&self.data_dir)
    }

    // Files are read per request, so a missing dataset only fails its own routes
    pub fn build_service(&self) -> Result<AnalyticsService, ConfigError> {
        let catalog = Arc::new(self.load_catalog()?);
        let source = self.build_source()?;
        info!(dir = %self.inflation_dir().display(), "using CSV inflation data");
        let inflation = Arc::new(CsvInflationSource::new(self.inflation_dir()));
        Ok(AnalyticsService::new(source, catalog, self.policy.clone()).with_inflation_source(inflation))
    }
}
