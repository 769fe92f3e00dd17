// src/error.rs

use market_data::{DateRange, MarketDataError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Unknown portfolio: {0}")]
    UnknownPortfolio(String),

    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("Invalid investor profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Data gap for {ticker} ({range}): {reason}")]
    DataGap {
        ticker: String,
        range: DateRange,
        reason: String,
    },

    #[error("Timed out fetching {ticker} ({range})")]
    DataSourceTimeout { ticker: String, range: DateRange },

    #[error("Market data provider unavailable for {ticker} ({range}): {reason}")]
    ProviderUnavailable {
        ticker: String,
        range: DateRange,
        reason: String,
    },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Dataset not available: {0}")]
    MissingDataset(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
}

impl AnalyticsError {
    // Machine-readable kind carried in error responses
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsError::UnknownPortfolio(_) => "UnknownPortfolio",
            AnalyticsError::UnknownTicker(_) => "UnknownTicker",
            AnalyticsError::InvalidProfile(_) => "InvalidProfile",
            AnalyticsError::InvalidRequest(_) => "InvalidRequest",
            AnalyticsError::DataGap { .. } => "DataGap",
            AnalyticsError::DataSourceTimeout { .. } => "DataSourceTimeout",
            AnalyticsError::ProviderUnavailable { .. } => "ProviderUnavailable",
            AnalyticsError::Catalog(_) => "Catalog",
            AnalyticsError::MissingDataset(_) => "MissingDataset",
            AnalyticsError::InvalidDataset(_) => "InvalidDataset",
        }
    }

    // 4xx for caller errors, 5xx for upstream failures
    pub fn status(&self) -> u16 {
        match self {
            AnalyticsError::UnknownPortfolio(_) | AnalyticsError::UnknownTicker(_) | AnalyticsError::MissingDataset(_) => {
                404
            }
            AnalyticsError::InvalidProfile(_) | AnalyticsError::InvalidRequest(_) => 400,
            AnalyticsError::DataGap { .. } => 422,
            AnalyticsError::DataSourceTimeout { .. } => 504,
            AnalyticsError::ProviderUnavailable { .. } => 502,
            AnalyticsError::Catalog(_) | AnalyticsError::InvalidDataset(_) => 500,
        }
    }

    pub fn ticker(&self) -> Option<&str> {
        match self {
            AnalyticsError::DataGap { ticker, .. }
            | AnalyticsError::DataSourceTimeout { ticker, .. }
            | AnalyticsError::ProviderUnavailable { ticker, .. } => Some(ticker),
            AnalyticsError::UnknownTicker(ticker) => Some(ticker),
            _ => None,
        }
    }

    pub fn range(&self) -> Option<DateRange> {
        match self {
            AnalyticsError::DataGap { range, .. }
            | AnalyticsError::DataSourceTimeout { range, .. }
            | AnalyticsError::ProviderUnavailable { range, .. } => Some(*range),
            _ => None,
        }
    }

    /// Attaches fetch context to a provider failure. `NotFound` is handled
    /// by the engine before this point and only lands here for tickers
    /// outside the catalog.
    pub fn from_source(err: MarketDataError, ticker: &str, range: DateRange) -> Self {
        match err {
            MarketDataError::NotFound { ticker } => AnalyticsError::UnknownTicker(ticker),
            MarketDataError::Timeout { ticker, range } => AnalyticsError::DataSourceTimeout { ticker, range },
            MarketDataError::ProviderUnavailable { ticker, range, reason } => {
                AnalyticsError::ProviderUnavailable { ticker, range, reason }
            }
            MarketDataError::InvalidRange { start, end } => {
                AnalyticsError::InvalidRequest(format!("start {start} is after end {end}"))
            }
            other => AnalyticsError::ProviderUnavailable {
                ticker: ticker.to_string(),
                range,
                reason: other.to_string(),
            },
        }
    }

    // Failures reading the static inflation datasets
    pub fn from_dataset(err: MarketDataError) -> Self {
        match err {
            MarketDataError::MissingDataset { path } => AnalyticsError::MissingDataset(path),
            other => AnalyticsError::InvalidDataset(other.to_string()),
        }
    }
}
