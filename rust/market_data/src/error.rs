// src/error.rs

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::DateRange;

pub type Result<T> = std::result::Result<T, MarketDataError>;

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("No market data available for ticker {ticker}")]
    NotFound { ticker: String },

    #[error("Market data provider unavailable for {ticker} ({range}): {reason}")]
    ProviderUnavailable {
        ticker: String,
        range: DateRange,
        reason: String,
    },

    #[error("Timed out fetching {ticker} ({range})")]
    Timeout { ticker: String, range: DateRange },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Failed to parse market data: {0}")]
    Parse(String),

    #[error("Dataset not found: {path}")]
    MissingDataset { path: String },

    #[error("Dataset {path} has no {column} column")]
    MissingColumn { path: String, column: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error reading market data: {0}")]
    Io(#[from] std::io::Error),
}
