// src/client.rs

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{MarketDataError, Result};
use crate::models::{DailySeriesResponse, DateRange, PricePoint};
use crate::source::{normalize_series, MarketDataSource};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

// Alpha Vantage TIME_SERIES_DAILY client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(AlphaVantageClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn fetch_daily(&self, ticker: &str, range: DateRange) -> Result<DailySeriesResponse> {
        let url = format!("{}/query", self.base_url);
        let unavailable = |reason: String| MarketDataError::ProviderUnavailable {
            ticker: ticker.to_string(),
            range,
            reason,
        };

        let response = self
            .http
            .get(&url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", ticker),
                ("outputsize", "full"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    MarketDataError::Timeout { ticker: ticker.to_string(), range }
                } else {
                    unavailable(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {status}")));
        }

        response.json::<DailySeriesResponse>().await.map_err(|err| {
            if err.is_timeout() {
                MarketDataError::Timeout { ticker: ticker.to_string(), range }
            } else {
                unavailable(format!("malformed response: {err}"))
            }
        })
    }
}

#[async_trait]
impl MarketDataSource for AlphaVantageClient {
    async fn fetch_history(&self, ticker: &str, range: DateRange) -> Result<Vec<PricePoint>> {
        debug!(ticker, %range, "fetching daily series from Alpha Vantage");
        let response = self.fetch_daily(ticker, range).await?;

        if let Some(message) = response.error_message.as_deref() {
            debug!(ticker, message, "provider rejected ticker");
            return Err(MarketDataError::NotFound { ticker: ticker.to_string() });
        }

        if let Some(meta) = response.meta_data.as_ref() {
            debug!(
                ticker,
                symbol = %meta.symbol,
                last_refreshed = %meta.last_refreshed,
                information = %meta.information,
                "daily series metadata"
            );
        }

        if response.daily_time_series.is_empty() {
            if let Some(notice) = response.notice() {
                warn!(ticker, notice, "provider throttled request");
                return Err(MarketDataError::ProviderUnavailable {
                    ticker: ticker.to_string(),
                    range,
                    reason: notice.to_string(),
                });
            }
        }

        Ok(normalize_series(response.into_price_points(range)?))
    }
}
