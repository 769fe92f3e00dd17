// src/models.rs

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{MarketDataError, Result};

// One trading day for one ticker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(MarketDataError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    // The `days` calendar days ending at (and including) `end`
    pub fn trailing_days(end: NaiveDate, days: i64) -> Self {
        let start = end - Duration::days(days.max(0));
        DateRange { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// Alpha Vantage encodes prices as strings
fn string_to_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<f64>().map_err(serde::de::Error::custom)
}

// Volumes arrive as strings too
fn string_to_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<u64>().map_err(serde::de::Error::custom)
}

// "YYYY-MM-DD" string dates
fn string_to_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let date_part = s.get(..10).unwrap_or(&s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

// Meta Data block of the daily time series response
#[derive(Debug, Deserialize)]
pub struct MetaData {
    #[serde(rename = "1. Information")]
    pub information: String,

    #[serde(rename = "2. Symbol")]
    pub symbol: String,

    #[serde(rename = "3. Last Refreshed", deserialize_with = "string_to_date")]
    pub last_refreshed: NaiveDate,
}

// One OHLCV row of the daily series
#[derive(Debug, Deserialize)]
pub struct TimeSeriesData {
    #[serde(rename = "1. open", deserialize_with = "string_to_f64")]
    pub open: f64,

    #[serde(rename = "2. high", deserialize_with = "string_to_f64")]
    pub high: f64,

    #[serde(rename = "3. low", deserialize_with = "string_to_f64")]
    pub low: f64,

    #[serde(rename = "4. close", deserialize_with = "string_to_f64")]
    pub close: f64,

    #[serde(rename = "5. volume", deserialize_with = "string_to_u64")]
    pub volume: u64,
}

// TIME_SERIES_DAILY response. The provider answers errors and throttling
// notices with HTTP 200 and one of the message fields instead of the series.
#[derive(Debug, Deserialize)]
pub struct DailySeriesResponse {
    #[serde(rename = "Meta Data")]
    pub meta_data: Option<MetaData>,

    #[serde(rename = "Time Series (Daily)", default)]
    pub daily_time_series: HashMap<String, TimeSeriesData>,  // Date -> TimeSeriesData

    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,

    #[serde(rename = "Note")]
    pub note: Option<String>,

    #[serde(rename = "Information")]
    pub information: Option<String>,
}

impl DailySeriesResponse {
    pub fn notice(&self) -> Option<&str> {
        self.note.as_deref().or(self.information.as_deref())
    }

    // Ascending points inside `range`
    pub fn into_price_points(self, range: DateRange) -> Result<Vec<PricePoint>> {
        let mut points = Vec::with_capacity(self.daily_time_series.len());
        for (date_str, data) in self.daily_time_series {
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|_| MarketDataError::Parse(format!("invalid date key {date_str}")))?;
            if range.contains(date) {
                points.push(PricePoint {
                    date,
                    open: data.open,
                    high: data.high,
                    low: data.low,
                    close: data.close,
                    volume: data.volume,
                });
            }
        }
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let err = DateRange::new(date("2024-02-01"), date("2024-01-01")).unwrap_err();
        assert!(matches!(err, MarketDataError::InvalidRange { .. }));
    }

    #[test]
    fn test_trailing_days_is_inclusive() {
        let range = DateRange::trailing_days(date("2024-01-31"), 30);
        assert_eq!(range.start, date("2024-01-01"));
        assert!(range.contains(date("2024-01-01")));
        assert!(range.contains(date("2024-01-31")));
        assert!(!range.contains(date("2024-02-01")));
        assert_eq!(range.to_string(), "2024-01-01..2024-01-31");
    }

    #[test]
    fn test_daily_response_filters_and_sorts() {
        let body = r#"
        {
            "Meta Data": {
                "1. Information": "Daily Prices (open, high, low, close) and Volumes",
                "2. Symbol": "SPY",
                "3. Last Refreshed": "2024-03-22",
                "4. Output Size": "Full size",
                "5. Time Zone": "US/Eastern"
            },
            "Time Series (Daily)": {
                "2024-03-22": {"1. open": "10.0", "2. high": "11.0", "3. low": "9.5", "4. close": "10.5", "5. volume": "100"},
                "2024-03-20": {"1. open": "9.0", "2. high": "10.0", "3. low": "8.5", "4. close": "9.5", "5. volume": "200"},
                "2024-03-01": {"1. open": "8.0", "2. high": "9.0", "3. low": "7.5", "4. close": "8.5", "5. volume": "300"}
            }
        }"#;
        let response: DailySeriesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.meta_data.as_ref().unwrap().symbol, "SPY");

        let range = DateRange::new(date("2024-03-10"), date("2024-03-31")).unwrap();
        let points = response.into_price_points(range).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date("2024-03-20"));
        assert_eq!(points[1].close, 10.5);
        assert_eq!(points[1].volume, 100);
    }

    #[test]
    fn test_daily_response_error_message() {
        let body = r#"{"Error Message": "Invalid API call."}"#;
        let response: DailySeriesResponse = serde_json::from_str(body).unwrap();
        assert!(response.meta_data.is_none());
        assert!(response.daily_time_series.is_empty());
        assert_eq!(response.error_message.as_deref(), Some("Invalid API call."));
    }
}
