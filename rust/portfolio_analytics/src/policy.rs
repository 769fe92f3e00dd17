// src/policy.rs

use chrono::NaiveDate;
use market_data::DateRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AnalyticsError, Result};
use crate::matching::TimeHorizon;

// How ticker-level weights inside a portfolio are assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightingPolicy {
    #[default]
    Equal,
    // Weight by the current value of an equal initial investment
    MarketValue,
}

impl fmt::Display for WeightingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightingPolicy::Equal => write!(f, "equal"),
            WeightingPolicy::MarketValue => write!(f, "market-value"),
        }
    }
}

impl FromStr for WeightingPolicy {
    type Err = AnalyticsError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "equal" => Ok(WeightingPolicy::Equal),
            "market-value" | "market_value" | "marketvalue" => Ok(WeightingPolicy::MarketValue),
            other => Err(AnalyticsError::InvalidRequest(format!(
                "unknown weighting policy {other:?}, expected equal or market-value"
            ))),
        }
    }
}

/// Tunable constants of the analytics layer.
///
/// Windows are counted in trading days (price points), lookback in calendar
/// days. Build with `AnalyticsPolicy::default()` and the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsPolicy {
    pub short_term_days: usize,
    pub long_term_days: usize,
    pub weighting: WeightingPolicy,
    pub performer_limit: usize,
    pub top_companies: usize,
    pub fetch_timeout: Duration,
    pub default_lookback_days: i64,
    pub risk_free_rate: f64,
    pub trading_days_per_year: f64,
    // Percentage points a custom allocation may stray from 100
    pub allocation_tolerance: f64,
    // Drawdown fractions, compared against the negated drawdown
    pub drawdown_start: f64,
    pub drawdown_recovered: f64,
    pub severe_drawdown: f64,
    // Keep every n-th row of the inflation datasets
    pub inflation_sample_every: usize,
}

impl Default for AnalyticsPolicy {
    fn default() -> Self {
        AnalyticsPolicy {
            short_term_days: 21,
            long_term_days: 252,
            weighting: WeightingPolicy::Equal,
            performer_limit: 10,
            top_companies: 50,
            fetch_timeout: Duration::from_secs(10),
            default_lookback_days: 730,
            risk_free_rate: 0.02,
            trading_days_per_year: 252.0,
            allocation_tolerance: 0.01,
            drawdown_start: 0.05,
            drawdown_recovered: 0.01,
            severe_drawdown: 0.10,
            inflation_sample_every: 4,
        }
    }
}

impl AnalyticsPolicy {
    pub fn with_short_term_days(mut self, days: usize) -> Self {
        self.short_term_days = days;
        self
    }

    pub fn with_long_term_days(mut self, days: usize) -> Self {
        self.long_term_days = days;
        self
    }

    pub fn with_weighting(mut self, weighting: WeightingPolicy) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_performer_limit(mut self, limit: usize) -> Self {
        self.performer_limit = limit;
        self
    }

    pub fn with_top_companies(mut self, top: usize) -> Self {
        self.top_companies = top;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_default_lookback_days(mut self, days: i64) -> Self {
        self.default_lookback_days = days;
        self
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn with_drawdown_thresholds(mut self, start: f64, recovered: f64, severe: f64) -> Self {
        self.drawdown_start = start;
        self.drawdown_recovered = recovered;
        self.severe_drawdown = severe;
        self
    }

    pub fn with_inflation_sample_every(mut self, every: usize) -> Self {
        self.inflation_sample_every = every.max(1);
        self
    }

    pub fn window_days(&self, horizon: TimeHorizon) -> usize {
        match horizon {
            TimeHorizon::ShortTerm => self.short_term_days,
            TimeHorizon::LongTerm => self.long_term_days,
        }
    }

    pub fn default_range(&self, today: NaiveDate) -> DateRange {
        DateRange::trailing_days(today, self.default_lookback_days)
    }

    // Fills in missing bounds: end defaults to today, start to end minus the lookback
    pub fn resolve_range(
        &self,
        today: NaiveDate,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DateRange> {
        let end = end.unwrap_or(today);
        let start = start.unwrap_or(self.default_range(end).start);
        DateRange::new(start, end)
            .map_err(|_| AnalyticsError::InvalidRequest(format!("startDate {start} is after endDate {end}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_defaults() {
        let policy = AnalyticsPolicy::default();
        assert_eq!(policy.window_days(TimeHorizon::ShortTerm), 21);
        assert_eq!(policy.window_days(TimeHorizon::LongTerm), 252);
        assert_eq!(policy.weighting, WeightingPolicy::Equal);
        assert_eq!(policy.fetch_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builders_override() {
        let policy = AnalyticsPolicy::default()
            .with_short_term_days(5)
            .with_weighting(WeightingPolicy::MarketValue)
            .with_performer_limit(3);
        assert_eq!(policy.window_days(TimeHorizon::ShortTerm), 5);
        assert_eq!(policy.weighting, WeightingPolicy::MarketValue);
        assert_eq!(policy.performer_limit, 3);

        let policy = AnalyticsPolicy::default()
            .with_drawdown_thresholds(0.1, 0.02, 0.2)
            .with_inflation_sample_every(0);
        assert_eq!((policy.drawdown_start, policy.drawdown_recovered, policy.severe_drawdown), (0.1, 0.02, 0.2));
        assert_eq!(policy.inflation_sample_every, 1);
    }

    #[test]
    fn test_resolve_range_defaults_to_two_years() {
        let policy = AnalyticsPolicy::default();
        let range = policy.resolve_range(date("2024-12-31"), None, None).unwrap();
        assert_eq!(range.end, date("2024-12-31"));
        assert_eq!(range.start, date("2023-01-01"));

        let explicit = policy
            .resolve_range(date("2024-12-31"), Some(date("2024-01-01")), Some(date("2024-06-30")))
            .unwrap();
        assert_eq!(explicit.start, date("2024-01-01"));
        assert_eq!(explicit.end, date("2024-06-30"));
    }

    #[test]
    fn test_resolve_range_rejects_inverted() {
        let policy = AnalyticsPolicy::default();
        let err = policy
            .resolve_range(date("2024-12-31"), Some(date("2024-06-30")), Some(date("2024-01-01")))
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidRequest");
    }

    #[test]
    fn test_weighting_policy_parse() {
        assert_eq!("Equal".parse::<WeightingPolicy>().unwrap(), WeightingPolicy::Equal);
        assert_eq!(" market-value ".parse::<WeightingPolicy>().unwrap(), WeightingPolicy::MarketValue);
        assert!("cap".parse::<WeightingPolicy>().is_err());
    }
}
