// src/source.rs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MarketDataError, Result};
use crate::models::{DateRange, PricePoint};

/// Historical OHLCV provider.
///
/// Implementations return points inside `range`, ascending by date, with no
/// duplicate dates. An unknown ticker is `MarketDataError::NotFound`.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_history(&self, ticker: &str, range: DateRange) -> Result<Vec<PricePoint>>;
}

#[async_trait]
impl<S: MarketDataSource + ?Sized> MarketDataSource for Arc<S> {
    async fn fetch_history(&self, ticker: &str, range: DateRange) -> Result<Vec<PricePoint>> {
        (**self).fetch_history(ticker, range).await
    }
}

// Sort ascending and keep the first point for any repeated date
pub fn normalize_series(mut points: Vec<PricePoint>) -> Vec<PricePoint> {
    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    points
}

// Fixed series held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<String, Vec<PricePoint>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, ticker: impl Into<String>, points: Vec<PricePoint>) -> Self {
        self.insert(ticker, points);
        self
    }

    pub fn insert(&mut self, ticker: impl Into<String>, points: Vec<PricePoint>) {
        self.series.insert(ticker.into(), normalize_series(points));
    }
}

#[async_trait]
impl MarketDataSource for InMemorySource {
    async fn fetch_history(&self, ticker: &str, range: DateRange) -> Result<Vec<PricePoint>> {
        let points = self
            .series
            .get(ticker)
            .ok_or_else(|| MarketDataError::NotFound { ticker: ticker.to_string() })?;

        Ok(points.iter().filter(|p| range.contains(p.date)).copied().collect())
    }
}
