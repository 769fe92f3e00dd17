// src/cache.rs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;
use crate::models::{DateRange, PricePoint};
use crate::source::MarketDataSource;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: String,
    pub range: DateRange,
}

#[derive(Debug)]
struct CachedEntry {
    points: Vec<PricePoint>,
    fetched_at: Instant,
}

type Slot = Arc<tokio::sync::Mutex<Option<CachedEntry>>>;

/// Process-wide price cache in front of another source.
///
/// Every key owns an async mutex, so concurrent callers for the same
/// (ticker, range) queue behind a single in-flight fetch and then read its
/// result. Entries older than `ttl` are refetched; failures are not stored.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl<S: MarketDataSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        CachedSource {
            inner,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: CacheKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(key).or_default().clone()
    }

    /// Drops stale or empty slots that no caller currently holds. Returns
    /// the number of slots removed.
    pub fn purge_expired(&self) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|_, slot| {
            // Held elsewhere: a fetch is queued or running on this key
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(entry) => entry
                    .as_ref()
                    .is_some_and(|cached| cached.fetched_at.elapsed() < self.ttl),
                Err(_) => true,
            }
        });
        before - slots.len()
    }
}

#[async_trait]
impl<S: MarketDataSource> MarketDataSource for CachedSource<S> {
    async fn fetch_history(&self, ticker: &str, range: DateRange) -> Result<Vec<PricePoint>> {
        let slot = self.slot(CacheKey { ticker: ticker.to_string(), range });
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!(ticker, %range, "price cache hit");
                return Ok(cached.points.clone());
            }
        }

        debug!(ticker, %range, "price cache miss");
        let points = self.inner.fetch_history(ticker, range).await?;
        *entry = Some(CachedEntry {
            points: points.clone(),
            fetched_at: Instant::now(),
        });
        drop(entry);

        self.purge_expired();
        Ok(points)
    }
}
