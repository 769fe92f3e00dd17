// src/testutil.rs

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use market_data::PricePoint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day += Duration::days(1);
    }
    days
}

pub fn point(date: NaiveDate, close: f64, volume: u64) -> PricePoint {
    PricePoint {
        date,
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

pub fn flat_series(days: &[NaiveDate], close: f64) -> Vec<PricePoint> {
    days.iter().map(|d| point(*d, close, 1_000)).collect()
}

pub fn series_from_closes(days: &[NaiveDate], closes: &[f64]) -> Vec<PricePoint> {
    days.iter().zip(closes).map(|(d, c)| point(*d, *c, 1_000)).collect()
}

// Seeded geometric random walk with plausible OHLCV fields
pub fn random_walk(seed: u64, days: &[NaiveDate], start: f64) -> Vec<PricePoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = start;
    days.iter()
        .map(|d| {
            let open = close;
            close *= 1.0 + rng.gen_range(-0.02..0.02);
            PricePoint {
                date: *d,
                open,
                high: open.max(close) * 1.005,
                low: open.min(close) * 0.995,
                close,
                volume: rng.gen_range(100_000..5_000_000),
            }
        })
        .collect()
}
