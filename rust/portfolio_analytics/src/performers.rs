// src/performers.rs

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::Ticker;
use crate::error::{AnalyticsError, Result};
use crate::matching::TimeHorizon;
use crate::panel::{DataGap, GapKind, PricePanel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    High,
    Low,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::High => write!(f, "high"),
            Direction::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Direction {
    type Err = AnalyticsError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Direction::High),
            "low" => Ok(Direction::Low),
            other => Err(AnalyticsError::InvalidRequest(format!(
                "performer direction must be high or low, got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Performer {
    pub rank: usize,
    pub ticker: String,
    pub name: String,
    pub pct_change: f64,
    pub data_gap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformerRanking {
    pub direction: Direction,
    pub horizon: TimeHorizon,
    pub window_days: usize,
    pub performers: Vec<Performer>,
    // Tickers left out of the ranking for lack of data
    pub excluded: Vec<DataGap>,
}

struct Candidate<'a> {
    ticker: &'a Ticker,
    pct_change: NotNan<f64>,
    data_gap: bool,
}

// Change over the last `window` trading days, or why it cannot be computed
fn window_change<'a>(panel: &PricePanel, ticker: &'a Ticker, window: usize) -> std::result::Result<Candidate<'a>, DataGap> {
    let points = panel.series(&ticker.symbol);
    if points.is_empty() {
        return Err(DataGap::new(&ticker.symbol, GapKind::NoData));
    }
    if points.len() < window + 1 {
        return Err(DataGap::new(&ticker.symbol, GapKind::InsufficientHistory));
    }

    let first = points[points.len() - window - 1];
    let last = points[points.len() - 1];
    let pct = (last.close / first.close - 1.0) * 100.0;
    let pct_change = match NotNan::new(pct) {
        Ok(value) if first.close > 0.0 && pct.is_finite() => value,
        _ => return Err(DataGap::new(&ticker.symbol, GapKind::InsufficientHistory)),
    };

    let data_gap = panel
        .gap(&ticker.symbol)
        .is_some_and(|gap| gap.missing_dates.iter().any(|d| *d >= first.date));

    Ok(Candidate {
        ticker,
        pct_change,
        data_gap,
    })
}

/// Ranks `universe` by percentage close change over the trailing window.
///
/// High order is change descending, then symbol ascending; low order is
/// exactly that order reversed. At most `limit` entries are kept.
pub fn rank_performers(
    panel: &PricePanel,
    universe: &[&Ticker],
    direction: Direction,
    horizon: TimeHorizon,
    window: usize,
    limit: usize,
) -> PerformerRanking {
    let mut candidates = Vec::with_capacity(universe.len());
    let mut excluded = Vec::new();
    for ticker in universe {
        match window_change(panel, ticker, window) {
            Ok(candidate) => candidates.push(candidate),
            Err(gap) => excluded.push(gap),
        }
    }

    candidates.sort_by(|a, b| {
        b.pct_change
            .cmp(&a.pct_change)
            .then_with(|| a.ticker.symbol.cmp(&b.ticker.symbol))
    });
    if direction == Direction::Low {
        candidates.reverse();
    }

    let performers = candidates
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, c)| Performer {
            rank: i + 1,
            ticker: c.ticker.symbol.clone(),
            name: c.ticker.name.clone(),
            pct_change: c.pct_change.into_inner(),
            data_gap: c.data_gap,
        })
        .collect();

    PerformerRanking {
        direction,
        horizon,
        window_days: window,
        performers,
        excluded,
    }
}
