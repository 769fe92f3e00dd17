// src/series.rs

use chrono::NaiveDate;
use serde::Serialize;

use crate::panel::{DataGap, PricePanel};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumePoint {
    pub date: NaiveDate,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedVolumePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerVolume {
    pub ticker: String,
    pub points: Vec<VolumePoint>,
    pub data_gap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSeries {
    pub portfolio_id: String,
    pub tickers: Vec<TickerVolume>,
    // Allocation-weighted volume on dates where every ticker traded
    pub combined: Vec<WeightedVolumePoint>,
    pub gaps: Vec<DataGap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandlestickSeries {
    pub ticker: String,
    pub candles: Vec<Candle>,
    pub data_gap: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioCandlesticks {
    pub portfolio_id: String,
    pub series: Vec<CandlestickSeries>,
    pub gaps: Vec<DataGap>,
}

/// Per-ticker volume plus the combined series.
///
/// `weights` follows `panel.symbols()`; a missing entry counts as zero.
pub fn volume_series(portfolio_id: &str, panel: &PricePanel, weights: &[f64]) -> VolumeSeries {
    let tickers = panel
        .symbols()
        .iter()
        .map(|symbol| TickerVolume {
            ticker: symbol.clone(),
            points: panel
                .series(symbol)
                .iter()
                .map(|p| VolumePoint { date: p.date, value: p.volume })
                .collect(),
            data_gap: panel.has_gap(symbol),
        })
        .collect();

    let combined = panel
        .common_dates()
        .into_iter()
        .map(|date| {
            let value = panel
                .symbols()
                .iter()
                .enumerate()
                .filter_map(|(i, symbol)| {
                    let volume = panel.point_on(symbol, date)?.volume as f64;
                    Some(weights.get(i).copied().unwrap_or(0.0) * volume)
                })
                .sum();
            WeightedVolumePoint { date, value }
        })
        .collect();

    VolumeSeries {
        portfolio_id: portfolio_id.to_string(),
        tickers,
        combined,
        gaps: panel.gaps(),
    }
}

pub fn candlesticks(panel: &PricePanel, symbol: &str) -> CandlestickSeries {
    CandlestickSeries {
        ticker: symbol.to_string(),
        candles: panel
            .series(symbol)
            .iter()
            .map(|p| Candle {
                date: p.date,
                open: p.open,
                high: p.high,
                low: p.low,
                close: p.close,
            })
            .collect(),
        data_gap: panel.has_gap(symbol),
        missing_dates: panel.gap(symbol).map(|gap| gap.missing_dates).unwrap_or_default(),
    }
}

pub fn portfolio_candlesticks(portfolio_id: &str, panel: &PricePanel) -> PortfolioCandlesticks {
    PortfolioCandlesticks {
        portfolio_id: portfolio_id.to_string(),
        series: panel.symbols().iter().map(|s| candlesticks(panel, s)).collect(),
        gaps: panel.gaps(),
    }
}
