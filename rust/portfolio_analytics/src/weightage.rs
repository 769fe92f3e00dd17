// src/weightage.rs

use serde::Serialize;

use crate::catalog::Portfolio;
use crate::panel::{DataGap, PricePanel};
use crate::policy::WeightingPolicy;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerWeight {
    pub ticker: String,
    pub name: String,
    pub sector: String,
    // None when the policy needs prices the ticker does not have
    pub weight: Option<f64>,
    pub data_gap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorWeight {
    pub sector: String,
    pub weight: Option<f64>,
    pub tickers: Vec<String>,
    pub data_gap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightageBreakdown {
    pub portfolio_id: String,
    pub policy: WeightingPolicy,
    pub companies: Vec<TickerWeight>,
    pub sectors: Vec<SectorWeight>,
    pub gaps: Vec<DataGap>,
}

// Current value of one unit invested at the first close in range
fn growth(panel: &PricePanel, symbol: &str) -> Option<f64> {
    let points = panel.series(symbol);
    let (first, last) = (points.first()?, points.last()?);
    (first.close > 0.0 && last.close.is_finite()).then(|| last.close / first.close)
}

/// Ticker-level weights of a portfolio under `policy`.
///
/// Known weights always sum to 1. Under `MarketValue` a ticker without
/// prices has no weight and is left out of the normalization.
pub fn ticker_weights(portfolio: &Portfolio, panel: &PricePanel, policy: WeightingPolicy) -> Vec<TickerWeight> {
    let n = portfolio.tickers.len();
    let raw: Vec<Option<f64>> = match policy {
        WeightingPolicy::Equal => vec![Some(1.0); n],
        WeightingPolicy::MarketValue => portfolio.tickers.iter().map(|t| growth(panel, &t.symbol)).collect(),
    };

    let total: f64 = raw.iter().flatten().sum();
    portfolio
        .tickers
        .iter()
        .zip(raw)
        .map(|(ticker, value)| TickerWeight {
            ticker: ticker.symbol.clone(),
            name: ticker.name.clone(),
            sector: ticker.sector.clone(),
            weight: value.filter(|_| total > 0.0).map(|v| v / total),
            data_gap: panel.has_gap(&ticker.symbol),
        })
        .collect()
}

pub(crate) fn sort_by_weight_desc<T>(items: &mut [T], weight: impl Fn(&T) -> Option<f64>, name: impl Fn(&T) -> &str) {
    items.sort_by(|a, b| {
        let (wa, wb) = (weight(a).unwrap_or(f64::NEG_INFINITY), weight(b).unwrap_or(f64::NEG_INFINITY));
        wb.total_cmp(&wa).then_with(|| name(a).cmp(name(b)))
    });
}

pub fn sector_weights(weights: &[TickerWeight]) -> Vec<SectorWeight> {
    let mut sectors: Vec<SectorWeight> = Vec::new();
    for entry in weights {
        let index = match sectors.iter().position(|s| s.sector == entry.sector) {
            Some(index) => index,
            None => {
                sectors.push(SectorWeight {
                    sector: entry.sector.clone(),
                    weight: None,
                    tickers: Vec::new(),
                    data_gap: false,
                });
                sectors.len() - 1
            }
        };

        let sector = &mut sectors[index];
        sector.tickers.push(entry.ticker.clone());
        sector.data_gap |= entry.data_gap;
        if let Some(w) = entry.weight {
            sector.weight = Some(sector.weight.unwrap_or(0.0) + w);
        }
    }

    sort_by_weight_desc(&mut sectors, |s| s.weight, |s| &s.sector);
    sectors
}

pub fn weightage(portfolio: &Portfolio, panel: &PricePanel, policy: WeightingPolicy) -> WeightageBreakdown {
    let companies = ticker_weights(portfolio, panel, policy);
    WeightageBreakdown {
        portfolio_id: portfolio.id.clone(),
        policy,
        sectors: sector_weights(&companies),
        companies,
        gaps: panel.gaps(),
    }
}
