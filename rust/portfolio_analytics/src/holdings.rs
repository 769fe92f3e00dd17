// src/holdings.rs

use serde::Serialize;
use std::collections::HashMap;

use crate::catalog::{Holding, Portfolio, Ticker};
use crate::panel::DataGap;
use crate::weightage::{sort_by_weight_desc, TickerWeight};

pub const OTHERS: &str = "Others";
pub const VARIOUS: &str = "Various";

// Tolerance on declared holdings summing above 1
const OVERWEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyExposure {
    pub company: String,
    pub symbol: String,
    pub sector: String,
    pub weight: f64,
    pub etfs: Vec<String>,
    pub data_gap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyWeightage {
    pub portfolio_id: String,
    pub companies: Vec<CompanyExposure>,
    pub gaps: Vec<DataGap>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryExposure {
    pub sector: String,
    pub weight: f64,
    pub etfs: Vec<String>,
    pub data_gap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryWeightage {
    pub portfolio_id: String,
    pub industries: Vec<IndustryExposure>,
    pub gaps: Vec<DataGap>,
}

fn others(weight: f64) -> Holding {
    Holding {
        company: OTHERS.to_string(),
        symbol: String::new(),
        sector: VARIOUS.to_string(),
        weight,
    }
}

/// The holdings of `ticker` as fractions summing to 1.
///
/// A ticker without declared holdings holds itself. Declared weights below
/// 1 get the remainder as `Others`; above 1 they are scaled down.
pub fn effective_holdings(ticker: &Ticker) -> Vec<Holding> {
    let declared: f64 = ticker.holdings.iter().map(|h| h.weight).sum();
    if ticker.holdings.is_empty() || declared <= 0.0 {
        return vec![Holding {
            company: ticker.name.clone(),
            symbol: ticker.symbol.clone(),
            sector: ticker.sector.clone(),
            weight: 1.0,
        }];
    }

    let mut holdings = ticker.holdings.clone();
    if declared > 1.0 + OVERWEIGHT_TOLERANCE {
        for holding in &mut holdings {
            holding.weight /= declared;
        }
    } else if declared < 1.0 {
        holdings.push(others(1.0 - declared));
    }
    holdings
}

// (ticker, etf weight, holding) for every ticker with a known weight
fn look_through<'a>(
    portfolio: &'a Portfolio,
    weights: &'a [TickerWeight],
) -> impl Iterator<Item = (&'a TickerWeight, Holding)> + 'a {
    portfolio
        .tickers
        .iter()
        .zip(weights)
        .filter(|(_, w)| w.weight.is_some())
        .flat_map(|(ticker, w)| effective_holdings(ticker).into_iter().map(move |h| (w, h)))
}

/// Portfolio exposure to individual companies.
///
/// At most `top` named companies are listed, heaviest first. Everything
/// else, including undeclared ETF remainders, is one trailing `Others` entry.
pub fn company_weightage(portfolio: &Portfolio, weights: &[TickerWeight], gaps: Vec<DataGap>, top: usize) -> CompanyWeightage {
    let mut by_company: HashMap<String, CompanyExposure> = HashMap::new();
    let mut rest = CompanyExposure {
        company: OTHERS.to_string(),
        symbol: String::new(),
        sector: VARIOUS.to_string(),
        weight: 0.0,
        etfs: Vec::new(),
        data_gap: false,
    };

    for (etf, holding) in look_through(portfolio, weights) {
        let weight = etf.weight.unwrap_or(0.0) * holding.weight;
        let entry = if holding.company == OTHERS {
            &mut rest
        } else {
            by_company.entry(holding.company.clone()).or_insert_with(|| CompanyExposure {
                company: holding.company.clone(),
                symbol: holding.symbol.clone(),
                sector: holding.sector.clone(),
                weight: 0.0,
                etfs: Vec::new(),
                data_gap: false,
            })
        };
        entry.weight += weight;
        entry.data_gap |= etf.data_gap;
        if !entry.etfs.contains(&etf.ticker) {
            entry.etfs.push(etf.ticker.clone());
        }
    }

    let mut companies: Vec<CompanyExposure> = by_company.into_values().collect();
    sort_by_weight_desc(&mut companies, |c| Some(c.weight), |c| &c.company);

    if companies.len() > top {
        for tail in companies.split_off(top) {
            rest.weight += tail.weight;
            rest.data_gap |= tail.data_gap;
            for etf in tail.etfs {
                if !rest.etfs.contains(&etf) {
                    rest.etfs.push(etf);
                }
            }
        }
    }
    if rest.weight > 0.0 {
        companies.push(rest);
    }

    CompanyWeightage {
        portfolio_id: portfolio.id.clone(),
        companies,
        gaps,
    }
}

pub fn industry_weightage(portfolio: &Portfolio, weights: &[TickerWeight], gaps: Vec<DataGap>) -> IndustryWeightage {
    let mut industries: Vec<IndustryExposure> = Vec::new();
    for (etf, holding) in look_through(portfolio, weights) {
        let weight = etf.weight.unwrap_or(0.0) * holding.weight;
        let index = match industries.iter().position(|i| i.sector == holding.sector) {
            Some(index) => index,
            None => {
                industries.push(IndustryExposure {
                    sector: holding.sector.clone(),
                    weight: 0.0,
                    etfs: Vec::new(),
                    data_gap: false,
                });
                industries.len() - 1
            }
        };

        let industry = &mut industries[index];
        industry.weight += weight;
        industry.data_gap |= etf.data_gap;
        if !industry.etfs.contains(&etf.ticker) {
            industry.etfs.push(etf.ticker.clone());
        }
    }

    sort_by_weight_desc(&mut industries, |i| Some(i.weight), |i| &i.sector);
    IndustryWeightage {
        portfolio_id: portfolio.id.clone(),
        industries,
        gaps,
    }
}
