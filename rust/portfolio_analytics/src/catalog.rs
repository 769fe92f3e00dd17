// src/catalog.rs

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{AnalyticsError, Result};
use crate::matching::{RiskTolerance, TimeHorizon};

pub type PortfolioId = String;

// One company held by an ETF; weight is a fraction of the fund
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub company: String,
    #[serde(default)]
    pub symbol: String,
    pub sector: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: PortfolioId,
    pub name: String,
    pub risk_tolerance: RiskTolerance,
    pub time_horizon: TimeHorizon,
    pub tickers: Vec<Ticker>,
}

impl Portfolio {
    pub fn symbols(&self) -> Vec<String> {
        self.tickers.iter().map(|t| t.symbol.clone()).collect()
    }
}

/// Fixed, read-only set of portfolios loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogFile")]
pub struct PortfolioCatalog {
    portfolios: Vec<Portfolio>,
}

#[derive(Deserialize)]
struct CatalogFile {
    portfolios: Vec<Portfolio>,
}

impl TryFrom<CatalogFile> for PortfolioCatalog {
    type Error = AnalyticsError;

    fn try_from(file: CatalogFile) -> Result<Self> {
        PortfolioCatalog::new(file.portfolios)
    }
}

impl PortfolioCatalog {
    pub fn new(portfolios: Vec<Portfolio>) -> Result<Self> {
        validate(&portfolios)?;
        Ok(PortfolioCatalog { portfolios })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| AnalyticsError::Catalog(err.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| AnalyticsError::Catalog(format!("{}: {err}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn get_portfolio(&self, id: &str) -> Result<&Portfolio> {
        self.portfolios
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AnalyticsError::UnknownPortfolio(id.to_string()))
    }

    // Catalog order, stable for the process lifetime
    pub fn list_portfolios(&self) -> &[Portfolio] {
        &self.portfolios
    }

    // Every ticker once, in first-seen catalog order
    pub fn universe(&self) -> Vec<&Ticker> {
        let mut seen = HashSet::new();
        self.portfolios
            .iter()
            .flat_map(|p| p.tickers.iter())
            .filter(|t| seen.insert(t.symbol.as_str()))
            .collect()
    }

    pub fn ticker(&self, symbol: &str) -> Option<&Ticker> {
        self.portfolios
            .iter()
            .flat_map(|p| p.tickers.iter())
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }
}

fn validate(portfolios: &[Portfolio]) -> Result<()> {
    if portfolios.is_empty() {
        return Err(AnalyticsError::Catalog("catalog has no portfolios".to_string()));
    }

    let mut ids = HashSet::new();
    let mut buckets = HashSet::new();
    for portfolio in portfolios {
        if portfolio.id.trim().is_empty() {
            return Err(AnalyticsError::Catalog("portfolio with empty id".to_string()));
        }
        if !ids.insert(portfolio.id.as_str()) {
            return Err(AnalyticsError::Catalog(format!("duplicate portfolio id {}", portfolio.id)));
        }
        if !buckets.insert((portfolio.risk_tolerance, portfolio.time_horizon)) {
            return Err(AnalyticsError::Catalog(format!(
                "more than one portfolio for {} risk, {}",
                portfolio.risk_tolerance, portfolio.time_horizon
            )));
        }
        if portfolio.tickers.is_empty() {
            return Err(AnalyticsError::Catalog(format!("portfolio {} has no tickers", portfolio.id)));
        }

        let mut symbols = HashSet::new();
        for ticker in &portfolio.tickers {
            if ticker.symbol.trim().is_empty() {
                return Err(AnalyticsError::Catalog(format!("empty ticker symbol in {}", portfolio.id)));
            }
            if !symbols.insert(ticker.symbol.as_str()) {
                return Err(AnalyticsError::Catalog(format!(
                    "ticker {} listed twice in {}",
                    ticker.symbol, portfolio.id
                )));
            }
            if let Some(bad) = ticker.holdings.iter().find(|h| !h.weight.is_finite() || h.weight < 0.0) {
                return Err(AnalyticsError::Catalog(format!(
                    "holding {} of {} has invalid weight {}",
                    bad.company, ticker.symbol, bad.weight
                )));
            }
        }
    }

    // The matcher needs every (risk, horizon) combination
    for risk in RiskTolerance::ALL {
        for horizon in TimeHorizon::ALL {
            if !buckets.contains(&(risk, horizon)) {
                return Err(AnalyticsError::Catalog(format!("no portfolio for {risk} risk, {horizon}")));
            }
        }
    }
    Ok(())
}

fn holding(company: &str, symbol: &str, sector: &str, weight: f64) -> Holding {
    Holding {
        company: company.to_string(),
        symbol: symbol.to_string(),
        sector: sector.to_string(),
        weight,
    }
}

fn ticker(symbol: &str, name: &str, sector: &str, holdings: Vec<Holding>) -> Ticker {
    Ticker {
        symbol: symbol.to_string(),
        name: name.to_string(),
        sector: sector.to_string(),
        holdings,
    }
}

fn portfolio(id: &str, name: &str, risk: RiskTolerance, horizon: TimeHorizon, tickers: Vec<Ticker>) -> Portfolio {
    Portfolio {
        id: id.to_string(),
        name: name.to_string(),
        risk_tolerance: risk,
        time_horizon: horizon,
        tickers,
    }
}

fn spy() -> Ticker {
    ticker(
        "SPY",
        "SPDR S&P 500 ETF Trust",
        "Large Blend",
        vec![
            holding("Apple Inc.", "AAPL", "Information Technology", 0.070),
            holding("Microsoft Corp.", "MSFT", "Information Technology", 0.065),
            holding("NVIDIA Corp.", "NVDA", "Information Technology", 0.060),
            holding("Amazon.com Inc.", "AMZN", "Consumer Discretionary", 0.037),
            holding("Meta Platforms Inc.", "META", "Communication Services", 0.025),
            holding("Alphabet Inc.", "GOOGL", "Communication Services", 0.020),
        ],
    )
}

fn default_catalog() -> PortfolioCatalog {
    use RiskTolerance::{High, Low};
    use TimeHorizon::{LongTerm, ShortTerm};

    let portfolios = vec![
        portfolio(
            "high-risk-long-term",
            "High Risk, Long Term",
            High,
            LongTerm,
            vec![
                spy(),
                ticker(
                    "GBTC",
                    "Grayscale Bitcoin Trust",
                    "Digital Assets",
                    vec![holding("Bitcoin", "BTC", "Digital Assets", 1.0)],
                ),
                ticker("BRK-B", "Berkshire Hathaway Inc.", "Financials", vec![]),
                ticker(
                    "VUG",
                    "Vanguard Growth ETF",
                    "Large Growth",
                    vec![
                        holding("Apple Inc.", "AAPL", "Information Technology", 0.120),
                        holding("Microsoft Corp.", "MSFT", "Information Technology", 0.110),
                        holding("NVIDIA Corp.", "NVDA", "Information Technology", 0.100),
                        holding("Amazon.com Inc.", "AMZN", "Consumer Discretionary", 0.065),
                        holding("Meta Platforms Inc.", "META", "Communication Services", 0.045),
                    ],
                ),
            ],
        ),
        portfolio(
            "high-risk-short-term",
            "High Risk, Short Term",
            High,
            ShortTerm,
            vec![
                ticker(
                    "ARKK",
                    "ARK Innovation ETF",
                    "Innovation",
                    vec![
                        holding("Tesla Inc.", "TSLA", "Consumer Discretionary", 0.12),
                        holding("Coinbase Global Inc.", "COIN", "Financials", 0.09),
                        holding("Roku Inc.", "ROKU", "Communication Services", 0.08),
                        holding("Roblox Corp.", "RBLX", "Communication Services", 0.06),
                    ],
                ),
                ticker(
                    "IWF",
                    "iShares Russell 1000 Growth ETF",
                    "Large Growth",
                    vec![
                        holding("Apple Inc.", "AAPL", "Information Technology", 0.110),
                        holding("Microsoft Corp.", "MSFT", "Information Technology", 0.100),
                        holding("NVIDIA Corp.", "NVDA", "Information Technology", 0.095),
                        holding("Amazon.com Inc.", "AMZN", "Consumer Discretionary", 0.060),
                    ],
                ),
                ticker(
                    "QQQ",
                    "Invesco QQQ Trust",
                    "Technology",
                    vec![
                        holding("Apple Inc.", "AAPL", "Information Technology", 0.090),
                        holding("Microsoft Corp.", "MSFT", "Information Technology", 0.085),
                        holding("NVIDIA Corp.", "NVDA", "Information Technology", 0.080),
                        holding("Amazon.com Inc.", "AMZN", "Consumer Discretionary", 0.055),
                        holding("Broadcom Inc.", "AVGO", "Information Technology", 0.050),
                    ],
                ),
                ticker("UPRO", "ProShares UltraPro S&P500", "Leveraged Equity", vec![]),
            ],
        ),
        portfolio(
            "low-risk-long-term",
            "Low Risk, Long Term",
            Low,
            LongTerm,
            vec![
                spy(),
                ticker("BND", "Vanguard Total Bond Market ETF", "Fixed Income", vec![]),
                ticker("VTIP", "Vanguard Short-Term Inflation-Protected Securities ETF", "Fixed Income", vec![]),
                ticker(
                    "VXUS",
                    "Vanguard Total International Stock ETF",
                    "International Equity",
                    vec![
                        holding("Taiwan Semiconductor Manufacturing", "TSM", "Information Technology", 0.025),
                        holding("Tencent Holdings Ltd.", "0700", "Communication Services", 0.011),
                        holding("Nestle SA", "NESN", "Consumer Staples", 0.008),
                    ],
                ),
            ],
        ),
        portfolio(
            "low-risk-short-term",
            "Low Risk, Short Term",
            Low,
            ShortTerm,
            vec![
                ticker("USMV", "iShares MSCI USA Min Vol Factor ETF", "Low Volatility", vec![]),
                ticker("SPLV", "Invesco S&P 500 Low Volatility ETF", "Low Volatility", vec![]),
                ticker(
                    "VYM",
                    "Vanguard High Dividend Yield ETF",
                    "Dividend Equity",
                    vec![
                        holding("JPMorgan Chase & Co.", "JPM", "Financials", 0.040),
                        holding("Exxon Mobil Corp.", "XOM", "Energy", 0.030),
                        holding("Johnson & Johnson", "JNJ", "Health Care", 0.025),
                    ],
                ),
                ticker("AGG", "iShares Core US Aggregate Bond ETF", "Fixed Income", vec![]),
            ],
        ),
    ];

    PortfolioCatalog { portfolios }
}

lazy_static! {
    // Built-in catalog used when no catalog file is configured
    pub static ref DEFAULT_CATALOG: PortfolioCatalog = default_catalog();
}
