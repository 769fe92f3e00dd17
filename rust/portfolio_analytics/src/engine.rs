// src/engine.rs

use chrono::{NaiveDate, Utc};
use futures::future::{join_all, try_join_all};
use market_data::{DateRange, InflationSource, MarketDataError, MarketDataSource, PricePoint};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::{Portfolio, PortfolioCatalog, Ticker};
use crate::correlation::{correlation_matrix, CorrelationMatrix};
use crate::error::{AnalyticsError, Result};
use crate::holdings::{company_weightage, industry_weightage, CompanyWeightage, IndustryWeightage};
use crate::inflation::{
    bank_vs_spy, inflation_stats, real_vs_nominal, BankVsSpyPoint, InflationStats, RealVsNominalPoint, SampledSeries,
};
use crate::matching::TimeHorizon;
use crate::panel::PricePanel;
use crate::performance::{allocation_fractions, performance_report, PerformanceReport};
use crate::performers::{rank_performers, Direction, PerformerRanking};
use crate::policy::AnalyticsPolicy;
use crate::series::{candlesticks, portfolio_candlesticks, volume_series, CandlestickSeries, PortfolioCandlesticks, VolumeSeries};
use crate::weightage::{ticker_weights, weightage, WeightageBreakdown};

/// Computes every analytics result from fresh price fetches.
///
/// The engine holds no mutable state; results are never cached, only the
/// underlying source may cache raw prices. Inflation operations need an
/// inflation source and report `MissingDataset` without one.
#[derive(Clone)]
pub struct AnalyticsEngine {
    source: Arc<dyn MarketDataSource>,
    inflation: Option<Arc<dyn InflationSource>>,
    catalog: Arc<PortfolioCatalog>,
    policy: AnalyticsPolicy,
}

impl AnalyticsEngine {
    pub fn new(source: Arc<dyn MarketDataSource>, catalog: Arc<PortfolioCatalog>, policy: AnalyticsPolicy) -> Self {
        AnalyticsEngine {
            source,
            inflation: None,
            catalog,
            policy,
        }
    }

    pub fn with_inflation_source(mut self, inflation: Arc<dyn InflationSource>) -> Self {
        self.inflation = Some(inflation);
        self
    }

    pub fn catalog(&self) -> &Arc<PortfolioCatalog> {
        &self.catalog
    }

    pub fn policy(&self) -> &AnalyticsPolicy {
        &self.policy
    }

    pub fn resolve_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<DateRange> {
        self.policy.resolve_range(Utc::now().date_naive(), start, end)
    }

    // A catalog ticker the provider does not know degrades to an empty series
    async fn fetch(&self, symbol: &str, range: DateRange) -> Result<Vec<PricePoint>> {
        let fetched = tokio::time::timeout(self.policy.fetch_timeout, self.source.fetch_history(symbol, range)).await;
        match fetched {
            Err(_) => {
                warn!(ticker = symbol, %range, "price fetch timed out");
                Err(AnalyticsError::DataSourceTimeout {
                    ticker: symbol.to_string(),
                    range,
                })
            }
            Ok(Ok(points)) => {
                debug!(ticker = symbol, %range, points = points.len(), "fetched prices");
                Ok(points)
            }
            Ok(Err(MarketDataError::NotFound { .. })) => {
                warn!(ticker = symbol, %range, "provider has no data for ticker");
                Ok(Vec::new())
            }
            Ok(Err(err)) => Err(AnalyticsError::from_source(err, symbol, range)),
        }
    }

    // Trading days of catalog tickers outside `symbols`. A failed donor only
    // narrows the calendar, so its error is logged and dropped.
    async fn reference_dates(&self, symbols: &[String], range: DateRange) -> Vec<NaiveDate> {
        let donors: Vec<&str> = self
            .catalog
            .universe()
            .into_iter()
            .map(|t| t.symbol.as_str())
            .filter(|s| !symbols.iter().any(|m| m == s))
            .collect();
        let fetched = join_all(donors.iter().map(|s| self.fetch(s, range))).await;

        let mut dates = Vec::new();
        for (donor, result) in donors.into_iter().zip(fetched) {
            match result {
                Ok(points) => dates.extend(points.into_iter().map(|p| p.date)),
                Err(err) => debug!(ticker = donor, %err, "calendar donor unavailable"),
            }
        }
        dates
    }

    async fn load_panel(&self, symbols: Vec<String>, range: DateRange) -> Result<PricePanel> {
        let (series, reference) = tokio::join!(
            try_join_all(symbols.iter().map(|s| self.fetch(s, range))),
            self.reference_dates(&symbols, range)
        );
        let panel = PricePanel::with_reference(range, symbols.into_iter().zip(series?).collect(), reference);
        for gap in panel.gaps() {
            warn!(ticker = %gap.ticker, kind = ?gap.kind, missing = gap.missing_dates.len(), %range, "data gap");
        }
        Ok(panel)
    }

    async fn portfolio_panel(&self, portfolio_id: &str, range: DateRange) -> Result<(&Portfolio, PricePanel)> {
        let portfolio = self.catalog.get_portfolio(portfolio_id)?;
        let panel = self.load_panel(portfolio.symbols(), range).await?;
        Ok((portfolio, panel))
    }

    pub async fn correlation(&self, portfolio_id: &str, range: DateRange) -> Result<CorrelationMatrix> {
        let (_, panel) = self.portfolio_panel(portfolio_id, range).await?;
        Ok(correlation_matrix(&panel))
    }

    pub async fn weightage(&self, portfolio_id: &str, range: DateRange) -> Result<WeightageBreakdown> {
        let (portfolio, panel) = self.portfolio_panel(portfolio_id, range).await?;
        Ok(weightage(portfolio, &panel, self.policy.weighting))
    }

    pub async fn company_weightage(&self, portfolio_id: &str, range: DateRange) -> Result<CompanyWeightage> {
        let (portfolio, panel) = self.portfolio_panel(portfolio_id, range).await?;
        let weights = ticker_weights(portfolio, &panel, self.policy.weighting);
        Ok(company_weightage(portfolio, &weights, panel.gaps(), self.policy.top_companies))
    }

    pub async fn industry_weightage(&self, portfolio_id: &str, range: DateRange) -> Result<IndustryWeightage> {
        let (portfolio, panel) = self.portfolio_panel(portfolio_id, range).await?;
        let weights = ticker_weights(portfolio, &panel, self.policy.weighting);
        Ok(industry_weightage(portfolio, &weights, panel.gaps()))
    }

    /// Ranks the whole catalog universe over the horizon's window.
    pub async fn performers(
        &self,
        direction: Direction,
        horizon: TimeHorizon,
        range: DateRange,
        limit: Option<usize>,
    ) -> Result<PerformerRanking> {
        let limit = limit.unwrap_or(self.policy.performer_limit);
        if limit == 0 {
            return Err(AnalyticsError::InvalidRequest("limit must be at least 1".to_string()));
        }

        let universe: Vec<&Ticker> = self.catalog.universe();
        let symbols = universe.iter().map(|t| t.symbol.clone()).collect();
        let panel = self.load_panel(symbols, range).await?;
        let window = self.policy.window_days(horizon);
        Ok(rank_performers(&panel, &universe, direction, horizon, window, limit))
    }

    pub async fn volume(&self, portfolio_id: &str, range: DateRange) -> Result<VolumeSeries> {
        let (portfolio, panel) = self.portfolio_panel(portfolio_id, range).await?;
        let weights: Vec<f64> = ticker_weights(portfolio, &panel, self.policy.weighting)
            .iter()
            .map(|w| w.weight.unwrap_or(0.0))
            .collect();
        Ok(volume_series(&portfolio.id, &panel, &weights))
    }

    // Single catalog ticker; an empty range has nothing to degrade to
    pub async fn candlestick(&self, symbol: &str, range: DateRange) -> Result<CandlestickSeries> {
        let ticker = self
            .catalog
            .ticker(symbol)
            .ok_or_else(|| AnalyticsError::UnknownTicker(symbol.to_string()))?;
        let panel = self.load_panel(vec![ticker.symbol.clone()], range).await?;

        let series = candlesticks(&panel, &ticker.symbol);
        if series.candles.is_empty() {
            return Err(AnalyticsError::DataGap {
                ticker: ticker.symbol.clone(),
                range,
                reason: "no prices in range".to_string(),
            });
        }
        Ok(series)
    }

    pub async fn portfolio_candlesticks(&self, portfolio_id: &str, range: DateRange) -> Result<PortfolioCandlesticks> {
        let (portfolio, panel) = self.portfolio_panel(portfolio_id, range).await?;
        Ok(portfolio_candlesticks(&portfolio.id, &panel))
    }

    /// `allocations` maps tickers to percentages; `None` splits evenly.
    pub async fn performance(
        &self,
        portfolio_id: &str,
        range: DateRange,
        amount: f64,
        allocations: Option<&HashMap<String, f64>>,
    ) -> Result<PerformanceReport> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(AnalyticsError::InvalidRequest(format!(
                "investmentAmount must be a positive number, got {amount}"
            )));
        }
        let portfolio = self.catalog.get_portfolio(portfolio_id)?;
        let fractions = allocation_fractions(&portfolio.symbols(), allocations, self.policy.allocation_tolerance)?;
        let panel = self.load_panel(portfolio.symbols(), range).await?;
        performance_report(&portfolio.id, &panel, amount, &fractions, &self.policy)
    }

    fn inflation_source(&self) -> Result<&dyn InflationSource> {
        self.inflation
            .as_deref()
            .ok_or_else(|| AnalyticsError::MissingDataset("no inflation data configured".to_string()))
    }

    pub async fn real_vs_nominal(&self) -> Result<SampledSeries<RealVsNominalPoint>> {
        let rows = self
            .inflation_source()?
            .spy_inflation()
            .await
            .map_err(AnalyticsError::from_dataset)?;
        Ok(real_vs_nominal(&rows, self.policy.inflation_sample_every))
    }

    pub async fn bank_vs_spy(&self) -> Result<SampledSeries<BankVsSpyPoint>> {
        let inflation = self.inflation_source()?;
        let (bank, spy) = tokio::join!(inflation.bank_values(), inflation.spy_inflation());
        let bank = bank.map_err(AnalyticsError::from_dataset)?;
        let spy = spy.map_err(AnalyticsError::from_dataset)?;
        Ok(bank_vs_spy(&bank, &spy, self.policy.inflation_sample_every))
    }

    // The bank dataset is optional here
    pub async fn inflation_stats(&self) -> Result<InflationStats> {
        let inflation = self.inflation_source()?;
        let (spy, bank) = tokio::join!(inflation.spy_inflation(), inflation.bank_values());
        let spy = spy.map_err(AnalyticsError::from_dataset)?;
        let bank = match bank {
            Ok(rows) => Some(rows),
            Err(MarketDataError::MissingDataset { path }) => {
                debug!(%path, "bank dataset missing, skipping bank return");
                None
            }
            Err(err) => return Err(AnalyticsError::from_dataset(err)),
        };
        inflation_stats(&spy, bank.as_deref())
    }
}
