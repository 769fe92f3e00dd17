// src/performance.rs

use chrono::{Datelike, NaiveDate};
use ndarray::Array1;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{AnalyticsError, Result};
use crate::panel::{DataGap, PricePanel};
use crate::policy::AnalyticsPolicy;

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    // Buckets on annualized volatility
    pub fn from_volatility(volatility: f64) -> Self {
        match volatility {
            v if v < 0.05 => RiskLevel::VeryLow,
            v if v < 0.10 => RiskLevel::Low,
            v if v < 0.15 => RiskLevel::Moderate,
            v if v < 0.20 => RiskLevel::High,
            _ => RiskLevel::VeryHigh,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValuePoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyReturn {
    pub year: i32,
    pub total_return: f64,
}

/// One holding's own price behaviour over the range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EtfPerformance {
    pub ticker: String,
    // Percent of the investment, 0 for unheld tickers
    pub allocation: f64,
    pub first_price: f64,
    pub last_price: f64,
    pub total_return: f64,
    pub volatility: f64,
    // Close over the first close on the report's dates; empty when unheld
    pub normalized: Vec<ValuePoint>,
    pub data_gap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub peak: f64,
    pub drawdown: f64,
}

/// Stretch below the start threshold. `end_date` is the first date back
/// within the recovery threshold; an open period has none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownPeriod {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub max_drawdown: f64,
    // Trading days from start to recovery
    pub recovery_days: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub portfolio_id: String,
    pub investment_amount: f64,
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    // Largest peak-to-trough decline, as a negative fraction
    pub max_drawdown: f64,
    pub max_drawdown_date: Option<NaiveDate>,
    pub sharpe_ratio: f64,
    pub risk_level: RiskLevel,
    pub yearly_returns: Vec<YearlyReturn>,
    pub values: Vec<ValuePoint>,
    pub etfs: Vec<EtfPerformance>,
    pub drawdowns: Vec<DrawdownPoint>,
    // Dates below the severe threshold
    pub severe_drawdowns: usize,
    pub drawdown_periods: Vec<DrawdownPeriod>,
    pub gaps: Vec<DataGap>,
}

/// Resolves requested percentages into fractions following `symbols`.
///
/// `None` splits evenly. Keys match case-insensitively; unnamed holdings get
/// zero. The total must be 100 within `tolerance` percentage points.
pub fn allocation_fractions(
    symbols: &[String],
    requested: Option<&HashMap<String, f64>>,
    tolerance: f64,
) -> Result<Vec<f64>> {
    let Some(requested) = requested else {
        return Ok(vec![1.0 / symbols.len() as f64; symbols.len()]);
    };

    let mut percents = vec![0.0; symbols.len()];
    for (ticker, percent) in requested {
        let index = symbols
            .iter()
            .position(|s| s.eq_ignore_ascii_case(ticker.trim()))
            .ok_or_else(|| AnalyticsError::InvalidRequest(format!("{ticker} is not held by this portfolio")))?;
        if !percent.is_finite() || *percent < 0.0 {
            return Err(AnalyticsError::InvalidRequest(format!(
                "allocation for {ticker} must be a non-negative number, got {percent}"
            )));
        }
        percents[index] += percent;
    }

    let total: f64 = percents.iter().sum();
    if (total - 100.0).abs() > tolerance {
        return Err(AnalyticsError::InvalidRequest(format!(
            "Total allocation must be 100%, got {total}%"
        )));
    }
    Ok(percents.into_iter().map(|p| p / total).collect())
}

// Dates on which every held ticker has a close
fn held_dates(panel: &PricePanel, fractions: &[f64]) -> Vec<NaiveDate> {
    let held: Vec<&String> = panel
        .symbols()
        .iter()
        .zip(fractions)
        .filter(|(_, f)| **f > 0.0)
        .map(|(s, _)| s)
        .collect();
    panel
        .calendar()
        .iter()
        .copied()
        .filter(|date| held.iter().all(|s| panel.point_on(s, *date).is_some()))
        .collect()
}

// Buy-and-hold value of `amount` split by `fractions` on every held date
fn value_series(panel: &PricePanel, amount: f64, fractions: &[f64]) -> Vec<ValuePoint> {
    let dates = held_dates(panel, fractions);
    let Some(&start) = dates.first() else {
        return Vec::new();
    };

    let symbols = panel.symbols();
    let shares: Vec<f64> = symbols
        .iter()
        .zip(fractions)
        .map(|(s, fraction)| {
            panel
                .point_on(s, start)
                .filter(|p| p.close > 0.0 && *fraction > 0.0)
                .map_or(0.0, |p| amount * fraction / p.close)
        })
        .collect();

    dates
        .into_iter()
        .map(|date| {
            let value = symbols
                .iter()
                .zip(&shares)
                .filter(|(_, qty)| **qty > 0.0)
                .filter_map(|(s, qty)| panel.point_on(s, date).map(|p| qty * p.close))
                .sum();
            ValuePoint { date, value }
        })
        .collect()
}

fn annualized_std(returns: Array1<f64>, trading_days_per_year: f64) -> f64 {
    if returns.len() >= 2 {
        returns.std(1.0) * trading_days_per_year.sqrt()
    } else {
        0.0
    }
}

fn etf_performance(
    panel: &PricePanel,
    fractions: &[f64],
    dates: &[NaiveDate],
    policy: &AnalyticsPolicy,
) -> Vec<EtfPerformance> {
    panel
        .symbols()
        .iter()
        .zip(fractions)
        .filter_map(|(symbol, fraction)| {
            let points = panel.series(symbol);
            let (first, last) = (points.first()?, points.last()?);
            let returns: Array1<f64> = points
                .windows(2)
                .filter(|w| w[0].close > 0.0)
                .map(|w| w[1].close / w[0].close - 1.0)
                .collect();

            let normalized = if *fraction > 0.0 {
                let base = dates.first().and_then(|d| panel.point_on(symbol, *d)).map(|p| p.close);
                match base.filter(|b| *b > 0.0) {
                    Some(base) => dates
                        .iter()
                        .filter_map(|d| panel.point_on(symbol, *d))
                        .map(|p| ValuePoint { date: p.date, value: p.close / base })
                        .collect(),
                    None => Vec::new(),
                }
            } else {
                Vec::new()
            };

            Some(EtfPerformance {
                ticker: symbol.clone(),
                allocation: fraction * 100.0,
                first_price: first.close,
                last_price: last.close,
                total_return: if first.close > 0.0 { last.close / first.close - 1.0 } else { 0.0 },
                volatility: annualized_std(returns, policy.trading_days_per_year),
                normalized,
                data_gap: panel.has_gap(symbol),
            })
        })
        .collect()
}

fn drawdown_series(values: &[ValuePoint]) -> Vec<DrawdownPoint> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|point| {
            peak = peak.max(point.value);
            let drawdown = if peak > 0.0 { point.value / peak - 1.0 } else { 0.0 };
            DrawdownPoint { date: point.date, value: point.value, peak, drawdown }
        })
        .collect()
}

fn drawdown_periods(drawdowns: &[DrawdownPoint], policy: &AnalyticsPolicy) -> Vec<DrawdownPeriod> {
    let mut periods = Vec::new();
    let mut open: Option<(usize, f64)> = None;
    for (i, point) in drawdowns.iter().enumerate() {
        match open {
            None if point.drawdown < -policy.drawdown_start => open = Some((i, point.drawdown)),
            Some((start, worst)) if point.drawdown >= -policy.drawdown_recovered => {
                periods.push(DrawdownPeriod {
                    start_date: drawdowns[start].date,
                    end_date: Some(point.date),
                    max_drawdown: worst,
                    recovery_days: Some(i - start),
                });
                open = None;
            }
            Some((start, worst)) => open = Some((start, worst.min(point.drawdown))),
            None => {}
        }
    }
    if let Some((start, worst)) = open {
        periods.push(DrawdownPeriod {
            start_date: drawdowns[start].date,
            end_date: None,
            max_drawdown: worst,
            recovery_days: None,
        });
    }
    periods
}

fn max_drawdown(values: &[ValuePoint]) -> (f64, Option<NaiveDate>) {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0;
    let mut worst_date = None;
    for point in values {
        peak = peak.max(point.value);
        if peak > 0.0 {
            let drawdown = point.value / peak - 1.0;
            if drawdown < worst {
                worst = drawdown;
                worst_date = Some(point.date);
            }
        }
    }
    (worst, worst_date)
}

// Each year measured from the previous year's last value (the first value for the first year)
fn yearly_returns(values: &[ValuePoint]) -> Vec<YearlyReturn> {
    let mut years = Vec::new();
    let Some(first) = values.first() else {
        return years;
    };

    let mut base = first.value;
    let mut year = first.date.year();
    let mut last = first.value;
    for point in values {
        if point.date.year() != year {
            years.push(YearlyReturn { year, total_return: last / base - 1.0 });
            base = last;
            year = point.date.year();
        }
        last = point.value;
    }
    years.push(YearlyReturn { year, total_return: last / base - 1.0 });
    years
}

/// `fractions` follows `panel.symbols()`, as `allocation_fractions` returns it.
pub fn performance_report(
    portfolio_id: &str,
    panel: &PricePanel,
    amount: f64,
    fractions: &[f64],
    policy: &AnalyticsPolicy,
) -> Result<PerformanceReport> {
    let values = value_series(panel, amount, fractions);
    let (Some(first), Some(last)) = (values.first(), values.last()) else {
        let ticker = panel
            .gaps()
            .first()
            .map(|g| g.ticker.clone())
            .unwrap_or_else(|| portfolio_id.to_string());
        return Err(AnalyticsError::DataGap {
            ticker,
            range: panel.range(),
            reason: "no date on which every held ticker has a close".to_string(),
        });
    };

    let total_return = last.value / first.value - 1.0;
    let years = (last.date - first.date).num_days() as f64 / DAYS_PER_YEAR;
    let annualized_return = if years > 0.0 {
        (1.0 + total_return).powf(1.0 / years) - 1.0
    } else {
        total_return
    };

    let returns: Array1<f64> = values
        .windows(2)
        .map(|w| w[1].value / w[0].value - 1.0)
        .collect();
    let annualized_volatility = annualized_std(returns, policy.trading_days_per_year);

    let sharpe_ratio = if annualized_volatility > 0.0 {
        (annualized_return - policy.risk_free_rate) / annualized_volatility
    } else {
        0.0
    };
    let (max_drawdown, max_drawdown_date) = max_drawdown(&values);
    let dates: Vec<NaiveDate> = values.iter().map(|v| v.date).collect();
    let drawdowns = drawdown_series(&values);
    let severe_drawdowns = drawdowns.iter().filter(|d| d.drawdown < -policy.severe_drawdown).count();

    Ok(PerformanceReport {
        portfolio_id: portfolio_id.to_string(),
        investment_amount: amount,
        initial_value: first.value,
        final_value: last.value,
        total_return,
        annualized_return,
        annualized_volatility,
        max_drawdown,
        max_drawdown_date,
        sharpe_ratio,
        risk_level: RiskLevel::from_volatility(annualized_volatility),
        yearly_returns: yearly_returns(&values),
        etfs: etf_performance(panel, fractions, &dates, policy),
        drawdown_periods: drawdown_periods(&drawdowns, policy),
        severe_drawdowns,
        drawdowns,
        gaps: panel.gaps(),
        values,
    })
}
