// src/inflation.rs

use chrono::NaiveDate;
use market_data::{BankValuePoint, InflationPoint};
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{AnalyticsError, Result};

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealVsNominalPoint {
    pub date: NaiveDate,
    pub nominal_inv_10k: f64,
    pub real_inv_10k: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankVsSpyPoint {
    pub date: NaiveDate,
    pub bank_value: f64,
    pub spy_value: f64,
}

/// Every `sample_every`-th row of a dataset, starting with the first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledSeries<T> {
    pub points: Vec<T>,
    pub sample_every: usize,
    pub source_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnRange {
    pub min: f64,
    pub max: f64,
}

// Published reference figures shown next to the computed ones, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRates {
    pub singapore_inflation: f64,
    pub global_inflation: f64,
    pub bank_interest: f64,
    pub spy_return_range: ReturnRange,
}

impl Default for ReferenceRates {
    fn default() -> Self {
        ReferenceRates {
            singapore_inflation: 1.8,
            global_inflation: 4.5,
            bank_interest: 0.5,
            spy_return_range: ReturnRange { min: 7.0, max: 10.0 },
        }
    }
}

/// Summary of the SPY inflation dataset. Returns are fractions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InflationStats {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub years: f64,
    pub nominal_total_return: f64,
    pub real_total_return: f64,
    pub nominal_annualized_return: f64,
    pub real_annualized_return: f64,
    // Inflation that turns the nominal rate into the real one
    pub implied_inflation: f64,
    pub bank_real_annualized_return: Option<f64>,
    pub reference: ReferenceRates,
}

fn sample<T: Copy>(rows: &[T], every: usize) -> SampledSeries<T> {
    let every = every.max(1);
    SampledSeries {
        points: rows.iter().step_by(every).copied().collect(),
        sample_every: every,
        source_rows: rows.len(),
    }
}

fn years_between(start: NaiveDate, end: NaiveDate) -> f64 {
    (end - start).num_days() as f64 / DAYS_PER_YEAR
}

fn total_return(first: f64, last: f64) -> f64 {
    if first > 0.0 {
        last / first - 1.0
    } else {
        0.0
    }
}

fn annualized(total: f64, years: f64) -> f64 {
    if years > 0.0 && total > -1.0 {
        (1.0 + total).powf(1.0 / years) - 1.0
    } else {
        total
    }
}

pub fn real_vs_nominal(rows: &[InflationPoint], every: usize) -> SampledSeries<RealVsNominalPoint> {
    let points: Vec<RealVsNominalPoint> = rows
        .iter()
        .map(|row| RealVsNominalPoint {
            date: row.date,
            nominal_inv_10k: row.nominal,
            real_inv_10k: row.real,
        })
        .collect();
    sample(&points, every)
}

/// Inner join on date, in bank order, then sampled.
pub fn bank_vs_spy(bank: &[BankValuePoint], spy: &[InflationPoint], every: usize) -> SampledSeries<BankVsSpyPoint> {
    let spy_real: HashMap<NaiveDate, f64> = spy.iter().map(|p| (p.date, p.real)).collect();
    let joined: Vec<BankVsSpyPoint> = bank
        .iter()
        .filter_map(|b| {
            spy_real.get(&b.date).map(|spy_value| BankVsSpyPoint {
                date: b.date,
                bank_value: b.real_value,
                spy_value: *spy_value,
            })
        })
        .collect();
    sample(&joined, every)
}

pub fn inflation_stats(spy: &[InflationPoint], bank: Option<&[BankValuePoint]>) -> Result<InflationStats> {
    let (Some(first), Some(last)) = (spy.first(), spy.last()) else {
        return Err(AnalyticsError::InvalidDataset("SPY inflation dataset has no rows".to_string()));
    };

    let years = years_between(first.date, last.date);
    let nominal_total_return = total_return(first.nominal, last.nominal);
    let real_total_return = total_return(first.real, last.real);
    let nominal_annualized_return = annualized(nominal_total_return, years);
    let real_annualized_return = annualized(real_total_return, years);

    let bank_real_annualized_return = bank.and_then(|rows| {
        let (first, last) = (rows.first()?, rows.last()?);
        Some(annualized(
            total_return(first.real_value, last.real_value),
            years_between(first.date, last.date),
        ))
    });

    Ok(InflationStats {
        start_date: first.date,
        end_date: last.date,
        years,
        nominal_total_return,
        real_total_return,
        nominal_annualized_return,
        real_annualized_return,
        implied_inflation: (1.0 + nominal_annualized_return) / (1.0 + real_annualized_return) - 1.0,
        bank_real_annualized_return,
        reference: ReferenceRates::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::date;
    use approx::assert_abs_diff_eq;

    fn spy_rows() -> Vec<InflationPoint> {
        (0..10)
            .map(|i| InflationPoint {
                date: date("2020-01-06") + chrono::Duration::weeks(i),
                nominal: 10_000.0 + 100.0 * i as f64,
                real: 10_000.0 + 50.0 * i as f64,
            })
            .collect()
    }

    #[test]
    fn test_real_vs_nominal_keeps_every_fourth_row() {
        let sampled = real_vs_nominal(&spy_rows(), 4);
        assert_eq!(sampled.source_rows, 10);
        let dates: Vec<NaiveDate> = sampled.points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date("2020-01-06"), date("2020-02-03"), date("2020-03-02")]);
        assert_eq!(sampled.points[1].nominal_inv_10k, 10_400.0);
        assert_eq!(sampled.points[1].real_inv_10k, 10_200.0);
    }

    #[test]
    fn test_bank_vs_spy_joins_on_date() {
        let spy = spy_rows();
        let bank: Vec<BankValuePoint> = [("2020-01-06", 10_000.0), ("2020-01-08", 9_999.0), ("2020-01-13", 9_990.0)]
            .iter()
            .map(|(d, v)| BankValuePoint { date: date(d), real_value: *v })
            .collect();

        let joined = bank_vs_spy(&bank, &spy, 1);
        assert_eq!(joined.source_rows, 2);
        assert_eq!(
            joined.points[1],
            BankVsSpyPoint { date: date("2020-01-13"), bank_value: 9_990.0, spy_value: 10_050.0 }
        );
    }

    #[test]
    fn test_stats_from_rows() {
        let spy = vec![
            InflationPoint { date: date("2020-01-01"), nominal: 10_000.0, real: 10_000.0 },
            InflationPoint { date: date("2022-01-01"), nominal: 12_100.0, real: 11_025.0 },
        ];
        let bank = vec![
            BankValuePoint { date: date("2020-01-01"), real_value: 10_000.0 },
            BankValuePoint { date: date("2022-01-01"), real_value: 9_801.0 },
        ];

        let stats = inflation_stats(&spy, Some(&bank)).unwrap();
        assert_abs_diff_eq!(stats.years, 731.0 / 365.25, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.nominal_total_return, 0.21, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.nominal_annualized_return, 0.1, epsilon = 1e-3);
        assert_abs_diff_eq!(stats.real_annualized_return, 0.05, epsilon = 1e-3);
        assert_abs_diff_eq!(stats.implied_inflation, 1.1 / 1.05 - 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(stats.bank_real_annualized_return.unwrap(), -0.01, epsilon = 1e-3);
        assert_eq!(stats.reference.bank_interest, 0.5);

        assert!(inflation_stats(&spy, None).unwrap().bank_real_annualized_return.is_none());
        assert_eq!(inflation_stats(&[], None).unwrap_err().kind(), "InvalidDataset");
    }
}
