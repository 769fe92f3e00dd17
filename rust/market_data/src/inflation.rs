// src/inflation.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{MarketDataError, Result};
use crate::loader::{parse_date, parse_number};

pub const SPY_INFLATION_FILE: &str = "spy_inflation.csv";
pub const BANK_VALUES_FILE: &str = "bank_values.csv";

/// Growth of a 10k SPY investment in nominal and inflation-adjusted terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InflationPoint {
    pub date: NaiveDate,
    pub nominal: f64,
    pub real: f64,
}

// Inflation-adjusted value of cash left in a savings account
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BankValuePoint {
    pub date: NaiveDate,
    pub real_value: f64,
}

#[async_trait]
pub trait InflationSource: Send + Sync {
    async fn spy_inflation(&self) -> Result<Vec<InflationPoint>>;

    async fn bank_values(&self) -> Result<Vec<BankValuePoint>>;
}

// Reads `spy_inflation.csv` and `bank_values.csv` from one directory
#[derive(Debug, Clone)]
pub struct CsvInflationSource {
    dir: PathBuf,
}

impl CsvInflationSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvInflationSource { dir: dir.into() }
    }

    async fn read(&self, file: &str) -> Result<Vec<u8>> {
        let path = self.dir.join(file);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "loaded dataset");
                Ok(bytes)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(MarketDataError::MissingDataset {
                path: path.display().to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl InflationSource for CsvInflationSource {
    async fn spy_inflation(&self) -> Result<Vec<InflationPoint>> {
        let bytes = self.read(SPY_INFLATION_FILE).await?;
        parse_inflation_csv(bytes.as_slice(), SPY_INFLATION_FILE)
    }

    async fn bank_values(&self) -> Result<Vec<BankValuePoint>> {
        let bytes = self.read(BANK_VALUES_FILE).await?;
        parse_bank_csv(bytes.as_slice(), BANK_VALUES_FILE)
    }
}

/// Fixed datasets; an unset one behaves like a missing file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInflationSource {
    spy: Option<Vec<InflationPoint>>,
    bank: Option<Vec<BankValuePoint>>,
}

impl InMemoryInflationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spy_inflation(mut self, points: Vec<InflationPoint>) -> Self {
        self.spy = Some(points);
        self
    }

    pub fn with_bank_values(mut self, points: Vec<BankValuePoint>) -> Self {
        self.bank = Some(points);
        self
    }
}

#[async_trait]
impl InflationSource for InMemoryInflationSource {
    async fn spy_inflation(&self) -> Result<Vec<InflationPoint>> {
        self.spy.clone().ok_or_else(|| MarketDataError::MissingDataset {
            path: SPY_INFLATION_FILE.to_string(),
        })
    }

    async fn bank_values(&self) -> Result<Vec<BankValuePoint>> {
        self.bank.clone().ok_or_else(|| MarketDataError::MissingDataset {
            path: BANK_VALUES_FILE.to_string(),
        })
    }
}

// Header row plus data rows; columns are located by name
fn read_table<R: Read>(reader: R) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut rdr = ReaderBuilder::new().flexible(true).trim(Trim::All).from_reader(reader);
    let header = rdr.headers().map_err(|err| MarketDataError::Parse(err.to_string()))?.clone();
    let rows = rdr
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| MarketDataError::Parse(err.to_string()))?;
    Ok((header, rows))
}

fn column(header: &StringRecord, name: &str, path: &str) -> Result<usize> {
    header
        .iter()
        .position(|cell| cell.eq_ignore_ascii_case(name))
        .ok_or_else(|| MarketDataError::MissingColumn {
            path: path.to_string(),
            column: name.to_string(),
        })
}

/// Parses `date,nominal_inv_10k,real_inv_10k`. Unparseable rows are
/// skipped; the result is ascending with unique dates.
pub fn parse_inflation_csv<R: Read>(reader: R, path: &str) -> Result<Vec<InflationPoint>> {
    let (header, rows) = read_table(reader)?;
    let (date, nominal, real) = (
        column(&header, "date", path)?,
        column(&header, "nominal_inv_10k", path)?,
        column(&header, "real_inv_10k", path)?,
    );

    let mut points: Vec<InflationPoint> = rows
        .iter()
        .filter_map(|row| {
            Some(InflationPoint {
                date: row.get(date).and_then(parse_date)?,
                nominal: row.get(nominal).and_then(parse_number)?,
                real: row.get(real).and_then(parse_number)?,
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    Ok(points)
}

/// Parses `date,real_value`, same row rules as `parse_inflation_csv`.
pub fn parse_bank_csv<R: Read>(reader: R, path: &str) -> Result<Vec<BankValuePoint>> {
    let (header, rows) = read_table(reader)?;
    let (date, real_value) = (column(&header, "date", path)?, column(&header, "real_value", path)?);

    let mut points: Vec<BankValuePoint> = rows
        .iter()
        .filter_map(|row| {
            Some(BankValuePoint {
                date: row.get(date).and_then(parse_date)?,
                real_value: row.get(real_value).and_then(parse_number)?,
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    Ok(points)
}
