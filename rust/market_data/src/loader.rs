// src/loader.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{MarketDataError, Result};
use crate::models::{DateRange, PricePoint};
use crate::source::{normalize_series, MarketDataSource};

// Reads `<dir>/<ticker lowercase>.csv`
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvDirectorySource { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker.to_lowercase()))
    }
}

#[async_trait]
impl MarketDataSource for CsvDirectorySource {
    async fn fetch_history(&self, ticker: &str, range: DateRange) -> Result<Vec<PricePoint>> {
        let path = self.path_for(ticker);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(MarketDataError::NotFound { ticker: ticker.to_string() });
            }
            Err(err) => return Err(err.into()),
        };

        let points = parse_price_csv(bytes.as_slice())?;
        debug!(ticker, path = %path.display(), rows = points.len(), "loaded price csv");
        Ok(points.into_iter().filter(|p| range.contains(p.date)).collect())
    }
}

// Column positions of one CSV layout
#[derive(Debug, Clone, Copy, PartialEq)]
struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

// Three header rows (Price / Ticker / Date) then Date,Close,High,Low,Open,Volume
const STACKED_HEADER_COLUMNS: Columns = Columns {
    date: 0,
    close: 1,
    high: 2,
    low: 3,
    open: 4,
    volume: Some(5),
};

fn detect_columns(records: &[StringRecord]) -> Result<Columns> {
    let stacked = records
        .get(1)
        .and_then(|row| row.get(0))
        .is_some_and(|cell| cell.eq_ignore_ascii_case("ticker"));
    if stacked {
        return Ok(STACKED_HEADER_COLUMNS);
    }

    let header = records
        .first()
        .ok_or_else(|| MarketDataError::Parse("empty price file".to_string()))?;
    let find = |name: &str| header.iter().position(|cell| cell.eq_ignore_ascii_case(name));
    let require = |name: &str| {
        find(name).ok_or_else(|| MarketDataError::Parse(format!("missing column {name}")))
    };

    let close = match find("close") {
        Some(index) => index,
        None => require("adj close")?,
    };

    Ok(Columns {
        date: require("date")?,
        open: require("open")?,
        high: require("high")?,
        low: require("low")?,
        close,
        volume: find("volume"),
    })
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    // %y before %Y: "22/3/24" would otherwise parse as year 24
    const FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%y", "%d/%m/%Y"];
    let raw = raw.trim();
    let candidate = match raw.get(..10) {
        Some(prefix) if raw.len() > 10 && prefix.as_bytes().get(4) == Some(&b'-') => prefix,
        _ => raw,
    };
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a daily price CSV in either supported layout.
///
/// Rows whose date or close cannot be parsed are skipped, including the
/// header rows themselves. The result is ascending with unique dates.
pub fn parse_price_csv<R: Read>(reader: R) -> Result<Vec<PricePoint>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let records = rdr
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| MarketDataError::Parse(err.to_string()))?;

    let columns = detect_columns(&records)?;
    let mut points = Vec::with_capacity(records.len());

    for record in &records {
        let field = |index: usize| record.get(index).and_then(parse_number);
        let (Some(date), Some(close)) = (record.get(columns.date).and_then(parse_date), field(columns.close)) else {
            continue;
        };

        points.push(PricePoint {
            date,
            open: field(columns.open).unwrap_or(close),
            high: field(columns.high).unwrap_or(close),
            low: field(columns.low).unwrap_or(close),
            close,
            volume: columns
                .volume
                .and_then(field)
                .map(|v| v.max(0.0).round() as u64)
                .unwrap_or(0),
        });
    }

    Ok(normalize_series(points))
}
