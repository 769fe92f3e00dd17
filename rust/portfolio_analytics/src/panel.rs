// src/panel.rs

use chrono::NaiveDate;
use market_data::{DateRange, PricePoint};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GapKind {
    // No points at all in the requested range
    NoData,
    // Absent on some trading-calendar dates
    MissingDays,
    // Too few points for the requested window
    InsufficientHistory,
}

/// Missing data for one ticker inside one computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataGap {
    pub ticker: String,
    pub kind: GapKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_dates: Vec<NaiveDate>,
}

impl DataGap {
    pub fn new(ticker: &str, kind: GapKind) -> Self {
        DataGap {
            ticker: ticker.to_string(),
            kind,
            missing_dates: Vec::new(),
        }
    }
}

/// Price series of every ticker taking part in one computation, plus the
/// trading calendar they are checked against.
///
/// The calendar is the sorted union of the tickers' own dates and any
/// reference dates. Without reference dates a day missing from every
/// ticker (or from the only ticker) cannot be seen.
#[derive(Debug, Clone)]
pub struct PricePanel {
    range: DateRange,
    symbols: Vec<String>,
    series: HashMap<String, Vec<PricePoint>>,
    calendar: Vec<NaiveDate>,
}

impl PricePanel {
    // Series must be ascending with unique dates, as sources return them
    pub fn new(range: DateRange, entries: Vec<(String, Vec<PricePoint>)>) -> Self {
        PricePanel::with_reference(range, entries, [])
    }

    /// Like `new`, with extra trading days from series outside the panel.
    /// Reference dates outside `range` are ignored.
    pub fn with_reference(
        range: DateRange,
        entries: Vec<(String, Vec<PricePoint>)>,
        reference_dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        let mut calendar: BTreeSet<NaiveDate> = entries
            .iter()
            .flat_map(|(_, points)| points.iter().map(|p| p.date))
            .collect();
        calendar.extend(reference_dates.into_iter().filter(|d| range.contains(*d)));

        let mut symbols = Vec::with_capacity(entries.len());
        let mut series = HashMap::with_capacity(entries.len());
        for (symbol, points) in entries {
            if series.contains_key(&symbol) {
                continue;
            }
            symbols.push(symbol.clone());
            series.insert(symbol, points);
        }

        PricePanel {
            range,
            symbols,
            series,
            calendar: calendar.into_iter().collect(),
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn calendar(&self) -> &[NaiveDate] {
        &self.calendar
    }

    pub fn series(&self, symbol: &str) -> &[PricePoint] {
        self.series.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn point_on(&self, symbol: &str, date: NaiveDate) -> Option<&PricePoint> {
        let points = self.series(symbol);
        points.binary_search_by_key(&date, |p| p.date).ok().map(|i| &points[i])
    }

    // One slot per calendar date, `None` where the ticker has no point
    pub fn aligned(&self, symbol: &str) -> Vec<Option<PricePoint>> {
        let points = self.series(symbol);
        let mut next = points.iter().peekable();
        self.calendar
            .iter()
            .map(|date| {
                if next.peek().is_some_and(|p| p.date == *date) {
                    next.next().copied()
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn aligned_closes(&self, symbol: &str) -> Vec<Option<f64>> {
        self.aligned(symbol).into_iter().map(|p| p.map(|p| p.close)).collect()
    }

    // Calendar dates on which every ticker has a point
    pub fn common_dates(&self) -> Vec<NaiveDate> {
        self.calendar
            .iter()
            .copied()
            .filter(|date| self.symbols.iter().all(|s| self.point_on(s, *date).is_some()))
            .collect()
    }

    pub fn gap(&self, symbol: &str) -> Option<DataGap> {
        let points = self.series(symbol);
        if points.is_empty() {
            return Some(DataGap::new(symbol, GapKind::NoData));
        }

        let missing_dates: Vec<NaiveDate> = self
            .calendar
            .iter()
            .copied()
            .zip(self.aligned(symbol))
            .filter_map(|(date, point)| point.is_none().then_some(date))
            .collect();

        if missing_dates.is_empty() {
            None
        } else {
            Some(DataGap {
                ticker: symbol.to_string(),
                kind: GapKind::MissingDays,
                missing_dates,
            })
        }
    }

    pub fn has_gap(&self, symbol: &str) -> bool {
        let points = self.series(symbol);
        points.is_empty() || points.len() < self.calendar.len()
    }

    pub fn gaps(&self) -> Vec<DataGap> {
        self.symbols.iter().filter_map(|s| self.gap(s)).collect()
    }
}
