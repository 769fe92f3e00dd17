// src/correlation.rs

use ndarray::Array1;
use serde::Serialize;

use crate::panel::{DataGap, PricePanel};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPair {
    pub a: String,
    pub b: String,
    // None when fewer than 2 overlapping returns or a flat series
    pub correlation: Option<f64>,
    pub observations: usize,
    pub data_gap: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    pub tickers: Vec<String>,
    pub pairs: Vec<CorrelationPair>,
    pub matrix: Vec<Vec<Option<f64>>>,
    pub gaps: Vec<DataGap>,
}

/// Simple returns between consecutive calendar slots.
///
/// Slot `i` of the output is the return from slot `i` to `i + 1` of the
/// input, `None` unless both closes exist and the earlier one is non-zero.
pub fn daily_returns(closes: &[Option<f64>]) -> Vec<Option<f64>> {
    closes
        .windows(2)
        .map(|w| match (w[0], w[1]) {
            (Some(prev), Some(next)) if prev != 0.0 => Some((next - prev) / prev),
            _ => None,
        })
        .collect()
}

pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let x = Array1::from_vec(x.to_vec());
    let y = Array1::from_vec(y.to_vec());
    let dx = &x - x.mean()?;
    let dy = &y - y.mean()?;

    let denom = (dx.dot(&dx) * dy.dot(&dy)).sqrt();
    if !denom.is_finite() || denom == 0.0 {
        return None;
    }
    Some((dx.dot(&dy) / denom).clamp(-1.0, 1.0))
}

// Returns observed on the same calendar step for both tickers
fn paired_returns(a: &[Option<f64>], b: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip()
}

pub fn correlation_matrix(panel: &PricePanel) -> CorrelationMatrix {
    let tickers = panel.symbols().to_vec();
    let returns: Vec<Vec<Option<f64>>> = tickers
        .iter()
        .map(|t| daily_returns(&panel.aligned_closes(t)))
        .collect();

    let n = tickers.len();
    let mut matrix = vec![vec![None; n]; n];
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);

    for i in 0..n {
        matrix[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let (x, y) = paired_returns(&returns[i], &returns[j]);
            let correlation = pearson(&x, &y);
            matrix[i][j] = correlation;
            matrix[j][i] = correlation;
            pairs.push(CorrelationPair {
                a: tickers[i].clone(),
                b: tickers[j].clone(),
                correlation,
                observations: x.len(),
                data_gap: panel.has_gap(&tickers[i]) || panel.has_gap(&tickers[j]),
            });
        }
    }

    CorrelationMatrix {
        gaps: panel.gaps(),
        tickers,
        pairs,
        matrix,
    }
}
