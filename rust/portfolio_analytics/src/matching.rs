// src/matching.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::{PortfolioCatalog, PortfolioId};
use crate::error::{AnalyticsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    High,
}

impl RiskTolerance {
    pub const ALL: [RiskTolerance; 2] = [RiskTolerance::Low, RiskTolerance::High];
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTolerance::Low => write!(f, "low"),
            RiskTolerance::High => write!(f, "high"),
        }
    }
}

impl FromStr for RiskTolerance {
    type Err = AnalyticsError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskTolerance::Low),
            "high" => Ok(RiskTolerance::High),
            _ => Err(AnalyticsError::InvalidProfile(format!(
                "riskTolerance must be low or high, got {raw:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeHorizon {
    ShortTerm,
    LongTerm,
}

impl TimeHorizon {
    pub const ALL: [TimeHorizon; 2] = [TimeHorizon::ShortTerm, TimeHorizon::LongTerm];

    // Short code used in performer operation names
    pub fn code(&self) -> &'static str {
        match self {
            TimeHorizon::ShortTerm => "ST",
            TimeHorizon::LongTerm => "LT",
        }
    }
}

impl fmt::Display for TimeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeHorizon::ShortTerm => write!(f, "short-term"),
            TimeHorizon::LongTerm => write!(f, "long-term"),
        }
    }
}

impl FromStr for TimeHorizon {
    type Err = AnalyticsError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "short-term" | "short" | "st" => Ok(TimeHorizon::ShortTerm),
            "long-term" | "long" | "lt" => Ok(TimeHorizon::LongTerm),
            _ => Err(AnalyticsError::InvalidProfile(format!(
                "timeHorizon must be short-term or long-term, got {raw:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorProfile {
    pub risk_tolerance: RiskTolerance,
    pub investment_amount: f64,
    pub time_horizon: TimeHorizon,
}

impl InvestorProfile {
    pub fn new(risk_tolerance: RiskTolerance, investment_amount: f64, time_horizon: TimeHorizon) -> Result<Self> {
        if !investment_amount.is_finite() || investment_amount <= 0.0 {
            return Err(AnalyticsError::InvalidProfile(format!(
                "investmentAmount must be a positive number, got {investment_amount}"
            )));
        }
        Ok(InvestorProfile {
            risk_tolerance,
            investment_amount,
            time_horizon,
        })
    }

    /// Builds a profile from raw request fields; a missing amount is an invalid profile.
    pub fn parse(risk_tolerance: &str, investment_amount: Option<f64>, time_horizon: &str) -> Result<Self> {
        let investment_amount = investment_amount
            .ok_or_else(|| AnalyticsError::InvalidProfile("investmentAmount must be a number".to_string()))?;
        InvestorProfile::new(risk_tolerance.parse()?, investment_amount, time_horizon.parse()?)
    }
}

/// Maps an investor profile onto one catalog portfolio.
///
/// Selection only looks at risk tolerance and horizon; the amount is
/// validated but never changes the bucket.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    catalog: Arc<PortfolioCatalog>,
}

impl MatchingEngine {
    pub fn new(catalog: Arc<PortfolioCatalog>) -> Self {
        MatchingEngine { catalog }
    }

    pub fn match_profile(&self, profile: &InvestorProfile) -> Result<PortfolioId> {
        let portfolio = self
            .catalog
            .list_portfolios()
            .iter()
            .find(|p| p.risk_tolerance == profile.risk_tolerance && p.time_horizon == profile.time_horizon)
            .ok_or_else(|| {
                AnalyticsError::Catalog(format!(
                    "no portfolio for {} risk, {}",
                    profile.risk_tolerance, profile.time_horizon
                ))
            })?;

        debug!(
            risk = %profile.risk_tolerance,
            horizon = %profile.time_horizon,
            portfolio = %portfolio.id,
            "matched investor profile"
        );
        Ok(portfolio.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DEFAULT_CATALOG;

    fn engine() -> MatchingEngine {
        MatchingEngine::new(Arc::new(DEFAULT_CATALOG.clone()))
    }

    #[test]
    fn test_decision_table() {
        let engine = engine();
        let cases = [
            ("low", "short-term", "low-risk-short-term"),
            ("low", "long-term", "low-risk-long-term"),
            ("high", "short-term", "high-risk-short-term"),
            ("high", "long-term", "high-risk-long-term"),
        ];
        for (risk, horizon, expected) in cases {
            let profile = InvestorProfile::parse(risk, Some(1000.0), horizon).unwrap();
            assert_eq!(engine.match_profile(&profile).unwrap(), expected);
        }
    }

    #[test]
    fn test_amount_does_not_change_bucket() {
        let engine = engine();
        for amount in [100.0, 1000.0, 1_000_000.0] {
            let profile = InvestorProfile::new(RiskTolerance::Low, amount, TimeHorizon::ShortTerm).unwrap();
            assert_eq!(engine.match_profile(&profile).unwrap(), "low-risk-short-term");
        }
    }

    #[test]
    fn test_medium_risk_is_invalid_profile() {
        let err = InvestorProfile::parse("medium", Some(1000.0), "short-term").unwrap_err();
        assert_eq!(err.kind(), "InvalidProfile");
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_amount_must_be_positive_finite() {
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = InvestorProfile::new(RiskTolerance::High, amount, TimeHorizon::LongTerm).unwrap_err();
            assert!(matches!(err, AnalyticsError::InvalidProfile(_)));
        }
        let err = InvestorProfile::parse("high", None, "long-term").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidProfile(_)));
    }

    #[test]
    fn test_horizon_aliases() {
        assert_eq!("LT".parse::<TimeHorizon>().unwrap(), TimeHorizon::LongTerm);
        assert_eq!(" Short ".parse::<TimeHorizon>().unwrap(), TimeHorizon::ShortTerm);
        assert_eq!(TimeHorizon::ShortTerm.code(), "ST");
        assert!("forever".parse::<TimeHorizon>().is_err());
        assert_eq!("HIGH".parse::<RiskTolerance>().unwrap(), RiskTolerance::High);
    }
}
