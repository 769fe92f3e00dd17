// src/models.rs

use chrono::NaiveDate;
use portfolio_analytics::correlation::CorrelationMatrix;
use portfolio_analytics::holdings::{CompanyWeightage, IndustryWeightage};
use portfolio_analytics::inflation::{BankVsSpyPoint, InflationStats, RealVsNominalPoint, SampledSeries};
use portfolio_analytics::performance::PerformanceReport;
use portfolio_analytics::performers::PerformerRanking;
use portfolio_analytics::series::{CandlestickSeries, PortfolioCandlesticks, VolumeSeries};
use portfolio_analytics::weightage::WeightageBreakdown;
use portfolio_analytics::{RiskTolerance, TimeHorizon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use validator::Validate;

// Portfolio-scoped operations
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRequest {
    #[validate(length(min = 1, message = "portfolioId must not be empty"))]
    pub portfolio_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformersRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<usize>,
}

// Either one ticker or a whole portfolio
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CandlestickRequest {
    #[validate(length(min = 1, message = "ticker must not be empty"))]
    pub ticker: Option<String>,
    #[validate(length(min = 1, message = "portfolioId must not be empty"))]
    pub portfolio_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRequest {
    #[validate(length(min = 1, message = "portfolioId must not be empty"))]
    pub portfolio_id: String,
    #[validate(range(exclusive_min = 0.0, message = "investmentAmount must be positive"))]
    pub investment_amount: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    // Ticker -> percent of the investment; omitted means an even split
    #[serde(default)]
    pub allocations: Option<HashMap<String, f64>>,
}

// Kept raw so missing or out-of-domain values surface as InvalidProfile
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchRequest {
    pub risk_tolerance: Option<String>,
    pub time_horizon: Option<String>,
    pub investment_amount: Option<Value>,
}

impl MatchRequest {
    /// Numbers and numeric strings are accepted; anything else reads as absent.
    pub fn amount(&self) -> Option<f64> {
        match self.investment_amount.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Body of `POST /api/analytics`: the operation name plus its parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "operation")]
pub enum AnalyticsRequest {
    #[serde(rename = "correlation")]
    Correlation(PortfolioRequest),
    #[serde(rename = "weightage")]
    Weightage(PortfolioRequest),
    #[serde(rename = "company-weightage")]
    CompanyWeightage(PortfolioRequest),
    #[serde(rename = "industry-weightage")]
    IndustryWeightage(PortfolioRequest),
    #[serde(rename = "performers-high-LT")]
    PerformersHighLongTerm(PerformersRequest),
    #[serde(rename = "performers-high-ST")]
    PerformersHighShortTerm(PerformersRequest),
    #[serde(rename = "performers-low-LT")]
    PerformersLowLongTerm(PerformersRequest),
    #[serde(rename = "performers-low-ST")]
    PerformersLowShortTerm(PerformersRequest),
    #[serde(rename = "volume")]
    Volume(PortfolioRequest),
    #[serde(rename = "candlestick")]
    Candlestick(CandlestickRequest),
    #[serde(rename = "performance")]
    Performance(PerformanceRequest),
    #[serde(rename = "match")]
    Match(MatchRequest),
    #[serde(rename = "real-vs-nominal")]
    RealVsNominal,
    #[serde(rename = "bank-vs-spy")]
    BankVsSpy,
    #[serde(rename = "inflation-stats")]
    InflationStats,
}

impl AnalyticsRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            AnalyticsRequest::Correlation(_) => "correlation",
            AnalyticsRequest::Weightage(_) => "weightage",
            AnalyticsRequest::CompanyWeightage(_) => "company-weightage",
            AnalyticsRequest::IndustryWeightage(_) => "industry-weightage",
            AnalyticsRequest::PerformersHighLongTerm(_) => "performers-high-LT",
            AnalyticsRequest::PerformersHighShortTerm(_) => "performers-high-ST",
            AnalyticsRequest::PerformersLowLongTerm(_) => "performers-low-LT",
            AnalyticsRequest::PerformersLowShortTerm(_) => "performers-low-ST",
            AnalyticsRequest::Volume(_) => "volume",
            AnalyticsRequest::Candlestick(_) => "candlestick",
            AnalyticsRequest::Performance(_) => "performance",
            AnalyticsRequest::Match(_) => "match",
            AnalyticsRequest::RealVsNominal => "real-vs-nominal",
            AnalyticsRequest::BankVsSpy => "bank-vs-spy",
            AnalyticsRequest::InflationStats => "inflation-stats",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub portfolio_id: String,
    pub portfolio_name: String,
    pub risk_tolerance: RiskTolerance,
    pub time_horizon: TimeHorizon,
    pub investment_amount: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalyticsResponse {
    Correlation(CorrelationMatrix),
    Weightage(WeightageBreakdown),
    CompanyWeightage(CompanyWeightage),
    IndustryWeightage(IndustryWeightage),
    Performers(PerformerRanking),
    Volume(VolumeSeries),
    Candlestick(CandlestickSeries),
    PortfolioCandlesticks(PortfolioCandlesticks),
    Performance(PerformanceReport),
    Match(MatchResponse),
    RealVsNominal(SampledSeries<RealVsNominalPoint>),
    BankVsSpy(SampledSeries<BankVsSpyPoint>),
    InflationStats(InflationStats),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_body_parses_operation_tag() {
        let body = r#"{"operation": "performers-high-LT", "limit": 5}"#;
        let request: AnalyticsRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.operation(), "performers-high-LT");
        match request {
            AnalyticsRequest::PerformersHighLongTerm(params) => assert_eq!(params.limit, Some(5)),
            other => panic!("unexpected request: {other:?}"),
        }

        let body = r#"{"operation": "correlation", "portfolioId": "high-risk-long-term", "startDate": "2023-01-01"}"#;
        let request: AnalyticsRequest = serde_json::from_str(body).unwrap();
        match request {
            AnalyticsRequest::Correlation(params) => {
                assert_eq!(params.portfolio_id, "high-risk-long-term");
                assert_eq!(params.start_date, NaiveDate::from_ymd_opt(2023, 1, 1));
                assert_eq!(params.end_date, None);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_dataset_operations_need_no_parameters() {
        let request: AnalyticsRequest = serde_json::from_str(r#"{"operation": "bank-vs-spy"}"#).unwrap();
        assert_eq!(request.operation(), "bank-vs-spy");

        let body = r#"{"operation": "performance", "portfolioId": "p", "investmentAmount": 100,
                       "allocations": {"SPY": 70, "VUG": 30}}"#;
        match serde_json::from_str::<AnalyticsRequest>(body).unwrap() {
            AnalyticsRequest::Performance(params) => {
                let allocations = params.allocations.unwrap();
                assert_eq!(allocations.get("SPY"), Some(&70.0));
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        let body = r#"{"operation": "forecast", "portfolioId": "x"}"#;
        assert!(serde_json::from_str::<AnalyticsRequest>(body).is_err());
    }

    #[test]
    fn test_performers_body_fields_are_optional() {
        let request: PerformersRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.limit, None);
        assert!(serde_json::from_str::<PerformersRequest>(r#"{"limit": -3}"#).is_err());
    }

    #[test]
    fn test_match_amount_accepts_numbers_and_numeric_strings() {
        let request: MatchRequest =
            serde_json::from_str(r#"{"riskTolerance": "low", "timeHorizon": "short-term", "investmentAmount": 250}"#)
                .unwrap();
        assert_eq!(request.amount(), Some(250.0));

        let request: MatchRequest = serde_json::from_str(r#"{"investmentAmount": " 1200.5 "}"#).unwrap();
        assert_eq!(request.amount(), Some(1200.5));

        let request: MatchRequest = serde_json::from_str(r#"{"investmentAmount": "lots"}"#).unwrap();
        assert_eq!(request.amount(), None);
        assert_eq!(MatchRequest::default().amount(), None);
    }

    #[test]
    fn test_validation_rules() {
        let empty = PortfolioRequest { portfolio_id: String::new(), start_date: None, end_date: None };
        assert!(empty.validate().is_err());

        let too_many = PerformersRequest { limit: Some(500), ..Default::default() };
        assert!(too_many.validate().is_err());
        assert!(PerformersRequest::default().validate().is_ok());

        let broke = PerformanceRequest {
            portfolio_id: "low-risk-long-term".into(),
            investment_amount: 0.0,
            start_date: None,
            end_date: None,
            allocations: None,
        };
        assert!(broke.validate().is_err());
    }
}
