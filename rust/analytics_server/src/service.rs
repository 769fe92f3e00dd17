// src/service.rs

use market_data::{InflationSource, MarketDataSource};
use portfolio_analytics::correlation::CorrelationMatrix;
use portfolio_analytics::holdings::{CompanyWeightage, IndustryWeightage};
use portfolio_analytics::inflation::{BankVsSpyPoint, InflationStats, RealVsNominalPoint, SampledSeries};
use portfolio_analytics::performance::PerformanceReport;
use portfolio_analytics::performers::PerformerRanking;
use portfolio_analytics::series::VolumeSeries;
use portfolio_analytics::weightage::WeightageBreakdown;
use portfolio_analytics::{
    AnalyticsEngine, AnalyticsError, AnalyticsPolicy, Direction, InvestorProfile, MatchingEngine, Portfolio,
    PortfolioCatalog, TimeHorizon,
};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::error::ServiceError;
use crate::models::{
    AnalyticsRequest, AnalyticsResponse, CandlestickRequest, MatchRequest, MatchResponse, PerformanceRequest,
    PerformersRequest, PortfolioRequest,
};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Request-level entry point shared by every handler.
#[derive(Clone)]
pub struct AnalyticsService {
    engine: AnalyticsEngine,
    matcher: MatchingEngine,
}

impl AnalyticsService {
    pub fn new(source: Arc<dyn MarketDataSource>, catalog: Arc<PortfolioCatalog>, policy: AnalyticsPolicy) -> Self {
        AnalyticsService {
            matcher: MatchingEngine::new(catalog.clone()),
            engine: AnalyticsEngine::new(source, catalog, policy),
        }
    }

    pub fn with_inflation_source(mut self, inflation: Arc<dyn InflationSource>) -> Self {
        self.engine = self.engine.with_inflation_source(inflation);
        self
    }

    pub fn portfolios(&self) -> &[Portfolio] {
        self.engine.catalog().list_portfolios()
    }

    pub fn portfolio(&self, id: &str) -> ServiceResult<&Portfolio> {
        Ok(self.engine.catalog().get_portfolio(id)?)
    }

    pub async fn correlation(&self, request: PortfolioRequest) -> ServiceResult<CorrelationMatrix> {
        request.validate()?;
        let range = self.engine.resolve_range(request.start_date, request.end_date)?;
        info!(portfolio = %request.portfolio_id, %range, "correlation");
        Ok(self.engine.correlation(&request.portfolio_id, range).await?)
    }

    pub async fn weightage(&self, request: PortfolioRequest) -> ServiceResult<WeightageBreakdown> {
        request.validate()?;
        let range = self.engine.resolve_range(request.start_date, request.end_date)?;
        info!(portfolio = %request.portfolio_id, %range, "weightage");
        Ok(self.engine.weightage(&request.portfolio_id, range).await?)
    }

    pub async fn company_weightage(&self, request: PortfolioRequest) -> ServiceResult<CompanyWeightage> {
        request.validate()?;
        let range = self.engine.resolve_range(request.start_date, request.end_date)?;
        info!(portfolio = %request.portfolio_id, %range, "company weightage");
        Ok(self.engine.company_weightage(&request.portfolio_id, range).await?)
    }

    pub async fn industry_weightage(&self, request: PortfolioRequest) -> ServiceResult<IndustryWeightage> {
        request.validate()?;
        let range = self.engine.resolve_range(request.start_date, request.end_date)?;
        info!(portfolio = %request.portfolio_id, %range, "industry weightage");
        Ok(self.engine.industry_weightage(&request.portfolio_id, range).await?)
    }

    pub async fn performers(
        &self,
        direction: Direction,
        horizon: TimeHorizon,
        request: PerformersRequest,
    ) -> ServiceResult<PerformerRanking> {
        request.validate()?;
        let range = self.engine.resolve_range(request.start_date, request.end_date)?;
        info!(%direction, horizon = horizon.code(), %range, "performers");
        Ok(self.engine.performers(direction, horizon, range, request.limit).await?)
    }

    pub async fn volume(&self, request: PortfolioRequest) -> ServiceResult<VolumeSeries> {
        request.validate()?;
        let range = self.engine.resolve_range(request.start_date, request.end_date)?;
        info!(portfolio = %request.portfolio_id, %range, "volume");
        Ok(self.engine.volume(&request.portfolio_id, range).await?)
    }

    pub async fn candlestick(&self, request: CandlestickRequest) -> ServiceResult<AnalyticsResponse> {
        request.validate()?;
        let range = self.engine.resolve_range(request.start_date, request.end_date)?;
        match (request.ticker, request.portfolio_id) {
            (Some(ticker), None) => {
                info!(%ticker, %range, "candlestick");
                Ok(AnalyticsResponse::Candlestick(self.engine.candlestick(&ticker, range).await?))
            }
            (None, Some(portfolio_id)) => {
                info!(portfolio = %portfolio_id, %range, "candlestick");
                let series = self.engine.portfolio_candlesticks(&portfolio_id, range).await?;
                Ok(AnalyticsResponse::PortfolioCandlesticks(series))
            }
            _ => Err(ServiceError::BadRequest(
                "exactly one of ticker or portfolioId is required".to_string(),
            )),
        }
    }

    pub async fn performance(&self, request: PerformanceRequest) -> ServiceResult<PerformanceReport> {
        request.validate()?;
        let range = self.engine.resolve_range(request.start_date, request.end_date)?;
        info!(
            portfolio = %request.portfolio_id,
            %range,
            amount = request.investment_amount,
            custom_allocations = request.allocations.is_some(),
            "performance"
        );
        Ok(self
            .engine
            .performance(
                &request.portfolio_id,
                range,
                request.investment_amount,
                request.allocations.as_ref(),
            )
            .await?)
    }

    pub async fn real_vs_nominal(&self) -> ServiceResult<SampledSeries<RealVsNominalPoint>> {
        info!("real vs nominal");
        Ok(self.engine.real_vs_nominal().await?)
    }

    pub async fn bank_vs_spy(&self) -> ServiceResult<SampledSeries<BankVsSpyPoint>> {
        info!("bank vs spy");
        Ok(self.engine.bank_vs_spy().await?)
    }

    pub async fn inflation_stats(&self) -> ServiceResult<InflationStats> {
        info!("inflation stats");
        Ok(self.engine.inflation_stats().await?)
    }

    pub fn match_profile(&self, request: MatchRequest) -> ServiceResult<MatchResponse> {
        let profile = InvestorProfile::parse(
            request.risk_tolerance.as_deref().unwrap_or_default(),
            request.amount(),
            request.time_horizon.as_deref().unwrap_or_default(),
        )?;
        let portfolio_id = self.matcher.match_profile(&profile)?;
        let portfolio = self.engine.catalog().get_portfolio(&portfolio_id)?;
        info!(risk = %profile.risk_tolerance, horizon = %profile.time_horizon, portfolio = %portfolio_id, "matched profile");

        Ok(MatchResponse {
            portfolio_id,
            portfolio_name: portfolio.name.clone(),
            risk_tolerance: profile.risk_tolerance,
            time_horizon: profile.time_horizon,
            investment_amount: profile.investment_amount,
        })
    }

    pub async fn execute(&self, request: AnalyticsRequest) -> ServiceResult<AnalyticsResponse> {
        use AnalyticsRequest as R;
        use AnalyticsResponse as Out;

        info!(operation = request.operation(), "dispatching");
        let response = match request {
            R::Correlation(req) => Out::Correlation(self.correlation(req).await?),
            R::Weightage(req) => Out::Weightage(self.weightage(req).await?),
            R::CompanyWeightage(req) => Out::CompanyWeightage(self.company_weightage(req).await?),
            R::IndustryWeightage(req) => Out::IndustryWeightage(self.industry_weightage(req).await?),
            R::PerformersHighLongTerm(req) => {
                Out::Performers(self.performers(Direction::High, TimeHorizon::LongTerm, req).await?)
            }
            R::PerformersHighShortTerm(req) => {
                Out::Performers(self.performers(Direction::High, TimeHorizon::ShortTerm, req).await?)
            }
            R::PerformersLowLongTerm(req) => {
                Out::Performers(self.performers(Direction::Low, TimeHorizon::LongTerm, req).await?)
            }
            R::PerformersLowShortTerm(req) => {
                Out::Performers(self.performers(Direction::Low, TimeHorizon::ShortTerm, req).await?)
            }
            R::Volume(req) => Out::Volume(self.volume(req).await?),
            R::Candlestick(req) => self.candlestick(req).await?,
            R::Performance(req) => Out::Performance(self.performance(req).await?),
            R::Match(req) => Out::Match(self.match_profile(req)?),
            R::RealVsNominal => Out::RealVsNominal(self.real_vs_nominal().await?),
            R::BankVsSpy => Out::BankVsSpy(self.bank_vs_spy().await?),
            R::InflationStats => Out::InflationStats(self.inflation_stats().await?),
        };
        Ok(response)
    }
}

/// Parses the `{direction}/{horizon}` segments of the performers route.
pub fn parse_performer_path(direction: &str, horizon: &str) -> ServiceResult<(Direction, TimeHorizon)> {
    let direction: Direction = direction.parse()?;
    let horizon: TimeHorizon = horizon
        .parse()
        .map_err(|_| AnalyticsError::InvalidRequest(format!("unknown horizon {horizon:?}, expected LT or ST")))?;
    Ok((direction, horizon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_data::InMemorySource;
    use portfolio_analytics::DEFAULT_CATALOG;

    fn service() -> AnalyticsService {
        AnalyticsService::new(
            Arc::new(InMemorySource::new()),
            Arc::new(DEFAULT_CATALOG.clone()),
            AnalyticsPolicy::default(),
        )
    }

    fn matching(risk: &str, horizon: &str, amount: f64) -> MatchRequest {
        MatchRequest {
            risk_tolerance: Some(risk.to_string()),
            time_horizon: Some(horizon.to_string()),
            investment_amount: Some(amount.into()),
        }
    }

    #[test]
    fn test_match_profile() {
        let service = service();
        let matched = service.match_profile(matching("high", "long-term", 2500.0)).unwrap();
        assert_eq!(matched.portfolio_id, "high-risk-long-term");
        assert_eq!(matched.investment_amount, 2500.0);

        let err = service.match_profile(matching("medium", "short-term", 100.0)).unwrap_err();
        assert_eq!(err.kind(), "InvalidProfile");
    }

    #[test]
    fn test_match_profile_missing_fields_are_invalid_profile() {
        let service = service();
        let no_amount = MatchRequest { investment_amount: None, ..matching("low", "short-term", 1.0) };
        assert_eq!(service.match_profile(no_amount).unwrap_err().kind(), "InvalidProfile");

        let text_amount = MatchRequest {
            investment_amount: Some("a lot".into()),
            ..matching("low", "short-term", 1.0)
        };
        assert_eq!(service.match_profile(text_amount).unwrap_err().kind(), "InvalidProfile");

        let no_risk = MatchRequest { risk_tolerance: None, ..matching("low", "short-term", 1.0) };
        assert_eq!(service.match_profile(no_risk).unwrap_err().kind(), "InvalidProfile");
    }

    #[test]
    fn test_performer_path() {
        assert_eq!(
            parse_performer_path("high", "LT").unwrap(),
            (Direction::High, TimeHorizon::LongTerm)
        );
        assert_eq!(
            parse_performer_path("low", "st").unwrap(),
            (Direction::Low, TimeHorizon::ShortTerm)
        );
        assert_eq!(parse_performer_path("sideways", "LT").unwrap_err().kind(), "InvalidRequest");
        assert_eq!(parse_performer_path("high", "decade").unwrap_err().kind(), "InvalidRequest");
    }

    #[tokio::test]
    async fn test_candlestick_needs_one_target() {
        let service = service();
        let err = service.candlestick(CandlestickRequest::default()).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidRequest");

        let both = CandlestickRequest {
            ticker: Some("SPY".into()),
            portfolio_id: Some("low-risk-long-term".into()),
            ..Default::default()
        };
        assert!(service.candlestick(both).await.is_err());
    }

    #[tokio::test]
    async fn test_inverted_range_rejected() {
        let service = service();
        let request = PortfolioRequest {
            portfolio_id: "low-risk-long-term".into(),
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
        };
        let err = service.correlation(request).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidRequest");
    }
}
