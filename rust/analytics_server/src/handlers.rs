// src/handlers.rs

use actix_web::{get, post, web, HttpResponse, Responder};

use crate::error::ServiceError;
use crate::models::{AnalyticsRequest, CandlestickRequest, MatchRequest, PerformanceRequest, PerformersRequest, PortfolioRequest};
use crate::service::{parse_performer_path, AnalyticsService};

type HandlerResult = Result<HttpResponse, ServiceError>;

#[get("/health")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("OK")
}

#[get("/api/portfolios")]
pub async fn list_portfolios(service: web::Data<AnalyticsService>) -> impl Responder {
    HttpResponse::Ok().json(service.portfolios())
}

#[get("/api/portfolios/{id}")]
pub async fn get_portfolio(service: web::Data<AnalyticsService>, path: web::Path<String>) -> HandlerResult {
    let portfolio = service.portfolio(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(portfolio))
}

// Single entry point keyed by the `operation` field
#[post("/api/analytics")]
pub async fn analytics(service: web::Data<AnalyticsService>, params: web::Json<AnalyticsRequest>) -> HandlerResult {
    let response = service.execute(params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/correlation")]
pub async fn correlation(service: web::Data<AnalyticsService>, params: web::Json<PortfolioRequest>) -> HandlerResult {
    let result = service.correlation(params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/api/weightage")]
pub async fn weightage(service: web::Data<AnalyticsService>, params: web::Json<PortfolioRequest>) -> HandlerResult {
    let result = service.weightage(params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/api/company-weightage")]
pub async fn company_weightage(
    service: web::Data<AnalyticsService>,
    params: web::Json<PortfolioRequest>,
) -> HandlerResult {
    let result = service.company_weightage(params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/api/industry-weightage")]
pub async fn industry_weightage(
    service: web::Data<AnalyticsService>,
    params: web::Json<PortfolioRequest>,
) -> HandlerResult {
    let result = service.industry_weightage(params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/api/performers/{direction}/{horizon}")]
pub async fn performers(
    service: web::Data<AnalyticsService>,
    path: web::Path<(String, String)>,
    body: web::Bytes,
) -> HandlerResult {
    let (direction, horizon) = path.into_inner();
    let (direction, horizon) = parse_performer_path(&direction, &horizon)?;
    // An empty body means all defaults; anything else must parse
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        PerformersRequest::default()
    } else {
        serde_json::from_slice::<PerformersRequest>(&body).map_err(|err| ServiceError::BadRequest(err.to_string()))?
    };
    let result = service.performers(direction, horizon, request).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/api/volume")]
pub async fn volume(service: web::Data<AnalyticsService>, params: web::Json<PortfolioRequest>) -> HandlerResult {
    let result = service.volume(params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/api/candlestick")]
pub async fn candlestick(service: web::Data<AnalyticsService>, params: web::Json<CandlestickRequest>) -> HandlerResult {
    let result = service.candlestick(params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/api/performance")]
pub async fn performance(service: web::Data<AnalyticsService>, params: web::Json<PerformanceRequest>) -> HandlerResult {
    let result = service.performance(params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[post("/api/match")]
pub async fn match_profile(service: web::Data<AnalyticsService>, params: web::Json<MatchRequest>) -> HandlerResult {
    let result = service.match_profile(params.into_inner())?;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/api/real-vs-nominal")]
pub async fn real_vs_nominal(service: web::Data<AnalyticsService>) -> HandlerResult {
    let result = service.real_vs_nominal().await?;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/api/bank-vs-spy")]
pub async fn bank_vs_spy(service: web::Data<AnalyticsService>) -> HandlerResult {
    let result = service.bank_vs_spy().await?;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/api/inflation-stats")]
pub async fn inflation_stats(service: web::Data<AnalyticsService>) -> HandlerResult {
    let result = service.inflation_stats().await?;
    Ok(HttpResponse::Ok().json(result))
}
