// tests/integration_tests.rs

use actix_web::{test, web, App};
use analytics_server::configure;
use analytics_server::service::AnalyticsService;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use market_data::{BankValuePoint, InMemoryInflationSource, InMemorySource, InflationPoint, PricePoint};
use more_asserts::{assert_ge, assert_gt};
use portfolio_analytics::{AnalyticsPolicy, DEFAULT_CATALOG};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::sync::Arc;

const START: &str = "2023-01-02";
const END: &str = "2024-12-31";

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn trading_days() -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = date(START);
    while day <= date(END) {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(day);
        }
        day += Duration::days(1);
    }
    days
}

fn random_walk(seed: u64, days: &[NaiveDate], start: f64) -> Vec<PricePoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut close = start;
    days.iter()
        .map(|d| {
            let open = close;
            close *= 1.0 + rng.gen_range(-0.02..0.02);
            PricePoint {
                date: *d,
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: rng.gen_range(100_000..2_000_000),
            }
        })
        .collect()
}

// Two years of weekday prices for the whole catalog; `drop_day` removes one date from SPY
fn source(drop_day: Option<NaiveDate>) -> InMemorySource {
    let days = trading_days();
    let mut source = InMemorySource::new();
    for (i, ticker) in DEFAULT_CATALOG.universe().iter().enumerate() {
        let mut points = random_walk(i as u64 + 7, &days, 50.0 + 10.0 * i as f64);
        if ticker.symbol == "SPY" {
            points.retain(|p| Some(p.date) != drop_day);
        }
        source.insert(ticker.symbol.clone(), points);
    }
    source
}

fn service(source: InMemorySource) -> web::Data<AnalyticsService> {
    web::Data::new(AnalyticsService::new(
        Arc::new(source),
        Arc::new(DEFAULT_CATALOG.clone()),
        AnalyticsPolicy::default(),
    ))
}

macro_rules! app {
    ($source:expr) => {
        test::init_service(App::new().app_data(service($source)).configure(configure)).await
    };
}

fn portfolio_body(id: &str) -> Value {
    json!({ "portfolioId": id, "startDate": START, "endDate": END })
}

#[actix_rt::test]
async fn test_health_check() {
    let app = app!(source(None));
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    assert_eq!(test::read_body(resp).await, "OK");
}

#[actix_rt::test]
async fn test_list_and_get_portfolios() {
    let app = app!(source(None));

    let req = test::TestRequest::get().uri("/api/portfolios").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let ids: Vec<&str> = body.as_array().unwrap().iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(
        ids,
        vec!["high-risk-long-term", "high-risk-short-term", "low-risk-long-term", "low-risk-short-term"]
    );

    let req = test::TestRequest::get().uri("/api/portfolios/low-risk-short-term").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["tickers"].as_array().unwrap().len(), 4);

    let req = test::TestRequest::get().uri("/api/portfolios/balanced").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_rt::test]
async fn test_correlation_has_all_pairs() {
    let app = app!(source(None));
    let req = test::TestRequest::post()
        .uri("/api/correlation")
        .set_json(portfolio_body("high-risk-long-term"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let pairs = body["pairs"].as_array().unwrap();
    assert_eq!(pairs.len(), 6);
    for pair in pairs {
        let r = pair["correlation"].as_f64().unwrap();
        assert!((-1.0..=1.0).contains(&r));
        assert_eq!(pair["dataGap"], false);
    }
    assert!(body["gaps"].as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_weightage_sums_to_one() {
    let app = app!(source(None));
    for portfolio in DEFAULT_CATALOG.list_portfolios() {
        let req = test::TestRequest::post()
            .uri("/api/weightage")
            .set_json(portfolio_body(&portfolio.id))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let total: f64 = body["companies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["weight"].as_f64().unwrap())
            .sum();
        assert!((total - 1.0).abs() < 1e-9, "{} weights sum to {total}", portfolio.id);
    }
}

#[actix_rt::test]
async fn test_missing_day_flags_data_gap() {
    let dropped = date("2024-03-14");
    let app = app!(source(Some(dropped)));

    let req = test::TestRequest::post()
        .uri("/api/correlation")
        .set_json(portfolio_body("high-risk-long-term"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let gaps = body["gaps"].as_array().unwrap();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0]["ticker"], "SPY");
    assert_eq!(gaps[0]["missingDates"], json!(["2024-03-14"]));
    let flagged = body["pairs"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["dataGap"] == true)
        .count();
    assert_eq!(flagged, 3);

    let req = test::TestRequest::post()
        .uri("/api/weightage")
        .set_json(portfolio_body("low-risk-long-term"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let spy = body["companies"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["ticker"] == "SPY")
        .unwrap()
        .clone();
    assert_eq!(spy["dataGap"], true);
}

#[actix_rt::test]
async fn test_candlestick_covers_every_trading_day() {
    let app = app!(source(None));
    let req = test::TestRequest::post()
        .uri("/api/candlestick")
        .set_json(json!({ "ticker": "VUG", "startDate": START, "endDate": END }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let candles = body["candles"].as_array().unwrap();
    assert_eq!(candles.len(), trading_days().len());
    for candle in candles {
        let high = candle["high"].as_f64().unwrap();
        let low = candle["low"].as_f64().unwrap();
        assert_ge!(high, low);
    }

    let req = test::TestRequest::post()
        .uri("/api/candlestick")
        .set_json(json!({ "portfolioId": "high-risk-short-term", "startDate": START, "endDate": END }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["series"].as_array().unwrap().len(), 4);
}

#[actix_rt::test]
async fn test_unknown_ticker_and_portfolio() {
    let app = app!(source(None));

    let req = test::TestRequest::post()
        .uri("/api/candlestick")
        .set_json(json!({ "ticker": "TSLA", "startDate": START, "endDate": END }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["error"]["kind"], "UnknownTicker");
    assert_eq!(body["error"]["ticker"], "TSLA");

    let req = test::TestRequest::post()
        .uri("/api/volume")
        .set_json(portfolio_body("balanced"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["error"]["kind"], "UnknownPortfolio");
}

#[actix_rt::test]
async fn test_match_is_independent_of_amount() {
    let app = app!(source(None));
    for amount in [100.0, 1_000_000.0] {
        let req = test::TestRequest::post()
            .uri("/api/match")
            .set_json(json!({ "riskTolerance": "low", "timeHorizon": "short-term", "investmentAmount": amount }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["portfolioId"], "low-risk-short-term");
        assert_eq!(body["investmentAmount"].as_f64(), Some(amount));
    }
}

#[actix_rt::test]
async fn test_match_rejects_unknown_risk() {
    let app = app!(source(None));
    let req = test::TestRequest::post()
        .uri("/api/match")
        .set_json(json!({ "riskTolerance": "medium", "timeHorizon": "short-term", "investmentAmount": 500.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["error"]["kind"], "InvalidProfile");
    assert_eq!(body["error"]["status"], 400);
}

#[actix_rt::test]
async fn test_performers_rank_the_universe() {
    let app = app!(source(None));
    let req = test::TestRequest::post()
        .uri("/api/performers/high/LT")
        .set_json(json!({ "startDate": START, "endDate": END, "limit": 5 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let performers = body["performers"].as_array().unwrap();
    assert_eq!(performers.len(), 5);
    assert_eq!(body["windowDays"], 252);
    let changes: Vec<f64> = performers.iter().map(|p| p["pctChange"].as_f64().unwrap()).collect();
    assert!(changes.windows(2).all(|w| w[0] >= w[1]));

    let req = test::TestRequest::post()
        .uri("/api/performers/sideways/LT")
        .set_json(json!({ "startDate": START, "endDate": END }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_rt::test]
async fn test_performance_and_volume() {
    let app = app!(source(None));
    let req = test::TestRequest::post()
        .uri("/api/performance")
        .set_json(json!({
            "portfolioId": "low-risk-long-term",
            "investmentAmount": 10000.0,
            "startDate": START,
            "endDate": END
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!((body["initialValue"].as_f64().unwrap() - 10_000.0).abs() < 1e-6);
    assert_eq!(body["values"].as_array().unwrap().len(), trading_days().len());
    assert_eq!(body["yearlyReturns"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::post()
        .uri("/api/volume")
        .set_json(portfolio_body("low-risk-long-term"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["tickers"].as_array().unwrap().len(), 4);
    let combined = body["combined"].as_array().unwrap();
    assert_eq!(combined.len(), trading_days().len());
    assert_gt!(combined[0]["value"].as_f64().unwrap(), 0.0);
}

#[actix_rt::test]
async fn test_dispatch_endpoint() {
    let app = app!(source(None));

    let req = test::TestRequest::post()
        .uri("/api/analytics")
        .set_json(json!({
            "operation": "industry-weightage",
            "portfolioId": "high-risk-long-term",
            "startDate": START,
            "endDate": END
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let total: f64 = body["industries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["weight"].as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 1e-9);

    let req = test::TestRequest::post()
        .uri("/api/analytics")
        .set_json(json!({ "operation": "performers-low-ST", "startDate": START, "endDate": END }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["direction"], "low");
    assert_eq!(body["windowDays"], 21);

    let req = test::TestRequest::post()
        .uri("/api/analytics")
        .set_json(json!({ "operation": "forecast", "portfolioId": "high-risk-long-term" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["error"]["kind"], "InvalidRequest");
}

#[actix_rt::test]
async fn test_inverted_range_is_invalid_request() {
    let app = app!(source(None));
    let req = test::TestRequest::post()
        .uri("/api/weightage")
        .set_json(json!({ "portfolioId": "low-risk-long-term", "startDate": END, "endDate": START }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_rt::test]
async fn test_single_ticker_candlestick_reports_missing_day() {
    let app = app!(source(Some(date("2024-03-14"))));
    let req = test::TestRequest::post()
        .uri("/api/candlestick")
        .set_json(json!({ "ticker": "SPY", "startDate": START, "endDate": END }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["dataGap"], true);
    assert_eq!(body["missingDates"], json!(["2024-03-14"]));
    assert_eq!(body["candles"].as_array().unwrap().len(), trading_days().len() - 1);
}

#[actix_rt::test]
async fn test_performers_reject_malformed_body() {
    let app = app!(source(None));
    for body in [json!({ "limit": -3 }), json!({ "startDate": "not-a-date" })] {
        let req = test::TestRequest::post()
            .uri("/api/performers/high/LT")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(body["error"]["kind"], "InvalidRequest");
    }

    // No body at all still ranks with defaults
    let req = test::TestRequest::post().uri("/api/performers/low/ST").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_rt::test]
async fn test_match_amount_errors_are_invalid_profile() {
    let app = app!(source(None));
    for body in [
        json!({ "riskTolerance": "low", "timeHorizon": "short-term" }),
        json!({ "riskTolerance": "low", "timeHorizon": "short-term", "investmentAmount": "plenty" }),
        json!({ "riskTolerance": "low", "timeHorizon": "short-term", "investmentAmount": null }),
    ] {
        let req = test::TestRequest::post().uri("/api/match").set_json(body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(body["error"]["kind"], "InvalidProfile");
    }

    let req = test::TestRequest::post()
        .uri("/api/match")
        .set_json(json!({ "riskTolerance": "high", "timeHorizon": "short-term", "investmentAmount": "750" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["portfolioId"], "high-risk-short-term");
    assert_eq!(body["investmentAmount"].as_f64(), Some(750.0));
}

#[actix_rt::test]
async fn test_performance_with_allocations_and_drawdowns() {
    let app = app!(source(None));
    let req = test::TestRequest::post()
        .uri("/api/performance")
        .set_json(json!({
            "portfolioId": "high-risk-long-term",
            "investmentAmount": 10000.0,
            "startDate": START,
            "endDate": END,
            "allocations": { "SPY": 40, "gbtc": 10, "VUG": 50 }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!((body["initialValue"].as_f64().unwrap() - 10_000.0).abs() < 1e-6);

    let etfs = body["etfs"].as_array().unwrap();
    assert_eq!(etfs.len(), 4);
    let brk = etfs.iter().find(|e| e["ticker"] == "BRK-B").unwrap();
    assert_eq!(brk["allocation"].as_f64(), Some(0.0));
    assert!(brk["normalized"].as_array().unwrap().is_empty());
    let gbtc = etfs.iter().find(|e| e["ticker"] == "GBTC").unwrap();
    assert!((gbtc["allocation"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    assert_eq!(gbtc["normalized"][0]["value"].as_f64(), Some(1.0));

    let drawdowns = body["drawdowns"].as_array().unwrap();
    assert_eq!(drawdowns.len(), trading_days().len());
    assert!(drawdowns.iter().all(|d| d["drawdown"].as_f64().unwrap() <= 0.0));
    let severe = drawdowns.iter().filter(|d| d["drawdown"].as_f64().unwrap() < -0.10).count();
    assert_eq!(body["severeDrawdowns"].as_u64(), Some(severe as u64));
    assert!(body["drawdownPeriods"].is_array());

    let req = test::TestRequest::post()
        .uri("/api/performance")
        .set_json(json!({
            "portfolioId": "high-risk-long-term",
            "investmentAmount": 10000.0,
            "allocations": { "SPY": 40, "VUG": 50 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["error"]["kind"], "InvalidRequest");
    assert!(body["error"]["message"].as_str().unwrap().contains("got 90%"));
}

fn inflation_source() -> InMemoryInflationSource {
    let spy: Vec<InflationPoint> = (0..20)
        .map(|i| InflationPoint {
            date: date("2015-01-02") + Duration::days(30 * i),
            nominal: 10_000.0 * 1.01f64.powi(i as i32),
            real: 10_000.0 * 1.005f64.powi(i as i32),
        })
        .collect();
    let bank = spy
        .iter()
        .step_by(2)
        .map(|p| BankValuePoint { date: p.date, real_value: 10_000.0 - p.nominal / 100.0 })
        .collect();
    InMemoryInflationSource::new().with_spy_inflation(spy).with_bank_values(bank)
}

#[actix_rt::test]
async fn test_inflation_routes() {
    let service = AnalyticsService::new(
        Arc::new(source(None)),
        Arc::new(DEFAULT_CATALOG.clone()),
        AnalyticsPolicy::default(),
    )
    .with_inflation_source(Arc::new(inflation_source()));
    let app = test::init_service(App::new().app_data(web::Data::new(service)).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/real-vs-nominal").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["sampleEvery"], 4);
    assert_eq!(body["sourceRows"], 20);
    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 5);
    assert_eq!(points[0]["date"], "2015-01-02");
    assert_eq!(points[0]["nominalInv10k"].as_f64(), Some(10_000.0));

    let req = test::TestRequest::get().uri("/api/bank-vs-spy").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["sourceRows"], 10);
    assert_eq!(body["points"].as_array().unwrap().len(), 3);
    assert_eq!(body["points"][0]["bankValue"].as_f64(), Some(9_900.0));

    let req = test::TestRequest::get().uri("/api/inflation-stats").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_gt!(body["nominalAnnualizedReturn"].as_f64().unwrap(), body["realAnnualizedReturn"].as_f64().unwrap());
    assert_gt!(body["impliedInflation"].as_f64().unwrap(), 0.0);
    assert_eq!(body["reference"]["singaporeInflation"].as_f64(), Some(1.8));

    let req = test::TestRequest::post()
        .uri("/api/analytics")
        .set_json(json!({ "operation": "real-vs-nominal" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["points"].as_array().unwrap().len(), 5);
}

#[actix_rt::test]
async fn test_inflation_routes_without_datasets() {
    let app = app!(source(None));
    let req = test::TestRequest::get().uri("/api/bank-vs-spy").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
    let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["error"]["kind"], "MissingDataset");
}
