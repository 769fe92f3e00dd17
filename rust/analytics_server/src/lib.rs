// src/lib.rs

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod service;

use actix_web::{middleware, web, App, HttpServer};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{json_error_handler, path_error_handler};
use crate::service::AnalyticsService;

/// Registers every route plus the extractor error handlers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(handlers::health_check)
        .service(handlers::list_portfolios)
        .service(handlers::get_portfolio)
        .service(handlers::analytics)
        .service(handlers::correlation)
        .service(handlers::weightage)
        .service(handlers::company_weightage)
        .service(handlers::industry_weightage)
        .service(handlers::performers)
        .service(handlers::volume)
        .service(handlers::candlestick)
        .service(handlers::performance)
        .service(handlers::match_profile)
        .service(handlers::real_vs_nominal)
        .service(handlers::bank_vs_spy)
        .service(handlers::inflation_stats);
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let service = config
        .build_service()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    let service = web::Data::new(service);

    let (host, port) = config.bind_address();
    info!(%host, port, portfolios = service.portfolios().len(), "starting analytics server");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(service.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}
