// src/lib.rs

pub mod catalog;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod holdings;
pub mod inflation;
pub mod matching;
pub mod panel;
pub mod performance;
pub mod performers;
pub mod policy;
pub mod series;
pub mod weightage;

#[cfg(test)]
mod testutil;

pub use catalog::{Holding, Portfolio, PortfolioCatalog, PortfolioId, Ticker, DEFAULT_CATALOG};
pub use engine::AnalyticsEngine;
pub use error::{AnalyticsError, Result};
pub use matching::{InvestorProfile, MatchingEngine, RiskTolerance, TimeHorizon};
pub use panel::{DataGap, GapKind, PricePanel};
pub use performers::Direction;
pub use policy::{AnalyticsPolicy, WeightingPolicy};
