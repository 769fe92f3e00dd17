// src/lib.rs

pub mod cache;
pub mod client;
pub mod error;
pub mod inflation;
pub mod loader;
pub mod models;
pub mod source;

pub use cache::CachedSource;
pub use client::AlphaVantageClient;
pub use error::{MarketDataError, Result};
pub use inflation::{BankValuePoint, CsvInflationSource, InMemoryInflationSource, InflationPoint, InflationSource};
pub use loader::CsvDirectorySource;
pub use models::{DateRange, PricePoint};
pub use source::{InMemorySource, MarketDataSource};
