//! CoinGecko Pipeline
//!
//! A scheduled ETL pipeline: fetch a market snapshot from CoinGecko, stage
//! it as raw JSON in GCS, project it into a six-column CSV, and load that
//! into a BigQuery table with truncate-and-replace semantics.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod etl;
pub mod market;
pub mod storage;
pub mod warehouse;

// Re-exports for convenience
pub use client::{Auth, CoinGeckoClient, MarketSource, MarketsQuery};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use etl::{Fetcher, Loader, Pipeline, RetryPolicy, Step, Transformer};
pub use market::{AssetRow, CSV_HEADER};
pub use storage::{GcsStore, LocalStore, ObjectStore};
pub use warehouse::{BigQueryClient, LoadRequest, TableId, Warehouse, WriteDisposition};
